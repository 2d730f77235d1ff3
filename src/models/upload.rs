use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 红包封面类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CoverType {
    /// 背景封面
    Cover,
    /// 放在红包后方的异形装饰图
    Heterotypic,
}

impl CoverType {
    /// 推荐尺寸（宽, 高），均为 2:3
    pub fn recommended_size(&self) -> (u32, u32) {
        match self {
            CoverType::Cover => (360, 540),
            CoverType::Heterotypic => (480, 720),
        }
    }
}

/// 源图像素坐标系下的裁剪区域
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CropArea {
    pub x: f64,
    pub y: f64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CropRequest {
    /// data:image/...;base64,... 形式的源图
    pub image: String,
    pub cover_type: CoverType,
    /// 不传则按缩放与平移计算
    #[serde(default)]
    pub area: Option<CropArea>,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
}

fn default_zoom() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CropResponse {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    pub recommended_width: u32,
    pub recommended_height: u32,
}
