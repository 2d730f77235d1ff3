use std::io::Cursor;
use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use regex::Regex;

use crate::error::{AppError, AppResult};
use crate::models::{CropArea, CropRequest, CropResponse};

/// 裁剪框宽高比 2:3
pub const CROP_ASPECT: f64 = 2.0 / 3.0;
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 3.0;
const MAX_OUTPUT_SIDE: u32 = 4096;

static DATA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:([A-Za-z0-9.+\-]+/[A-Za-z0-9.+\-]+);base64,([A-Za-z0-9+/=\s]*)$")
        .expect("data url regex")
});

/// 与浏览器 `Math.round` 一致：.5 向正无穷取整
fn js_round(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

/// 上传前校验：类型必须是图片，大小不超过上限
pub fn validate_upload(mime: &str, size: u64, max_bytes: u64) -> AppResult<()> {
    if !mime.starts_with("image/") {
        return Err(AppError::ValidationError("请选择图片文件".to_string()));
    }
    if size > max_bytes {
        return Err(oversize_error(max_bytes));
    }
    Ok(())
}

pub fn oversize_error(max_bytes: u64) -> AppError {
    AppError::ValidationError(format!("图片大小不能超过 {}MB", max_bytes / (1024 * 1024)))
}

/// 解析 data URL，在解码前先校验类型与大小
pub fn decode_data_url(data_url: &str, max_bytes: u64) -> AppResult<(String, Vec<u8>)> {
    let caps = DATA_URL
        .captures(data_url)
        .ok_or_else(|| AppError::ValidationError("图片数据格式错误".to_string()))?;
    let mime = caps[1].to_ascii_lowercase();
    let payload: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();

    let padding = payload.bytes().rev().take_while(|b| *b == b'=').count() as u64;
    let estimated = (payload.len() as u64 / 4) * 3;
    validate_upload(&mime, estimated.saturating_sub(padding), max_bytes)?;

    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| AppError::ValidationError(format!("图片数据格式错误: {e}")))?;
    Ok((mime, bytes))
}

/// 旋转后的外接矩形尺寸
pub fn rotate_size(width: f64, height: f64, rotation: f64) -> (f64, f64) {
    let rad = rotation.to_radians();
    let (sin, cos) = (rad.sin().abs(), rad.cos().abs());
    (cos * width + sin * height, sin * width + cos * height)
}

/// 裁剪面板：媒体尺寸、缩放、旋转与平移，输出源图像素坐标下的裁剪区域
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSurface {
    pub media_width: u32,
    pub media_height: u32,
    pub zoom: f64,
    pub rotation: f64,
    /// 以源图像素计的平移量
    pub offset_x: f64,
    pub offset_y: f64,
}

impl CropSurface {
    pub fn new(media_width: u32, media_height: u32) -> Self {
        Self {
            media_width,
            media_height,
            zoom: MIN_ZOOM,
            rotation: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    pub fn with_zoom(mut self, zoom: f64) -> AppResult<Self> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
            return Err(AppError::ValidationError(format!(
                "缩放比例必须在 {MIN_ZOOM} 到 {MAX_ZOOM} 之间"
            )));
        }
        self.zoom = zoom;
        Ok(self)
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation.rem_euclid(360.0);
        self
    }

    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    /// 裁剪框在缩放前能容纳的最大 2:3 尺寸
    fn base_crop_size(&self) -> (f64, f64) {
        let (bw, bh) = rotate_size(
            self.media_width as f64,
            self.media_height as f64,
            self.rotation,
        );
        if bw / bh > CROP_ASPECT {
            (bh * CROP_ASPECT, bh)
        } else {
            (bw, bw / CROP_ASPECT)
        }
    }

    pub fn crop_area(&self) -> CropArea {
        let (w, h) = (self.media_width as f64, self.media_height as f64);
        let (bw, bh) = rotate_size(w, h, self.rotation);
        let (base_w, base_h) = self.base_crop_size();
        let crop_w = (base_w / self.zoom).round().max(1.0);
        let crop_h = (base_h / self.zoom).round().max(1.0);

        // 平移不能让裁剪框超出旋转后的图片范围
        let max_dx = ((bw - crop_w) / 2.0).max(0.0);
        let max_dy = ((bh - crop_h) / 2.0).max(0.0);
        let cx = w / 2.0 - self.offset_x.clamp(-max_dx, max_dx);
        let cy = h / 2.0 - self.offset_y.clamp(-max_dy, max_dy);

        CropArea {
            x: (cx - crop_w / 2.0).round(),
            y: (cy - crop_h / 2.0).round(),
            width: crop_w as u32,
            height: crop_h as u32,
        }
    }
}

/// 按旋转角度裁剪
///
/// 源图居中绘制在边长为 `2 * (max/2 * sqrt2)` 的安全区内并绕中心旋转，
/// 再从中取出裁剪区域，输出尺寸恰为 `area.width × area.height`，
/// 超出安全区的像素保持透明。
pub fn crop_image(image: &DynamicImage, area: CropArea, rotation: f64) -> AppResult<RgbaImage> {
    if area.width == 0 || area.height == 0 {
        return Err(AppError::ImageError("裁剪区域为空".to_string()));
    }
    if area.width > MAX_OUTPUT_SIDE || area.height > MAX_OUTPUT_SIDE {
        return Err(AppError::ValidationError("裁剪区域过大".to_string()));
    }

    let source = image.to_rgba8();
    let (w, h) = source.dimensions();
    if w == 0 || h == 0 {
        return Err(AppError::ImageError("图片尺寸为空".to_string()));
    }

    let max_size = w.max(h) as f64;
    let safe = (2.0 * ((max_size / 2.0) * std::f64::consts::SQRT_2)).floor();
    let half = safe / 2.0;
    let draw_x = half - w as f64 * 0.5;
    let draw_y = half - h as f64 * 0.5;

    let dx = js_round(-half + w as f64 * 0.5 - area.x);
    let dy = js_round(-half + h as f64 * 0.5 - area.y);

    let rad = rotation.to_radians();
    let (sin, cos) = rad.sin_cos();
    let safe_px = safe as i64;

    let mut output = RgbaImage::from_pixel(area.width, area.height, Rgba([0, 0, 0, 0]));
    for j in 0..area.height {
        let by = j as i64 - dy;
        if by < 0 || by >= safe_px {
            continue;
        }
        for i in 0..area.width {
            let bx = i as i64 - dx;
            if bx < 0 || bx >= safe_px {
                continue;
            }

            // 逆旋转回源图坐标，取像素中心最近邻
            let px = bx as f64 + 0.5 - half;
            let py = by as f64 + 0.5 - half;
            let ux = cos * px + sin * py + half - draw_x;
            let uy = -sin * px + cos * py + half - draw_y;
            let (sx, sy) = (ux.floor(), uy.floor());
            if sx < 0.0 || sy < 0.0 || sx >= w as f64 || sy >= h as f64 {
                continue;
            }
            output.put_pixel(i, j, *source.get_pixel(sx as u32, sy as u32));
        }
    }
    Ok(output)
}

pub fn to_png_data_url(image: &RgbaImage) -> AppResult<String> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(buf.into_inner())))
}

/// 完整的裁剪流程：校验、解码、计算区域、裁剪、编码
pub fn crop_data_url(req: &CropRequest, max_bytes: u64) -> AppResult<CropResponse> {
    let (_mime, bytes) = decode_data_url(&req.image, max_bytes)?;
    let image = image::load_from_memory(&bytes)?;

    let area = match req.area {
        Some(area) => area,
        None => CropSurface::new(image.width(), image.height())
            .with_zoom(req.zoom)?
            .with_rotation(req.rotation)
            .with_offset(req.offset_x, req.offset_y)
            .crop_area(),
    };
    let cropped = crop_image(&image, area, req.rotation)?;
    let (recommended_width, recommended_height) = req.cover_type.recommended_size();

    Ok(CropResponse {
        data_url: to_png_data_url(&cropped)?,
        width: cropped.width(),
        height: cropped.height(),
        recommended_width,
        recommended_height,
    })
}
