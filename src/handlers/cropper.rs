use actix_web::error::JsonPayloadError;
use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::config::UploadConfig;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;
use crate::utils::{crop_data_url, oversize_error};

/// 请求体里除图片外的 JSON 字段余量
const JSON_OVERHEAD_BYTES: u64 = 64 * 1024;

/// base64 会把图片放大到 4/3
fn json_limit(max_bytes: u64) -> usize {
    let limit = max_bytes.div_ceil(3) * 4 + JSON_OVERHEAD_BYTES;
    usize::try_from(limit).unwrap_or(usize::MAX)
}

#[utoipa::path(
    post,
    path = "/api/v1/view/cropper",
    tag = "cropper",
    request_body = CropRequest,
    responses(
        (status = 200, description = "裁剪后的 2:3 PNG", body = CropApiResponse),
        (status = 400, description = "不是图片、图片过大或裁剪区域无效")
    )
)]
pub async fn crop(
    state: web::Data<AppState>,
    request: web::Json<CropRequest>,
) -> Result<HttpResponse> {
    let max_bytes = state.config.upload.max_bytes;
    let request = request.into_inner();

    // 解码与重采样是 CPU 密集操作，放到阻塞线程池
    let result = web::block(move || crop_data_url(&request, max_bytes))
        .await
        .map_err(|e| AppError::InternalError(format!("crop task failed: {e}")))
        .and_then(|r| r);

    match result {
        Ok(cropped) => Ok(HttpResponse::Ok().json(ApiResponse::success(cropped))),
        Err(e) => {
            log::warn!("crop failed: {e}");
            Ok(e.error_response())
        }
    }
}

/// 请求体上限随 `upload.max_bytes` 调整，超限时给出与上传校验相同的提示
pub fn cropper_config(upload: &UploadConfig) -> impl FnOnce(&mut web::ServiceConfig) {
    let max_bytes = upload.max_bytes;
    move |cfg: &mut web::ServiceConfig| {
        let json = web::JsonConfig::default()
            .limit(json_limit(max_bytes))
            .error_handler(move |err, _req| {
                if matches!(
                    err,
                    JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. }
                ) {
                    log::warn!("crop request too large: {err}");
                    return oversize_error(max_bytes).into();
                }
                err.into()
            });
        cfg.service(
            web::resource("/cropper")
                .app_data(json)
                .route(web::post().to(crop)),
        );
    }
}
