use std::time::Duration;

use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::error::AppError;
use crate::models::*;
use crate::services::ClaimMachine;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RedEnvelopeListParams {
    /// sent / received
    #[serde(rename = "type", default = "default_list_type")]
    pub list_type: String,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

fn default_list_type() -> String {
    "received".to_string()
}

#[utoipa::path(
    get,
    path = "/api/v1/view/redenvelope/{id}",
    tag = "redenvelope",
    params(
        ("id" = String, Path, description = "红包 ID")
    ),
    responses(
        (status = 200, description = "红包领取页视图", body = ClaimView),
        (status = 404, description = "红包不存在")
    )
)]
pub async fn get_claim_view(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let machine = ClaimMachine::new(
        state.api_for(&req),
        path.into_inner(),
        Duration::from_millis(state.config.claim.reveal_delay_ms),
    );

    match machine.load().await {
        Ok(_) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": machine.view(Utc::now()).await
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/view/redenvelope/{id}/open",
    tag = "redenvelope",
    params(
        ("id" = String, Path, description = "红包 ID")
    ),
    responses(
        (status = 200, description = "领取成功", body = ClaimView),
        (status = 400, description = "红包不可领取或已被领完"),
        (status = 502, description = "上游服务异常，可重试")
    )
)]
pub async fn open_red_envelope(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let machine = ClaimMachine::new(
        state.api_for(&req),
        path.into_inner(),
        Duration::from_millis(state.config.claim.reveal_delay_ms),
    );

    if let Err(e) = machine.load().await {
        return Ok(e.error_response());
    }

    match machine.open().await {
        Ok(_) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": machine.view(Utc::now()).await
        }))),
        // 失败时同样返回最新视图，前端据此决定是否允许重试
        Err(e) => Ok(HttpResponse::build(e.status_code()).json(json!({
            "success": false,
            "error": e.info(),
            "data": machine.view(Utc::now()).await
        }))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/view/redenvelopes",
    tag = "redenvelope",
    params(RedEnvelopeListParams),
    responses(
        (status = 200, description = "我发出或收到的红包"),
        (status = 401, description = "未登录")
    )
)]
pub async fn list_red_envelopes(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<RedEnvelopeListParams>,
) -> Result<HttpResponse> {
    let params = query.into_inner();
    if params.list_type != "sent" && params.list_type != "received" {
        return Ok(AppError::ValidationError(format!(
            "未知的红包列表类型: {}",
            params.list_type
        ))
        .error_response());
    }
    let pagination = PaginationParams::new(params.page, params.page_size);
    let list_query = RedEnvelopeListQuery {
        page: pagination.get_page(),
        page_size: pagination.get_page_size(),
        list_type: params.list_type,
    };

    match state.api_for(&req).red_envelope_list(&list_query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": {
                "has_more": page.has_more(),
                "page": page
            }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn red_envelope_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/redenvelope")
            .route("/{id}", web::get().to(get_claim_view))
            .route("/{id}/open", web::post().to(open_red_envelope)),
    )
    .route("/redenvelopes", web::get().to(list_red_envelopes));
}
