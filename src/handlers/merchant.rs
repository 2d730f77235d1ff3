use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::models::*;
use crate::services::MerchantService;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/view/merchant/{api_key_id}/payment-links",
    tag = "merchant",
    params(
        ("api_key_id" = u64, Path, description = "商户 API Key ID")
    ),
    request_body = CreatePaymentLinkRequest,
    responses(
        (status = 200, description = "支付链接创建成功", body = PaymentLink),
        (status = 400, description = "请填写完整信息或金额无效")
    )
)]
pub async fn create_payment_link(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<u64>,
    request: web::Json<CreatePaymentLinkRequest>,
) -> Result<HttpResponse> {
    let service = MerchantService::new(state.api_for(&req));
    match service.create_payment_link(path.into_inner(), &request).await {
        Ok(link) => {
            let origin = {
                let info = req.connection_info();
                format!("{}://{}", info.scheme(), info.host())
            };
            let pay_url = link.pay_url(&origin);
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "data": {
                    "link": link,
                    "pay_url": pay_url
                },
                "message": "支付链接创建成功"
            })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn merchant_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/merchant")
            .route("/{api_key_id}/payment-links", web::post().to(create_payment_link)),
    );
}
