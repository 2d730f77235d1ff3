use actix_web::{HttpRequest, HttpResponse, Result, ResponseError, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::error::AppError;
use crate::models::*;
use crate::services::{AdminStore, pay_config_for_score};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScoreQuery {
    /// 用户积分
    pub score: i64,
}

#[utoipa::path(
    get,
    path = "/api/v1/view/admin/user-pay-configs",
    tag = "admin",
    responses(
        (status = 200, description = "支付等级配置列表", body = Vec<UserPayConfig>),
        (status = 403, description = "无管理权限")
    )
)]
pub async fn list_pay_configs(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let store = AdminStore::new(state.api_for(&req));
    match store.refetch_pay_configs().await {
        Ok(configs) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": configs
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/view/admin/user-pay-configs/match",
    tag = "admin",
    params(ScoreQuery),
    responses(
        (status = 200, description = "积分所在的支付等级", body = UserPayConfig),
        (status = 404, description = "没有覆盖该积分的等级")
    )
)]
pub async fn match_pay_config(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ScoreQuery>,
) -> Result<HttpResponse> {
    let store = AdminStore::new(state.api_for(&req));
    let configs = match store.refetch_pay_configs().await {
        Ok(configs) => configs,
        Err(e) => return Ok(e.error_response()),
    };

    match pay_config_for_score(&configs, query.score) {
        Some(config) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": config
        }))),
        None => Ok(AppError::NotFound(format!("积分 {} 没有对应的支付等级", query.score))
            .error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/view/admin/user-pay-configs/{id}",
    tag = "admin",
    params(
        ("id" = u64, Path, description = "配置 ID")
    ),
    request_body = UpdateUserPayConfigRequest,
    responses(
        (status = 200, description = "更新成功，返回最新列表", body = Vec<UserPayConfig>),
        (status = 400, description = "参数错误")
    )
)]
pub async fn update_pay_config(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<u64>,
    request: web::Json<UpdateUserPayConfigRequest>,
) -> Result<HttpResponse> {
    let store = AdminStore::new(state.api_for(&req));
    match store.update_pay_config(path.into_inner(), &request).await {
        Ok(configs) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": configs,
            "message": "支付配置已更新"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/view/admin/user-pay-configs/{id}",
    tag = "admin",
    params(
        ("id" = u64, Path, description = "配置 ID")
    ),
    responses(
        (status = 200, description = "删除成功，返回最新列表", body = Vec<UserPayConfig>)
    )
)]
pub async fn delete_pay_config(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<u64>,
) -> Result<HttpResponse> {
    let store = AdminStore::new(state.api_for(&req));
    match store.delete_pay_config(path.into_inner()).await {
        Ok(configs) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": configs,
            "message": "支付配置已删除"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/view/admin/system-configs",
    tag = "admin",
    responses(
        (status = 200, description = "系统配置列表", body = Vec<SystemConfig>)
    )
)]
pub async fn list_system_configs(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let store = AdminStore::new(state.api_for(&req));
    match store.refetch_system_configs().await {
        Ok(configs) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": configs
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/view/admin/system-configs/{key}",
    tag = "admin",
    params(
        ("key" = String, Path, description = "配置键")
    ),
    request_body = UpdateSystemConfigRequest,
    responses(
        (status = 200, description = "更新成功，返回最新列表", body = Vec<SystemConfig>),
        (status = 400, description = "参数错误")
    )
)]
pub async fn update_system_config(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<UpdateSystemConfigRequest>,
) -> Result<HttpResponse> {
    let store = AdminStore::new(state.api_for(&req));
    match store.update_system_config(&path, &request).await {
        Ok(configs) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": configs,
            "message": "系统配置已更新"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/view/admin/system-configs/{key}",
    tag = "admin",
    params(
        ("key" = String, Path, description = "配置键")
    ),
    responses(
        (status = 200, description = "删除成功，返回最新列表", body = Vec<SystemConfig>)
    )
)]
pub async fn delete_system_config(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let store = AdminStore::new(state.api_for(&req));
    match store.delete_system_config(&path).await {
        Ok(configs) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": configs,
            "message": "系统配置已删除"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/user-pay-configs", web::get().to(list_pay_configs))
            .route("/user-pay-configs/match", web::get().to(match_pay_config))
            .route("/user-pay-configs/{id}", web::put().to(update_pay_config))
            .route("/user-pay-configs/{id}", web::delete().to(delete_pay_config))
            .route("/system-configs", web::get().to(list_system_configs))
            .route("/system-configs/{key}", web::put().to(update_system_config))
            .route("/system-configs/{key}", web::delete().to(delete_system_config)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::test_state;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn test_invalid_pay_config_rejected_before_upstream() {
        let app = test::init_service(
            App::new()
                .app_data(test_state())
                .service(web::scope("/api/v1/view").configure(admin_config)),
        )
        .await;
        let req = test::TestRequest::put()
            .uri("/api/v1/view/admin/user-pay-configs/1")
            .set_json(json!({
                "min_score": 100,
                "max_score": 50,
                "fee_rate": "0.01",
                "score_rate": "1"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }
}
