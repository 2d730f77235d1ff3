use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::models::*;
use crate::services::{BalanceStore, DisputeStore, UserContext, transaction_store};
use crate::state::AppState;

/// 无限滚动最多一次性补齐的页数
const MAX_SCROLL_PAGES: u32 = 10;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParam {
    /// 已滚动到的页数
    pub page: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/view/balance",
    tag = "balance",
    responses(
        (status = 200, description = "账户余额", body = Balance),
        (status = 401, description = "未登录")
    )
)]
pub async fn get_balance(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let store = BalanceStore::new(state.api_for(&req));
    match store.refetch().await {
        Ok(balance) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": balance
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/view/transactions",
    tag = "balance",
    params(TransactionQuery, PageParam),
    responses(
        (status = 200, description = "交易记录分页，未指定时间范围时默认最近 30 天"),
        (status = 401, description = "未登录")
    )
)]
pub async fn get_transactions(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<TransactionQuery>,
    page: web::Query<PageParam>,
) -> Result<HttpResponse> {
    let mut query = query.into_inner();
    let pages = page.page.unwrap_or(1).clamp(1, MAX_SCROLL_PAGES);
    let store = transaction_store(state.api_for(&req), Utc::now());

    // 未指定时间范围时沿用默认的最近 30 天
    let defaults = store.query().await;
    if query.start_time.is_none() && query.end_time.is_none() {
        query.start_time = defaults.start_time;
        query.end_time = defaults.end_time;
    }
    let page_size = query.page_size.or(defaults.page_size);
    query.page_size = Some(PaginationParams::new(None, page_size).get_page_size());

    if let Err(e) = store.set_query(query).await {
        return Ok(e.error_response());
    }
    for _ in 1..pages {
        match store.load_more().await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => return Ok(e.error_response()),
        }
    }

    let snapshot = store.snapshot().await;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "has_more": snapshot.has_more(),
            "page": snapshot.page,
            "page_size": snapshot.page_size,
            "total": snapshot.total,
            "items": snapshot.items
        }
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/view/disputes",
    tag = "balance",
    responses(
        (status = 200, description = "待处理争议（首页 20 条），加载失败时返回空列表", body = DisputeList)
    )
)]
pub async fn get_disputes(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let api = state.api_for(&req);
    let signed_in = match UserContext::new(api.clone()).signed_in_user().await {
        Ok(user) => user.is_some(),
        Err(e) => {
            log::warn!("failed to resolve user for disputes: {e}");
            false
        }
    };

    let store = DisputeStore::new(api, signed_in);
    match store.initial_load().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/view/disputes/refresh",
    tag = "balance",
    responses(
        (status = 200, description = "刷新待处理争议", body = DisputeList),
        (status = 401, description = "未登录"),
        (status = 502, description = "上游服务异常")
    )
)]
pub async fn refresh_disputes(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let api = state.api_for(&req);
    let signed_in = match UserContext::new(api.clone()).signed_in_user().await {
        Ok(user) => user.is_some(),
        Err(e) => return Ok(e.error_response()),
    };

    let store = DisputeStore::new(api, signed_in);
    match store.refresh().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn balance_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/balance", web::get().to(get_balance))
        .route("/transactions", web::get().to(get_transactions))
        .route("/disputes", web::get().to(get_disputes))
        .route("/disputes/refresh", web::post().to(refresh_disputes));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::test_state;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn test_disputes_degrade_to_empty_list() {
        let app = test::init_service(
            App::new()
                .app_data(test_state())
                .service(web::scope("/api/v1/view").configure(balance_config)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/v1/view/disputes")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
    }

    #[actix_web::test]
    async fn test_refresh_disputes_surfaces_errors() {
        let app = test::init_service(
            App::new()
                .app_data(test_state())
                .service(web::scope("/api/v1/view").configure(balance_config)),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/v1/view/disputes/refresh")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 502);
    }
}
