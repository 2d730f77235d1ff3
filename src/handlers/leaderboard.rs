use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::error::AppError;
use crate::models::*;
use crate::services::LeaderboardStore;
use crate::state::AppState;

/// 无限滚动最多一次性补齐的页数
const MAX_SCROLL_PAGES: u32 = 10;

#[utoipa::path(
    get,
    path = "/api/v1/view/leaderboard",
    tag = "leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "排行榜视图（领奖台、趋势、个人排名）", body = LeaderboardView),
        (status = 502, description = "上游服务异常")
    )
)]
pub async fn get_leaderboard(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<LeaderboardQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let pages = query.page.unwrap_or(1).clamp(1, MAX_SCROLL_PAGES);
    let defaults = LeaderboardQuery {
        page_size: Some(state.config.leaderboard.page_size),
        ..Default::default()
    };
    let store = LeaderboardStore::new(state.api_for(&req), defaults);

    if let Err(e) = store.update_params(query).await {
        return Ok(e.error_response());
    }
    // 按滚动位置补齐之前的页
    for _ in 1..pages {
        match store.load_next_page().await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => return Ok(e.error_response()),
        }
    }

    match store.view().await {
        Some(view) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": view
        }))),
        None => Ok(AppError::InternalError("leaderboard not loaded".into())
            .error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/view/leaderboard/metadata",
    tag = "leaderboard",
    responses(
        (status = 200, description = "排行榜元数据", body = LeaderboardMetadata)
    )
)]
pub async fn get_metadata(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let store = LeaderboardStore::new(state.api_for(&req), LeaderboardQuery::default());
    match store.metadata().await {
        Ok(metadata) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": metadata
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/view/leaderboard/users/{user_id}",
    tag = "leaderboard",
    params(
        ("user_id" = u64, Path, description = "用户 ID"),
        LeaderboardQuery
    ),
    responses(
        (status = 200, description = "指定用户的排名", body = UserRank),
        (status = 404, description = "用户不在榜单中")
    )
)]
pub async fn get_user_rank(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<u64>,
    query: web::Query<LeaderboardQuery>,
) -> Result<HttpResponse> {
    let store = LeaderboardStore::new(state.api_for(&req), query.into_inner());
    match store.user_rank(path.into_inner()).await {
        Ok(rank) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": rank
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn leaderboard_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leaderboard")
            .route("", web::get().to(get_leaderboard))
            .route("/metadata", web::get().to(get_metadata))
            .route("/users/{user_id}", web::get().to(get_user_rank)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::test_state;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn test_unreachable_upstream_is_bad_gateway_toast() {
        let app = test::init_service(
            App::new()
                .app_data(test_state())
                .service(web::scope("/api/v1/view").configure(leaderboard_config)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/v1/view/leaderboard?period=week&metric=net_amount")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 502);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["surface"], "toast");
    }
}
