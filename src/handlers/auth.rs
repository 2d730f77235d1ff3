use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::error::AppError;
use crate::models::*;
use crate::services::{AuthService, UserContext};
use crate::state::{AppState, NotificationPrefs};
use crate::utils::{REDIRECT_COOKIE, cookie_value, session_id};

fn cookie_header(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
}

fn request_session(state: &AppState, req: &HttpRequest) -> Option<String> {
    session_id(cookie_header(req), &state.config.session.cookie_prefix)
}

#[utoipa::path(
    get,
    path = "/login",
    tag = "auth",
    responses(
        (status = 302, description = "跳转到 OAuth 登录页"),
        (status = 502, description = "上游服务异常")
    )
)]
pub async fn login(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let service = AuthService::new(state.api_for(&req));
    match service.login_url().await {
        Ok(url) => Ok(HttpResponse::Found()
            .insert_header((header::LOCATION, url))
            .finish()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/callback",
    tag = "auth",
    params(CallbackRequest),
    responses(
        (status = 302, description = "登录成功，跳回登录前的页面"),
        (status = 400, description = "缺少 code 或 state 参数"),
        (status = 401, description = "授权失败")
    )
)]
pub async fn callback(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<CallbackRequest>,
) -> Result<HttpResponse> {
    let service = AuthService::new(state.api_for(&req));
    let stored = cookie_value(cookie_header(&req), REDIRECT_COOKIE);

    match service
        .handle_callback(query.into_inner(), stored.as_deref())
        .await
    {
        Ok(outcome) => {
            let mut resp = HttpResponse::Found();
            resp.insert_header((header::LOCATION, outcome.redirect_to));
            for cookie in outcome.set_cookies {
                resp.append_header((header::SET_COOKIE, cookie));
            }
            // 一次性的跳转目标
            let mut clear = Cookie::named(REDIRECT_COOKIE);
            clear.set_path("/");
            clear.make_removal();
            resp.cookie(clear);
            Ok(resp.finish())
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/view/me",
    tag = "auth",
    responses(
        (status = 200, description = "当前用户与通知偏好", body = User),
        (status = 401, description = "未登录")
    )
)]
pub async fn me(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let ctx = UserContext::new(state.api_for(&req));
    let session = request_session(&state, &req);
    match ctx.load().await {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": {
                "user": user,
                "notifications": state.notifications.get(session.as_deref()).await
            }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/view/settings/notifications",
    tag = "auth",
    responses(
        (status = 200, description = "当前会话的通知偏好，未登录时为默认值", body = NotificationPrefs)
    )
)]
pub async fn get_notification_settings(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let session = request_session(&state, &req);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": state.notifications.get(session.as_deref()).await
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/view/settings/notifications",
    tag = "auth",
    request_body = NotificationPrefs,
    responses(
        (status = 200, description = "更新当前会话的通知偏好", body = NotificationPrefs),
        (status = 401, description = "未登录")
    )
)]
pub async fn update_notification_settings(
    state: web::Data<AppState>,
    req: HttpRequest,
    request: web::Json<NotificationPrefs>,
) -> Result<HttpResponse> {
    let Some(session) = request_session(&state, &req) else {
        return Ok(AppError::AuthError("请先登录".to_string()).error_response());
    };
    let prefs = state
        .notifications
        .set(&session, request.into_inner())
        .await;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": prefs
    })))
}

/// 登录跳转路由，挂在根路径
pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::get().to(login))
        .route("/callback", web::get().to(callback));
}

pub fn account_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/me", web::get().to(me)).service(
        web::resource("/settings/notifications")
            .route(web::get().to(get_notification_settings))
            .route(web::put().to(update_notification_settings)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::test_state;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn test_callback_without_code_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(test_state())
                .configure(auth_config),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/callback?state=abc")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["message"], "Missing code or state parameter");
    }

    #[actix_web::test]
    async fn test_notification_settings_require_session() {
        let app = test::init_service(
            App::new()
                .app_data(test_state())
                .service(web::scope("/api/v1/view").configure(account_config)),
        )
        .await;
        let req = test::TestRequest::put()
            .uri("/api/v1/view/settings/notifications")
            .set_json(json!({"show_bell": false}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::get()
            .uri("/api/v1/view/settings/notifications")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["show_bell"], true);
    }

    #[actix_web::test]
    async fn test_notification_settings_kept_per_session() {
        let app = test::init_service(
            App::new()
                .app_data(test_state())
                .service(web::scope("/api/v1/view").configure(account_config)),
        )
        .await;
        let req = test::TestRequest::put()
            .uri("/api/v1/view/settings/notifications")
            .insert_header((header::COOKIE, "linux_do_credit_session_id=alice"))
            .set_json(json!({"show_bell": false}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let req = test::TestRequest::get()
            .uri("/api/v1/view/settings/notifications")
            .insert_header((header::COOKIE, "linux_do_credit_session_id=alice"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["show_bell"], false);

        let req = test::TestRequest::get()
            .uri("/api/v1/view/settings/notifications")
            .insert_header((header::COOKIE, "linux_do_credit_session_id=bob"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["show_bell"], true);
    }
}
