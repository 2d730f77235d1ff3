use crate::config::SessionConfig;
use crate::utils::{REDIRECT_COOKIE, has_session_cookie};
use actix_web::body::EitherBody;
use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::{Method, header};
use actix_web::{
    Error, HttpResponse,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;

// 公开路径配置
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    // 已登录用户访问时跳回首页
    guest_only_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec!["/", "/login", "/callback", "/swagger-ui", "/api-docs/openapi.json"],
            prefix_paths: vec![
                "/swagger-ui/",
                "/api-docs/",
                "/api/",
                "/redenvelope/",
                "/paying/",
                "/f/",
            ],
            guest_only_paths: vec!["/login"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }
        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }

    fn is_guest_only(&self, path: &str) -> bool {
        self.guest_only_paths.contains(&path)
    }
}

/// 会话跳转中间件
///
/// 只根据会话 Cookie 是否存在决定跳转：未登录访问受保护页面去登录页，
/// 已登录访问登录页回首页。真正的鉴权由上游完成。
pub struct SessionMiddleware {
    config: Rc<SessionConfig>,
}

impl SessionMiddleware {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config: Rc::new(config),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService {
            service,
            config: self.config.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: S,
    config: Rc<SessionConfig>,
    public_paths: PublicPaths,
}

impl<S> SessionMiddlewareService<S> {
    fn redirect<B>(&self, req: ServiceRequest, location: &str, remember: Option<String>) -> ServiceResponse<EitherBody<B>> {
        let mut resp = HttpResponse::Found();
        resp.insert_header((header::LOCATION, location));
        if let Some(target) = remember {
            resp.cookie(
                Cookie::build(REDIRECT_COOKIE, target)
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .max_age(CookieDuration::minutes(10))
                    .finish(),
            );
        }
        req.into_response(resp.finish()).map_into_right_body()
    }
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let cookie_header = req
            .headers()
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok());
        let signed_in = has_session_cookie(cookie_header, &self.config.cookie_prefix);
        let path = req.path().to_string();

        if signed_in && self.public_paths.is_guest_only(&path) {
            log::debug!("signed-in request to {path}, redirecting home");
            let home = self.config.home_path.clone();
            let resp = self.redirect(req, &home, None);
            return Box::pin(async move { Ok(resp) });
        }

        if !signed_in && !self.public_paths.is_public_path(&path) {
            let target = match req.query_string() {
                "" => path.clone(),
                q => format!("{path}?{q}"),
            };
            log::debug!("no session for {path}, redirecting to login");
            let login = self.config.login_path.clone();
            let resp = self.redirect(req, &login, Some(target));
            return Box::pin(async move { Ok(resp) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
