use std::future::Future;

use crate::error::{AppError, AppResult};
use crate::external::CreditApi;
use crate::models::*;
use crate::store::{Resource, ResourceState};
use crate::utils::safe_redirect_target;

pub trait AuthSource {
    fn login_url(&self) -> impl Future<Output = AppResult<String>>;
    fn exchange_callback(
        &self,
        exchange: &CallbackExchange,
    ) -> impl Future<Output = AppResult<Vec<String>>>;
    fn user_info(&self) -> impl Future<Output = AppResult<User>>;
}

impl AuthSource for CreditApi {
    async fn login_url(&self) -> AppResult<String> {
        CreditApi::login_url(self).await
    }

    async fn exchange_callback(&self, exchange: &CallbackExchange) -> AppResult<Vec<String>> {
        CreditApi::exchange_callback(self, exchange).await
    }

    async fn user_info(&self) -> AppResult<User> {
        CreditApi::user_info(self).await
    }
}

/// 回调处理结果：需要转发给浏览器的 Cookie 与跳转地址
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackOutcome {
    pub set_cookies: Vec<String>,
    pub redirect_to: String,
}

pub struct AuthService<S> {
    source: S,
}

impl<S: AuthSource> AuthService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub async fn login_url(&self) -> AppResult<String> {
        let url = self.source.login_url().await?;
        if !(url.starts_with("https://") || url.starts_with("http://") || url.starts_with('/')) {
            return Err(AppError::InvalidResponse(format!("unexpected login url: {url}")));
        }
        Ok(url)
    }

    /// 用 code/state 换取会话，成功后跳回登录前的页面
    pub async fn handle_callback(
        &self,
        req: CallbackRequest,
        stored_redirect: Option<&str>,
    ) -> AppResult<CallbackOutcome> {
        let exchange = req
            .into_exchange()
            .ok_or_else(|| AppError::ValidationError("Missing code or state parameter".to_string()))?;

        let set_cookies = self.source.exchange_callback(&exchange).await?;
        log::info!("oauth callback exchanged, {} cookie(s) issued", set_cookies.len());

        Ok(CallbackOutcome {
            set_cookies,
            redirect_to: safe_redirect_target(stored_redirect),
        })
    }
}

/// 当前用户
pub struct UserContext<S> {
    source: S,
    user: Resource<User>,
}

impl<S: AuthSource> UserContext<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            user: Resource::new(),
        }
    }

    pub async fn load(&self) -> AppResult<User> {
        self.user.load(self.source.user_info()).await
    }

    /// 未登录时返回 `None`，其他错误照常返回
    pub async fn signed_in_user(&self) -> AppResult<Option<User>> {
        match self.load().await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::AuthError(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn snapshot(&self) -> ResourceState<User> {
        self.user.snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockAuth {
        exchanges: Mutex<Vec<CallbackExchange>>,
        signed_in: bool,
    }

    impl AuthSource for MockAuth {
        async fn login_url(&self) -> AppResult<String> {
            Ok("https://connect.linux.do/oauth2/authorize?client_id=x".into())
        }

        async fn exchange_callback(&self, exchange: &CallbackExchange) -> AppResult<Vec<String>> {
            self.exchanges.lock().unwrap().push(exchange.clone());
            Ok(vec!["linux_do_credit_session_id=s1; Path=/; HttpOnly".into()])
        }

        async fn user_info(&self) -> AppResult<User> {
            if !self.signed_in {
                return Err(AppError::AuthError("未登录".into()));
            }
            Ok(User {
                id: 1,
                username: "alice".into(),
                nickname: None,
                avatar_url: None,
                trust_level: 2,
                pay_score: 120,
                is_admin: false,
            })
        }
    }

    #[tokio::test]
    async fn test_callback_requires_code_and_state() {
        let service = AuthService::new(MockAuth::default());
        let err = service
            .handle_callback(
                CallbackRequest {
                    code: Some("c".into()),
                    state: None,
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == "Missing code or state parameter"));
        assert!(service.source.exchanges.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_callback_redirects_to_safe_target() {
        let service = AuthService::new(MockAuth::default());
        let req = || CallbackRequest {
            code: Some("c".into()),
            state: Some("s".into()),
        };

        let outcome = service.handle_callback(req(), Some("/balance")).await.unwrap();
        assert_eq!(outcome.redirect_to, "/balance");
        assert_eq!(outcome.set_cookies.len(), 1);

        let outcome = service
            .handle_callback(req(), Some("https://evil.example"))
            .await
            .unwrap();
        assert_eq!(outcome.redirect_to, "/");

        let outcome = service.handle_callback(req(), None).await.unwrap();
        assert_eq!(outcome.redirect_to, "/");
    }

    #[tokio::test]
    async fn test_user_context_signed_out() {
        let ctx = UserContext::new(MockAuth::default());
        assert_eq!(ctx.signed_in_user().await.unwrap(), None);

        let ctx = UserContext::new(MockAuth {
            signed_in: true,
            ..Default::default()
        });
        assert_eq!(ctx.signed_in_user().await.unwrap().unwrap().username, "alice");
        assert!(ctx.snapshot().await.data.is_some());
    }
}
