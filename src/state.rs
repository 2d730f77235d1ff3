use std::collections::HashMap;

use actix_web::HttpRequest;
use actix_web::http::header;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::config::Config;
use crate::error::AppResult;
use crate::external::CreditApi;

/// 通知偏好
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationPrefs {
    pub show_bell: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self { show_bell: true }
    }
}

/// 按会话 Cookie 的值分别保存通知偏好
#[derive(Debug, Default)]
pub struct NotificationSettings {
    prefs: RwLock<HashMap<String, NotificationPrefs>>,
}

impl NotificationSettings {
    /// 未登录或未设置过时返回默认值
    pub async fn get(&self, session: Option<&str>) -> NotificationPrefs {
        let Some(session) = session else {
            return NotificationPrefs::default();
        };
        self.prefs
            .read()
            .await
            .get(session)
            .copied()
            .unwrap_or_default()
    }

    pub async fn set(&self, session: &str, prefs: NotificationPrefs) -> NotificationPrefs {
        self.prefs.write().await.insert(session.to_string(), prefs);
        prefs
    }
}

/// 进程内共享状态，通过 `web::Data` 注入
pub struct AppState {
    pub config: Config,
    api: CreditApi,
    pub notifications: NotificationSettings,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let api = CreditApi::new(&config.upstream)?;
        Ok(Self {
            config,
            api,
            notifications: NotificationSettings::default(),
        })
    }

    /// 携带调用方 Cookie 的上游客户端
    pub fn api_for(&self, req: &HttpRequest) -> CreditApi {
        let cookie = req
            .headers()
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.api.with_cookie(cookie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notification_settings() {
        let settings = NotificationSettings::default();
        assert!(settings.get(Some("a")).await.show_bell);
        settings.set("a", NotificationPrefs { show_bell: false }).await;
        assert!(!settings.get(Some("a")).await.show_bell);
        assert!(settings.get(Some("b")).await.show_bell);
        assert!(settings.get(None).await.show_bell);
    }
}
