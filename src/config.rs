use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub claim: ClaimConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 允许跨域的来源，留空表示不限制
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// 远端 Credit API 地址，例如 https://credit.linux.do
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_prefix: String,
    pub login_path: String,
    pub home_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_prefix: "linux_do_credit_session_id".to_string(),
            login_path: "/login".to_string(),
            home_path: "/home".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimConfig {
    /// 红包开启动画时长（毫秒），结束前不展示金额
    pub reveal_delay_ms: u64,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            reveal_delay_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 2 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    pub page_size: u32,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self { page_size: 20 }
    }
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    "ldc-frontend/0.1".to_string()
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("解析配置文件失败: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 上游地址在无配置文件时必须提供
                let base_url = env::var("UPSTREAM_BASE_URL")
                    .map_err(|_| "缺少 UPSTREAM_BASE_URL 环境变量，且未找到配置文件 config.toml")?;

                Config {
                    server: ServerConfig {
                        host: "0.0.0.0".to_string(),
                        port: 3000,
                        allowed_origins: Vec::new(),
                    },
                    upstream: UpstreamConfig {
                        base_url,
                        timeout_secs: default_timeout_secs(),
                        user_agent: default_user_agent(),
                    },
                    session: SessionConfig::default(),
                    claim: ClaimConfig::default(),
                    upload: UploadConfig::default(),
                    leaderboard: LeaderboardConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("无法读取配置文件 {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 环境变量覆盖（即便文件存在时也覆盖）
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("ALLOWED_ORIGINS") {
            self.server.allowed_origins = v
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("UPSTREAM_BASE_URL") {
            self.upstream.base_url = v;
        }
        if let Ok(v) = env::var("UPSTREAM_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            self.upstream.timeout_secs = n;
        }
        if let Ok(v) = env::var("SESSION_COOKIE_PREFIX") {
            self.session.cookie_prefix = v;
        }
        if let Ok(v) = env::var("CLAIM_REVEAL_DELAY_MS")
            && let Ok(n) = v.parse()
        {
            self.claim.reveal_delay_ms = n;
        }
        if let Ok(v) = env::var("UPLOAD_MAX_BYTES")
            && let Ok(n) = v.parse()
        {
            self.upload.max_bytes = n;
        }
        if let Ok(v) = env::var("LEADERBOARD_PAGE_SIZE")
            && let Ok(n) = v.parse()
        {
            self.leaderboard.page_size = n;
        }
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.upstream.base_url.starts_with("http://")
            && !self.upstream.base_url.starts_with("https://")
        {
            return Err(format!("upstream.base_url 必须是 http(s) 地址: {}", self.upstream.base_url).into());
        }
        if self.leaderboard.page_size == 0 || self.leaderboard.page_size > 100 {
            return Err("leaderboard.page_size 必须在 1-100 之间".into());
        }
        if self.session.cookie_prefix.is_empty() {
            return Err("session.cookie_prefix 不能为空".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_toml_uses_defaults() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 3000

            [upstream]
            base_url = "https://credit.linux.do"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.upstream.timeout_secs, 15);
        assert_eq!(config.session.cookie_prefix, "linux_do_credit_session_id");
        assert_eq!(config.claim.reveal_delay_ms, 1500);
        assert_eq!(config.upload.max_bytes, 2 * 1024 * 1024);
        assert_eq!(config.leaderboard.page_size, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 3000

            [upstream]
            base_url = "credit.linux.do"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert!(config.validate().is_err());
    }
}
