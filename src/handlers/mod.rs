pub mod admin;
pub mod auth;
pub mod balance;
pub mod cropper;
pub mod leaderboard;
pub mod merchant;
pub mod red_envelope;

pub use admin::admin_config;
pub use auth::{account_config, auth_config};
pub use balance::balance_config;
pub use cropper::cropper_config;
pub use leaderboard::leaderboard_config;
pub use merchant::merchant_config;
pub use red_envelope::red_envelope_config;

#[cfg(test)]
pub(crate) mod test_support {
    use actix_web::web;

    use crate::config::Config;
    use crate::state::AppState;

    /// 指向不可达端口的上游，用于只验证本地校验的接口测试
    pub fn test_state() -> web::Data<AppState> {
        let config: Config = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 3000

            [upstream]
            base_url = "http://127.0.0.1:9"
            timeout_secs = 1
            "#,
        )
        .unwrap();
        web::Data::new(AppState::new(config).unwrap())
    }
}
