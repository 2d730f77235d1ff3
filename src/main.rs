use actix_web::{App, HttpServer, middleware::Logger, web};
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use chrono::Local;  // timestamp in log lines

use ldc_frontend::{
    config::Config,
    handlers,
    middlewares::{SessionMiddleware, create_cors},
    state::AppState,
    swagger::swagger_config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 上游客户端与进程内状态
    let state = web::Data::new(
        AppState::new(config.clone()).expect("Failed to create upstream client"),
    );

    log::info!(
        "Starting HTTP server at {}:{}, upstream {}",
        config.server.host,
        config.server.port,
        config.upstream.base_url
    );

    let allowed_origins = config.server.allowed_origins.clone();
    let session = config.session.clone();
    let upload = config.upload.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(SessionMiddleware::new(session.clone()))
            .wrap(create_cors(&allowed_origins))
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(swagger_config)
            .configure(handlers::auth_config)
            .service(
                web::scope("/api/v1/view")
                    .configure(handlers::account_config)
                    .configure(handlers::red_envelope_config)
                    .configure(handlers::leaderboard_config)
                    .configure(handlers::balance_config)
                    .configure(handlers::merchant_config)
                    .configure(handlers::admin_config)
                    .configure(handlers::cropper_config(&upload)),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
