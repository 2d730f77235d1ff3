use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::{ErrorInfo, ErrorSurface};
use crate::handlers;
use crate::models::*;
use crate::state::NotificationPrefs;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        // 会话由上游签发的 Cookie 承载，本服务原样转发
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    "linux_do_credit_session_id",
                ))),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::callback,
        handlers::auth::me,
        handlers::auth::get_notification_settings,
        handlers::auth::update_notification_settings,
        handlers::red_envelope::get_claim_view,
        handlers::red_envelope::open_red_envelope,
        handlers::red_envelope::list_red_envelopes,
        handlers::leaderboard::get_leaderboard,
        handlers::leaderboard::get_metadata,
        handlers::leaderboard::get_user_rank,
        handlers::balance::get_balance,
        handlers::balance::get_transactions,
        handlers::balance::get_disputes,
        handlers::balance::refresh_disputes,
        handlers::merchant::create_payment_link,
        handlers::admin::list_pay_configs,
        handlers::admin::match_pay_config,
        handlers::admin::update_pay_config,
        handlers::admin::delete_pay_config,
        handlers::admin::list_system_configs,
        handlers::admin::update_system_config,
        handlers::admin::delete_system_config,
        handlers::cropper::crop,
    ),
    components(
        schemas(
            ErrorInfo,
            ErrorSurface,
            NotificationPrefs,
            User,
            CallbackRequest,
            RedEnvelopeType,
            RedEnvelopeStatus,
            RedEnvelope,
            RedEnvelopeClaim,
            UserClaimed,
            RedEnvelopeDetail,
            ClaimState,
            ClaimRowView,
            ClaimView,
            PeriodType,
            MetricType,
            LeaderboardEntry,
            LeaderboardPeriod,
            LeaderboardList,
            UserRankInfo,
            UserRank,
            MetricInfo,
            LeaderboardDefaults,
            LeaderboardMetadata,
            TrendDirection,
            RankedEntryView,
            LeaderboardView,
            Balance,
            OrderType,
            OrderStatus,
            Transaction,
            DisputeStatus,
            DisputeWithOrder,
            DisputeList,
            CreatePaymentLinkRequest,
            PaymentLink,
            UserPayConfig,
            SystemConfig,
            UpdateUserPayConfigRequest,
            UpdateSystemConfigRequest,
            CoverType,
            CropArea,
            CropRequest,
            CropResponse,
            ClaimViewResponse,
            LeaderboardViewResponse,
            BalanceResponse,
            DisputeListResponse,
            PaymentLinkResponse,
            CropApiResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login redirect and account API"),
        (name = "redenvelope", description = "Red envelope claim API"),
        (name = "leaderboard", description = "Leaderboard view API"),
        (name = "balance", description = "Balance, transactions and disputes API"),
        (name = "merchant", description = "Merchant payment link API"),
        (name = "admin", description = "Admin configuration API"),
        (name = "cropper", description = "Cover image cropping API"),
    ),
    info(
        title = "LINUX DO Credit Frontend API",
        version = "0.1.0",
        description = "View-model API behind the LINUX DO Credit web frontend"
    ),
    servers(
        (url = "/", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
