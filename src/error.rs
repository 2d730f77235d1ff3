use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::ApiResponse;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 上游业务拒绝（4xx），例如红包已领完
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    /// 上游返回的数据未通过结构校验
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// 请求已被更新的请求取代，结果被丢弃
    #[error("Request cancelled")]
    Cancelled,

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl From<image::ImageError> for AppError {
    fn from(e: image::ImageError) -> Self {
        AppError::ImageError(e.to_string())
    }
}

/// 错误在界面上的呈现方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSurface {
    /// 轻提示，操作可重试
    Toast,
    /// 整页错误，只能离开页面
    Page,
    /// 不展示（取消）
    Silent,
}

/// 可克隆的错误快照，供 store 状态保存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    pub surface: ErrorSurface,
}

impl AppError {
    /// 按 HTTP 状态码映射上游错误
    pub fn from_upstream(status: u16, message: String) -> Self {
        match status {
            401 => AppError::AuthError(message),
            403 => AppError::Forbidden(message),
            404 => AppError::NotFound(message),
            400..=499 => AppError::Rejected(message),
            _ => AppError::ExternalApiError(message),
        }
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }

    pub fn surface(&self) -> ErrorSurface {
        match self {
            AppError::Cancelled => ErrorSurface::Silent,
            AppError::NotFound(_)
            | AppError::Forbidden(_)
            | AppError::AuthError(_)
            | AppError::InvalidResponse(_) => ErrorSurface::Page,
            _ => ErrorSurface::Toast,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Rejected(_) => "REJECTED",
            AppError::ExternalApiError(_) | AppError::ReqwestError(_) => "EXTERNAL_API_ERROR",
            AppError::InvalidResponse(_) | AppError::SerdeJsonError(_) => "INVALID_RESPONSE",
            AppError::Cancelled => "CANCELLED",
            AppError::ImageError(_) => "IMAGE_ERROR",
            AppError::ConfigError(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// 面向用户的提示文本（优先使用服务端返回的消息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::ValidationError(m)
            | AppError::AuthError(m)
            | AppError::NotFound(m)
            | AppError::Forbidden(m)
            | AppError::Rejected(m)
            | AppError::ExternalApiError(m)
            | AppError::ImageError(m) => m.clone(),
            AppError::ReqwestError(_) => "网络请求失败".to_string(),
            AppError::InvalidResponse(_) | AppError::SerdeJsonError(_) => {
                "服务端返回数据异常".to_string()
            }
            AppError::Cancelled => "请求已取消".to_string(),
            AppError::ConfigError(_) | AppError::InternalError(_) => "内部错误".to_string(),
        }
    }

    pub fn info(&self) -> ErrorInfo {
        ErrorInfo {
            code: self.code().to_string(),
            message: self.user_message(),
            surface: self.surface(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::ImageError(_) | AppError::Rejected(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ExternalApiError(_)
            | AppError::ReqwestError(_)
            | AppError::InvalidResponse(_)
            | AppError::SerdeJsonError(_) => StatusCode::BAD_GATEWAY,
            AppError::Cancelled => StatusCode::CONFLICT,
            AppError::ConfigError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        match self.status() {
            StatusCode::BAD_GATEWAY => log::error!("Upstream error: {self}"),
            s if s.is_server_error() => log::error!("Internal error: {self}"),
            _ => log::warn!("Request failed: {self}"),
        }

        HttpResponse::build(self.status()).json(ApiResponse::<()>::failure(self.info()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_mapping() {
        let e = AppError::from_upstream(404, "红包不存在".into());
        assert!(matches!(e, AppError::NotFound(_)));
        assert_eq!(e.surface(), ErrorSurface::Page);

        let e = AppError::from_upstream(409, "红包已领完".into());
        assert!(matches!(e, AppError::Rejected(_)));
        assert_eq!(e.surface(), ErrorSurface::Toast);
        assert_eq!(e.user_message(), "红包已领完");

        let e = AppError::from_upstream(503, "busy".into());
        assert!(matches!(e, AppError::ExternalApiError(_)));
    }

    #[test]
    fn test_cancel_is_silent() {
        let e = AppError::Cancelled;
        assert!(e.is_cancel());
        assert_eq!(e.info().surface, ErrorSurface::Silent);
    }

    #[test]
    fn test_bad_gateway_status() {
        let e = AppError::ExternalApiError("down".into());
        assert_eq!(e.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(e.error_response().status(), StatusCode::BAD_GATEWAY);
    }
}
