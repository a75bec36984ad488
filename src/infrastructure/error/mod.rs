use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::template::{StoreError, TemplateError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage unavailable: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TemplateError> for AppError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::InvalidCategory(_) | TemplateError::InvalidRole(_) => {
                AppError::Validation(err.to_string())
            }
            TemplateError::MandatoryLocked(_) => AppError::Forbidden(err.to_string()),
            TemplateError::Storage(e @ StoreError::Corrupt { .. }) => {
                AppError::Internal(e.to_string())
            }
            TemplateError::Storage(e) => AppError::Storage(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Auth(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "TEMPLATE_LOCKED"),
            AppError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let log_message = self.to_string();

        // Server-side details stay out of production responses
        let client_message = match &self {
            AppError::Storage(_) if is_production() => {
                "Service temporarily unavailable".to_string()
            }
            AppError::Internal(_) if is_production() => "Internal server error".to_string(),
            _ => log_message.clone(),
        };

        if status.is_server_error() {
            tracing::error!(code = %code, status = %status.as_u16(), message = %log_message, "API error");
        } else {
            tracing::warn!(code = %code, status = %status.as_u16(), message = %log_message, "API error");
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_errors_map_to_status() {
        let cases = [
            (
                AppError::from(TemplateError::InvalidCategory("X".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(TemplateError::MandatoryLocked("c_ARRIVAL".into())),
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::from(TemplateError::Storage(StoreError::Unavailable("down".into()))),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::from(TemplateError::Storage(StoreError::Corrupt {
                    id: "c_ARRIVAL".into(),
                    reason: "unknown category".into(),
                })),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_corrupt_record_is_internal_error() {
        let err = AppError::from(TemplateError::Storage(StoreError::Corrupt {
            id: "c_PICKUP".into(),
            reason: "unknown category BIRTHDAY".into(),
        }));
        assert!(matches!(err, AppError::Internal(ref m) if m.contains("c_PICKUP")));
    }
}
