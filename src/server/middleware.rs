use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::template::OperatorRole;

use super::AppState;

pub const API_KEY_HEADER: &str = "X-API-Key";
pub const OPERATOR_ROLE_HEADER: &str = "X-Operator-Role";

/// API Key authentication middleware.
/// Validates X-API-Key header against configured api.key
pub async fn api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // No key configured: development mode
    let Some(expected_key) = &state.settings.api.key else {
        return Ok(next.run(req).await);
    };

    let api_key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match api_key {
        Some(key) if key == expected_key => Ok(next.run(req).await),
        Some(_) => Err(AppError::Auth("Invalid API key".to_string())),
        None => Err(AppError::Auth("Missing API key header".to_string())),
    }
}

/// Role of the operator behind a request, from `X-Operator-Role`.
///
/// A missing header means the least privileged staff role (doorman).
#[derive(Debug, Clone, Copy)]
pub struct CallerRole(pub OperatorRole);

impl<S> FromRequestParts<S> for CallerRole
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(OPERATOR_ROLE_HEADER) else {
            return Ok(CallerRole(OperatorRole::default()));
        };

        let raw = value
            .to_str()
            .map_err(|_| AppError::Validation("Operator role header is not ASCII".to_string()))?;

        Ok(CallerRole(raw.parse::<OperatorRole>()?))
    }
}
