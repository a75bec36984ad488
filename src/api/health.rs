//! Health check endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub storage: StorageHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct StorageHealthResponse {
    pub backend: String,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health
///
/// Reports `degraded` rather than failing when the store is down, since
/// messages are still rendered from the defaults.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let backend = state.templates.backend();
    let ping = backend.ping().await;

    let (status, error) = match ping {
        Ok(()) => ("ok", None),
        Err(e) => {
            tracing::warn!(error = %e, "Template store health check failed");
            ("degraded", Some(e.to_string()))
        }
    };

    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        storage: StorageHealthResponse {
            backend: backend.backend_type().to_string(),
            connected: error.is_none(),
            error,
        },
    };

    (StatusCode::OK, Json(body))
}
