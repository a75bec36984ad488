use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::server::middleware::api_key_auth;
use crate::server::AppState;

use super::health::health;
use super::metrics::prometheus_metrics;
use super::template::{list_templates, list_variables, resolve_message, save_template};

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1",
            Router::new()
                // Template configuration
                .route("/condos/{condo_id}/templates", get(list_templates))
                .route("/condos/{condo_id}/templates/{category}", put(save_template))
                // Message resolution
                .route("/condos/{condo_id}/messages/{category}", post(resolve_message))
                // Quick-insert vocabulary
                .route("/categories/{category}/variables", get(list_variables))
                .route_layer(middleware::from_fn_with_state(state, api_key_auth)),
        )
}
