//! API layer - HTTP endpoint handlers.

mod health;
mod metrics;
mod routes;
mod template;

pub use health::health;
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
pub use template::{list_templates, list_variables, resolve_message, save_template};
