use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::postgres::PostgresPool;
use crate::template::{TemplateBackend, TemplateService};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub templates: Arc<TemplateService>,
    /// Present when templates are stored in PostgreSQL
    pub postgres: Option<Arc<PostgresPool>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        settings: Settings,
        backend: Arc<dyn TemplateBackend>,
        postgres: Option<Arc<PostgresPool>>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            templates: Arc::new(TemplateService::new(backend)),
            postgres,
            started_at: Instant::now(),
        }
    }
}
