//! Template backend factory

use std::sync::Arc;

use crate::config::StorageConfig;
use crate::postgres::PostgresPool;

use super::backend::{StoreError, TemplateBackend};
use super::memory_backend::MemoryTemplateBackend;
use super::postgres_backend::PostgresTemplateBackend;

/// Create a template backend based on configuration.
///
/// - `"postgres"`: a `PostgresTemplateBackend` if a pool is provided,
///   creating the schema first when `auto_migrate` is set
/// - `"memory"` (default): a `MemoryTemplateBackend`
///
/// A missing pool for the postgres backend falls back to memory.
pub async fn create_template_backend(
    config: &StorageConfig,
    postgres_pool: Option<Arc<PostgresPool>>,
) -> Result<Arc<dyn TemplateBackend>, StoreError> {
    match config.backend.as_str() {
        "postgres" => {
            if let Some(pool) = postgres_pool {
                tracing::info!(backend = "postgres", "Creating PostgreSQL template backend");
                let backend = PostgresTemplateBackend::new(pool);
                if config.auto_migrate {
                    backend.ensure_schema().await?;
                }
                Ok(Arc::new(backend))
            } else {
                tracing::warn!(
                    "PostgreSQL backend requested but no pool provided, falling back to memory"
                );
                Ok(Arc::new(MemoryTemplateBackend::new()))
            }
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory template backend");
            Ok(Arc::new(MemoryTemplateBackend::new()))
        }
    }
}
