//! PostgreSQL connection pool with circuit breaker integration.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::config::DatabaseConfig;

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};

/// Errors that can occur with the PostgreSQL pool.
#[derive(Debug, Error)]
pub enum PostgresPoolError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Circuit breaker is open")]
    CircuitOpen,
}

/// PostgreSQL connection pool with circuit breaker integration.
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
    circuit_breaker: Arc<CircuitBreaker>,
    database_url: String,
}

impl PostgresPool {
    /// Connect using the database configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, PostgresPoolError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await?;

        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: config.failure_threshold,
            reset_timeout_ms: config.reset_timeout_seconds * 1000,
        });

        let pool = Self::from_pool(pool, breaker, config.url.clone());
        tracing::info!(
            url = %pool.database_url_masked(),
            pool_size = config.pool_size,
            "PostgreSQL connection pool created"
        );

        Ok(pool)
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool, circuit_breaker: CircuitBreaker, database_url: String) -> Self {
        Self {
            pool,
            circuit_breaker: Arc::new(circuit_breaker),
            database_url,
        }
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.circuit_breaker
    }

    /// Execute an operation with circuit breaker protection.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, PostgresPoolError>
    where
        F: FnOnce(PgPool) -> Fut,
        Fut: std::future::Future<Output = Result<T, sqlx::Error>>,
    {
        if !self.circuit_breaker.allow_request() {
            return Err(PostgresPoolError::CircuitOpen);
        }

        let mut outcome = OutcomeGuard {
            breaker: &self.circuit_breaker,
            recorded: false,
        };

        let result = operation(self.pool.clone()).await;
        outcome.recorded = true;

        match result {
            Ok(result) => {
                self.circuit_breaker.record_success();
                Ok(result)
            }
            Err(e) => {
                self.circuit_breaker.record_failure();
                Err(PostgresPoolError::Sqlx(e))
            }
        }
    }

    /// Database URL with the password masked, for logging.
    pub fn database_url_masked(&self) -> String {
        mask_url(&self.database_url)
    }

    /// Close the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL connection pool closed");
    }
}

fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            // "postgres://host" has its only colon before "//"
            if url[colon_pos..].starts_with("://") {
                return url.to_string();
            }
            return format!("{}***{}", &url[..colon_pos + 1], &url[at_pos..]);
        }
    }
    url.to_string()
}

/// Frees a half-open probe slot if the operation is dropped mid-flight.
struct OutcomeGuard<'a> {
    breaker: &'a CircuitBreaker,
    recorded: bool,
}

impl Drop for OutcomeGuard<'_> {
    fn drop(&mut self) {
        if !self.recorded {
            self.breaker.release_probe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_url_hides_password() {
        let masked = mask_url("postgres://portaria:s3cret@db:5432/condo");
        assert_eq!(masked, "postgres://portaria:***@db:5432/condo");
    }

    #[test]
    fn test_mask_url_without_password() {
        assert_eq!(mask_url("postgres://db:5432/condo"), "postgres://db:5432/condo");
        assert_eq!(
            mask_url("postgres://portaria@db/condo"),
            "postgres://portaria@db/condo"
        );
    }
}
