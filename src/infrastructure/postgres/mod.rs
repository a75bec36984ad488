//! PostgreSQL persistence module.
//!
//! Provides connection pooling and a circuit breaker so an unavailable
//! database degrades template lookups instead of stalling them.

mod circuit_breaker;
pub mod pool;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use pool::{PostgresPool, PostgresPoolError};
