//! Circuit breaker guarding PostgreSQL template lookups.
//!
//! When the database keeps failing, lookups are rejected immediately so
//! message resolution falls back to the built-in defaults without waiting
//! on connection timeouts.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU8, Ordering};

use serde::Serialize;

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CircuitState {
    /// Requests flow through
    Closed = 0,
    /// Requests are rejected until the reset timeout elapses
    Open = 1,
    /// One probe request is let through
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening
    pub failure_threshold: u32,
    /// Time spent open before probing again (ms)
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_ms: 30_000,
        }
    }
}

pub struct CircuitBreaker {
    state: AtomicU8,
    failures: AtomicU32,
    opened_at: AtomicI64,
    /// Held by the single request admitted while half-open
    probe_in_flight: AtomicBool,
    config: CircuitBreakerConfig,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: AtomicU8::new(CircuitState::Closed as u8),
            failures: AtomicU32::new(0),
            opened_at: AtomicI64::new(0),
            probe_in_flight: AtomicBool::new(false),
            config,
        }
    }

    pub fn state(&self) -> CircuitState {
        let state = CircuitState::from(self.state.load(Ordering::Acquire));
        if state != CircuitState::Open {
            return state;
        }

        let elapsed = now_ms() - self.opened_at.load(Ordering::Acquire);
        if elapsed < self.config.reset_timeout_ms as i64 {
            return CircuitState::Open;
        }

        // Only the caller winning the exchange logs the transition
        if self
            .state
            .compare_exchange(
                CircuitState::Open as u8,
                CircuitState::HalfOpen as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            tracing::info!("Template store circuit half-open, probing database");
        }
        CircuitState::HalfOpen
    }

    /// Whether a request may go to the database.
    ///
    /// While half-open only the caller taking the probe slot is admitted;
    /// everyone else is rejected until that probe is recorded.
    pub fn allow_request(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => self
                .probe_in_flight
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok(),
        }
    }

    pub fn record_success(&self) {
        self.failures.store(0, Ordering::Release);
        self.probe_in_flight.store(false, Ordering::Release);
        let previous = self
            .state
            .swap(CircuitState::Closed as u8, Ordering::AcqRel);
        if CircuitState::from(previous) == CircuitState::HalfOpen {
            tracing::info!("Template store circuit closed");
        }
    }

    pub fn record_failure(&self) {
        let failures = self.failures.fetch_add(1, Ordering::AcqRel) + 1;
        let state = CircuitState::from(self.state.load(Ordering::Acquire));

        let should_open = match state {
            CircuitState::Closed => failures >= self.config.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };

        if should_open {
            self.opened_at.store(now_ms(), Ordering::Release);
            self.state.store(CircuitState::Open as u8, Ordering::Release);
            self.probe_in_flight.store(false, Ordering::Release);
            tracing::warn!(failures, "Template store circuit opened");
        }
    }

    /// Free the half-open probe slot without recording an outcome.
    ///
    /// Used when the admitted request is cancelled before finishing.
    pub fn release_probe(&self) {
        self.probe_in_flight.store(false, Ordering::Release);
    }

    pub fn failure_count(&self) -> u32 {
        self.failures.load(Ordering::Acquire)
    }
}
