//! Circuit breaker for external calls.
//!
//! When a backend fails repeatedly the circuit opens and callers go
//! straight to their fallback until the recovery timeout passes.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// An external service guarded by its own circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Reasoning,
    Weather,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Reasoning => write!(f, "reasoning"),
            Backend::Weather => write!(f, "weather"),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening
    pub failure_threshold: u32,

    /// Time an open circuit waits before a trial call
    #[serde(with = "crate::config::duration_str")]
    pub recovery_timeout: Duration,

    /// Trial successes needed to close again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// State of a circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    /// Normal operation
    Closed { failures: u32 },

    /// Calls bypass the backend
    Open { opened_at: Instant },

    /// Trial calls allowed
    HalfOpen { successes: u32 },
}

/// Per-backend circuit breaker.
pub struct CircuitBreaker {
    states: RwLock<HashMap<Backend, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Whether calls to `backend` should go straight to the fallback.
    ///
    /// An open circuit past its recovery timeout moves to half-open and
    /// lets the call through.
    pub fn is_open(&self, backend: Backend) -> bool {
        let states = self.states.read();
        match states.get(&backend) {
            Some(CircuitState::Open { opened_at }) => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    drop(states);
                    self.transition_to_half_open(backend);
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    pub fn record_success(&self, backend: Backend) {
        let mut states = self.states.write();
        match states.get(&backend).cloned() {
            Some(CircuitState::HalfOpen { successes }) => {
                if successes + 1 >= self.config.success_threshold {
                    states.insert(backend, CircuitState::Closed { failures: 0 });
                    tracing::info!(backend = %backend, "Circuit closed after successful recovery");
                } else {
                    states.insert(
                        backend,
                        CircuitState::HalfOpen {
                            successes: successes + 1,
                        },
                    );
                }
            }
            Some(CircuitState::Closed { .. }) => {
                states.insert(backend, CircuitState::Closed { failures: 0 });
            }
            _ => {}
        }
    }

    pub fn record_failure(&self, backend: Backend) {
        let mut states = self.states.write();
        let failures = match states.get(&backend).cloned() {
            Some(CircuitState::Closed { failures }) => failures + 1,
            None => 1,
            Some(CircuitState::HalfOpen { .. }) => {
                states.insert(
                    backend,
                    CircuitState::Open {
                        opened_at: Instant::now(),
                    },
                );
                tracing::warn!(backend = %backend, "Circuit reopened after failed recovery attempt");
                return;
            }
            Some(CircuitState::Open { .. }) => return,
        };

        if failures >= self.config.failure_threshold {
            states.insert(
                backend,
                CircuitState::Open {
                    opened_at: Instant::now(),
                },
            );
            tracing::warn!(
                backend = %backend,
                failures,
                "Circuit opened after repeated failures"
            );
        } else {
            states.insert(backend, CircuitState::Closed { failures });
        }
    }

    fn transition_to_half_open(&self, backend: Backend) {
        let mut states = self.states.write();
        if matches!(states.get(&backend), Some(CircuitState::Open { .. })) {
            states.insert(backend, CircuitState::HalfOpen { successes: 0 });
            tracing::info!(backend = %backend, "Circuit half-open, allowing trial call");
        }
    }

    pub fn state(&self, backend: Backend) -> CircuitState {
        self.states
            .read()
            .get(&backend)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }

    /// Close every circuit.
    pub fn reset(&self) {
        self.states.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("states", &*self.states.read())
            .field("config", &self.config)
            .finish()
    }
}
