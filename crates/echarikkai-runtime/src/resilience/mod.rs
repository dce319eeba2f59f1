//! Resilience for the network collaborators.
//!
//! Weather and the reasoning backend each get their own circuit so one
//! failing service never short-circuits the other. Retry with backoff lives
//! with the weather client.

mod circuit_breaker;

pub use circuit_breaker::{Backend, CircuitBreaker, CircuitBreakerConfig, CircuitState};
