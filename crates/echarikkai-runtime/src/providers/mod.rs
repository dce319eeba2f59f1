//! Reasoning backend providers.
//!
//! A provider turns a fully built prompt into free-text reply. The
//! [`ReasoningBackend`](crate::reasoning::ReasoningBackend) wraps one with
//! caching, the circuit breaker and the fixed fallback reply.
//!
//! ## Security
//!
//! Optional bearer tokens are held in an [`ApiCredential`] and are never
//! printed by `Debug` or `Display`.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

mod factory;
pub mod secrets;

#[cfg(feature = "ollama")]
mod ollama;

pub use factory::{ProviderFactory, ProviderRegistry};
pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaProvider, OllamaProviderFactory, OLLAMA_API_KEY_ENV};

/// Errors from reasoning providers.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Provider returned an empty reply")]
    EmptyResponse,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Settings for one generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Model to use
    pub model: String,

    /// Request timeout
    pub timeout: Duration,

    /// Sampling temperature; the model default when unset
    pub temperature: Option<f32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "mistral".to_string(),
            timeout: Duration::from_secs(60),
            temperature: None,
        }
    }
}

impl From<&crate::config::OllamaConfig> for GenerationConfig {
    fn from(config: &crate::config::OllamaConfig) -> Self {
        Self {
            model: config.model.clone(),
            timeout: config.timeout,
            temperature: config.temperature,
        }
    }
}

/// A text-generation backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a reply for a single prompt.
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, ProviderError>;

    /// Check if the backend is reachable.
    async fn health_check(&self) -> bool;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OllamaConfig;

    #[test]
    fn test_generation_config_from_ollama_config() {
        let ollama = OllamaConfig {
            model: "llama3".to_string(),
            timeout: Duration::from_secs(5),
            temperature: Some(0.3),
            ..Default::default()
        };
        let config = GenerationConfig::from(&ollama);
        assert_eq!(config.model, "llama3");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.temperature, Some(0.3));

        assert_eq!(GenerationConfig::from(&OllamaConfig::default()).temperature, None);
    }

    #[test]
    fn test_default_generation_config() {
        let config = GenerationConfig::default();
        assert_eq!(config.model, "mistral");
        assert_eq!(config.timeout, Duration::from_secs(60));
    }
}
