//! Reasoning backend.
//!
//! Wraps an [`LlmProvider`] so that asking for a risk assessment never
//! fails once the prompt is non-empty: provider errors, timeouts, blank
//! replies and an open circuit all yield [`FALLBACK_REPLY`].

use std::sync::Arc;

use echarikkai_core::CoreError;

use crate::cache::{PromptKey, ReplyCache};
use crate::providers::{GenerationConfig, LlmProvider};
use crate::resilience::{Backend, CircuitBreaker};

/// Reply substituted whenever the backend cannot answer.
pub const FALLBACK_REPLY: &str = "HIGH_RISKS:
* None

MEDIUM_RISKS:
* None

ASSUMPTIONS:
* LLM unavailable

MITIGATION:
* Manual review required

RISK_SCORE: 5
CONFIDENCE_LEVEL: low";

/// Why a reply came from where it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Provider,
    Cache,
    Fallback,
}

/// A reply plus its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningOutcome {
    pub text: String,
    pub source: ReplySource,
}

impl ReasoningOutcome {
    fn fallback() -> Self {
        Self {
            text: FALLBACK_REPLY.to_string(),
            source: ReplySource::Fallback,
        }
    }

    pub fn used_fallback(&self) -> bool {
        self.source == ReplySource::Fallback
    }
}

/// Provider plus cache, circuit breaker and fallback.
pub struct ReasoningBackend {
    provider: Arc<dyn LlmProvider>,
    config: GenerationConfig,
    circuit_breaker: Arc<CircuitBreaker>,
    cache: Option<ReplyCache>,
}

impl ReasoningBackend {
    pub fn new(provider: Arc<dyn LlmProvider>, config: GenerationConfig) -> Self {
        Self {
            provider,
            config,
            circuit_breaker: Arc::new(CircuitBreaker::default()),
            cache: None,
        }
    }

    /// Share a circuit breaker with other collaborators.
    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn with_cache(mut self, cache: ReplyCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Ask the backend to assess `prompt`.
    ///
    /// # Errors
    ///
    /// [`CoreError::EmptyInput`] if the prompt is empty or whitespace-only.
    /// Every other failure is absorbed into the fallback reply.
    pub async fn reason(&self, prompt: &str) -> Result<ReasoningOutcome, CoreError> {
        if prompt.trim().is_empty() {
            return Err(CoreError::EmptyInput("prompt"));
        }

        let key = PromptKey::new(&self.config.model, prompt);
        if let Some(cache) = &self.cache {
            if let Some(text) = cache.get(&key).await {
                tracing::debug!(provider = self.provider.name(), "Reasoning cache hit");
                return Ok(ReasoningOutcome {
                    text,
                    source: ReplySource::Cache,
                });
            }
        }

        if self.circuit_breaker.is_open(Backend::Reasoning) {
            tracing::warn!(
                provider = self.provider.name(),
                "Circuit open, using fallback reply"
            );
            return Ok(ReasoningOutcome::fallback());
        }

        let call = self.provider.generate(prompt, &self.config);
        let reply = match tokio::time::timeout(self.config.timeout, call).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => {
                tracing::warn!(provider = self.provider.name(), "Blank reply, using fallback");
                self.circuit_breaker.record_failure(Backend::Reasoning);
                return Ok(ReasoningOutcome::fallback());
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    error = %e,
                    "Reasoning call failed, using fallback"
                );
                self.circuit_breaker.record_failure(Backend::Reasoning);
                return Ok(ReasoningOutcome::fallback());
            }
            Err(_) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    timeout = ?self.config.timeout,
                    "Reasoning call timed out, using fallback"
                );
                self.circuit_breaker.record_failure(Backend::Reasoning);
                return Ok(ReasoningOutcome::fallback());
            }
        };

        self.circuit_breaker.record_success(Backend::Reasoning);
        if let Some(cache) = &self.cache {
            cache.insert(key, reply.clone()).await;
        }

        Ok(ReasoningOutcome {
            text: reply,
            source: ReplySource::Provider,
        })
    }
}

impl std::fmt::Debug for ReasoningBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningBackend")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}
