//! # echarikkai-runtime
//!
//! The networked half of a farm-plan assessment.
//!
//! `echarikkai-core` classifies a plan without touching the network. This
//! crate adds the collaborators that do:
//! - current weather from Open-Meteo (feature `open-meteo`)
//! - a reasoning reply from an Ollama model (feature `ollama`)
//! - the orchestrator that runs them and scores the result
//!
//! Every collaborator degrades instead of failing: weather becomes
//! unavailable, market context becomes unset and the reasoning step
//! substitutes a fixed fallback reply. Only usage errors reach the caller.
//!
//! ## Example
//!
//! ```rust,ignore
//! use echarikkai_runtime::{AssessmentOrchestrator, ProviderRegistry, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_yaml_file("echarikkai.yaml")?.with_env_overrides()?;
//! let provider = ProviderRegistry::with_defaults()
//!     .create("ollama", &config.ollama.provider_config())?;
//!
//! let orchestrator = AssessmentOrchestrator::builder()
//!     .provider(provider)
//!     .config(config)
//!     .build()?;
//!
//! let assessment = orchestrator.assess("rice in tamil nadu, rainfed, kcc loan").await?;
//! println!("{}", assessment.final_score.value());
//! ```

pub mod cache;
pub mod config;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod reasoning;
pub mod resilience;
pub mod weather;

pub use cache::ReplyCache;
pub use config::{CacheConfig, ConfigError, OllamaConfig, RuntimeConfig, WeatherConfig};
pub use orchestrator::{Assessment, AssessmentOrchestrator, AssessmentOrchestratorBuilder};
pub use prompts::build_prompt;
pub use providers::{GenerationConfig, LlmProvider, ProviderError, ProviderRegistry};
pub use reasoning::{ReasoningBackend, ReasoningOutcome, ReplySource, FALLBACK_REPLY};
pub use resilience::{Backend, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use weather::{parse_current, WeatherError, WeatherService, WeatherSource};

#[cfg(feature = "ollama")]
pub use providers::OllamaProvider;

#[cfg(feature = "open-meteo")]
pub use weather::OpenMeteoClient;

use thiserror::Error;

/// Errors from the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Core(#[from] echarikkai_core::CoreError),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Weather source not configured: {0}")]
    WeatherNotConfigured(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
