//! Runtime configuration.
//!
//! Loaded from YAML, then overridden by `ECHARIKKAI_*` environment
//! variables. Durations are written the humantime way ("60s", "500ms").
//!
//! ```yaml
//! ollama:
//!   base_url: http://localhost:11434
//!   model: mistral
//!   timeout: 60s
//!   temperature: 0.2
//! weather:
//!   timeout: 10s
//!   retry_attempts: 2
//! market_data: data/crops.yaml
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use echarikkai_core::{Coordinates, DEFAULT_COORDINATES};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resilience::CircuitBreakerConfig;

pub const OLLAMA_URL_ENV: &str = "ECHARIKKAI_OLLAMA_URL";
pub const OLLAMA_MODEL_ENV: &str = "ECHARIKKAI_OLLAMA_MODEL";
pub const WEATHER_URL_ENV: &str = "ECHARIKKAI_WEATHER_URL";
pub const MARKET_DATA_ENV: &str = "ECHARIKKAI_MARKET_DATA";
pub const REQUEST_TIMEOUT_ENV: &str = "ECHARIKKAI_REQUEST_TIMEOUT";
pub const OLLAMA_TEMPERATURE_ENV: &str = "ECHARIKKAI_OLLAMA_TEMPERATURE";

/// Errors loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub ollama: OllamaConfig,
    pub weather: WeatherConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub cache: CacheConfig,

    /// Crop knowledge file; the built-in table is used when unset.
    pub market_data: Option<PathBuf>,

    /// Where to ask for weather when the plan names no location.
    pub default_coordinates: Coordinates,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            weather: WeatherConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            cache: CacheConfig::default(),
            market_data: None,
            default_coordinates: DEFAULT_COORDINATES,
        }
    }
}

/// Reasoning backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    #[serde(with = "duration_str")]
    pub timeout: Duration,

    /// Sampling temperature; the model's own default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "mistral".to_string(),
            timeout: Duration::from_secs(60),
            temperature: None,
        }
    }
}

impl OllamaConfig {
    /// JSON handed to the provider factory.
    pub fn provider_config(&self) -> serde_json::Value {
        serde_json::json!({ "base_url": self.base_url })
    }
}

/// Weather client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    #[serde(with = "duration_str")]
    pub timeout: Duration,

    /// Retries after the first attempt for transient failures.
    pub retry_attempts: usize,

    #[serde(with = "duration_str")]
    pub retry_min_delay: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com".to_string(),
            timeout: Duration::from_secs(10),
            retry_attempts: 2,
            retry_min_delay: Duration::from_millis(200),
        }
    }
}

/// Reasoning reply cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: u64,
    #[serde(with = "duration_str")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 1_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl RuntimeConfig {
    /// Parse configuration from YAML. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Apply `ECHARIKKAI_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Blank values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(OLLAMA_URL_ENV) {
            self.ollama.base_url = url;
        }
        if let Some(model) = get(OLLAMA_MODEL_ENV) {
            self.ollama.model = model;
        }
        if let Some(url) = get(WEATHER_URL_ENV) {
            self.weather.base_url = url;
        }
        if let Some(path) = get(MARKET_DATA_ENV) {
            self.market_data = Some(PathBuf::from(path));
        }
        if let Some(raw) = get(REQUEST_TIMEOUT_ENV) {
            self.ollama.timeout = parse_timeout(REQUEST_TIMEOUT_ENV, &raw)?;
        }
        if let Some(raw) = get(OLLAMA_TEMPERATURE_ENV) {
            self.ollama.temperature = Some(parse_temperature(OLLAMA_TEMPERATURE_ENV, &raw)?);
        }

        Ok(self)
    }
}

/// Accepts humantime strings or bare seconds.
fn parse_timeout(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn parse_temperature(key: &str, raw: &str) -> Result<f32, ConfigError> {
    match raw.trim().parse::<f32>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        Ok(value) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("temperature must be a non-negative number, got {value}"),
        }),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Serde adapter for humantime duration strings.
pub(crate) mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}
