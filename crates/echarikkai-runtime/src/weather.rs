//! Current weather lookup.
//!
//! [`WeatherService::fetch`] never fails: transport errors, bad statuses
//! and undecodable bodies all degrade to [`WeatherSummary::unavailable`]
//! after transient errors have been retried with backoff.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use echarikkai_core::{Coordinates, WeatherSummary};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::config::WeatherConfig;
use crate::resilience::{Backend, CircuitBreaker};

/// Current-conditions variables requested from Open-Meteo.
pub const CURRENT_VARIABLES: &str = "temperature_2m,rain,wind_speed_10m";

/// Errors from a weather source.
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Weather service returned status {0}")]
    Status(u16),

    #[error("Failed to decode weather response: {0}")]
    DecodeError(String),
}

impl WeatherError {
    /// Whether a retry might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            WeatherError::HttpError(_) | WeatherError::Timeout(_) => true,
            WeatherError::Status(status) => *status == 429 || *status >= 500,
            WeatherError::DecodeError(_) => false,
        }
    }
}

/// Something that reports current conditions at a point.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, at: Coordinates) -> Result<WeatherSummary, WeatherError>;

    fn name(&self) -> &str;
}

/// Read the `current` block of a forecast response.
///
/// Readings may be numbers or numeric strings; anything else leaves that
/// reading unset.
pub fn parse_current(body: &JsonValue) -> WeatherSummary {
    let current = &body["current"];
    WeatherSummary {
        temperature: coerce_reading(&current["temperature_2m"]),
        rainfall: coerce_reading(&current["rain"]),
        wind_speed: coerce_reading(&current["wind_speed_10m"]),
    }
}

fn coerce_reading(value: &JsonValue) -> Option<f64> {
    let reading = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    reading.is_finite().then_some(reading)
}

/// Open-Meteo forecast client.
#[cfg(feature = "open-meteo")]
pub struct OpenMeteoClient {
    base_url: String,
    timeout: Duration,
}

#[cfg(feature = "open-meteo")]
impl OpenMeteoClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &WeatherConfig) -> Self {
        Self::new(&config.base_url, config.timeout)
    }

    fn client() -> &'static reqwest::Client {
        static CLIENT: std::sync::OnceLock<reqwest::Client> = std::sync::OnceLock::new();
        CLIENT.get_or_init(reqwest::Client::new)
    }
}

#[cfg(feature = "open-meteo")]
#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn current(&self, at: Coordinates) -> Result<WeatherSummary, WeatherError> {
        let latitude = at.latitude.to_string();
        let longitude = at.longitude.to_string();

        let response = Self::client()
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current", CURRENT_VARIABLES),
                ("timezone", "auto"),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WeatherError::Timeout(self.timeout)
                } else {
                    WeatherError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| WeatherError::DecodeError(e.to_string()))?;

        Ok(parse_current(&body))
    }

    fn name(&self) -> &str {
        "open-meteo"
    }
}

/// A weather source with retry, circuit breaker and graceful degradation.
pub struct WeatherService {
    source: Arc<dyn WeatherSource>,
    circuit_breaker: Arc<CircuitBreaker>,
    retry_attempts: usize,
    retry_min_delay: Duration,
}

impl WeatherService {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        let defaults = WeatherConfig::default();
        Self {
            source,
            circuit_breaker: Arc::new(CircuitBreaker::default()),
            retry_attempts: defaults.retry_attempts,
            retry_min_delay: defaults.retry_min_delay,
        }
    }

    /// Apply the retry settings from `config`.
    pub fn with_config(mut self, config: &WeatherConfig) -> Self {
        self.retry_attempts = config.retry_attempts;
        self.retry_min_delay = config.retry_min_delay;
        self
    }

    /// Share a circuit breaker with other collaborators.
    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    /// Current conditions at `at`, or an all-unavailable summary.
    pub async fn fetch(&self, at: Coordinates) -> WeatherSummary {
        if self.circuit_breaker.is_open(Backend::Weather) {
            tracing::warn!(source = self.source.name(), "Circuit open, weather unavailable");
            return WeatherSummary::unavailable();
        }

        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.retry_min_delay)
            .with_max_times(self.retry_attempts);

        let result = (|| self.source.current(at))
            .retry(backoff)
            .sleep(tokio::time::sleep)
            .when(WeatherError::is_transient)
            .notify(|err: &WeatherError, delay: Duration| {
                tracing::debug!(error = %err, delay = ?delay, "Retrying weather request");
            })
            .await;

        match result {
            Ok(summary) => {
                self.circuit_breaker.record_success(Backend::Weather);
                tracing::info!(
                    latitude = at.latitude,
                    longitude = at.longitude,
                    rainfall = ?summary.rainfall,
                    "Fetched weather"
                );
                summary
            }
            Err(e) => {
                self.circuit_breaker.record_failure(Backend::Weather);
                tracing::warn!(
                    source = self.source.name(),
                    error = %e,
                    "Weather lookup failed, continuing without weather"
                );
                WeatherSummary::unavailable()
            }
        }
    }
}

impl std::fmt::Debug for WeatherService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherService")
            .field("source", &self.source.name())
            .field("retry_attempts", &self.retry_attempts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CircuitBreakerConfig;
    use echarikkai_core::DEFAULT_COORDINATES;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails with `error` for the first `failures` calls, then reports rain.
    struct FlakySource {
        failures: usize,
        error: fn() -> WeatherError,
        calls: AtomicUsize,
    }

    impl FlakySource {
        fn new(failures: usize, error: fn() -> WeatherError) -> Arc<Self> {
            Arc::new(Self {
                failures,
                error,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherSource for FlakySource {
        async fn current(&self, _at: Coordinates) -> Result<WeatherSummary, WeatherError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err((self.error)());
            }
            Ok(WeatherSummary {
                temperature: Some(29.0),
                rainfall: Some(1.5),
                wind_speed: Some(8.0),
            })
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn connection_reset() -> WeatherError {
        WeatherError::HttpError("connection reset".to_string())
    }

    fn not_found() -> WeatherError {
        WeatherError::Status(404)
    }

    #[test]
    fn test_parse_current() {
        let body = serde_json::json!({
            "latitude": 13.08,
            "current": {
                "time": "2025-06-01T12:00",
                "temperature_2m": 31.4,
                "rain": 0.0,
                "wind_speed_10m": "14.2"
            }
        });
        let summary = parse_current(&body);
        assert_eq!(summary.temperature, Some(31.4));
        assert_eq!(summary.rainfall, Some(0.0));
        assert_eq!(summary.wind_speed, Some(14.2));
    }

    #[test]
    fn test_parse_tolerates_bad_fields() {
        let body = serde_json::json!({
            "current": { "temperature_2m": "hot", "rain": null, "wind_speed_10m": [1] }
        });
        assert_eq!(parse_current(&body), WeatherSummary::unavailable());
        assert_eq!(parse_current(&serde_json::json!("oops")), WeatherSummary::unavailable());
        assert_eq!(parse_current(&serde_json::json!({})), WeatherSummary::unavailable());
    }

    #[test]
    fn test_transient_classification() {
        assert!(connection_reset().is_transient());
        assert!(WeatherError::Status(503).is_transient());
        assert!(WeatherError::Status(429).is_transient());
        assert!(!not_found().is_transient());
        assert!(!WeatherError::DecodeError("eof".into()).is_transient());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let source = FlakySource::new(2, connection_reset);
        let service = WeatherService::new(source.clone());

        let summary = service.fetch(DEFAULT_COORDINATES).await;
        assert_eq!(summary.rainfall, Some(1.5));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_degrade() {
        let source = FlakySource::new(usize::MAX, connection_reset);
        let service = WeatherService::new(source.clone());

        assert_eq!(service.fetch(DEFAULT_COORDINATES).await, WeatherSummary::unavailable());
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_not_retried() {
        let source = FlakySource::new(1, not_found);
        let service = WeatherService::new(source.clone());

        assert!(!service.fetch(DEFAULT_COORDINATES).await.is_available());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_open_circuit_skips_source() {
        let source = FlakySource::new(usize::MAX, not_found);
        let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            ..Default::default()
        }));
        let service = WeatherService::new(source.clone()).with_circuit_breaker(breaker);

        service.fetch(DEFAULT_COORDINATES).await;
        service.fetch(DEFAULT_COORDINATES).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_no_retries_configured() {
        let source = FlakySource::new(1, connection_reset);
        let config = WeatherConfig {
            retry_attempts: 0,
            ..Default::default()
        };
        let service = WeatherService::new(source.clone()).with_config(&config);

        assert!(!service.fetch(DEFAULT_COORDINATES).await.is_available());
        assert_eq!(source.calls(), 1);
    }
}
