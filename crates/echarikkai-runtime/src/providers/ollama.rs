//! Ollama provider.
//!
//! Talks to the non-streaming `/api/generate` endpoint of a local or
//! proxied Ollama server.

use super::{
    factory::ProviderFactory,
    secrets::{ApiCredential, CredentialSource},
    GenerationConfig, LlmProvider, ProviderError,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding an optional bearer token.
pub const OLLAMA_API_KEY_ENV: &str = "OLLAMA_API_KEY";

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Longest error body kept in an [`ProviderError::ApiError`] message.
const MAX_ERROR_BODY: usize = 200;

/// Ollama `/api/generate` client.
pub struct OllamaProvider {
    base_url: String,
    credential: Option<ApiCredential>,
}

impl std::fmt::Debug for OllamaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaProvider")
            .field("base_url", &self.base_url)
            .field("credential", &self.credential)
            .finish()
    }
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential: None,
        }
    }

    /// Build from JSON config: `base_url` and an optional `api_key`, which
    /// falls back to `OLLAMA_API_KEY`.
    pub fn from_config(config: &JsonValue) -> Result<Self, ProviderError> {
        validate_base_url(config)?;

        let base_url = config["base_url"].as_str().unwrap_or(DEFAULT_BASE_URL);
        let mut provider = Self::new(base_url);
        provider.credential =
            ApiCredential::lookup(config, "api_key", OLLAMA_API_KEY_ENV, "Ollama API key");
        Ok(provider)
    }

    /// Attach a bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.credential = Some(ApiCredential::new(
            token,
            CredentialSource::Programmatic,
            "Ollama API key",
        ));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn client() -> &'static reqwest::Client {
        static CLIENT: std::sync::OnceLock<reqwest::Client> = std::sync::OnceLock::new();
        CLIENT.get_or_init(reqwest::Client::new)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credential {
            Some(credential) => request.bearer_auth(credential.expose()),
            None => request,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, ProviderError> {
        let request = GenerateRequest {
            model: &config.model,
            prompt,
            stream: false,
            options: config
                .temperature
                .map(|temperature| GenerateOptions { temperature }),
        };

        let response = self
            .authorize(Self::client().post(format!("{}/api/generate", self.base_url)))
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(config.timeout)
                } else {
                    ProviderError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| message.is_char_boundary(*i))
                    .unwrap_or(0);
                message.truncate(cut);
            }
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        match body.response {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ProviderError::EmptyResponse),
        }
    }

    async fn health_check(&self) -> bool {
        self.authorize(Self::client().get(format!("{}/api/tags", self.base_url)))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

fn validate_base_url(config: &JsonValue) -> Result<(), ProviderError> {
    match &config["base_url"] {
        JsonValue::Null => Ok(()),
        JsonValue::String(url) if url.starts_with("http://") || url.starts_with("https://") => {
            Ok(())
        }
        _ => Err(ProviderError::NotConfigured(
            "base_url must start with http:// or https://".to_string(),
        )),
    }
}

/// Factory for [`OllamaProvider`].
///
/// ```json
/// { "base_url": "http://localhost:11434", "api_key": "optional" }
/// ```
pub struct OllamaProviderFactory;

impl ProviderFactory for OllamaProviderFactory {
    fn provider_type(&self) -> &'static str {
        "ollama"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(Arc::new(OllamaProvider::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
        validate_base_url(config)
    }

    fn default_config(&self) -> JsonValue {
        serde_json::json!({ "base_url": DEFAULT_BASE_URL })
    }

    fn description(&self) -> &'static str {
        "Ollama local model server"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider = OllamaProvider::new("http://localhost:11434/");
        assert_eq!(provider.base_url(), "http://localhost:11434");
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_request_body_shape() {
        let request = GenerateRequest {
            model: "mistral",
            prompt: "assess",
            stream: false,
            options: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"model": "mistral", "prompt": "assess", "stream": false})
        );
    }

    #[test]
    fn test_response_field_optional() {
        let body: GenerateResponse = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert!(body.response.is_none());
    }

    #[test]
    fn test_factory_validates_base_url() {
        let factory = OllamaProviderFactory;
        assert!(factory.validate_config(&serde_json::json!({})).is_ok());
        assert!(factory
            .validate_config(&serde_json::json!({"base_url": "localhost:11434"}))
            .is_err());
        assert!(factory
            .create(&serde_json::json!({"base_url": "https://ollama.internal"}))
            .is_ok());
        assert_eq!(factory.default_config()["base_url"], DEFAULT_BASE_URL);
    }

    #[test]
    fn test_token_not_in_debug_output() {
        let secret = "proxy-secret-token";
        let provider = OllamaProvider::new(DEFAULT_BASE_URL).with_token(secret);
        let debug = format!("{:?}", provider);
        assert!(!debug.contains(secret));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let provider = OllamaProvider::new("http://127.0.0.1:9");
        let config = GenerationConfig {
            timeout: Duration::from_secs(2),
            ..Default::default()
        };
        assert!(provider.generate("prompt", &config).await.is_err());
        assert!(!provider.health_check().await);
    }
}
