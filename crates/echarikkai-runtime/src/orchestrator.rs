//! End-to-end farm-plan assessment.
//!
//! 1. Offline analysis in `echarikkai-core` (language, normalization,
//!    extraction, follow-up questions, categories)
//! 2. Fan-out: weather and market lookups run concurrently via `tokio::join!`
//! 3. Prompt construction and one reasoning call (never fails past here)
//! 4. Deterministic fan-in: reply parsing and score adjustment

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;

use echarikkai_core::{
    adjust_score, analyze, coordinates_for, parse_reply, score_adjustments, Analysis, Coordinates,
    MarketContext, MarketKnowledgeBase, ReasoningReply, RiskScore, ScoreAdjustment,
    WeatherSummary, DEFAULT_BASE_SCORE,
};

use crate::cache::ReplyCache;
use crate::config::RuntimeConfig;
use crate::prompts::build_prompt;
use crate::providers::{GenerationConfig, LlmProvider};
use crate::reasoning::{ReasoningBackend, ReplySource};
use crate::resilience::CircuitBreaker;
use crate::weather::{WeatherService, WeatherSource};
use crate::RuntimeError;

/// Everything known about one assessed plan.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub assessed_at: DateTime<Utc>,

    /// The farmer's text as given.
    pub input: String,

    #[serde(flatten)]
    pub analysis: Analysis,

    /// Where weather was requested.
    pub coordinates: Coordinates,
    pub weather: WeatherSummary,
    pub market: MarketContext,

    pub reply: ReasoningReply,
    pub reply_source: ReplySource,

    /// Score proposed by the reply, or the default when it gave none.
    pub base_score: i64,
    pub adjustments: Vec<ScoreAdjustment>,
    pub final_score: RiskScore,
}

impl Assessment {
    /// Whether the reasoning step had to fall back.
    pub fn used_fallback(&self) -> bool {
        self.reply_source == ReplySource::Fallback
    }
}

/// Runs the full assessment pipeline.
pub struct AssessmentOrchestrator {
    weather: WeatherService,
    market: MarketKnowledgeBase,
    reasoning: ReasoningBackend,
    config: RuntimeConfig,
}

impl AssessmentOrchestrator {
    pub fn builder() -> AssessmentOrchestratorBuilder {
        AssessmentOrchestratorBuilder::new()
    }

    /// Assess a plan, asking for weather where the plan's location is.
    pub async fn assess(&self, raw_text: &str) -> Result<Assessment, RuntimeError> {
        self.assess_at(raw_text, None).await
    }

    /// Assess a plan.
    ///
    /// Weather is requested at `coordinates` when given, else at the
    /// extracted location, else at the configured default.
    ///
    /// # Errors
    ///
    /// Only usage errors (empty text). Weather, market and reasoning
    /// failures degrade to their fallbacks.
    pub async fn assess_at(
        &self,
        raw_text: &str,
        coordinates: Option<Coordinates>,
    ) -> Result<Assessment, RuntimeError> {
        let analysis = analyze(raw_text)?;
        let context = &analysis.context;

        let coordinates = coordinates
            .or_else(|| context.location.map(coordinates_for))
            .unwrap_or(self.config.default_coordinates);

        let market_lookup = async {
            match context.crop {
                Some(crop) => self.market.context_for(crop),
                None => {
                    tracing::debug!("No crop detected, skipping market lookup");
                    MarketContext::unavailable()
                }
            }
        };

        let (weather, market) = tokio::join!(self.weather.fetch(coordinates), market_lookup);

        let prompt = build_prompt(context, &weather, &market, &analysis.categories, raw_text)?;
        let outcome = self.reasoning.reason(&prompt).await?;
        let reply = parse_reply(&outcome.text);

        let base_score = reply
            .risk_score
            .map(|s| i64::from(s.value()))
            .unwrap_or(DEFAULT_BASE_SCORE);
        let adjustments = score_adjustments(context, &weather);
        let final_score = adjust_score(base_score, context, &weather);

        tracing::info!(
            crop = ?context.crop,
            categories = %analysis.categories,
            reply_source = ?outcome.source,
            base_score,
            final_score = final_score.value(),
            "Assessment complete"
        );

        Ok(Assessment {
            assessed_at: Utc::now(),
            input: raw_text.to_string(),
            analysis,
            coordinates,
            weather,
            market,
            reply,
            reply_source: outcome.source,
            base_score,
            adjustments,
            final_score,
        })
    }

    /// Assess several plans, at most `concurrency` at a time.
    ///
    /// Results keep input order.
    pub async fn assess_batch<'a, I>(
        &self,
        plans: I,
        concurrency: usize,
    ) -> Vec<Result<Assessment, RuntimeError>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        stream::iter(plans)
            .map(|plan| self.assess(plan))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl std::fmt::Debug for AssessmentOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentOrchestrator")
            .field("weather", &self.weather)
            .field("market_crops", &self.market.len())
            .field("reasoning", &self.reasoning)
            .finish()
    }
}

/// Builder for [`AssessmentOrchestrator`].
pub struct AssessmentOrchestratorBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    weather_source: Option<Arc<dyn WeatherSource>>,
    market: Option<MarketKnowledgeBase>,
    config: RuntimeConfig,
}

impl AssessmentOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            weather_source: None,
            market: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the reasoning provider.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the weather source; Open-Meteo is used when unset and compiled in.
    pub fn weather_source(mut self, source: Arc<dyn WeatherSource>) -> Self {
        self.weather_source = Some(source);
        self
    }

    /// Set the market knowledge base instead of loading it from config.
    pub fn market(mut self, market: MarketKnowledgeBase) -> Self {
        self.market = Some(market);
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<AssessmentOrchestrator, RuntimeError> {
        let provider = self
            .provider
            .ok_or_else(|| RuntimeError::ProviderNotConfigured("No provider set".to_string()))?;

        let source = match self.weather_source {
            Some(source) => source,
            None => default_weather_source(&self.config)?,
        };

        let market = match self.market {
            Some(market) => market,
            None => load_market(&self.config),
        };

        let circuit_breaker = Arc::new(CircuitBreaker::new(self.config.circuit_breaker.clone()));

        let weather = WeatherService::new(source)
            .with_config(&self.config.weather)
            .with_circuit_breaker(circuit_breaker.clone());

        let mut reasoning =
            ReasoningBackend::new(provider, GenerationConfig::from(&self.config.ollama))
                .with_circuit_breaker(circuit_breaker);
        if let Some(cache) = ReplyCache::from_config(&self.config.cache) {
            reasoning = reasoning.with_cache(cache);
        }

        Ok(AssessmentOrchestrator {
            weather,
            market,
            reasoning,
            config: self.config,
        })
    }
}

impl Default for AssessmentOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "open-meteo")]
fn default_weather_source(config: &RuntimeConfig) -> Result<Arc<dyn WeatherSource>, RuntimeError> {
    Ok(Arc::new(crate::weather::OpenMeteoClient::from_config(
        &config.weather,
    )))
}

#[cfg(not(feature = "open-meteo"))]
fn default_weather_source(_config: &RuntimeConfig) -> Result<Arc<dyn WeatherSource>, RuntimeError> {
    Err(RuntimeError::WeatherNotConfigured(
        "no weather source set and 'open-meteo' feature disabled".to_string(),
    ))
}

/// The configured knowledge file, the built-in table, or nothing.
fn load_market(config: &RuntimeConfig) -> MarketKnowledgeBase {
    let loaded = match &config.market_data {
        Some(path) => MarketKnowledgeBase::from_file(path),
        None => MarketKnowledgeBase::builtin(),
    };

    loaded.unwrap_or_else(|e| {
        tracing::warn!(
            path = ?config.market_data,
            error = %e,
            "Market data unavailable, continuing without market context"
        );
        MarketKnowledgeBase::empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use crate::reasoning::FALLBACK_REPLY;
    use crate::weather::WeatherError;
    use async_trait::async_trait;
    use echarikkai_core::{
        CoreError, Crop, Level, Location, PriceTrend, RiskCategory, DEFAULT_COORDINATES,
    };
    use parking_lot::Mutex;
    use std::path::PathBuf;

    struct CannedProvider {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedProvider {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn down() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn generate(
            &self,
            prompt: &str,
            _config: &GenerationConfig,
        ) -> Result<String, ProviderError> {
            self.prompts.lock().push(prompt.to_string());
            self.reply
                .clone()
                .ok_or_else(|| ProviderError::HttpError("connection refused".to_string()))
        }

        async fn health_check(&self) -> bool {
            self.reply.is_some()
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    struct FixedWeather {
        summary: Option<WeatherSummary>,
        requested: Mutex<Vec<Coordinates>>,
    }

    impl FixedWeather {
        fn dry() -> Arc<Self> {
            Arc::new(Self {
                summary: Some(WeatherSummary {
                    temperature: Some(34.0),
                    rainfall: Some(0.0),
                    wind_speed: Some(12.0),
                }),
                requested: Mutex::new(Vec::new()),
            })
        }

        fn down() -> Arc<Self> {
            Arc::new(Self {
                summary: None,
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl WeatherSource for FixedWeather {
        async fn current(&self, at: Coordinates) -> Result<WeatherSummary, WeatherError> {
            self.requested.lock().push(at);
            self.summary.ok_or(WeatherError::Status(404))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    const REPLY: &str = "HIGH_RISKS:
* Monsoon delay on a rainfed crop

MEDIUM_RISKS:
* None

ASSUMPTIONS:
* Normal sowing window

MITIGATION:
* Arrange supplementary irrigation

RISK_SCORE: 6
CONFIDENCE_LEVEL: medium";

    const PLAN: &str = "I grow rice in Tamil Nadu, rainfed, in June with a KCC loan";

    fn orchestrator(
        provider: Arc<dyn LlmProvider>,
        weather: Arc<dyn WeatherSource>,
    ) -> AssessmentOrchestrator {
        AssessmentOrchestrator::builder()
            .provider(provider)
            .weather_source(weather)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let provider = CannedProvider::replying(REPLY);
        let weather = FixedWeather::dry();
        let orch = orchestrator(provider.clone(), weather.clone());

        let assessment = orch.assess(PLAN).await.unwrap();

        assert_eq!(assessment.analysis.context.crop, Some(Crop::Rice));
        assert_eq!(
            assessment.analysis.categories.as_slice(),
            &[
                RiskCategory::Weather,
                RiskCategory::Resource,
                RiskCategory::Financial
            ]
        );
        assert_eq!(assessment.market.price_trend, Some(PriceTrend::Stable));
        assert_eq!(assessment.market.demand_level, Some(Level::High));
        assert_eq!(assessment.weather.rainfall, Some(0.0));
        assert_eq!(assessment.coordinates, coordinates_for(Location::TamilNadu));
        assert_eq!(assessment.reply_source, ReplySource::Provider);
        assert_eq!(assessment.reply.high_risks.len(), 1);

        // 6 + zero rainfall + loan; rainfed counts as confirmed irrigation
        assert_eq!(assessment.base_score, 6);
        assert_eq!(
            assessment.adjustments,
            vec![ScoreAdjustment::ZeroRainfall, ScoreAdjustment::LoanExposure]
        );
        assert_eq!(assessment.final_score.value(), 8);

        let prompts = provider.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(PLAN));
        assert!(prompts[0].contains("  Price Trend  : Stable"));
    }

    #[tokio::test]
    async fn test_everything_down_still_assesses() {
        let orch = orchestrator(CannedProvider::down(), FixedWeather::down());

        let assessment = orch.assess("planning to farm next season").await.unwrap();

        assert!(assessment.used_fallback());
        assert_eq!(assessment.reply.assumptions, vec!["LLM unavailable".to_string()]);
        assert_eq!(assessment.weather, WeatherSummary::unavailable());
        assert_eq!(assessment.market, MarketContext::unavailable());
        assert_eq!(assessment.coordinates, DEFAULT_COORDINATES);
        assert_eq!(assessment.base_score, DEFAULT_BASE_SCORE);
        // 5 + irrigation never mentioned
        assert_eq!(assessment.final_score.value(), 6);
        assert_eq!(FALLBACK_REPLY.lines().last(), Some("CONFIDENCE_LEVEL: low"));
    }

    #[tokio::test]
    async fn test_explicit_coordinates_win() {
        let weather = FixedWeather::dry();
        let orch = orchestrator(CannedProvider::replying(REPLY), weather.clone());
        let farm = Coordinates::new(11.0168, 76.9558).unwrap();

        orch.assess_at(PLAN, Some(farm)).await.unwrap();
        assert_eq!(weather.requested.lock().as_slice(), &[farm]);
    }

    #[tokio::test]
    async fn test_empty_plan_is_usage_error() {
        let orch = orchestrator(CannedProvider::replying(REPLY), FixedWeather::dry());
        assert!(matches!(
            orch.assess("   ").await,
            Err(RuntimeError::Core(CoreError::EmptyInput(_)))
        ));
    }

    #[tokio::test]
    async fn test_batch_keeps_order() {
        let orch = orchestrator(CannedProvider::replying(REPLY), FixedWeather::dry());

        let results = orch
            .assess_batch(["wheat in punjab", "", "cotton in gujarat"], 2)
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].as_ref().unwrap().analysis.context.crop,
            Some(Crop::Wheat)
        );
        assert!(results[1].is_err());
        assert_eq!(
            results[2].as_ref().unwrap().analysis.context.crop,
            Some(Crop::Cotton)
        );
    }

    #[test]
    fn test_builder_requires_provider() {
        let result = AssessmentOrchestrator::builder()
            .weather_source(FixedWeather::dry())
            .build();
        assert!(matches!(result, Err(RuntimeError::ProviderNotConfigured(_))));
    }

    #[test]
    fn test_missing_market_file_degrades() {
        let config = RuntimeConfig {
            market_data: Some(PathBuf::from("/nonexistent/crops.yaml")),
            ..Default::default()
        };
        assert!(load_market(&config).is_empty());
        assert!(!load_market(&RuntimeConfig::default()).is_empty());
    }

    #[tokio::test]
    async fn test_assessment_serializes() {
        let orch = orchestrator(CannedProvider::replying(REPLY), FixedWeather::dry());
        let assessment = orch.assess(PLAN).await.unwrap();

        let json = serde_json::to_value(&assessment).unwrap();
        assert_eq!(json["final_score"], 8);
        assert_eq!(json["reply_source"], "provider");
        assert_eq!(json["context"]["crop"], "rice");
        assert_eq!(json["categories"][0], "Weather Risk");
        assert!(json["assessed_at"].is_string());
    }
}
