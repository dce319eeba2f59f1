//! # echarikkai-core
//!
//! Deterministic farm-plan risk classification.
//!
//! This crate turns a free-text farm-plan description into structured
//! signals and answers:
//! - What is being grown, where, when and with what water and money?
//! - Which risk categories does that plan fall into?
//! - What did the reasoning step say, once its reply is parsed?
//! - What is the final, corrected risk score?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No network calls**: All classification is keyword and rule based
//! 3. **Total parsing**: A reasoning reply never fails to parse
//! 4. **Thread-safe**: Registries are read-only statics
//!
//! ## Example
//!
//! ```rust,ignore
//! use echarikkai_core::{analyze, adjust_score, parse_reply, WeatherSummary, DEFAULT_BASE_SCORE};
//!
//! let analysis = analyze("I grow rice in Tamil Nadu, rainfed, with a KCC loan")?;
//! println!("{}", analysis.categories);
//!
//! let reply = parse_reply(&llm_text);
//! let base = reply.risk_score.map(|s| i64::from(s.value())).unwrap_or(DEFAULT_BASE_SCORE);
//! let score = adjust_score(base, &analysis.context, &WeatherSummary::unavailable());
//! ```

pub mod extractor;
pub mod ingestion;
pub mod language;
pub mod market;
pub mod questions;
pub mod registry;
pub mod reply;
pub mod rules;
pub mod scoring;
pub mod types;
pub mod weather;

// Re-export main types at crate root
pub use extractor::extract_entities;
pub use ingestion::{normalize_input, InputType};
pub use language::{detect_language, translate_from_english, translate_to_english, Language};
pub use market::{Level, MarketContext, MarketDataError, MarketKnowledgeBase, PriceTrend};
pub use questions::{follow_up_questions, missing_critical_fields, CRITICAL_FIELDS};
pub use reply::{parse_reply, ConfidenceLevel, ReasoningReply, RiskScore};
pub use rules::{
    categorize_risks, explain_risks, RiskCategory, RiskCategoryList, RiskFinding, RiskRule,
};
pub use scoring::{adjust_score, score_adjustments, ScoreAdjustment, DEFAULT_BASE_SCORE};
pub use types::{
    ContextField, Crop, DecisionContext, FinancialDependency, Irrigation, Location,
    MarketDependency, Month,
};
pub use weather::{coordinates_for, Coordinates, WeatherSummary, DEFAULT_COORDINATES};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Usage errors raised by core operations.
///
/// Malformed reasoning replies are never an error; see [`parse_reply`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error("Unsupported input type: {0}")]
    UnsupportedInputType(String),

    #[error("Unknown {field} token: {value:?}")]
    UnknownToken { field: &'static str, value: String },

    #[error("Invalid decision context: {0}")]
    InvalidContext(String),

    #[error("Invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

/// The deterministic half of an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Detected language of the raw input.
    pub language: Language,

    /// Text after translation and normalization.
    pub normalized_text: String,

    /// Extracted entities.
    pub context: DecisionContext,

    /// Critical fields the text did not mention.
    pub missing_fields: Vec<ContextField>,

    /// Follow-up questions for the missing fields.
    pub questions: Vec<String>,

    /// Triggered risk categories.
    pub categories: RiskCategoryList,
}

/// Run the offline pipeline over raw farm-plan text.
///
/// Detects the language, translates non-English input, normalizes, then
/// extracts entities, lists follow-up questions and categorizes risks.
/// Never touches the network.
///
/// # Errors
///
/// [`CoreError::EmptyInput`] if the text is empty or whitespace-only.
pub fn analyze(raw_text: &str) -> Result<Analysis, CoreError> {
    let language = detect_language(raw_text)?;
    let english = translate_to_english(raw_text)?;
    let normalized_text = normalize_input(InputType::Text, &english)?;

    let context = extract_entities(&normalized_text)?;
    let missing_fields = missing_critical_fields(&context);
    let questions = follow_up_questions(&context);
    let categories = categorize_risks(&context);

    tracing::info!(
        language = %language,
        crop = ?context.crop,
        location = ?context.location,
        categories = categories.len(),
        "Analyzed farm plan"
    );

    Ok(Analysis {
        language,
        normalized_text,
        context,
        missing_fields,
        questions,
        categories,
    })
}
