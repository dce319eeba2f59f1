//! Reasoning prompt construction.
//!
//! The prompt carries everything the backend may use: the farmer's own
//! words, the extracted context, current weather, market outlook and the
//! pre-detected categories. It then pins the reply to the six-header
//! format that [`parse_reply`](echarikkai_core::parse_reply) reads.
//!
//! Unset values are rendered as sentinels, never dropped:
//! - context and market fields: `Unknown`
//! - weather readings: `Unavailable`
//! - no categories: `None detected.`

use std::fmt::Write;

use echarikkai_core::{
    ContextField, CoreError, DecisionContext, MarketContext, RiskCategoryList, WeatherSummary,
};

const BANNER: &str = "════════════════════════════════════════════════════════";

/// Opening line of every prompt.
pub const ANALYST_PREAMBLE: &str = "You are an expert agricultural risk analyst specializing in Indian farming systems.
Analyze the following farmer profile and provide a structured risk assessment.";

/// Rules the reply must follow.
pub const STRICT_RULES: &str = r#"Using ALL the information above, produce a detailed risk assessment.

STRICT RULES — YOU MUST FOLLOW THESE EXACTLY:
1. Respond ONLY with the output format below. No introduction. No explanation. No extra text.
2. Every section header must appear EXACTLY as shown — same spelling, same caps, same colon.
3. Every item must start with * (asterisk + space).
4. RISK_SCORE must be a single integer from 1 (very low risk) to 10 (extremely high risk).
5. CONFIDENCE_LEVEL must be exactly one word: low, medium, or high.
6. If a section has no items, write: * None
7. Do not add any section not listed below.
8. Do not include any text before HIGH_RISKS: or after CONFIDENCE_LEVEL value."#;

/// The reply skeleton.
pub const OUTPUT_FORMAT: &str = r#"HIGH_RISKS:
* <describe each high severity risk on its own line>

MEDIUM_RISKS:
* <describe each medium severity risk on its own line>

ASSUMPTIONS:
* <list any assumption made due to missing or unclear data>

MITIGATION:
* <list one actionable mitigation step per line>

RISK_SCORE: <single integer 1-10>
CONFIDENCE_LEVEL: <low or medium or high>"#;

const UNKNOWN: &str = "Unknown";
const UNAVAILABLE: &str = "Unavailable";

/// Build the reasoning prompt.
///
/// `original_text` is the farmer's input as typed, before normalization.
///
/// # Errors
///
/// [`CoreError::EmptyInput`] if `original_text` is empty or whitespace-only.
pub fn build_prompt(
    context: &DecisionContext,
    weather: &WeatherSummary,
    market: &MarketContext,
    categories: &RiskCategoryList,
    original_text: &str,
) -> Result<String, CoreError> {
    let original_text = original_text.trim();
    if original_text.is_empty() {
        return Err(CoreError::EmptyInput("original_text"));
    }

    let mut prompt = String::with_capacity(4096);
    prompt.push_str(ANALYST_PREAMBLE);
    prompt.push('\n');

    push_section(&mut prompt, "FARMER INPUT", original_text);
    push_section(&mut prompt, "DECISION CONTEXT", &format_context(context));
    push_section(&mut prompt, "WEATHER CONDITIONS", &format_weather(weather));
    push_section(&mut prompt, "MARKET INTELLIGENCE", &format_market(market));
    push_section(&mut prompt, "PRE-DETECTED RISK CATEGORIES", &format_categories(categories));
    push_section(&mut prompt, "INSTRUCTIONS", STRICT_RULES);
    push_section(&mut prompt, "REQUIRED OUTPUT FORMAT — DO NOT DEVIATE", OUTPUT_FORMAT);
    push_section(&mut prompt, "YOUR RESPONSE MUST START WITH: HIGH_RISKS:", "");

    tracing::debug!(chars = prompt.len(), "Built reasoning prompt");
    Ok(prompt.trim_end().to_string())
}

fn push_section(prompt: &mut String, title: &str, body: &str) {
    let _ = write!(prompt, "\n{BANNER}\n{title}\n{BANNER}\n");
    if !body.is_empty() {
        prompt.push_str(body);
        prompt.push('\n');
    }
}

fn format_context(context: &DecisionContext) -> String {
    ContextField::ALL
        .iter()
        .map(|field| {
            let value = context.field_token(*field).unwrap_or(UNKNOWN);
            format!("  {:<25}: {}", context_label(*field), value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn context_label(field: ContextField) -> &'static str {
    match field {
        ContextField::Crop => "Crop",
        ContextField::Month => "Month",
        ContextField::Location => "Location",
        ContextField::Irrigation => "Irrigation",
        ContextField::MarketDependency => "Market Dependency",
        ContextField::FinancialDependency => "Financial Dependency",
    }
}

fn format_weather(weather: &WeatherSummary) -> String {
    format!(
        "  Temperature : {}\n  Rainfall    : {}\n  Wind Speed  : {}",
        reading(weather.temperature, "°C"),
        reading(weather.rainfall, "mm"),
        reading(weather.wind_speed, "km/h"),
    )
}

/// Whole readings keep one decimal so a measured zero reads "0.0 mm".
fn reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{v:.1} {unit}"),
        Some(v) => format!("{v} {unit}"),
        None => UNAVAILABLE.to_string(),
    }
}

fn format_market(market: &MarketContext) -> String {
    format!(
        "  Price Trend  : {}\n  Volatility   : {}\n  Demand Level : {}",
        capitalized(market.price_trend.map(|t| t.as_str())),
        capitalized(market.volatility.map(|l| l.as_str())),
        capitalized(market.demand_level.map(|l| l.as_str())),
    )
}

fn capitalized(token: Option<&str>) -> String {
    let Some(token) = token else {
        return UNKNOWN.to_string();
    };
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => UNKNOWN.to_string(),
    }
}

fn format_categories(categories: &RiskCategoryList) -> String {
    if categories.is_empty() {
        return "  None detected.".to_string();
    }
    categories
        .iter()
        .map(|category| format!("  • {}", category.label()))
        .collect::<Vec<_>>()
        .join("\n")
}
