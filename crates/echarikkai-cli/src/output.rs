//! Plain-text rendering for terminal output.

use std::fmt::Write;

use echarikkai_core::{
    Analysis, ContextField, DecisionContext, MarketContext, ReasoningReply, RiskCategoryList,
    RiskFinding, RiskScore, ScoreAdjustment, WeatherSummary,
};
use echarikkai_runtime::Assessment;

pub fn context(context: &DecisionContext) -> String {
    ContextField::ALL
        .iter()
        .map(|field| {
            format!(
                "{:<21} {}",
                format!("{}:", field.as_str()),
                context.field_token(*field).unwrap_or("-")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn categories(categories: &RiskCategoryList) -> String {
    if categories.is_empty() {
        "No risk categories triggered".to_string()
    } else {
        categories.to_string()
    }
}

pub fn findings(findings: &[RiskFinding]) -> String {
    if findings.is_empty() {
        return "No risk categories triggered".to_string();
    }

    let mut out = String::new();
    for finding in findings {
        let _ = writeln!(out, "{}", finding.category);
        for reason in &finding.reasons {
            let _ = writeln!(out, "  - {reason}");
        }
    }
    out.trim_end().to_string()
}

pub fn reply(reply: &ReasoningReply) -> String {
    let mut out = String::new();
    section(&mut out, "High risks", &reply.high_risks);
    section(&mut out, "Medium risks", &reply.medium_risks);
    section(&mut out, "Assumptions", &reply.assumptions);
    section(&mut out, "Mitigation", &reply.mitigation);

    let score = reply
        .risk_score
        .map(|s| s.value().to_string())
        .unwrap_or_else(|| "-".to_string());
    let confidence = reply
        .confidence_level
        .map(|c| c.as_str())
        .unwrap_or("-");
    let _ = writeln!(out, "Risk score: {score}");
    let _ = write!(out, "Confidence: {confidence}");
    out
}

fn section(out: &mut String, title: &str, items: &[String]) {
    let _ = writeln!(out, "{title}:");
    if items.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for item in items {
        let _ = writeln!(out, "  * {item}");
    }
}

pub fn score(base: i64, adjustments: &[ScoreAdjustment], score: RiskScore) -> String {
    let mut parts = vec![format!("base {base}")];
    parts.extend(adjustments.iter().map(ToString::to_string));
    format!("Risk score: {}/10 ({})", score.value(), parts.join(", "))
}

fn weather(weather: &WeatherSummary) -> String {
    if !weather.is_available() {
        return "unavailable".to_string();
    }
    let reading = |v: Option<f64>, unit: &str| match v {
        Some(v) => format!("{v} {unit}"),
        None => "-".to_string(),
    };
    format!(
        "{}, rain {}, wind {}",
        reading(weather.temperature, "°C"),
        reading(weather.rainfall, "mm"),
        reading(weather.wind_speed, "km/h"),
    )
}

fn market(market: &MarketContext) -> String {
    let token = |t: Option<&'static str>| t.unwrap_or("-");
    format!(
        "price {}, volatility {}, demand {}",
        token(market.price_trend.map(|t| t.as_str())),
        token(market.volatility.map(|l| l.as_str())),
        token(market.demand_level.map(|l| l.as_str())),
    )
}

pub fn analysis(analysis: &Analysis, market_context: Option<&MarketContext>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", context(&analysis.context));
    let _ = writeln!(out);
    let _ = writeln!(out, "Risk categories: {}", categories(&analysis.categories));

    if let Some(m) = market_context {
        let _ = writeln!(out, "Market: {}", market(m));
    }

    if !analysis.questions.is_empty() {
        let _ = writeln!(out, "\nTo sharpen this assessment:");
        for question in &analysis.questions {
            let _ = writeln!(out, "  ? {question}");
        }
    }
    out.trim_end().to_string()
}

pub fn assessment(assessment: &Assessment) -> String {
    let mut out = analysis(&assessment.analysis, None);
    let _ = writeln!(out);
    let _ = writeln!(out, "Weather: {}", weather(&assessment.weather));
    let _ = writeln!(out, "Market: {}", market(&assessment.market));
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", reply(&assessment.reply));
    let _ = writeln!(out);
    let _ = write!(
        out,
        "{}",
        score(
            assessment.base_score,
            &assessment.adjustments,
            assessment.final_score
        )
    );

    if assessment.used_fallback() {
        let _ = write!(
            out,
            "\nNote: reasoning backend unavailable, manual review required"
        );
    }
    out
}
