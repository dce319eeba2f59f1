//! Missing-field advisor.
//!
//! Four context fields are critical for a meaningful assessment. For each
//! one the text did not mention, the farmer is asked a fixed question.

use crate::types::{ContextField, DecisionContext};

/// Critical fields, in the order questions are asked.
pub const CRITICAL_FIELDS: [ContextField; 4] = [
    ContextField::Crop,
    ContextField::Month,
    ContextField::Location,
    ContextField::Irrigation,
];

/// The follow-up question for a critical field.
///
/// Returns `None` for fields that are not critical.
pub fn question_for(field: ContextField) -> Option<&'static str> {
    match field {
        ContextField::Crop => Some("Which crop are you planning to grow this season?"),
        ContextField::Month => Some("Which month are you planning to start or are currently in?"),
        ContextField::Location => Some("Which state or district is your farm located in?"),
        ContextField::Irrigation => Some(
            "What is the irrigation status of your farm? \
             (e.g. irrigated, rainfed, or partially irrigated)",
        ),
        ContextField::MarketDependency | ContextField::FinancialDependency => None,
    }
}

/// Critical fields that are unset, in [`CRITICAL_FIELDS`] order.
pub fn missing_critical_fields(context: &DecisionContext) -> Vec<ContextField> {
    CRITICAL_FIELDS
        .iter()
        .copied()
        .filter(|field| !context.is_set(*field))
        .collect()
}

/// Follow-up questions for every unset critical field.
pub fn follow_up_questions(context: &DecisionContext) -> Vec<String> {
    missing_critical_fields(context)
        .into_iter()
        .filter_map(question_for)
        .map(str::to_string)
        .collect()
}
