//! Deterministic score correction.
//!
//! The reasoning step proposes a base score; three fixed adjustments are
//! added on top and the result is clamped into `[1, 10]`:
//!
//! | Condition | Delta |
//! |-----------|-------|
//! | irrigation unset or `none` | +1 |
//! | rainfall reported and exactly zero | +1 |
//! | financed by a loan | +1 |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reply::RiskScore;
use crate::types::{DecisionContext, FinancialDependency, Irrigation};
use crate::weather::WeatherSummary;

/// Base score used when the reasoning reply carries none.
pub const DEFAULT_BASE_SCORE: i64 = 5;

/// One fired adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreAdjustment {
    NoConfirmedIrrigation,
    ZeroRainfall,
    LoanExposure,
}

impl ScoreAdjustment {
    pub fn delta(&self) -> i64 {
        1
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScoreAdjustment::NoConfirmedIrrigation => "no confirmed water source",
            ScoreAdjustment::ZeroRainfall => "zero rainfall recorded",
            ScoreAdjustment::LoanExposure => "active loan exposure",
        }
    }
}

impl fmt::Display for ScoreAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} {}", self.delta(), self.description())
    }
}

/// The adjustments that apply, in fixed order.
pub fn score_adjustments(
    context: &DecisionContext,
    weather: &WeatherSummary,
) -> Vec<ScoreAdjustment> {
    let mut adjustments = Vec::new();

    if matches!(context.irrigation, None | Some(Irrigation::NoSource)) {
        adjustments.push(ScoreAdjustment::NoConfirmedIrrigation);
    }

    if weather.rainfall == Some(0.0) {
        adjustments.push(ScoreAdjustment::ZeroRainfall);
    }

    if context.financial_dependency == Some(FinancialDependency::Loan) {
        adjustments.push(ScoreAdjustment::LoanExposure);
    }

    adjustments
}

/// Apply the adjustments to `base` and clamp into `[1, 10]`.
///
/// The base itself is not validated; only the result is clamped.
pub fn adjust_score(base: i64, context: &DecisionContext, weather: &WeatherSummary) -> RiskScore {
    let adjustments = score_adjustments(context, weather);
    let total: i64 = adjustments.iter().map(ScoreAdjustment::delta).sum();
    let score = RiskScore::clamped(base.saturating_add(total));

    tracing::debug!(
        base,
        adjustments = ?adjustments,
        score = score.value(),
        "Adjusted risk score"
    );

    score
}
