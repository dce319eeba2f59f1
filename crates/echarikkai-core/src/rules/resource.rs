//! Resource rule
//!
//! **Question**: Does the farm lack a reliable water source?

use crate::types::{DecisionContext, Irrigation};

use super::{RiskCategory, RiskFinding, RiskRule};

/// The resource rule.
pub struct ResourceRule;

impl RiskRule for ResourceRule {
    fn category(&self) -> RiskCategory {
        RiskCategory::Resource
    }

    fn evaluate(&self, context: &DecisionContext) -> Option<RiskFinding> {
        let reason = match context.irrigation {
            None => "irrigation status is unknown",
            Some(Irrigation::NoSource) => "farm has no water source",
            Some(Irrigation::Rainfed) => "no irrigation beyond rainfall",
            Some(Irrigation::Irrigated | Irrigation::PartiallyIrrigated) => return None,
        };

        let mut finding = RiskFinding::new(self.category());
        finding.reasons.push(reason.to_string());
        Some(finding)
    }
}
