//! Operational rule
//!
//! **Question**: Is the plan too vague to execute, or leaning on external
//! support?
//!
//! Fires when two or more critical fields are unknown, or when the plan
//! depends on a subsidy or insurance payout.

use crate::questions::missing_critical_fields;
use crate::types::{DecisionContext, FinancialDependency};

use super::{RiskCategory, RiskFinding, RiskRule};

/// Number of unknown critical fields at which a plan counts as vague.
pub const VAGUE_PLAN_THRESHOLD: usize = 2;

/// The operational rule.
pub struct OperationalRule;

impl RiskRule for OperationalRule {
    fn category(&self) -> RiskCategory {
        RiskCategory::Operational
    }

    fn evaluate(&self, context: &DecisionContext) -> Option<RiskFinding> {
        let mut finding = RiskFinding::new(self.category());

        let missing = missing_critical_fields(context);
        if missing.len() >= VAGUE_PLAN_THRESHOLD {
            let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
            finding
                .reasons
                .push(format!("plan is missing {}", names.join(", ")));
        }

        if let Some(dependency @ (FinancialDependency::Subsidy | FinancialDependency::Insurance)) =
            context.financial_dependency
        {
            finding
                .reasons
                .push(format!("plan relies on {dependency}"));
        }

        finding.into_option()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Crop, Irrigation, Location, Month};

    #[test]
    fn test_two_missing_fields_fire() {
        let ctx = DecisionContext {
            crop: Some(Crop::Banana),
            month: Some(Month::March),
            ..Default::default()
        };
        let finding = OperationalRule.evaluate(&ctx).unwrap();
        assert_eq!(finding.reasons, vec!["plan is missing location, irrigation"]);
    }

    #[test]
    fn test_one_missing_field_is_quiet() {
        let ctx = DecisionContext {
            crop: Some(Crop::Banana),
            month: Some(Month::March),
            location: Some(Location::Kerala),
            ..Default::default()
        };
        assert!(OperationalRule.evaluate(&ctx).is_none());
    }

    #[test]
    fn test_external_support_fires() {
        let ctx = DecisionContext {
            crop: Some(Crop::Turmeric),
            month: Some(Month::July),
            location: Some(Location::Telangana),
            irrigation: Some(Irrigation::Irrigated),
            financial_dependency: Some(FinancialDependency::Insurance),
            ..Default::default()
        };
        let finding = OperationalRule.evaluate(&ctx).unwrap();
        assert_eq!(finding.reasons, vec!["plan relies on insurance"]);
    }
}
