//! Financial rule
//!
//! **Question**: Is the plan carrying active debt?

use crate::types::{DecisionContext, FinancialDependency};

use super::{RiskCategory, RiskFinding, RiskRule};

/// The financial rule. Only a loan triggers it.
pub struct FinancialRule;

impl RiskRule for FinancialRule {
    fn category(&self) -> RiskCategory {
        RiskCategory::Financial
    }

    fn evaluate(&self, context: &DecisionContext) -> Option<RiskFinding> {
        if context.financial_dependency != Some(FinancialDependency::Loan) {
            return None;
        }

        let mut finding = RiskFinding::new(self.category());
        finding
            .reasons
            .push("plan is financed by a loan".to_string());
        Some(finding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_loan_fires() {
        for dependency in FinancialDependency::ALL {
            let ctx = DecisionContext {
                financial_dependency: Some(*dependency),
                ..Default::default()
            };
            let fired = FinancialRule.evaluate(&ctx).is_some();
            assert_eq!(fired, *dependency == FinancialDependency::Loan, "{dependency}");
        }
        assert!(FinancialRule.evaluate(&DecisionContext::empty()).is_none());
    }
}
