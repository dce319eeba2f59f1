//! Market rule
//!
//! **Question**: Is income tied to volatile market prices?
//!
//! Fires on an explicit high or medium market dependency, or on a crop whose
//! price is known to swing.

use crate::types::{Crop, DecisionContext, MarketDependency};

use super::{RiskCategory, RiskFinding, RiskRule};

/// Crops whose income is strongly price dependent.
pub const PRICE_SENSITIVE_CROPS: &[Crop] = &[
    Crop::Cotton,
    Crop::Sugarcane,
    Crop::Tomato,
    Crop::Onion,
    Crop::Chilli,
    Crop::Groundnut,
    Crop::Soybean,
    Crop::Mango,
];

/// The market rule.
pub struct MarketRule;

impl RiskRule for MarketRule {
    fn category(&self) -> RiskCategory {
        RiskCategory::Market
    }

    fn evaluate(&self, context: &DecisionContext) -> Option<RiskFinding> {
        let mut finding = RiskFinding::new(self.category());

        if let Some(dependency @ (MarketDependency::High | MarketDependency::Medium)) =
            context.market_dependency
        {
            finding
                .reasons
                .push(format!("{dependency} dependence on market sales"));
        }

        if let Some(crop) = context.crop.filter(|c| PRICE_SENSITIVE_CROPS.contains(c)) {
            finding
                .reasons
                .push(format!("{crop} prices are volatile"));
        }

        finding.into_option()
    }
}
