//! Weather rule
//!
//! **Question**: Is the crop exposed to rain failure or sown out of season?
//!
//! Fires when the farm is rainfed, or when both crop and month are known
//! and the month falls outside the crop's season.

use crate::types::{DecisionContext, Irrigation};

use super::seasons::is_out_of_season;
use super::{RiskCategory, RiskFinding, RiskRule};

/// The weather rule.
pub struct WeatherRule;

impl RiskRule for WeatherRule {
    fn category(&self) -> RiskCategory {
        RiskCategory::Weather
    }

    fn evaluate(&self, context: &DecisionContext) -> Option<RiskFinding> {
        let mut finding = RiskFinding::new(self.category());

        if context.irrigation == Some(Irrigation::Rainfed) {
            finding
                .reasons
                .push("rainfed farm depends entirely on rainfall".to_string());
        }

        if let (Some(crop), Some(month)) = (context.crop, context.month) {
            if is_out_of_season(crop, month) {
                finding
                    .reasons
                    .push(format!("{month} is outside the usual {crop} season"));
            }
        }

        finding.into_option()
    }
}
