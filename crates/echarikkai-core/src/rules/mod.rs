//! Risk categorization rules.
//!
//! Five independent rules inspect a [`DecisionContext`]. Each one lives in
//! its own module and answers a single question:
//!
//! | Rule | Question |
//! |------|----------|
//! | Weather | Is the crop exposed to rain failure or sown out of season? |
//! | Resource | Does the farm lack a reliable water source? |
//! | Market | Is income tied to volatile market prices? |
//! | Financial | Is the plan carrying active debt? |
//! | Operational | Is the plan too vague, or leaning on external support? |
//!
//! All rules are always evaluated; their results never influence each other.

mod financial;
mod market;
mod operational;
mod resource;
pub mod seasons;
mod weather;

pub use financial::FinancialRule;
pub use market::MarketRule;
pub use operational::OperationalRule;
pub use resource::ResourceRule;
pub use weather::WeatherRule;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::DecisionContext;

/// A risk category label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskCategory {
    #[serde(rename = "Weather Risk")]
    Weather,
    #[serde(rename = "Resource Risk")]
    Resource,
    #[serde(rename = "Market Risk")]
    Market,
    #[serde(rename = "Financial Risk")]
    Financial,
    #[serde(rename = "Operational Risk")]
    Operational,
}

impl RiskCategory {
    /// All categories, in evaluation order.
    pub const ALL: [RiskCategory; 5] = [
        RiskCategory::Weather,
        RiskCategory::Resource,
        RiskCategory::Market,
        RiskCategory::Financial,
        RiskCategory::Operational,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::Weather => "Weather Risk",
            RiskCategory::Resource => "Resource Risk",
            RiskCategory::Market => "Market Risk",
            RiskCategory::Financial => "Financial Risk",
            RiskCategory::Operational => "Operational Risk",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An ordered list of risk categories without duplicates.
///
/// Insertion order is preserved; pushing a category already present is a
/// no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RiskCategory>", into = "Vec<RiskCategory>")]
pub struct RiskCategoryList(Vec<RiskCategory>);

impl RiskCategoryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a category unless already present. Returns whether it was added.
    pub fn push(&mut self, category: RiskCategory) -> bool {
        if self.0.contains(&category) {
            return false;
        }
        self.0.push(category);
        true
    }

    pub fn contains(&self, category: RiskCategory) -> bool {
        self.0.contains(&category)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[RiskCategory] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RiskCategory> {
        self.0.iter()
    }
}

impl From<Vec<RiskCategory>> for RiskCategoryList {
    fn from(categories: Vec<RiskCategory>) -> Self {
        let mut list = Self::new();
        for category in categories {
            list.push(category);
        }
        list
    }
}

impl From<RiskCategoryList> for Vec<RiskCategory> {
    fn from(list: RiskCategoryList) -> Self {
        list.0
    }
}

impl<'a> IntoIterator for &'a RiskCategoryList {
    type Item = &'a RiskCategory;
    type IntoIter = std::slice::Iter<'a, RiskCategory>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for RiskCategoryList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.0.iter().map(|c| c.label()).collect();
        f.write_str(&labels.join(", "))
    }
}

/// A triggered category and the sub-rules that fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFinding {
    pub category: RiskCategory,
    pub reasons: Vec<String>,
}

impl RiskFinding {
    /// A finding with no reasons yet.
    pub fn new(category: RiskCategory) -> Self {
        Self {
            category,
            reasons: Vec::new(),
        }
    }

    /// `Some(self)` if any reason was recorded.
    pub fn into_option(self) -> Option<Self> {
        if self.reasons.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// A single risk rule.
pub trait RiskRule: Send + Sync {
    /// The category this rule can trigger.
    fn category(&self) -> RiskCategory;

    /// Evaluate the context; `None` when the rule does not fire.
    fn evaluate(&self, context: &DecisionContext) -> Option<RiskFinding>;
}

/// The rules in evaluation order.
pub fn rules() -> [&'static dyn RiskRule; 5] {
    [
        &WeatherRule,
        &ResourceRule,
        &MarketRule,
        &FinancialRule,
        &OperationalRule,
    ]
}

/// Evaluate every rule and return each finding, in evaluation order.
pub fn explain_risks(context: &DecisionContext) -> Vec<RiskFinding> {
    rules()
        .iter()
        .filter_map(|rule| {
            let finding = rule.evaluate(context);
            if let Some(finding) = &finding {
                tracing::debug!(
                    category = %finding.category,
                    reasons = ?finding.reasons,
                    "Risk rule fired"
                );
            }
            finding
        })
        .collect()
}

/// Map a context to its risk categories.
///
/// # Example
///
/// ```rust,ignore
/// let categories = categorize_risks(&DecisionContext::empty());
/// assert_eq!(categories.to_string(), "Resource Risk, Operational Risk");
/// ```
pub fn categorize_risks(context: &DecisionContext) -> RiskCategoryList {
    let mut categories = RiskCategoryList::new();
    for finding in explain_risks(context) {
        categories.push(finding.category);
    }
    categories
}
