//! Entity extraction from normalized farm-plan text.
//!
//! Rule-based keyword detection only. Each of the six registries in
//! [`crate::registry`] is searched independently; the first registry entry
//! with a matching keyword supplies the field's value.

use crate::registry::{
    KeywordRegistry, CROP_REGISTRY, FINANCIAL_DEPENDENCY_REGISTRY, IRRIGATION_REGISTRY,
    LOCATION_REGISTRY, MARKET_DEPENDENCY_REGISTRY, MONTH_REGISTRY,
};
use crate::types::DecisionContext;
use crate::CoreError;

/// Extract a [`DecisionContext`] from a normalized plan description.
///
/// The input is expected to be lowercased and whitespace-collapsed by
/// [`crate::ingestion::normalize_input`]; it is lowercased again here so the
/// function stands on its own.
///
/// # Errors
///
/// [`CoreError::EmptyInput`] if the text is empty or whitespace-only.
///
/// # Example
///
/// ```rust,ignore
/// let ctx = extract_entities("i grow rice in tamil nadu using borewell in june")?;
/// assert_eq!(ctx.crop, Some(Crop::Rice));
/// assert_eq!(ctx.irrigation, Some(Irrigation::Irrigated));
/// ```
pub fn extract_entities(plan_text: &str) -> Result<DecisionContext, CoreError> {
    if plan_text.trim().is_empty() {
        return Err(CoreError::EmptyInput("plan_text"));
    }

    let text = plan_text.to_lowercase();

    let context = DecisionContext {
        crop: lookup(&CROP_REGISTRY, &text),
        month: lookup(&MONTH_REGISTRY, &text),
        location: lookup(&LOCATION_REGISTRY, &text),
        irrigation: lookup(&IRRIGATION_REGISTRY, &text),
        market_dependency: lookup(&MARKET_DEPENDENCY_REGISTRY, &text),
        financial_dependency: lookup(&FINANCIAL_DEPENDENCY_REGISTRY, &text),
    };

    Ok(context)
}

fn lookup<T: Copy + std::fmt::Display>(registry: &KeywordRegistry<T>, text: &str) -> Option<T> {
    let hit = registry.first_match_with_keyword(text);
    if let Some((token, keyword)) = &hit {
        tracing::debug!(
            registry = registry.name(),
            keyword = %keyword,
            token = %token,
            "Keyword matched"
        );
    }
    hit.map(|(token, _)| token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Crop, FinancialDependency, Irrigation, Location, MarketDependency, Month};

    #[test]
    fn test_extracts_full_plan() {
        let ctx = extract_entities("i grow rice in tamil nadu using borewell in june").unwrap();

        assert_eq!(ctx.crop, Some(Crop::Rice));
        assert_eq!(ctx.month, Some(Month::June));
        assert_eq!(ctx.location, Some(Location::TamilNadu));
        assert_eq!(ctx.irrigation, Some(Irrigation::Irrigated));
        assert_eq!(ctx.market_dependency, None);
        assert_eq!(ctx.financial_dependency, None);
    }

    #[test]
    fn test_extracts_dependencies() {
        let ctx = extract_entities("cotton farmer rainfed taken a kcc loan sells in mandi").unwrap();

        assert_eq!(ctx.crop, Some(Crop::Cotton));
        assert_eq!(ctx.irrigation, Some(Irrigation::Rainfed));
        assert_eq!(ctx.financial_dependency, Some(FinancialDependency::Loan));
        assert_eq!(ctx.market_dependency, Some(MarketDependency::High));
    }

    #[test]
    fn test_wheat_punjab_kcc() {
        let ctx = extract_entities("wheat farmer in punjab rainfed taken a kcc loan").unwrap();

        assert_eq!(ctx.crop, Some(Crop::Wheat));
        assert_eq!(ctx.month, None);
        assert_eq!(ctx.location, Some(Location::Punjab));
        assert_eq!(ctx.irrigation, Some(Irrigation::Rainfed));
        assert_eq!(ctx.financial_dependency, Some(FinancialDependency::Loan));
    }

    #[test]
    fn test_unknown_text_yields_empty_context() {
        let ctx = extract_entities("some random text").unwrap();
        assert_eq!(ctx, DecisionContext::empty());
    }

    #[test]
    fn test_registry_priority_over_text_position() {
        // wheat is mentioned first but rice is registered first
        let ctx = extract_entities("wheat last year, rice this year").unwrap();
        assert_eq!(ctx.crop, Some(Crop::Rice));
    }

    #[test]
    fn test_input_is_lowercased_defensively() {
        let ctx = extract_entities("Growing ONION in Karnataka").unwrap();
        assert_eq!(ctx.crop, Some(Crop::Onion));
        assert_eq!(ctx.location, Some(Location::Karnataka));
    }

    #[test]
    fn test_empty_input_is_usage_error() {
        assert!(matches!(extract_entities(""), Err(CoreError::EmptyInput(_))));
        assert!(matches!(extract_entities("   \t"), Err(CoreError::EmptyInput(_))));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let text = "paddy in andhra with drip irrigation, crop insurance via pmfby, in oct";
        let first = extract_entities(text).unwrap();
        let second = extract_entities(text).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.crop, Some(Crop::Rice));
        assert_eq!(first.location, Some(Location::AndhraPradesh));
        assert_eq!(first.financial_dependency, Some(FinancialDependency::Insurance));
        assert_eq!(first.month, Some(Month::October));
    }
}
