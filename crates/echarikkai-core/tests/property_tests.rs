/// Property-based tests using proptest
/// Invariants of extraction, categorization, reply parsing and scoring
use echarikkai_core::{
    adjust_score, categorize_risks, extract_entities, normalize_input, parse_reply, Crop,
    DecisionContext, FinancialDependency, InputType, Irrigation, Location, MarketDependency,
    Month, RiskCategory, WeatherSummary,
};
use proptest::prelude::*;

fn option_of<T: Clone + std::fmt::Debug + 'static>(
    values: &'static [T],
) -> impl Strategy<Value = Option<T>> {
    proptest::option::of(proptest::sample::select(values))
}

prop_compose! {
    fn arb_context()(
        crop in option_of(Crop::ALL),
        month in option_of(Month::ALL),
        location in option_of(Location::ALL),
        irrigation in option_of(Irrigation::ALL),
        market_dependency in option_of(MarketDependency::ALL),
        financial_dependency in option_of(FinancialDependency::ALL),
    ) -> DecisionContext {
        DecisionContext {
            crop,
            month,
            location,
            irrigation,
            market_dependency,
            financial_dependency,
        }
    }
}

prop_compose! {
    fn arb_weather()(
        rainfall in proptest::option::of(prop_oneof![Just(0.0), 0.0f64..500.0]),
        temperature in proptest::option::of(-10.0f64..50.0),
    ) -> WeatherSummary {
        WeatherSummary { temperature, rainfall, wind_speed: None }
    }
}

// Property: extraction never panics and always yields six keys
proptest! {
    #[test]
    fn extraction_always_yields_six_keys(text in "[a-z ]{1,80}") {
        prop_assume!(!text.trim().is_empty());
        let ctx = extract_entities(&text).unwrap();
        let value = serde_json::to_value(&ctx).unwrap();
        prop_assert_eq!(value.as_object().unwrap().len(), 6);
    }

    #[test]
    fn extraction_is_idempotent(text in "\\PC{1,120}") {
        prop_assume!(!text.trim().is_empty());
        let normalized = normalize_input(InputType::Text, &text).unwrap();
        prop_assert_eq!(
            extract_entities(&normalized).unwrap(),
            extract_entities(&normalized).unwrap()
        );
    }

    #[test]
    fn normalization_is_stable(text in "\\PC{1,120}") {
        prop_assume!(!text.trim().is_empty());
        let once = normalize_input(InputType::Text, &text).unwrap();
        prop_assert!(!once.contains("  "));
        prop_assert_eq!(once.trim(), once.as_str());
    }
}

// Property: categorization is ordered, deduplicated and deterministic
proptest! {
    #[test]
    fn categories_follow_fixed_order(ctx in arb_context()) {
        let categories = categorize_risks(&ctx);
        let positions: Vec<usize> = categories
            .iter()
            .map(|c| RiskCategory::ALL.iter().position(|x| x == c).unwrap())
            .collect();

        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(categories.len() <= 5);
        prop_assert_eq!(categories.clone(), categorize_risks(&ctx));
    }

    #[test]
    fn loan_always_means_financial_risk(ctx in arb_context()) {
        let categories = categorize_risks(&ctx);
        prop_assert_eq!(
            categories.contains(RiskCategory::Financial),
            ctx.financial_dependency == Some(FinancialDependency::Loan)
        );
    }
}

// Property: reply parsing is total
proptest! {
    #[test]
    fn parse_never_panics(text in "\\PC*") {
        let _ = parse_reply(&text);
    }

    #[test]
    fn parsed_score_is_in_range(
        header_noise in "[A-Z_: ]{0,20}",
        n in any::<i64>(),
        tail in "[a-z ]{0,10}",
    ) {
        let text = format!("{header_noise}\nRISK_SCORE: {n}{tail}\nCONFIDENCE_LEVEL: {tail}");
        let reply = parse_reply(&text);
        if let Some(score) = reply.risk_score {
            prop_assert!((1..=10).contains(&score.value()));
        }
    }

    #[test]
    fn parsed_items_are_never_placeholders(lines in proptest::collection::vec("[*\\-• ]{0,2}[A-Za-z/ -]{0,12}", 0..8)) {
        let text = format!("HIGH_RISKS:\n{}", lines.join("\n"));
        let reply = parse_reply(&text);
        for item in &reply.high_risks {
            prop_assert!(!item.is_empty());
            let lowered = item.to_lowercase();
            prop_assert!(!["none", "-", "n/a"].contains(&lowered.as_str()));
        }
    }
}

// Property: adjusted score stays in bounds and never exceeds base + 3
proptest! {
    #[test]
    fn adjusted_score_in_bounds(base in -100i64..100, ctx in arb_context(), weather in arb_weather()) {
        let score = adjust_score(base, &ctx, &weather).value() as i64;
        prop_assert!((1..=10).contains(&score));
        prop_assert!(score <= (base + 3).max(1));
        prop_assert!(score >= base.clamp(1, 10));
    }
}
