use proptest::prelude::*;
use selection_study::metrics::{expected_match_rate, shannon_entropy};
use selection_study::{aggregate, analyze, render, InteractionRecord, ReportConfig, Strategy};

fn strategy_from(i: u8) -> Strategy {
    match i % 4 {
        0 => Strategy::FixedPriority,
        1 => Strategy::EmotionModulated,
        2 => Strategy::Random,
        _ => Strategy::from("round_robin"),
    }
}

prop_compose! {
    fn arb_record()(
        s in 0u8..4,
        scenario in 0u8..3,
        step in 1u32..10,
        behavior in 0u8..6,
        modifier in -5i32..=5,
        matched in any::<bool>(),
    ) -> InteractionRecord {
        InteractionRecord::new(strategy_from(s), format!("scenario_{scenario}"), step, format!("behavior_{behavior}"), 5)
            .with_modifier(modifier)
            .matching(matched)
    }
}

proptest! {
    #[test]
    fn partition_sizes_sum_to_input(records in prop::collection::vec(arb_record(), 0..60)) {
        let agg = aggregate(&records);
        prop_assert_eq!(agg.by_strategy().total_len(), records.len());
        let nested: usize = agg.by_scenario().values().map(|g| g.total_len()).sum();
        prop_assert_eq!(nested, records.len());
    }

    #[test]
    fn single_behavior_has_zero_variety(n in 1usize..200) {
        prop_assert_eq!(shannon_entropy(&[n]), Some(0.0));
    }

    #[test]
    fn uniform_behaviors_reach_log2_k(k in 1usize..32, each in 1usize..20) {
        let counts = vec![each; k];
        let h = shannon_entropy(&counts).unwrap();
        prop_assert!((h - (k as f64).log2()).abs() < 1e-9, "h={} k={}", h, k);
    }

    #[test]
    fn entropy_bounded_by_log2_of_distinct(counts in prop::collection::vec(1usize..50, 1..20)) {
        let h = shannon_entropy(&counts).unwrap();
        prop_assert!(h >= 0.0);
        prop_assert!(h <= (counts.len() as f64).log2() + 1e-9);
    }

    #[test]
    fn match_rate_monotone_in_matches(size in 1usize..40, flips in 0usize..40) {
        let flips = flips.min(size);
        let mut records: Vec<InteractionRecord> = (0..size)
            .map(|i| InteractionRecord::new(Strategy::Random, "s", i as u32, "wave", 1))
            .collect();
        let mut previous = {
            let refs: Vec<&InteractionRecord> = records.iter().collect();
            expected_match_rate(&refs).unwrap()
        };
        for i in 0..flips {
            records[i].matches_expected = true;
            let refs: Vec<&InteractionRecord> = records.iter().collect();
            let rate = expected_match_rate(&refs).unwrap();
            prop_assert!(rate >= previous);
            prop_assert!((0.0..=100.0).contains(&rate));
            previous = rate;
        }
    }

    #[test]
    fn rendering_is_deterministic(records in prop::collection::vec(arb_record(), 1..40)) {
        let config = ReportConfig::default();
        let a = analyze(&records, None, &config).unwrap();
        let b = analyze(&records, None, &config).unwrap();
        prop_assert_eq!(render::markdown(&a), render::markdown(&b));
        prop_assert_eq!(render::text(&a), render::text(&b));
    }

    #[test]
    fn distribution_percentages_sum_to_hundred(records in prop::collection::vec(arb_record(), 1..40)) {
        let report = analyze(&records, None, &ReportConfig::default()).unwrap();
        for section in &report.strategies {
            let total: usize = section.distribution.iter().map(|s| s.count).sum();
            prop_assert_eq!(total, section.total_interactions);
            let pct: f64 = section.distribution.iter().map(|s| s.percentage).sum();
            prop_assert!((pct - 100.0).abs() < 1e-6);
        }
    }
}
