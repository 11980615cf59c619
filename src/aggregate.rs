/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Partitioning of interaction records by strategy and by scenario.
//!
//! Groups hold references into the caller's record slice, in source order.
//! Keys are enumerated in first-seen order.
//!
//! # Invariants
//!
//! - Every input record lands in exactly one strategy group and exactly one
//!   (scenario, strategy) group; group sizes sum to the input length.
//! - No group is ever re-sorted.
//! - Empty input yields empty mappings.

use serde::Serialize;

use crate::ordered::{OrderedMap, OrderedMultiMap};
use crate::record::{InteractionRecord, Strategy};

/// Strategy → records, in source order.
pub type StrategyGroups<'a> = OrderedMultiMap<Strategy, &'a InteractionRecord>;

/// Scenario → strategy → records, in source order.
pub type ScenarioGroups<'a> = OrderedMap<String, StrategyGroups<'a>>;

/// Grouped view over one record slice.
#[derive(Clone, Debug, Serialize)]
pub struct Aggregation<'a> {
    by_strategy: StrategyGroups<'a>,
    by_scenario: ScenarioGroups<'a>,
    #[serde(skip)]
    record_count: usize,
}

/// Group `records` by strategy and by (scenario, strategy) in a single pass.
pub fn aggregate(records: &[InteractionRecord]) -> Aggregation<'_> {
    let mut by_strategy = StrategyGroups::new();
    let mut by_scenario = ScenarioGroups::new();

    for record in records {
        by_strategy.push(record.strategy.clone(), record);
        by_scenario
            .get_or_insert_with(record.scenario.clone(), StrategyGroups::new)
            .push(record.strategy.clone(), record);
    }

    tracing::debug!(
        records = records.len(),
        strategies = by_strategy.len(),
        scenarios = by_scenario.len(),
        "aggregated interaction records"
    );

    Aggregation {
        by_strategy,
        by_scenario,
        record_count: records.len(),
    }
}

impl<'a> Aggregation<'a> {
    /// Strategy → records mapping.
    pub fn by_strategy(&self) -> &StrategyGroups<'a> {
        &self.by_strategy
    }

    /// Scenario → strategy → records mapping.
    pub fn by_scenario(&self) -> &ScenarioGroups<'a> {
        &self.by_scenario
    }

    /// Number of records the aggregation was built from.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Strategies in first-seen order.
    pub fn strategies(&self) -> impl Iterator<Item = &Strategy> {
        self.by_strategy.keys()
    }

    /// Scenarios in first-seen order.
    pub fn scenarios(&self) -> impl Iterator<Item = &str> {
        self.by_scenario.keys().map(String::as_str)
    }

    /// Records for one strategy, or `None` if the strategy never occurs.
    pub fn strategy_group(&self, strategy: &Strategy) -> Option<&[&'a InteractionRecord]> {
        self.by_strategy.get(strategy).map(Vec::as_slice)
    }

    /// Records for one (scenario, strategy) pair. Empty when the pair never occurs.
    pub fn scenario_group(&self, scenario: &str, strategy: &Strategy) -> &[&'a InteractionRecord] {
        self.by_scenario
            .get(scenario)
            .and_then(|groups| groups.get(strategy))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(strategy: Strategy, scenario: &str, step: u32, behavior: &str) -> InteractionRecord {
        InteractionRecord::new(strategy, scenario, step, behavior, 1)
    }

    fn sample() -> Vec<InteractionRecord> {
        vec![
            rec(Strategy::FixedPriority, "ambush", 1, "flee"),
            rec(Strategy::EmotionModulated, "ambush", 1, "cautious"),
            rec(Strategy::FixedPriority, "greeting", 1, "greet"),
            rec(Strategy::Random, "ambush", 1, "joyful"),
            rec(Strategy::FixedPriority, "ambush", 2, "flee"),
            rec(Strategy::EmotionModulated, "greeting", 1, "friendly"),
        ]
    }

    #[test]
    fn test_partition_sizes_sum_to_input() {
        let records = sample();
        let agg = aggregate(&records);
        assert_eq!(agg.by_strategy().total_len(), records.len());
        let nested: usize = agg.by_scenario().values().map(|g| g.total_len()).sum();
        assert_eq!(nested, records.len());
        assert_eq!(agg.record_count(), records.len());
    }

    #[test]
    fn test_groups_keep_source_order() {
        let records = sample();
        let agg = aggregate(&records);
        let fixed = agg.strategy_group(&Strategy::FixedPriority).unwrap();
        let steps: Vec<(&str, u32)> = fixed.iter().map(|r| (r.scenario.as_str(), r.step)).collect();
        assert_eq!(steps, [("ambush", 1), ("greeting", 1), ("ambush", 2)]);
    }

    #[test]
    fn test_keys_in_first_seen_order() {
        let records = sample();
        let agg = aggregate(&records);
        let strategies: Vec<&Strategy> = agg.strategies().collect();
        assert_eq!(
            strategies,
            [&Strategy::FixedPriority, &Strategy::EmotionModulated, &Strategy::Random]
        );
        assert_eq!(agg.scenarios().collect::<Vec<_>>(), ["ambush", "greeting"]);
    }

    #[test]
    fn test_absent_pair_is_empty_slice() {
        let records = sample();
        let agg = aggregate(&records);
        assert!(agg.scenario_group("greeting", &Strategy::Random).is_empty());
        assert!(agg.scenario_group("nowhere", &Strategy::Random).is_empty());
        assert_eq!(agg.scenario_group("ambush", &Strategy::FixedPriority).len(), 2);
    }

    #[test]
    fn test_empty_input_gives_empty_mappings() {
        let agg = aggregate(&[]);
        assert!(agg.by_strategy().is_empty());
        assert!(agg.by_scenario().is_empty());
        assert_eq!(agg.record_count(), 0);
    }
}
