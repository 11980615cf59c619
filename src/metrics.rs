/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Per-strategy metrics: behavior counts, variety, expected-match rate and
//! average priority override.
//!
//! # Metrics
//!
//! ```text
//! variety   = −Σ pᵢ · log2(pᵢ)          pᵢ = countᵢ / total, summed in first-seen order
//! match     = 100 × matches / total
//! override  = Σ emotional_modifier / total
//! ```
//!
//! # Invariants
//!
//! - `behavior_counts` sums to `total_interactions`.
//! - A degenerate distribution (one distinct behavior) has variety exactly 0.
//! - An empty group is an [`AnalysisError::EmptyGroup`], never a NaN.
//! - Entropy is accumulated in first-seen order, so identical input order
//!   gives bit-identical output.
//!
//! Statistics may also arrive precomputed from the record store. Those are
//! checked with [`StrategyStatistics::validate`] and compared against the
//! recomputed values with [`cross_check`].

use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregation;
use crate::error::{AnalysisError, Result};
use crate::ordered::OrderedMap;
use crate::record::{InteractionRecord, Strategy};

/// Behavior → occurrence count, in first-seen order.
pub type BehaviorCounts = OrderedMap<String, usize>;

// ─── Primitive metrics ──────────────────────────────────────────────────────

/// Count selections per behavior, preserving first-seen order.
pub fn behavior_counts(records: &[&InteractionRecord]) -> BehaviorCounts {
    let mut counts = BehaviorCounts::new();
    for record in records {
        *counts.get_or_insert_with(record.selected_behavior.clone(), || 0) += 1;
    }
    counts
}

/// Base-2 Shannon entropy of a frequency distribution.
///
/// Zero counts contribute nothing (0 · log2 0 = 0). Returns `None` when the
/// counts sum to zero.
pub fn shannon_entropy(counts: &[usize]) -> Option<f64> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return None;
    }
    let total = total as f64;
    let entropy = counts
        .iter()
        .filter(|&&c| c > 0)
        .fold(0.0_f64, |acc, &c| {
            let p = c as f64 / total;
            acc - p * p.log2()
        });
    Some(entropy)
}

/// Percentage of records flagged `matches_expected`. `None` for an empty group.
pub fn expected_match_rate(records: &[&InteractionRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let matches = records.iter().filter(|r| r.matches_expected).count();
    Some(100.0 * matches as f64 / records.len() as f64)
}

/// Arithmetic mean of `emotional_modifier`. `None` for an empty group.
pub fn avg_priority_override(records: &[&InteractionRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let sum: i64 = records.iter().map(|r| i64::from(r.emotional_modifier)).sum();
    Some(sum as f64 / records.len() as f64)
}

// ─── StrategyStatistics ─────────────────────────────────────────────────────

/// Summary metrics for one strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyStatistics {
    /// Strategy these statistics describe.
    pub strategy: Strategy,
    /// Number of records in the group.
    pub total_interactions: usize,
    /// Selection count per behavior, first-seen order.
    pub behavior_counts: BehaviorCounts,
    /// Shannon entropy of `behavior_counts`, in bits.
    pub variety_score: f64,
    /// Percentage of records matching the expected category, in [0, 100].
    pub expected_match_rate: f64,
    /// Mean emotional modifier over the group.
    pub avg_priority_override: f64,
}

impl StrategyStatistics {
    /// Compute statistics for one strategy group.
    ///
    /// Fails with [`AnalysisError::EmptyGroup`] when `records` is empty.
    pub fn from_group(strategy: &Strategy, records: &[&InteractionRecord]) -> Result<Self> {
        let empty = || AnalysisError::EmptyGroup { strategy: strategy.to_string() };

        let behavior_counts = behavior_counts(records);
        let counts: Vec<usize> = behavior_counts.values().copied().collect();
        let variety_score = shannon_entropy(&counts).ok_or_else(empty)?;
        let expected_match_rate = expected_match_rate(records).ok_or_else(empty)?;
        let avg_priority_override = avg_priority_override(records).ok_or_else(empty)?;

        Ok(Self {
            strategy: strategy.clone(),
            total_interactions: records.len(),
            behavior_counts,
            variety_score,
            expected_match_rate,
            avg_priority_override,
        })
    }

    /// Check the internal consistency of externally supplied statistics.
    pub fn validate(&self) -> Result<()> {
        let inconsistent = |reason: String| AnalysisError::InconsistentStatistics {
            strategy: self.strategy.to_string(),
            reason,
        };

        if self.total_interactions == 0 {
            return Err(AnalysisError::EmptyGroup { strategy: self.strategy.to_string() });
        }
        let counted: usize = self.behavior_counts.values().sum();
        if counted != self.total_interactions {
            return Err(inconsistent(format!(
                "behavior counts sum to {counted}, total_interactions is {}",
                self.total_interactions
            )));
        }
        if !(0.0..=100.0).contains(&self.expected_match_rate) {
            return Err(inconsistent(format!(
                "expected_match_rate {} outside [0, 100]",
                self.expected_match_rate
            )));
        }
        if !self.variety_score.is_finite() || self.variety_score < 0.0 {
            return Err(inconsistent(format!("variety_score {} is not a valid entropy", self.variety_score)));
        }
        if !self.avg_priority_override.is_finite() {
            return Err(inconsistent("avg_priority_override is not finite".into()));
        }
        Ok(())
    }

    /// `count` as a percentage of this strategy's interactions.
    pub fn share_pct(&self, count: usize) -> f64 {
        if self.total_interactions == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.total_interactions as f64
        }
    }
}

// ─── Whole-run computation ──────────────────────────────────────────────────

/// A strategy group whose metrics could not be computed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupFailure {
    /// Strategy of the failed group.
    pub strategy: Strategy,
    /// Error message.
    pub reason: String,
}

/// Statistics for every computable group, plus the groups that failed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsOutcome {
    /// One entry per strategy, in first-seen order.
    pub statistics: Vec<StrategyStatistics>,
    /// Groups whose metrics failed; the rest are unaffected.
    pub failures: Vec<GroupFailure>,
}

/// Compute statistics for every strategy group of an aggregation.
///
/// A failing group is recorded in [`MetricsOutcome::failures`] and does not
/// stop the remaining groups.
pub fn compute_statistics(aggregation: &Aggregation<'_>) -> MetricsOutcome {
    let mut outcome = MetricsOutcome::default();
    for (strategy, records) in aggregation.by_strategy().iter() {
        match StrategyStatistics::from_group(strategy, records) {
            Ok(stats) => {
                tracing::debug!(
                    strategy = %strategy,
                    total = stats.total_interactions,
                    variety = stats.variety_score,
                    match_rate = stats.expected_match_rate,
                    "computed strategy statistics"
                );
                outcome.statistics.push(stats);
            }
            Err(e) => {
                tracing::warn!(strategy = %strategy, error = %e, "strategy metrics unavailable");
                outcome.failures.push(GroupFailure {
                    strategy: strategy.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    outcome
}

// ─── Keyed lookup ───────────────────────────────────────────────────────────

/// Keyed view over a statistics collection.
///
/// When a strategy appears more than once the first entry wins and later
/// ones are ignored.
#[derive(Debug)]
pub struct StatisticsIndex<'s> {
    by_strategy: OrderedMap<Strategy, &'s StrategyStatistics>,
}

impl<'s> StatisticsIndex<'s> {
    /// Index a statistics collection by strategy.
    pub fn new(statistics: &'s [StrategyStatistics]) -> Self {
        let mut by_strategy = OrderedMap::new();
        for stats in statistics {
            by_strategy.get_or_insert_with(stats.strategy.clone(), || stats);
        }
        Self { by_strategy }
    }

    /// Indexed statistics in collection order, one entry per strategy.
    pub fn entries(&self) -> impl Iterator<Item = &'s StrategyStatistics> + '_ {
        self.by_strategy.values().copied()
    }

    /// Statistics for `strategy`, if present.
    pub fn get(&self, strategy: &Strategy) -> Option<&'s StrategyStatistics> {
        self.by_strategy.get(strategy).copied()
    }

    /// Statistics for `strategy`, or [`AnalysisError::MissingStrategy`].
    pub fn require(&self, strategy: &Strategy) -> Result<&'s StrategyStatistics> {
        self.get(strategy).ok_or_else(|| AnalysisError::MissingStrategy {
            strategy: strategy.to_string(),
        })
    }

    /// Indexed strategies in collection order.
    pub fn strategies(&self) -> impl Iterator<Item = &Strategy> {
        self.by_strategy.keys()
    }
}

// ─── Precomputed-path cross-check ───────────────────────────────────────────

/// One disagreement between recomputed and precomputed statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatisticsMismatch {
    /// Strategy the disagreement concerns.
    pub strategy: Strategy,
    /// Field that disagrees.
    pub field: String,
    /// What differs.
    pub detail: String,
}

/// Compare recomputed statistics against a precomputed collection.
///
/// Counts must agree exactly; float metrics within `tolerance`. A strategy
/// present on only one side is reported as a mismatch on `strategy`.
pub fn cross_check(
    recomputed: &[StrategyStatistics],
    precomputed: &[StrategyStatistics],
    tolerance: f64,
) -> Vec<StatisticsMismatch> {
    let ours = StatisticsIndex::new(recomputed);
    let theirs = StatisticsIndex::new(precomputed);
    let mut mismatches = Vec::new();

    let mismatch = |strategy: &Strategy, field: &str, detail: String| StatisticsMismatch {
        strategy: strategy.clone(),
        field: field.to_owned(),
        detail,
    };

    for strategy in ours.strategies() {
        let (Some(a), Some(b)) = (ours.get(strategy), theirs.get(strategy)) else {
            mismatches.push(mismatch(strategy, "strategy", "absent from precomputed statistics".into()));
            continue;
        };

        if a.total_interactions != b.total_interactions {
            mismatches.push(mismatch(
                strategy,
                "total_interactions",
                format!("recomputed {} vs precomputed {}", a.total_interactions, b.total_interactions),
            ));
        }

        for (behavior, &count) in a.behavior_counts.iter() {
            let other = b.behavior_counts.get(behavior).copied().unwrap_or(0);
            if other != count {
                mismatches.push(mismatch(
                    strategy,
                    "behavior_counts",
                    format!("{behavior}: recomputed {count} vs precomputed {other}"),
                ));
            }
        }
        for (behavior, &count) in b.behavior_counts.iter() {
            if !a.behavior_counts.contains_key(behavior) {
                mismatches.push(mismatch(
                    strategy,
                    "behavior_counts",
                    format!("{behavior}: recomputed 0 vs precomputed {count}"),
                ));
            }
        }

        let floats = [
            ("variety_score", a.variety_score, b.variety_score),
            ("expected_match_rate", a.expected_match_rate, b.expected_match_rate),
            ("avg_priority_override", a.avg_priority_override, b.avg_priority_override),
        ];
        for (field, x, y) in floats {
            if !((x - y).abs() <= tolerance) {
                mismatches.push(mismatch(strategy, field, format!("recomputed {x} vs precomputed {y}")));
            }
        }
    }

    for strategy in theirs.strategies() {
        if ours.get(strategy).is_none() {
            mismatches.push(mismatch(strategy, "strategy", "absent from interaction records".into()));
        }
    }

    for m in &mismatches {
        tracing::warn!(strategy = %m.strategy, field = %m.field, detail = %m.detail, "statistics cross-check mismatch");
    }
    mismatches
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;

    fn fixed(behavior: &str) -> InteractionRecord {
        InteractionRecord::new(Strategy::FixedPriority, "s", 1, behavior, 3)
    }

    fn refs(records: &[InteractionRecord]) -> Vec<&InteractionRecord> {
        records.iter().collect()
    }

    #[test]
    fn test_greet_wave_example() {
        let records: Vec<_> = ["greet", "greet", "wave", "greet"].into_iter().map(fixed).collect();
        let stats = StrategyStatistics::from_group(&Strategy::FixedPriority, &refs(&records)).unwrap();

        assert_eq!(stats.total_interactions, 4);
        assert_eq!(stats.behavior_counts.get("greet"), Some(&3));
        assert_eq!(stats.behavior_counts.get("wave"), Some(&1));
        assert_eq!(
            stats.behavior_counts.keys().map(String::as_str).collect::<Vec<_>>(),
            ["greet", "wave"]
        );
        assert!((stats.variety_score - 0.811_278).abs() < 1e-5, "variety={}", stats.variety_score);
        assert_eq!(stats.expected_match_rate, 0.0);
        assert_eq!(stats.avg_priority_override, 0.0);
    }

    #[test]
    fn test_single_behavior_has_zero_variety() {
        let records: Vec<_> = (0..7).map(|_| fixed("greet")).collect();
        let stats = StrategyStatistics::from_group(&Strategy::FixedPriority, &refs(&records)).unwrap();
        assert_eq!(stats.variety_score, 0.0);
        assert!(stats.variety_score.is_sign_positive());
    }

    #[test]
    fn test_uniform_distribution_is_log2_k() {
        for k in 1..=8usize {
            let counts = vec![3usize; k];
            let h = shannon_entropy(&counts).unwrap();
            assert!((h - (k as f64).log2()).abs() < 1e-12, "k={k} h={h}");
        }
    }

    #[test]
    fn test_zero_counts_contribute_nothing() {
        assert_eq!(shannon_entropy(&[4, 0, 4]), shannon_entropy(&[4, 4]));
        assert_eq!(shannon_entropy(&[]), None);
        assert_eq!(shannon_entropy(&[0, 0]), None);
    }

    #[test]
    fn test_modifier_mean_example() {
        let records = vec![
            InteractionRecord::new(Strategy::EmotionModulated, "s", 1, "flee", 5).with_modifier(2),
            InteractionRecord::new(Strategy::EmotionModulated, "s", 2, "flee", 5).with_modifier(-1),
        ];
        let stats = StrategyStatistics::from_group(&Strategy::EmotionModulated, &refs(&records)).unwrap();
        assert_eq!(stats.avg_priority_override, 0.5);
    }

    #[test]
    fn test_match_rate_percentage() {
        let records = vec![fixed("a").matching(true), fixed("b"), fixed("c").matching(true), fixed("d")];
        assert_eq!(expected_match_rate(&refs(&records)), Some(50.0));
    }

    #[test]
    fn test_empty_group_is_error() {
        let err = StrategyStatistics::from_group(&Strategy::Random, &[]).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyGroup { ref strategy } if strategy == "random"));
    }

    #[test]
    fn test_compute_statistics_first_seen_order() {
        let records = vec![
            InteractionRecord::new(Strategy::Random, "s", 1, "a", 1),
            InteractionRecord::new(Strategy::EmotionModulated, "s", 1, "b", 1),
            InteractionRecord::new(Strategy::Random, "s", 2, "c", 1),
        ];
        let outcome = compute_statistics(&aggregate(&records));
        assert!(outcome.failures.is_empty());
        let order: Vec<&Strategy> = outcome.statistics.iter().map(|s| &s.strategy).collect();
        assert_eq!(order, [&Strategy::Random, &Strategy::EmotionModulated]);
        assert_eq!(outcome.statistics[0].variety_score, 1.0);
    }

    #[test]
    fn test_index_lookup_and_require() {
        let records = vec![fixed("a")];
        let stats = vec![StrategyStatistics::from_group(&Strategy::FixedPriority, &refs(&records)).unwrap()];
        let index = StatisticsIndex::new(&stats);
        assert!(index.get(&Strategy::FixedPriority).is_some());
        assert!(index.get(&Strategy::EmotionModulated).is_none());
        let err = index.require(&Strategy::EmotionModulated).unwrap_err();
        assert_eq!(err.to_string(), "missing emotion_modulated data");
    }

    #[test]
    fn test_index_keeps_first_duplicate() {
        let records = vec![fixed("a"), fixed("b")];
        let first = StrategyStatistics::from_group(&Strategy::FixedPriority, &refs(&records)).unwrap();
        let mut second = first.clone();
        second.variety_score = 0.25;
        let stats = vec![first, second];

        let index = StatisticsIndex::new(&stats);
        assert_eq!(index.entries().count(), 1);
        assert_eq!(index.get(&Strategy::FixedPriority).map(|s| s.variety_score), Some(1.0));
    }

    #[test]
    fn test_validate_rejects_count_mismatch() {
        let records = vec![fixed("a"), fixed("b")];
        let mut stats = StrategyStatistics::from_group(&Strategy::FixedPriority, &refs(&records)).unwrap();
        assert!(stats.validate().is_ok());
        stats.total_interactions = 3;
        assert!(matches!(stats.validate(), Err(AnalysisError::InconsistentStatistics { .. })));
    }

    #[test]
    fn test_cross_check_agrees_within_tolerance() {
        let records = vec![fixed("a"), fixed("b"), fixed("a")];
        let ours = vec![StrategyStatistics::from_group(&Strategy::FixedPriority, &refs(&records)).unwrap()];
        let mut theirs = ours.clone();
        theirs[0].variety_score = (theirs[0].variety_score as f32) as f64;
        assert!(cross_check(&ours, &theirs, 1e-4).is_empty());

        theirs[0].behavior_counts.insert("a".into(), 1);
        theirs[0].behavior_counts.insert("z".into(), 1);
        let mismatches = cross_check(&ours, &theirs, 1e-4);
        let fields: Vec<&str> = mismatches.iter().map(|m| m.field.as_str()).collect();
        assert_eq!(fields, ["behavior_counts", "behavior_counts"]);
    }

    #[test]
    fn test_cross_check_reports_one_sided_strategies() {
        let records = vec![fixed("a")];
        let ours = vec![StrategyStatistics::from_group(&Strategy::FixedPriority, &refs(&records)).unwrap()];
        let mismatches = cross_check(&ours, &[], 1e-4);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].field, "strategy");
    }
}
