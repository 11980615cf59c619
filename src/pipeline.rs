/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! End-to-end analysis: aggregate → compute → (validate, cross-check) → compose.
//!
//! # Invariants
//!
//! - Running twice on the same input yields equal reports.
//! - A failing strategy group or a rejected precomputed entry becomes a note
//!   on the report; it never aborts the run.
//! - Only an out-of-range config or an empty record set is fatal here.

use hashbrown::HashSet;

use crate::aggregate::aggregate;
use crate::config::ReportConfig;
use crate::error::{AnalysisError, Result};
use crate::metrics::{compute_statistics, cross_check, StrategyStatistics};
use crate::record::{InteractionRecord, Strategy};
use crate::report::{compose_report, Report, StatisticsSource};
use crate::store::RecordSource;

/// Keep the precomputed entries that pass validation; describe the rest.
///
/// Only the first entry for a strategy is considered; repeats are rejected.
fn validated(precomputed: &[StrategyStatistics]) -> (Vec<StrategyStatistics>, Vec<String>) {
    let mut valid = Vec::with_capacity(precomputed.len());
    let mut notes = Vec::new();
    let mut seen: HashSet<&Strategy> = HashSet::new();
    for stats in precomputed {
        let verdict = if seen.insert(&stats.strategy) {
            stats.validate().map_err(|e| e.to_string())
        } else {
            Err("duplicate entry".to_owned())
        };
        match verdict {
            Ok(()) => valid.push(stats.clone()),
            Err(reason) => {
                tracing::warn!(strategy = %stats.strategy, reason = %reason, "precomputed statistics rejected");
                notes.push(format!("precomputed statistics for {} rejected: {reason}", stats.strategy));
            }
        }
    }
    (valid, notes)
}

/// Analyze a record collection, optionally against precomputed statistics.
///
/// Fails with [`AnalysisError::InvalidConfig`] for an out-of-range config and
/// [`AnalysisError::EmptyInput`] when `records` is empty.
pub fn analyze(
    records: &[InteractionRecord],
    precomputed: Option<&[StrategyStatistics]>,
    config: &ReportConfig,
) -> Result<Report> {
    config.validate()?;
    if records.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    tracing::info!(
        records = records.len(),
        precomputed = precomputed.is_some(),
        "starting strategy comparison"
    );

    let aggregation = aggregate(records);
    let outcome = compute_statistics(&aggregation);
    let mut notes: Vec<String> = outcome
        .failures
        .iter()
        .map(|f| format!("{} metrics unavailable: {}", f.strategy, f.reason))
        .collect();

    let (accepted, mismatches) = match precomputed {
        Some(precomputed) => {
            let (valid, rejected) = validated(precomputed);
            notes.extend(rejected);
            let mismatches = cross_check(&outcome.statistics, &valid, config.cross_check_tolerance);
            (Some(valid), Some(mismatches))
        }
        None => (None, None),
    };

    let (statistics, source) = match accepted {
        Some(valid) if config.prefer_precomputed && !valid.is_empty() => (valid, StatisticsSource::Precomputed),
        _ => (outcome.statistics, StatisticsSource::Recomputed),
    };

    let mut report = compose_report(&statistics, &aggregation, config);
    report.statistics_source = source;
    report.cross_check = mismatches;
    report.notes = notes;

    tracing::info!(
        strategies = report.strategies.len(),
        scenarios = report.scenarios.len(),
        notes = report.notes.len(),
        "strategy comparison complete"
    );
    Ok(report)
}

/// Load everything from `source` and analyze it.
pub fn run(source: &impl RecordSource, config: &ReportConfig) -> Result<Report> {
    let records = source.load_records()?;
    let precomputed = source.load_statistics()?;
    analyze(&records, precomputed.as_deref(), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::StrategyStatistics;
    use crate::report::ConclusionsSection;

    fn records() -> Vec<InteractionRecord> {
        vec![
            InteractionRecord::new(Strategy::FixedPriority, "ambush", 1, "flee", 8),
            InteractionRecord::new(Strategy::FixedPriority, "ambush", 2, "greet", 3),
            InteractionRecord::new(Strategy::EmotionModulated, "ambush", 1, "cautious", 6)
                .with_modifier(2)
                .with_emotion("fear", 0.7)
                .matching(true),
            InteractionRecord::new(Strategy::EmotionModulated, "ambush", 2, "flee", 8).with_modifier(-1),
        ]
    }

    #[test]
    fn test_empty_input_is_fatal() {
        let err = analyze(&[], None, &ReportConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput));
    }

    #[test]
    fn test_out_of_range_tolerance_is_fatal() {
        let config = ReportConfig { cross_check_tolerance: -1.0, ..ReportConfig::default() };
        let err = analyze(&records(), None, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig { .. }));
    }

    #[test]
    fn test_recomputed_run_has_no_cross_check() {
        let report = analyze(&records(), None, &ReportConfig::default()).unwrap();
        assert_eq!(report.statistics_source, StatisticsSource::Recomputed);
        assert!(report.cross_check.is_none());
        assert!(report.notes.is_empty());
        assert!(matches!(report.conclusions, ConclusionsSection::Available(_)));
    }

    #[test]
    fn test_invalid_precomputed_entry_becomes_note() {
        let recs = records();
        let agg = aggregate(&recs);
        let mut stats = compute_statistics(&agg).statistics;
        stats[0].total_interactions = 99;

        let report = analyze(&recs, Some(&stats), &ReportConfig::default()).unwrap();
        assert_eq!(report.notes.len(), 1);
        assert!(report.notes[0].starts_with("precomputed statistics for fixed_priority rejected"));
        // the rejected entry is absent from the precomputed side of the cross-check
        let mismatches = report.cross_check.unwrap();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].field, "strategy");
    }

    #[test]
    fn test_prefer_precomputed_uses_supplied_sections() {
        let recs = records();
        let agg = aggregate(&recs);
        let mut stats: Vec<StrategyStatistics> = compute_statistics(&agg).statistics;
        stats[1].variety_score = 0.5;

        let config = ReportConfig { prefer_precomputed: true, ..ReportConfig::default() };
        let report = analyze(&recs, Some(&stats), &config).unwrap();
        assert_eq!(report.statistics_source, StatisticsSource::Precomputed);
        assert_eq!(report.strategies[1].variety_score, 0.5);

        let mismatches = report.cross_check.unwrap();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].field, "variety_score");
    }

    #[test]
    fn test_duplicate_precomputed_strategy_rejected() {
        let recs = records();
        let agg = aggregate(&recs);
        let mut stats = compute_statistics(&agg).statistics;
        let mut repeat = stats[0].clone();
        repeat.variety_score = 0.25;
        stats.push(repeat);

        let config = ReportConfig { prefer_precomputed: true, ..ReportConfig::default() };
        let report = analyze(&recs, Some(&stats), &config).unwrap();
        assert_eq!(report.notes, ["precomputed statistics for fixed_priority rejected: duplicate entry"]);
        assert_eq!(report.strategies.len(), 2);
        assert_eq!(report.strategies[0].variety_score, 1.0);
        assert_eq!(report.scenarios[0].choices.len(), 2);
        assert_eq!(report.cross_check.map(|m| m.len()), Some(0));
    }

    #[test]
    fn test_prefer_precomputed_falls_back_when_none_valid() {
        let recs = records();
        let agg = aggregate(&recs);
        let mut stats = compute_statistics(&agg).statistics;
        for s in &mut stats {
            s.expected_match_rate = 250.0;
        }

        let config = ReportConfig { prefer_precomputed: true, ..ReportConfig::default() };
        let report = analyze(&recs, Some(&stats), &config).unwrap();
        assert_eq!(report.statistics_source, StatisticsSource::Recomputed);
        assert_eq!(report.notes.len(), 2);
        assert_eq!(report.strategies.len(), 2);
        assert!(report.strategies.iter().all(|s| s.expected_match_rate <= 100.0));
    }
}
