//! File-backed record source tests.
//!
//! Covers reading runner output and configuration from disk, and the error
//! paths for missing files and malformed documents.

use std::fs;

use selection_study::{
    run, AnalysisError, FileRecordSource, RecordSource, ReportConfig, StrategyStatistics,
};

const RAW_RESULTS: &str = r#"[
    {"strategy":"fixed_priority","scenario":"threatening_situation","step":1,"description":"A bandit draws a blade",
     "selected_behavior":"FleeBehavior","base_priority":8,"emotional_modifier":0,"final_priority":8,
     "valence":0.0,"arousal":0.0,"response":"...","matches_expected":true},
    {"strategy":"random_selection","scenario":"threatening_situation","step":1,
     "selected_behavior":"JoyfulBehavior","base_priority":3,"matches_expected":false},
    {"strategy":"emotion_modulated","scenario":"threatening_situation","step":1,
     "selected_behavior":"CautiousBehavior","base_priority":6,"emotional_modifier":3,"final_priority":9,
     "dominant_emotion":"fear","dominant_value":0.72,"matches_expected":true}
]"#;

// ─── test 1: records only ────────────────────────────────────────────────────

#[test]
fn test_reads_runner_output_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw_results.json");
    fs::write(&path, RAW_RESULTS).unwrap();

    let source = FileRecordSource::new(&path);
    let records = source.load_records().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].strategy.as_str(), "random");
    assert!(source.load_statistics().unwrap().is_none());

    let report = run(&source, &ReportConfig::default()).unwrap();
    assert_eq!(report.strategies.len(), 3);
    assert!(report.cross_check.is_none());
}

// ─── test 2: with statistics ─────────────────────────────────────────────────

#[test]
fn test_reads_statistics_file_and_cross_checks() {
    let dir = tempfile::tempdir().unwrap();
    let records_path = dir.path().join("raw_results.json");
    fs::write(&records_path, RAW_RESULTS).unwrap();

    let source = FileRecordSource::new(&records_path);
    let recomputed: Vec<StrategyStatistics> = run(&source, &ReportConfig::default())
        .unwrap()
        .strategies
        .iter()
        .map(|s| StrategyStatistics {
            strategy: s.strategy.clone(),
            total_interactions: s.total_interactions,
            behavior_counts: s.distribution.iter().map(|b| (b.behavior.clone(), b.count)).collect(),
            variety_score: s.variety_score,
            expected_match_rate: s.expected_match_rate,
            avg_priority_override: s.avg_priority_override,
        })
        .collect();

    let stats_path = dir.path().join("statistics.json");
    fs::write(&stats_path, serde_json::to_string_pretty(&recomputed).unwrap()).unwrap();

    let source = FileRecordSource::new(&records_path).with_statistics(&stats_path);
    assert_eq!(source.load_statistics().unwrap().map(|s| s.len()), Some(3));
    let report = run(&source, &ReportConfig::default()).unwrap();
    assert_eq!(report.cross_check.map(|m| m.len()), Some(0));
}

// ─── test 3: failures ────────────────────────────────────────────────────────

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = FileRecordSource::new(dir.path().join("absent.json"));
    assert!(matches!(source.load_records().unwrap_err(), AnalysisError::Io(_)));
}

#[test]
fn test_truncated_document_is_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw_results.json");
    fs::write(&path, &RAW_RESULTS[..40]).unwrap();
    let err = FileRecordSource::new(&path).load_records().unwrap_err();
    assert!(matches!(err, AnalysisError::Json(_)));
}

#[test]
fn test_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    fs::write(&path, r#"{"baseline": "random_selection", "title": "Pilot run"}"#).unwrap();

    let config = ReportConfig::load(&path).unwrap();
    assert_eq!(config.baseline.as_str(), "random");
    assert_eq!(config.title, "Pilot run");
    assert_eq!(config.highlight_limit, 10);
}
