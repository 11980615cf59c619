/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Record store adapter: turns JSON documents into validated records and
//! optional precomputed statistics.
//!
//! The record document is a JSON array of objects. Only `strategy` and
//! `selected_behavior` are required; everything else defaults:
//!
//! | Field | Default when absent |
//! |-------|---------------------|
//! | `scenario` | `""` |
//! | `step`, `base_priority`, `emotional_modifier` | `0` |
//! | `final_priority` | derived from strategy, base and modifier |
//! | `dominant_emotion`, `dominant_value`, `description` | absent |
//! | `matches_expected` | derived from `expected_category` if present, else `false` |
//!
//! Unknown fields (`valence`, `arousal`, `response`, ...) are ignored.
//!
//! This is the only module that performs I/O.

use std::io::Read;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AnalysisError, Result};
use crate::metrics::StrategyStatistics;
use crate::record::{final_priority_for, matches_expected_category, InteractionRecord, Strategy};

// ─── RecordSource ───────────────────────────────────────────────────────────

/// Anything that can supply interaction records and, optionally, precomputed
/// statistics for the same run.
pub trait RecordSource {
    /// Load and validate every interaction record.
    fn load_records(&self) -> Result<Vec<InteractionRecord>>;

    /// Load precomputed statistics, if this source has any.
    fn load_statistics(&self) -> Result<Option<Vec<StrategyStatistics>>> {
        Ok(None)
    }
}

/// In-memory JSON documents.
#[derive(Clone, Debug)]
pub struct JsonRecordSource {
    records: String,
    statistics: Option<String>,
}

impl JsonRecordSource {
    /// Source with a record document only.
    pub fn new(records: impl Into<String>) -> Self {
        Self { records: records.into(), statistics: None }
    }

    /// Attach a precomputed statistics document.
    pub fn with_statistics(mut self, statistics: impl Into<String>) -> Self {
        self.statistics = Some(statistics.into());
        self
    }
}

impl RecordSource for JsonRecordSource {
    fn load_records(&self) -> Result<Vec<InteractionRecord>> {
        parse_records(&self.records)
    }

    fn load_statistics(&self) -> Result<Option<Vec<StrategyStatistics>>> {
        self.statistics.as_deref().map(parse_statistics).transpose()
    }
}

/// Record and statistics documents on disk.
#[derive(Clone, Debug)]
pub struct FileRecordSource {
    records_path: PathBuf,
    statistics_path: Option<PathBuf>,
}

impl FileRecordSource {
    /// Source reading records from `records_path`.
    pub fn new(records_path: impl Into<PathBuf>) -> Self {
        Self { records_path: records_path.into(), statistics_path: None }
    }

    /// Also read precomputed statistics from `path`.
    pub fn with_statistics(mut self, path: impl Into<PathBuf>) -> Self {
        self.statistics_path = Some(path.into());
        self
    }
}

impl RecordSource for FileRecordSource {
    fn load_records(&self) -> Result<Vec<InteractionRecord>> {
        tracing::debug!(path = %self.records_path.display(), "reading interaction records");
        let file = std::fs::File::open(&self.records_path)?;
        read_records(std::io::BufReader::new(file))
    }

    fn load_statistics(&self) -> Result<Option<Vec<StrategyStatistics>>> {
        let Some(path) = &self.statistics_path else {
            return Ok(None);
        };
        tracing::debug!(path = %path.display(), "reading precomputed statistics");
        let text = std::fs::read_to_string(path)?;
        parse_statistics(&text).map(Some)
    }
}

// ─── Parsing ────────────────────────────────────────────────────────────────

/// Wire shape of one record: everything optional, validated afterwards.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRecord {
    strategy: Option<String>,
    scenario: Option<String>,
    step: Option<u32>,
    selected_behavior: Option<String>,
    base_priority: Option<u32>,
    emotional_modifier: Option<i32>,
    final_priority: Option<i32>,
    dominant_emotion: Option<String>,
    dominant_value: Option<f32>,
    matches_expected: Option<bool>,
    expected_category: Option<String>,
    description: Option<String>,
}

impl RawRecord {
    fn validate(self, index: usize) -> Result<InteractionRecord> {
        let strategy = required(self.strategy, index, "strategy")?;
        let selected_behavior = required(self.selected_behavior, index, "selected_behavior")?;
        let strategy = Strategy::from(strategy);

        let base_priority = self.base_priority.unwrap_or(0);
        let emotional_modifier = self.emotional_modifier.unwrap_or(0);
        let final_priority = self
            .final_priority
            .unwrap_or_else(|| final_priority_for(&strategy, base_priority, emotional_modifier));
        let matches_expected = match (self.matches_expected, &self.expected_category) {
            (Some(flag), _) => flag,
            (None, Some(category)) => matches_expected_category(&selected_behavior, category),
            (None, None) => false,
        };

        Ok(InteractionRecord {
            strategy,
            scenario: self.scenario.unwrap_or_default(),
            step: self.step.unwrap_or(0),
            selected_behavior,
            base_priority,
            emotional_modifier,
            final_priority,
            dominant_emotion: self.dominant_emotion,
            dominant_value: self.dominant_value,
            matches_expected,
            description: self.description,
        })
    }
}

fn required(value: Option<String>, index: usize, field: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AnalysisError::MalformedRecord { index, field }),
    }
}

fn expect_array(value: Value, what: &'static str) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(AnalysisError::NotASequence { what }),
    }
}

fn records_from_value(value: Value) -> Result<Vec<InteractionRecord>> {
    let items = expect_array(value, "interaction records")?;
    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<RawRecord>(item)
                .map_err(|source| AnalysisError::InvalidRecord { index, source })?
                .validate(index)
        })
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(count = records.len(), "loaded interaction records");
    Ok(records)
}

/// Parse a JSON array of interaction records.
///
/// The first malformed record aborts the load with
/// [`AnalysisError::MalformedRecord`].
pub fn parse_records(json: &str) -> Result<Vec<InteractionRecord>> {
    records_from_value(serde_json::from_str(json)?)
}

/// Like [`parse_records`], reading from any `Read`.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<InteractionRecord>> {
    records_from_value(serde_json::from_reader(reader)?)
}

/// Parse a JSON array of precomputed strategy statistics.
///
/// Only the shape is checked here; consistency is checked per strategy with
/// [`StrategyStatistics::validate`] so one bad entry does not hide the others.
pub fn parse_statistics(json: &str) -> Result<Vec<StrategyStatistics>> {
    let items = expect_array(serde_json::from_str(json)?, "strategy statistics")?;
    let stats = items
        .into_iter()
        .map(serde_json::from_value::<StrategyStatistics>)
        .collect::<core::result::Result<Vec<_>, _>>()?;
    tracing::debug!(count = stats.len(), "loaded precomputed statistics");
    Ok(stats)
}
