/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Error taxonomy for the analysis pipeline.
//!
//! Record-level and input-level errors abort a run. Group-level errors
//! ([`AnalysisError::EmptyGroup`], [`AnalysisError::MissingStrategy`],
//! [`AnalysisError::DivisionByZero`]) are caught by the reporter and surfaced
//! as explicitly flagged sections instead.

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, AnalysisError>;

/// Everything that can go wrong while loading, aggregating, measuring or
/// reporting on interaction records.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// A record is missing a field the aggregation cannot do without.
    #[error("malformed record at index {index}: missing required field `{field}`")]
    MalformedRecord {
        /// Position of the record in the source sequence.
        index: usize,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A metric that divides by the group size was requested on an empty group.
    #[error("strategy group `{strategy}` has no records")]
    EmptyGroup {
        /// Strategy whose group is empty.
        strategy: String,
    },

    /// A strategy required for cross-strategy conclusions is absent.
    #[error("missing {strategy} data")]
    MissingStrategy {
        /// Name of the absent strategy.
        strategy: String,
    },

    /// A derived ratio would divide by zero.
    #[error("division by zero while computing {quantity}")]
    DivisionByZero {
        /// Name of the quantity being computed.
        quantity: &'static str,
    },

    /// The record collection was empty where a non-empty sequence was required.
    #[error("no interaction records supplied")]
    EmptyInput,

    /// The source document was not a JSON array.
    #[error("expected a sequence of {what}")]
    NotASequence {
        /// What the sequence should have contained.
        what: &'static str,
    },

    /// Externally supplied statistics contradict themselves.
    #[error("inconsistent statistics for `{strategy}`: {reason}")]
    InconsistentStatistics {
        /// Strategy whose statistics failed validation.
        strategy: String,
        /// Human-readable description of the inconsistency.
        reason: String,
    },

    /// A record element has a field of the wrong JSON type.
    #[error("invalid record at index {index}: {source}")]
    InvalidRecord {
        /// Zero-based position in the input sequence.
        index: usize,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// A report configuration value is out of range.
    #[error("invalid report config: `{field}` {reason}")]
    InvalidConfig {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// JSON parse failure in the record store adapter.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure in the record store adapter.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// `true` for errors that are localized to one group and must not abort a run.
    pub fn is_group_local(&self) -> bool {
        matches!(
            self,
            Self::EmptyGroup { .. } | Self::MissingStrategy { .. } | Self::DivisionByZero { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_strategy_message_reads_naturally() {
        let err = AnalysisError::MissingStrategy { strategy: "fixed_priority".into() };
        assert_eq!(err.to_string(), "missing fixed_priority data");
    }

    #[test]
    fn test_group_local_classification() {
        assert!(AnalysisError::EmptyGroup { strategy: "random".into() }.is_group_local());
        assert!(AnalysisError::DivisionByZero { quantity: "x" }.is_group_local());
        assert!(!AnalysisError::EmptyInput.is_group_local());
        assert!(!AnalysisError::MalformedRecord { index: 0, field: "strategy" }.is_group_local());
    }
}
