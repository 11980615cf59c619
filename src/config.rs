/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Report configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::record::Strategy;

/// Tunables for one report-generation run.
///
/// Every field has a default, so a config file only needs the fields it
/// changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Strategy treated as the treatment in the conclusions.
    /// Default: `emotion_modulated`.
    pub treatment: Strategy,

    /// Strategy the treatment is compared against.
    /// Default: `fixed_priority`.
    pub baseline: Strategy,

    /// Entries in each modifier-highlight list. Default: 10.
    pub highlight_limit: usize,

    /// Absolute tolerance when cross-checking precomputed float metrics.
    /// Default: 1e-4 (precomputed statistics are often stored as `f32`).
    pub cross_check_tolerance: f64,

    /// Build per-strategy sections from precomputed statistics when they are
    /// supplied. Default: `false` (recompute from records).
    pub prefer_precomputed: bool,

    /// Top-level heading of rendered reports.
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            treatment: Strategy::EmotionModulated,
            baseline: Strategy::FixedPriority,
            highlight_limit: 10,
            cross_check_tolerance: 1e-4,
            prefer_precomputed: false,
            title: "Behavior Priority Study - Results".to_owned(),
        }
    }
}

impl ReportConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges: the tolerance must be a finite non-negative number.
    pub fn validate(&self) -> Result<()> {
        let tol = self.cross_check_tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(AnalysisError::InvalidConfig {
                field: "cross_check_tolerance",
                reason: format!("must be finite and non-negative, got {tol}"),
            });
        }
        Ok(())
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
