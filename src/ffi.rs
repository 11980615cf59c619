/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Python FFI bindings via PyO3.
//!
//! Records and precomputed statistics cross the boundary as JSON text, in
//! the same shape the study runner writes to disk.
//!
//! # Building the Python extension
//!
//! ```bash
//! pip install maturin
//! maturin develop --features python-ffi
//! ```
//!
//! # Usage
//!
//! ```python
//! import json
//! from selection_study import ReportConfig, analyze_json, render_markdown
//!
//! records = open("results/raw_results.json").read()
//! stats = open("results/statistics.json").read()
//!
//! report = json.loads(analyze_json(records, stats))
//! print(report["conclusions"]["status"])
//!
//! cfg = ReportConfig(baseline="random", highlight_limit=5)
//! print(render_markdown(records, config=cfg))
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::ReportConfig;
use crate::error::AnalysisError;
use crate::pipeline::run;
use crate::record::Strategy;
use crate::render;
use crate::report::{Report, SCENARIO_LISTING_LIMIT};
use crate::store::JsonRecordSource;

fn to_py_err(e: AnalysisError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

// ── ReportConfig ─────────────────────────────────────────────────────────────

/// Report tunables.
///
/// Args:
///     treatment:             strategy compared in the conclusions (default "emotion_modulated")
///     baseline:              strategy compared against (default "fixed_priority")
///     highlight_limit:       entries per modifier-highlight list (default 10)
///     cross_check_tolerance: float tolerance for precomputed statistics (default 1e-4)
///     prefer_precomputed:    build sections from precomputed statistics (default False)
///     title:                 report heading
#[pyclass(name = "ReportConfig")]
#[derive(Clone)]
pub struct PyReportConfig {
    inner: ReportConfig,
}

#[pymethods]
impl PyReportConfig {
    /// Create a config. Omitted arguments keep their defaults.
    #[new]
    #[pyo3(signature = (
        treatment = "emotion_modulated",
        baseline = "fixed_priority",
        highlight_limit = 10,
        cross_check_tolerance = 1e-4,
        prefer_precomputed = false,
        title = None
    ))]
    pub fn new(
        treatment: &str,
        baseline: &str,
        highlight_limit: usize,
        cross_check_tolerance: f64,
        prefer_precomputed: bool,
        title: Option<String>,
    ) -> PyResult<Self> {
        let defaults = ReportConfig::default();
        let inner = ReportConfig {
            treatment: Strategy::from(treatment),
            baseline: Strategy::from(baseline),
            highlight_limit,
            cross_check_tolerance,
            prefer_precomputed,
            title: title.unwrap_or(defaults.title),
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Parse a config from JSON text.
    #[staticmethod]
    pub fn from_json(json: &str) -> PyResult<Self> {
        ReportConfig::from_json_str(json).map(|inner| Self { inner }).map_err(to_py_err)
    }

    /// Treatment strategy name.
    #[getter]
    pub fn treatment(&self) -> String {
        self.inner.treatment.to_string()
    }

    /// Baseline strategy name.
    #[getter]
    pub fn baseline(&self) -> String {
        self.inner.baseline.to_string()
    }

    /// Entries per modifier-highlight list.
    #[getter]
    pub fn highlight_limit(&self) -> usize {
        self.inner.highlight_limit
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!(
            "ReportConfig(treatment='{}', baseline='{}', highlight_limit={})",
            self.inner.treatment, self.inner.baseline, self.inner.highlight_limit
        )
    }
}

// ── Functions ────────────────────────────────────────────────────────────────

fn build_report(records_json: &str, statistics_json: Option<&str>, config: Option<PyRef<'_, PyReportConfig>>) -> PyResult<Report> {
    let mut source = JsonRecordSource::new(records_json);
    if let Some(stats) = statistics_json {
        source = source.with_statistics(stats);
    }
    let config = config.map(|c| c.inner.clone()).unwrap_or_default();
    run(&source, &config).map_err(to_py_err)
}

/// Analyze a JSON record array and return the report as JSON text.
///
/// Args:
///     records_json:    JSON array of interaction records
///     statistics_json: optional JSON array of precomputed strategy statistics
///     config:          optional ReportConfig
///
/// Raises:
///     ValueError: malformed records or an empty record array
#[pyfunction]
#[pyo3(signature = (records_json, statistics_json = None, config = None))]
pub fn analyze_json(
    records_json: &str,
    statistics_json: Option<&str>,
    config: Option<PyRef<'_, PyReportConfig>>,
) -> PyResult<String> {
    let report = build_report(records_json, statistics_json, config)?;
    serde_json::to_string(&report).map_err(|e| to_py_err(e.into()))
}

/// Analyze a JSON record array and render the report as Markdown.
#[pyfunction]
#[pyo3(signature = (records_json, statistics_json = None, config = None))]
pub fn render_markdown(
    records_json: &str,
    statistics_json: Option<&str>,
    config: Option<PyRef<'_, PyReportConfig>>,
) -> PyResult<String> {
    build_report(records_json, statistics_json, config).map(|r| render::markdown(&r))
}

/// Analyze a JSON record array and render the 80-column text report.
#[pyfunction]
#[pyo3(signature = (records_json, statistics_json = None, config = None))]
pub fn render_text(
    records_json: &str,
    statistics_json: Option<&str>,
    config: Option<PyRef<'_, PyReportConfig>>,
) -> PyResult<String> {
    build_report(records_json, statistics_json, config).map(|r| render::text(&r))
}

// ── Module entry point ────────────────────────────────────────────────────────

/// Behavior priority study analysis.
///
/// Compares behavior-selection strategies from recorded interactions.
#[pymodule]
pub fn selection_study(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyReportConfig>()?;
    m.add_function(wrap_pyfunction!(analyze_json, m)?)?;
    m.add_function(wrap_pyfunction!(render_markdown, m)?)?;
    m.add_function(wrap_pyfunction!(render_text, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("SCENARIO_LISTING_LIMIT", SCENARIO_LISTING_LIMIT)?;
    Ok(())
}
