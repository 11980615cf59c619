//! # selection-study
//!
//! Strategy-comparison analysis for the behavior priority study.
//!
//! An agent faces a set of scripted scenarios and picks one behavior per
//! step. Several selection strategies run over the same scenarios:
//! fixed priority, random choice, and emotion-modulated priority. This crate
//! turns the resulting interaction records into per-strategy statistics and a
//! comparative report.
//!
//! ---
//!
//! ## The pipeline
//!
//! ```text
//! RecordSource → [InteractionRecord] → Aggregation → StrategyStatistics → Report → render
//!                                          │                 ↑
//!                                          │        precomputed statistics
//!                                          │         (validate, cross-check)
//!                                          └── scenario listings, modifier highlights,
//!                                              emotion × behavior table
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`record`] | [`Strategy`], [`InteractionRecord`] | One agent decision and the strategy that made it |
//! | [`ordered`] | [`OrderedMap`], [`OrderedMultiMap`] | Insertion-ordered maps used for every grouping |
//! | [`aggregate`] | [`Aggregation`] | Partition records by strategy and by scenario |
//! | [`metrics`] | [`StrategyStatistics`], [`StatisticsIndex`] | Variety score, match rate, override average; cross-check |
//! | [`report`] | [`Report`], [`ConclusionsSection`] | Comparative report composition |
//! | [`render`] | [`render::markdown`], [`render::text`] | Markdown and plain-text output |
//! | [`store`] | [`RecordSource`] | JSON and file loading; the only I/O |
//! | [`pipeline`] | [`analyze`], [`run`] | End-to-end analysis |
//! | [`config`] | [`ReportConfig`] | Report tunables |
//! | [`error`] | [`AnalysisError`] | Error type |
//!
//! ## Example
//!
//! ```
//! use selection_study::{analyze, render, InteractionRecord, ReportConfig, Strategy};
//!
//! let records = vec![
//!     InteractionRecord::new(Strategy::FixedPriority, "greeting", 1, "greet", 5),
//!     InteractionRecord::new(Strategy::FixedPriority, "greeting", 2, "wave", 4),
//!     InteractionRecord::new(Strategy::EmotionModulated, "greeting", 1, "joyful", 4)
//!         .with_modifier(2)
//!         .with_emotion("joy", 0.8),
//! ];
//! let report = analyze(&records, None, &ReportConfig::default()).unwrap();
//! assert!(render::markdown(&report).contains("### Fixed Priority"));
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber.
//!
//! ## Python bindings
//!
//! Enable the `python-ffi` feature for a PyO3 extension module (see [`ffi`]).
//!
//! ## License
//!
//! Business Source License 1.1.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod aggregate;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ordered;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod report;
pub mod store;

#[cfg(feature = "python-ffi")]
pub mod ffi;

pub use aggregate::{aggregate, Aggregation};
pub use config::ReportConfig;
pub use error::{AnalysisError, Result};
pub use metrics::{compute_statistics, cross_check, StatisticsIndex, StatisticsMismatch, StrategyStatistics};
pub use ordered::{OrderedMap, OrderedMultiMap};
pub use pipeline::{analyze, run};
pub use record::{InteractionRecord, Strategy};
pub use report::{compose_report, ConclusionsSection, Report};
pub use store::{FileRecordSource, JsonRecordSource, RecordSource};
