/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Comparative report composition.
//!
//! A [`Report`] is a plain, serializable value. It holds:
//!
//! - one [`StrategySection`] per strategy, always present;
//! - a [`ConclusionsSection`] comparing the treatment strategy against the
//!   baseline, or the reason it could not be produced;
//! - a per-scenario listing of the first [`SCENARIO_LISTING_LIMIT`] choices of
//!   every strategy;
//! - the largest emotional priority boosts and reductions;
//! - the dominant-emotion × behavior count table.
//!
//! Nothing here performs I/O; see [`crate::render`] for text output.
//!
//! # Conclusions
//!
//! ```text
//! variety_improvement_pct = 100 × (variety_treatment − variety_baseline) / variety_baseline
//! match_rate_difference   = match_rate_treatment − match_rate_baseline      (percentage points)
//! avg_override            = avg_priority_override of the treatment
//! ```
//!
//! A zero baseline variety leaves `variety_improvement_pct` explicitly
//! undefined instead of producing `inf` or `NaN`.

use std::collections::BTreeSet;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregation;
use crate::config::ReportConfig;
use crate::error::{AnalysisError, Result};
use crate::metrics::{StatisticsIndex, StatisticsMismatch, StrategyStatistics};
use crate::record::{InteractionRecord, Strategy};

/// Choices listed per (scenario, strategy) pair.
pub const SCENARIO_LISTING_LIMIT: usize = 5;

// ─── Per-strategy section ───────────────────────────────────────────────────

/// One row of a ranked behavior distribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviorShare {
    /// Behavior identifier.
    pub behavior: String,
    /// Times the behavior was selected.
    pub count: usize,
    /// `count` as a percentage of the strategy's interactions.
    pub percentage: f64,
}

/// Summary of one strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategySection {
    /// Strategy described.
    pub strategy: Strategy,
    /// Number of interactions.
    pub total_interactions: usize,
    /// Shannon entropy of the behavior distribution, in bits.
    pub variety_score: f64,
    /// Expected-match rate, in percent.
    pub expected_match_rate: f64,
    /// Mean emotional modifier.
    pub avg_priority_override: f64,
    /// Behaviors by descending count; ties keep first-seen order.
    pub distribution: Vec<BehaviorShare>,
}

impl StrategySection {
    /// Build a section from computed or precomputed statistics.
    pub fn from_statistics(stats: &StrategyStatistics) -> Self {
        let mut distribution: Vec<BehaviorShare> = stats
            .behavior_counts
            .iter()
            .map(|(behavior, &count)| BehaviorShare {
                behavior: behavior.clone(),
                count,
                percentage: stats.share_pct(count),
            })
            .collect();
        // stable: equal counts stay in first-seen order
        distribution.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            strategy: stats.strategy.clone(),
            total_interactions: stats.total_interactions,
            variety_score: stats.variety_score,
            expected_match_rate: stats.expected_match_rate,
            avg_priority_override: stats.avg_priority_override,
            distribution,
        }
    }
}

// ─── Conclusions ────────────────────────────────────────────────────────────

/// A derived quantity that may be undefined.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedValue {
    /// The value could be computed.
    Defined(f64),
    /// The value has no meaning for this input; the string says why.
    Undefined(String),
}

impl DerivedValue {
    /// The value, if defined.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(*v),
            Self::Undefined(_) => None,
        }
    }
}

/// Treatment-versus-baseline comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conclusions {
    /// Strategy treated as the treatment.
    pub treatment: Strategy,
    /// Strategy compared against.
    pub baseline: Strategy,
    /// Relative variety change, in percent of the baseline variety.
    pub variety_improvement_pct: DerivedValue,
    /// Treatment match rate minus baseline match rate, in percentage points.
    pub match_rate_difference: f64,
    /// Treatment match rate, restated.
    pub treatment_match_rate: f64,
    /// Treatment average priority override, restated.
    pub avg_override: f64,
}

/// Conclusions, or an explicit note that they could not be drawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConclusionsSection {
    /// Both strategies were present.
    Available(Conclusions),
    /// A required strategy was absent.
    Unavailable {
        /// Reader-facing explanation, e.g. `conclusions unavailable: missing fixed_priority data`.
        reason: String,
    },
}

/// Relative variety change of the treatment over the baseline, in percent.
///
/// Fails with [`AnalysisError::DivisionByZero`] when `baseline_variety` is 0.
pub fn variety_improvement_pct(treatment_variety: f64, baseline_variety: f64) -> Result<f64> {
    if baseline_variety == 0.0 {
        return Err(AnalysisError::DivisionByZero { quantity: "variety_improvement_pct" });
    }
    Ok(100.0 * (treatment_variety - baseline_variety) / baseline_variety)
}

/// Draw conclusions from keyed statistics.
///
/// Fails with [`AnalysisError::MissingStrategy`] when either strategy is absent.
pub fn draw_conclusions(
    index: &StatisticsIndex<'_>,
    treatment: &Strategy,
    baseline: &Strategy,
) -> Result<Conclusions> {
    let t = index.require(treatment)?;
    let b = index.require(baseline)?;

    let variety_improvement_pct = match variety_improvement_pct(t.variety_score, b.variety_score) {
        Ok(pct) => DerivedValue::Defined(pct),
        Err(e) => {
            tracing::warn!(baseline = %baseline, error = %e, "variety improvement undefined");
            DerivedValue::Undefined(format!("{e}: {baseline} variety score is zero"))
        }
    };

    Ok(Conclusions {
        treatment: treatment.clone(),
        baseline: baseline.clone(),
        variety_improvement_pct,
        match_rate_difference: t.expected_match_rate - b.expected_match_rate,
        treatment_match_rate: t.expected_match_rate,
        avg_override: t.avg_priority_override,
    })
}

// ─── Scenario listing ───────────────────────────────────────────────────────

/// The first choices one strategy made in one scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyChoices {
    /// Strategy.
    pub strategy: Strategy,
    /// Selected behaviors in step order, at most [`SCENARIO_LISTING_LIMIT`].
    pub behaviors: heapless::Vec<String, SCENARIO_LISTING_LIMIT>,
}

/// Side-by-side choices for one scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioListing {
    /// Scenario identifier.
    pub scenario: String,
    /// One entry per reported strategy, empty when it never ran here.
    pub choices: Vec<StrategyChoices>,
}

fn first_choices(records: &[&InteractionRecord]) -> heapless::Vec<String, SCENARIO_LISTING_LIMIT> {
    records
        .iter()
        .take(SCENARIO_LISTING_LIMIT)
        .map(|r| r.selected_behavior.clone())
        .collect()
}

/// List the first choices of each of `strategies` in every scenario.
pub fn scenario_listings(aggregation: &Aggregation<'_>, strategies: &[Strategy]) -> Vec<ScenarioListing> {
    aggregation
        .scenarios()
        .map(|scenario| ScenarioListing {
            scenario: scenario.to_owned(),
            choices: strategies
                .iter()
                .map(|strategy| StrategyChoices {
                    strategy: strategy.clone(),
                    behaviors: first_choices(aggregation.scenario_group(scenario, strategy)),
                })
                .collect(),
        })
        .collect()
}

// ─── Modifier highlights ────────────────────────────────────────────────────

/// One record with a notable emotional modifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifierHighlight {
    /// Scenario of the record.
    pub scenario: String,
    /// Step of the record.
    pub step: u32,
    /// Behavior selected.
    pub selected_behavior: String,
    /// Emotional modifier applied.
    pub emotional_modifier: i32,
    /// Dominant emotion, if recorded.
    pub dominant_emotion: Option<String>,
    /// Dominant emotion intensity, if recorded.
    pub dominant_value: Option<f32>,
}

impl From<&InteractionRecord> for ModifierHighlight {
    fn from(r: &InteractionRecord) -> Self {
        Self {
            scenario: r.scenario.clone(),
            step: r.step,
            selected_behavior: r.selected_behavior.clone(),
            emotional_modifier: r.emotional_modifier,
            dominant_emotion: r.dominant_emotion.clone(),
            dominant_value: r.dominant_value,
        }
    }
}

/// Largest priority boosts and reductions for one strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifierHighlights {
    /// Strategy the records belong to.
    pub strategy: Strategy,
    /// Positive modifiers, largest first; ties in record order.
    pub boosts: Vec<ModifierHighlight>,
    /// Negative modifiers, most negative first; ties in record order.
    pub reductions: Vec<ModifierHighlight>,
}

/// Pick the `limit` largest boosts and reductions from one group.
pub fn modifier_highlights(
    strategy: &Strategy,
    records: &[&InteractionRecord],
    limit: usize,
) -> ModifierHighlights {
    let mut boosts: Vec<&InteractionRecord> =
        records.iter().copied().filter(|r| r.emotional_modifier > 0).collect();
    boosts.sort_by(|a, b| b.emotional_modifier.cmp(&a.emotional_modifier));

    let mut reductions: Vec<&InteractionRecord> =
        records.iter().copied().filter(|r| r.emotional_modifier < 0).collect();
    reductions.sort_by_key(|r| r.emotional_modifier);

    ModifierHighlights {
        strategy: strategy.clone(),
        boosts: boosts.into_iter().take(limit).map(ModifierHighlight::from).collect(),
        reductions: reductions.into_iter().take(limit).map(ModifierHighlight::from).collect(),
    }
}

// ─── Emotion–behavior association ───────────────────────────────────────────

/// Count table of dominant emotion (rows) × selected behavior (columns).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmotionAssociation {
    /// Row labels, sorted.
    pub emotions: Vec<String>,
    /// Column labels, sorted.
    pub behaviors: Vec<String>,
    /// `counts[row][column]`, zero-filled.
    pub counts: Vec<Vec<usize>>,
}

/// Cross-tabulate dominant emotion against behavior.
///
/// Records without a dominant emotion are skipped. `None` if none remain.
pub fn emotion_association(records: &[&InteractionRecord]) -> Option<EmotionAssociation> {
    let mut pairs: HashMap<(&str, &str), usize> = HashMap::new();
    let mut emotions = BTreeSet::new();
    let mut behaviors = BTreeSet::new();

    for r in records {
        let Some(emotion) = r.dominant_emotion.as_deref() else {
            continue;
        };
        emotions.insert(emotion);
        behaviors.insert(r.selected_behavior.as_str());
        *pairs.entry((emotion, r.selected_behavior.as_str())).or_insert(0) += 1;
    }
    if pairs.is_empty() {
        return None;
    }

    let counts: Vec<Vec<usize>> = emotions
        .iter()
        .map(|&e| {
            behaviors
                .iter()
                .map(|&b| pairs.get(&(e, b)).copied().unwrap_or(0))
                .collect::<Vec<usize>>()
        })
        .collect();

    Some(EmotionAssociation {
        emotions: emotions.into_iter().map(str::to_owned).collect(),
        behaviors: behaviors.into_iter().map(str::to_owned).collect(),
        counts,
    })
}

// ─── Report ─────────────────────────────────────────────────────────────────

/// Where the per-strategy sections came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticsSource {
    /// Recomputed from interaction records.
    Recomputed,
    /// Taken from the precomputed statistics collection.
    Precomputed,
}

/// Complete comparative report for one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Heading.
    pub title: String,
    /// Origin of the per-strategy numbers.
    pub statistics_source: StatisticsSource,
    /// One section per strategy.
    pub strategies: Vec<StrategySection>,
    /// Cross-strategy conclusions.
    pub conclusions: ConclusionsSection,
    /// First choices per scenario and strategy.
    pub scenarios: Vec<ScenarioListing>,
    /// Largest emotional boosts and reductions of the treatment strategy.
    pub modifier_highlights: Option<ModifierHighlights>,
    /// Dominant emotion × behavior counts of the treatment strategy.
    pub emotion_association: Option<EmotionAssociation>,
    /// Disagreements with precomputed statistics, when those were supplied.
    pub cross_check: Option<Vec<StatisticsMismatch>>,
    /// Sections or groups that were omitted, with reasons.
    pub notes: Vec<String>,
}

/// Compose a report from statistics and the grouped records they describe.
///
/// Per-strategy sections are always produced, one per strategy; a repeated
/// strategy keeps its first entry. Conclusions that cannot be drawn are
/// marked unavailable rather than dropped.
pub fn compose_report(
    statistics: &[StrategyStatistics],
    aggregation: &Aggregation<'_>,
    config: &ReportConfig,
) -> Report {
    let index = StatisticsIndex::new(statistics);
    let strategies: Vec<StrategySection> = index.entries().map(StrategySection::from_statistics).collect();

    let conclusions = match draw_conclusions(&index, &config.treatment, &config.baseline) {
        Ok(c) => ConclusionsSection::Available(c),
        Err(e) => {
            tracing::warn!(error = %e, "conclusions unavailable");
            ConclusionsSection::Unavailable { reason: format!("conclusions unavailable: {e}") }
        }
    };

    let listed: Vec<Strategy> = index.entries().map(|s| s.strategy.clone()).collect();
    let scenarios = scenario_listings(aggregation, &listed);

    let treatment_records = aggregation.strategy_group(&config.treatment).unwrap_or(&[]);
    let modifier_highlights = (!treatment_records.is_empty())
        .then(|| modifier_highlights(&config.treatment, treatment_records, config.highlight_limit));
    let emotion_association = emotion_association(treatment_records);

    Report {
        title: config.title.clone(),
        statistics_source: StatisticsSource::Recomputed,
        strategies,
        conclusions,
        scenarios,
        modifier_highlights,
        emotion_association,
        cross_check: None,
        notes: Vec::new(),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
