/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Interaction records and the strategies that produced them.
//!
//! - [`Strategy`]: the behavior-selection policy under comparison.
//! - [`InteractionRecord`]: one observed selection, immutable once loaded.
//! - [`matches_expected_category`]: the category rule used when a source
//!   record carries an expected category but no precomputed match flag.

use core::fmt;

use serde::{Deserialize, Serialize};

// ─── Strategy ───────────────────────────────────────────────────────────────

/// A behavior-selection policy.
///
/// The three built-in strategies are the ones the comparative conclusions are
/// written against; anything else is carried through as [`Strategy::Other`]
/// and still gets its own per-strategy section.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Strategy {
    /// Priorities adjusted by the agent's emotional state.
    EmotionModulated,
    /// Highest static priority wins.
    FixedPriority,
    /// Uniform choice among matching behaviors.
    Random,
    /// Any strategy name outside the built-in set.
    Other(String),
}

impl Strategy {
    /// Parse a strategy name. `random_selection` is accepted as [`Strategy::Random`].
    pub fn parse(name: &str) -> Self {
        match name {
            "emotion_modulated" => Self::EmotionModulated,
            "fixed_priority" => Self::FixedPriority,
            "random" | "random_selection" => Self::Random,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Canonical snake_case name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::EmotionModulated => "emotion_modulated",
            Self::FixedPriority => "fixed_priority",
            Self::Random => "random",
            Self::Other(name) => name,
        }
    }

    /// Heading form: `emotion_modulated` → `Emotion Modulated`.
    pub fn title(&self) -> String {
        title_case(self.as_str())
    }

    /// `true` for the strategy whose records carry emotional modifiers.
    pub fn is_emotion_modulated(&self) -> bool {
        matches!(self, Self::EmotionModulated)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<String> for Strategy {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<&str> for Strategy {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<Strategy> for String {
    fn from(strategy: Strategy) -> Self {
        strategy.as_str().to_owned()
    }
}

/// `snake_case_words` → `Snake Case Words`.
pub(crate) fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ─── InteractionRecord ──────────────────────────────────────────────────────

/// One observed behavior selection.
///
/// Records are never mutated after loading; the aggregator and metrics engine
/// only borrow them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Strategy that made the selection.
    pub strategy: Strategy,
    /// Scripted scenario identifier.
    pub scenario: String,
    /// 1-based step within the scenario run.
    pub step: u32,
    /// Behavior chosen at this step.
    pub selected_behavior: String,
    /// Priority of the chosen behavior before modulation.
    pub base_priority: u32,
    /// Signed priority delta applied by emotional modulation (0 when absent).
    pub emotional_modifier: i32,
    /// Priority after modulation.
    pub final_priority: i32,
    /// Strongest emotional dimension at this step, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_emotion: Option<String>,
    /// Intensity of [`Self::dominant_emotion`], if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_value: Option<f32>,
    /// Whether the choice fell in the scenario's expected category set.
    pub matches_expected: bool,
    /// Free-text description of the step. Never used in computation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl InteractionRecord {
    /// Construct a record with no modulation and no emotional annotation.
    pub fn new(
        strategy: impl Into<Strategy>,
        scenario: impl Into<String>,
        step: u32,
        selected_behavior: impl Into<String>,
        base_priority: u32,
    ) -> Self {
        Self {
            strategy: strategy.into(),
            scenario: scenario.into(),
            step,
            selected_behavior: selected_behavior.into(),
            base_priority,
            emotional_modifier: 0,
            final_priority: saturate(i64::from(base_priority)),
            dominant_emotion: None,
            dominant_value: None,
            matches_expected: false,
            description: None,
        }
    }

    /// Set the emotional modifier and re-derive `final_priority`.
    pub fn with_modifier(mut self, modifier: i32) -> Self {
        self.emotional_modifier = modifier;
        self.final_priority = final_priority_for(&self.strategy, self.base_priority, modifier);
        self
    }

    /// Attach the dominant emotion and its intensity.
    pub fn with_emotion(mut self, emotion: impl Into<String>, value: f32) -> Self {
        self.dominant_emotion = Some(emotion.into());
        self.dominant_value = Some(value);
        self
    }

    /// Set the expected-category match flag.
    pub fn matching(mut self, matches_expected: bool) -> Self {
        self.matches_expected = matches_expected;
        self
    }
}

/// `base + modifier` for the emotion-modulated strategy, `base` otherwise.
pub fn final_priority_for(strategy: &Strategy, base_priority: u32, modifier: i32) -> i32 {
    let base = i64::from(base_priority);
    if strategy.is_emotion_modulated() {
        saturate(base + i64::from(modifier))
    } else {
        saturate(base)
    }
}

fn saturate(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

// ─── Expected-category rule ─────────────────────────────────────────────────

/// Case-insensitive check that `selected` belongs to the `expected` category.
///
/// The category matches when it occurs as a substring of the behavior name.
/// A category of the form `a_or_b` matches when any alternative does.
///
/// ```rust
/// use selection_study::record::matches_expected_category;
///
/// assert!(matches_expected_category("FleeBehavior", "flee"));
/// assert!(matches_expected_category("CautiousBehavior", "flee_or_cautious"));
/// assert!(!matches_expected_category("JoyfulBehavior", "aggressive"));
/// ```
pub fn matches_expected_category(selected: &str, expected: &str) -> bool {
    let selected = selected.to_lowercase();
    let expected = expected.to_lowercase();
    if expected.contains("_or_") {
        expected.split("_or_").any(|alt| selected.contains(alt))
    } else {
        selected.contains(&expected)
    }
}
