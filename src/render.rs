/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Text rendering of a [`Report`].
//!
//! Two layouts are provided: Markdown ([`markdown`], [`Markdown`]) and an
//! 80-column plain-text report ([`text`], [`PlainText`]). Both are pure
//! functions of the report value, so rendering the same report twice yields
//! identical bytes.

use core::fmt;

use crate::metrics::StatisticsMismatch;
use crate::record::title_case;
use crate::report::{
    ConclusionsSection, DerivedValue, EmotionAssociation, ModifierHighlight, ModifierHighlights,
    Report, ScenarioListing, StatisticsSource, StrategySection,
};

const RULE_WIDTH: usize = 80;

/// Render `report` as Markdown.
pub fn markdown(report: &Report) -> String {
    Markdown(report).to_string()
}

/// Render `report` as an 80-column plain-text report.
pub fn text(report: &Report) -> String {
    PlainText(report).to_string()
}

fn upper_heading(name: &str) -> String {
    title_case(name).to_uppercase()
}

fn emotion_label(h: &ModifierHighlight) -> String {
    match (&h.dominant_emotion, h.dominant_value) {
        (Some(e), Some(v)) => format!("{e}/{v:.2}"),
        (Some(e), None) => e.clone(),
        (None, _) => "none".to_owned(),
    }
}

fn source_sentence(source: StatisticsSource) -> &'static str {
    match source {
        StatisticsSource::Recomputed => "Per-strategy figures are recomputed from interaction records.",
        StatisticsSource::Precomputed => "Per-strategy figures are taken from precomputed statistics.",
    }
}

// ─── Markdown ───────────────────────────────────────────────────────────────

/// [`fmt::Display`] adapter producing the Markdown layout.
pub struct Markdown<'r>(pub &'r Report);

impl fmt::Display for Markdown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        writeln!(f, "# {}\n", r.title)?;
        writeln!(f, "## Overview\n")?;
        writeln!(
            f,
            "This report compares {} behavior-selection strategies across {} scenarios.",
            r.strategies.len(),
            r.scenarios.len()
        )?;
        writeln!(f, "{}\n", source_sentence(r.statistics_source))?;

        writeln!(f, "## Key Findings\n")?;
        for section in &r.strategies {
            md_strategy(f, section)?;
        }

        if !r.notes.is_empty() {
            writeln!(f, "## Notes\n")?;
            for note in &r.notes {
                writeln!(f, "- {note}")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "## Conclusions\n")?;
        md_conclusions(f, &r.conclusions)?;

        writeln!(f, "## Scenario Comparison\n")?;
        for listing in &r.scenarios {
            md_scenario(f, listing)?;
        }

        writeln!(f, "## Emotional Priority Modifiers\n")?;
        md_highlights(f, r.modifier_highlights.as_ref())?;

        writeln!(f, "## Emotion-Behavior Association\n")?;
        md_association(f, r.emotion_association.as_ref())?;

        if let Some(mismatches) = &r.cross_check {
            writeln!(f, "## Cross-Check\n")?;
            md_cross_check(f, mismatches)?;
        }
        Ok(())
    }
}

fn md_strategy(f: &mut fmt::Formatter<'_>, s: &StrategySection) -> fmt::Result {
    writeln!(f, "### {}\n", s.strategy.title())?;
    writeln!(f, "- **Variety Score**: {:.3}", s.variety_score)?;
    writeln!(f, "- **Expected Match Rate**: {:.1}%", s.expected_match_rate)?;
    writeln!(f, "- **Avg Priority Override**: {:.2}", s.avg_priority_override)?;
    writeln!(f, "- **Total Interactions**: {}\n", s.total_interactions)?;
    writeln!(f, "**Behavior Distribution**:")?;
    for share in &s.distribution {
        writeln!(f, "- {}: {} ({:.1}%)", share.behavior, share.count, share.percentage)?;
    }
    writeln!(f)
}

fn md_conclusions(f: &mut fmt::Formatter<'_>, section: &ConclusionsSection) -> fmt::Result {
    let c = match section {
        ConclusionsSection::Available(c) => c,
        ConclusionsSection::Unavailable { reason } => return writeln!(f, "{reason}\n"),
    };
    let treatment = c.treatment.title();
    let baseline = c.baseline.title();
    match &c.variety_improvement_pct {
        DerivedValue::Defined(pct) => writeln!(
            f,
            "1. **Behavior Variety**: {treatment} shows {pct:+.1}% difference in variety compared to {baseline}"
        )?,
        DerivedValue::Undefined(reason) => {
            writeln!(f, "1. **Behavior Variety**: undefined ({reason})")?
        }
    }
    writeln!(
        f,
        "2. **Context Appropriateness**: {:.1}% of behaviors matched expected categories ({:+.1} points vs {baseline})",
        c.treatment_match_rate, c.match_rate_difference
    )?;
    writeln!(f, "3. **Emotional Influence**: Average priority modification of {:.2}\n", c.avg_override)
}

fn md_scenario(f: &mut fmt::Formatter<'_>, listing: &ScenarioListing) -> fmt::Result {
    writeln!(f, "### {}\n", title_case(&listing.scenario))?;
    for choice in &listing.choices {
        if choice.behaviors.is_empty() {
            writeln!(f, "- **{}**: (no records)", choice.strategy)?;
        } else {
            writeln!(f, "- **{}**: {}", choice.strategy, choice.behaviors.join(", "))?;
        }
    }
    writeln!(f)
}

fn md_highlight_table(f: &mut fmt::Formatter<'_>, rows: &[ModifierHighlight]) -> fmt::Result {
    if rows.is_empty() {
        return writeln!(f, "_none_\n");
    }
    writeln!(f, "| Scenario | Step | Behavior | Modifier | Emotion |")?;
    writeln!(f, "|----------|------|----------|----------|---------|")?;
    for h in rows {
        writeln!(
            f,
            "| {} | {} | {} | {:+} | {} |",
            h.scenario,
            h.step,
            h.selected_behavior,
            h.emotional_modifier,
            emotion_label(h)
        )?;
    }
    writeln!(f)
}

fn md_highlights(f: &mut fmt::Formatter<'_>, highlights: Option<&ModifierHighlights>) -> fmt::Result {
    let Some(h) = highlights else {
        return writeln!(f, "No records for the treatment strategy.\n");
    };
    writeln!(f, "### Largest Priority Boosts ({})\n", h.strategy)?;
    md_highlight_table(f, &h.boosts)?;
    writeln!(f, "### Largest Priority Reductions ({})\n", h.strategy)?;
    md_highlight_table(f, &h.reductions)
}

fn md_association(f: &mut fmt::Formatter<'_>, table: Option<&EmotionAssociation>) -> fmt::Result {
    let Some(t) = table else {
        return writeln!(f, "No dominant-emotion data.\n");
    };
    write!(f, "| Emotion |")?;
    for b in &t.behaviors {
        write!(f, " {b} |")?;
    }
    writeln!(f)?;
    write!(f, "|---------|")?;
    for _ in &t.behaviors {
        write!(f, "---|")?;
    }
    writeln!(f)?;
    for (emotion, row) in t.emotions.iter().zip(&t.counts) {
        write!(f, "| {emotion} |")?;
        for n in row {
            write!(f, " {n} |")?;
        }
        writeln!(f)?;
    }
    writeln!(f)
}

fn md_cross_check(f: &mut fmt::Formatter<'_>, mismatches: &[StatisticsMismatch]) -> fmt::Result {
    if mismatches.is_empty() {
        return writeln!(f, "Precomputed statistics agree with the recomputed values.\n");
    }
    for m in mismatches {
        writeln!(f, "- {} `{}`: {}", m.strategy, m.field, m.detail)?;
    }
    writeln!(f)
}

// ─── Plain text ─────────────────────────────────────────────────────────────

/// [`fmt::Display`] adapter producing the plain-text layout.
pub struct PlainText<'r>(pub &'r Report);

fn heading(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    writeln!(f, "{name}")?;
    writeln!(f, "{}", "-".repeat(RULE_WIDTH))
}

impl fmt::Display for PlainText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        writeln!(f, "{}", r.title.to_uppercase())?;
        writeln!(f, "{}\n", "=".repeat(RULE_WIDTH))?;
        writeln!(f, "{}\n", source_sentence(r.statistics_source))?;

        heading(f, "KEY FINDINGS")?;
        writeln!(f)?;
        for s in &r.strategies {
            writeln!(f, "{}", upper_heading(s.strategy.as_str()))?;
            writeln!(f, "  Variety Score: {:.3}", s.variety_score)?;
            writeln!(f, "  Match Rate: {:.1}%", s.expected_match_rate)?;
            writeln!(f, "  Avg Priority Override: {:.2}", s.avg_priority_override)?;
            writeln!(f, "  Total Interactions: {}", s.total_interactions)?;
            writeln!(f, "  Behavior Distribution:")?;
            for share in &s.distribution {
                writeln!(f, "    {:40} {:3} ({:5.1}%)", share.behavior, share.count, share.percentage)?;
            }
            writeln!(f)?;
        }

        if !r.notes.is_empty() {
            heading(f, "NOTES")?;
            for note in &r.notes {
                writeln!(f, "  {note}")?;
            }
            writeln!(f)?;
        }

        heading(f, "CONCLUSIONS")?;
        match &r.conclusions {
            ConclusionsSection::Available(c) => {
                match &c.variety_improvement_pct {
                    DerivedValue::Defined(pct) => writeln!(f, "1. Variety Difference: {pct:+.1}%")?,
                    DerivedValue::Undefined(reason) => writeln!(f, "1. Variety Difference: undefined ({reason})")?,
                }
                writeln!(f, "2. Match Rate Difference: {:+.1}%", c.match_rate_difference)?;
                writeln!(f, "3. Emotional Influence: {:.2} avg modifier", c.avg_override)?;
            }
            ConclusionsSection::Unavailable { reason } => writeln!(f, "{reason}")?,
        }
        writeln!(f)?;

        heading(f, "SCENARIO ANALYSIS")?;
        for listing in &r.scenarios {
            writeln!(f, "{}", upper_heading(&listing.scenario))?;
            for choice in &listing.choices {
                writeln!(f, "  {:20} => {}", choice.strategy, choice.behaviors.join(", "))?;
            }
            writeln!(f)?;
        }

        heading(f, "EMOTIONAL PRIORITY MODIFIERS")?;
        match &r.modifier_highlights {
            Some(h) => {
                writeln!(f, "Largest Priority Boosts ({}):", h.strategy)?;
                text_highlights(f, &h.boosts)?;
                writeln!(f, "Largest Priority Reductions ({}):", h.strategy)?;
                text_highlights(f, &h.reductions)?;
            }
            None => writeln!(f, "No records for the treatment strategy.")?,
        }
        writeln!(f)?;

        heading(f, "EMOTION-BEHAVIOR ASSOCIATION")?;
        match &r.emotion_association {
            Some(t) => text_association(f, t)?,
            None => writeln!(f, "No dominant-emotion data.")?,
        }
        writeln!(f)?;

        if let Some(mismatches) = &r.cross_check {
            heading(f, "CROSS-CHECK")?;
            if mismatches.is_empty() {
                writeln!(f, "Precomputed statistics agree with the recomputed values.")?;
            }
            for m in mismatches {
                writeln!(f, "  {:20} {}: {}", m.strategy, m.field, m.detail)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn text_highlights(f: &mut fmt::Formatter<'_>, rows: &[ModifierHighlight]) -> fmt::Result {
    if rows.is_empty() {
        return writeln!(f, "  (none)");
    }
    for h in rows {
        writeln!(
            f,
            "  {:25} Step {:2}: {:30} Modifier: {:+3} (Emotion: {})",
            h.scenario,
            h.step,
            h.selected_behavior,
            h.emotional_modifier,
            emotion_label(h)
        )?;
    }
    Ok(())
}

fn text_association(f: &mut fmt::Formatter<'_>, t: &EmotionAssociation) -> fmt::Result {
    let label_width = t.emotions.iter().map(String::len).max().unwrap_or(0).max("emotion".len());
    write!(f, "  {:label_width$}", "emotion")?;
    for b in &t.behaviors {
        write!(f, "  {b}")?;
    }
    writeln!(f)?;
    for (emotion, row) in t.emotions.iter().zip(&t.counts) {
        write!(f, "  {emotion:label_width$}")?;
        for (b, n) in t.behaviors.iter().zip(row) {
            write!(f, "  {n:>width$}", width = b.len())?;
        }
        writeln!(f)?;
    }
    Ok(())
}
