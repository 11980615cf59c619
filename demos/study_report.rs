//! # Behavior Priority Study Report
//!
//! Builds a comparative report for three selection strategies.
//!
//! With no arguments a small scripted study is generated in code: four
//! scenarios, each a sequence of steps with an expected behavior category.
//! Given a path, records are read from that JSON file instead, and an optional
//! second path supplies precomputed statistics to cross-check against.
//!
//! ```bash
//! cargo run --example study_report
//! cargo run --example study_report -- results/raw_results.json results/statistics.json
//! RUST_LOG=selection_study=debug cargo run --example study_report
//! ```

use selection_study::record::matches_expected_category;
use selection_study::{
    analyze, render, run, FileRecordSource, InteractionRecord, ReportConfig, Strategy,
};
use tracing_subscriber::EnvFilter;

// ── Scripted scenarios ───────────────────────────────────────────────────────

/// One scripted step: the behavior each strategy ends up with, and what fits.
struct Step {
    expected: &'static str,
    fixed: &'static str,
    random: &'static str,
    emotional: (&'static str, i32, &'static str, f32),
}

const SCENARIOS: &[(&str, &[Step])] = &[
    (
        "peaceful_village",
        &[
            Step { expected: "friendly", fixed: "friendly", random: "cautious", emotional: ("friendly", 1, "joy", 0.42) },
            Step { expected: "cautious", fixed: "friendly", random: "joyful", emotional: ("cautious", 2, "fear", 0.35) },
            Step { expected: "friendly_or_joyful", fixed: "friendly", random: "aggressive", emotional: ("joyful", 3, "joy", 0.71) },
        ],
    ),
    (
        "threatening_situation",
        &[
            Step { expected: "cautious_or_flee", fixed: "flee", random: "friendly", emotional: ("cautious", 2, "fear", 0.58) },
            Step { expected: "flee", fixed: "flee", random: "flee", emotional: ("flee", 4, "fear", 0.86) },
            Step { expected: "flee", fixed: "flee", random: "joyful", emotional: ("flee", 5, "fear", 0.93) },
        ],
    ),
    (
        "provocative_interaction",
        &[
            Step { expected: "cautious_or_friendly", fixed: "aggressive", random: "cautious", emotional: ("cautious", -1, "anger", 0.31) },
            Step { expected: "aggressive_or_cautious", fixed: "aggressive", random: "friendly", emotional: ("aggressive", 2, "anger", 0.64) },
            Step { expected: "aggressive", fixed: "aggressive", random: "aggressive", emotional: ("aggressive", 3, "anger", 0.79) },
        ],
    ),
    (
        "mixed_emotions",
        &[
            Step { expected: "flee_or_aggressive", fixed: "flee", random: "joyful", emotional: ("aggressive", -2, "anger", 0.55) },
            Step { expected: "joyful", fixed: "friendly", random: "cautious", emotional: ("joyful", 2, "joy", 0.68) },
            Step { expected: "cautious", fixed: "friendly", random: "friendly", emotional: ("cautious", -3, "sadness", 0.47) },
        ],
    ),
];

fn scripted_study() -> Vec<InteractionRecord> {
    let mut records = Vec::new();
    for (scenario, steps) in SCENARIOS {
        for (i, step) in steps.iter().enumerate() {
            let n = i as u32 + 1;
            let (behavior, modifier, emotion, intensity) = step.emotional;

            records.push(
                InteractionRecord::new(Strategy::FixedPriority, *scenario, n, step.fixed, 5)
                    .matching(matches_expected_category(step.fixed, step.expected)),
            );
            records.push(
                InteractionRecord::new(Strategy::Random, *scenario, n, step.random, 5)
                    .matching(matches_expected_category(step.random, step.expected)),
            );
            records.push(
                InteractionRecord::new(Strategy::EmotionModulated, *scenario, n, behavior, 5)
                    .with_modifier(modifier)
                    .with_emotion(emotion, intensity)
                    .matching(matches_expected_category(behavior, step.expected)),
            );
        }
    }
    records
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let mut args = std::env::args().skip(1);
    let config = ReportConfig::default();

    let report = match args.next() {
        Some(records_path) => {
            let mut source = FileRecordSource::new(records_path);
            if let Some(stats_path) = args.next() {
                source = source.with_statistics(stats_path);
            }
            run(&source, &config)
        }
        None => analyze(&scripted_study(), None, &config),
    };

    match report {
        Ok(report) => {
            println!("{}", render::markdown(&report));
            println!("{}", render::text(&report));
        }
        Err(e) => {
            eprintln!("analysis failed: {e}");
            std::process::exit(1);
        }
    }
}
