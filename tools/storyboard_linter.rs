//! Storyboard Linter: reports gaps the fallback cascade would hide.
//!
//! Usage: storyboard_linter <storyboard.json|storyboard.ron>

use clap::Parser;
use scenario_engine::core::storyboard::{LintLevel, Storyboard};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "storyboard_linter")]
#[command(about = "Check a storyboard for missing branches and dangling choices")]
struct Args {
    /// Storyboard file (.json or .ron)
    path: PathBuf,

    /// Exit non-zero on warnings as well as errors
    #[arg(long)]
    strict: bool,
}

fn main() {
    let args = Args::parse();

    let storyboard = match Storyboard::load(&args.path) {
        Ok(storyboard) => storyboard,
        Err(e) => {
            eprintln!("ERROR: Failed to load storyboard: {}", e);
            process::exit(1);
        }
    };

    let event_count: usize = storyboard
        .classes
        .values()
        .flat_map(|class| class.values())
        .flat_map(|biome| biome.values())
        .map(|events| events.len())
        .sum();
    println!(
        "Loaded {} classes, {} events",
        storyboard.classes.len(),
        event_count
    );

    let issues = storyboard.lint();

    println!("\n=== Storyboard Lint Report ===\n");

    if issues.is_empty() {
        println!("All checks passed!");
    }

    let mut errors = 0;
    let mut warnings = 0;
    for issue in &issues {
        let label = match issue.level {
            LintLevel::Warning => {
                warnings += 1;
                "WARNING"
            }
            LintLevel::Error => {
                errors += 1;
                "ERROR"
            }
        };
        println!("{}: {}: {}", label, issue.path, issue.message);
    }

    println!("\nSummary: {} errors, {} warnings", errors, warnings);

    if errors > 0 || (args.strict && warnings > 0) {
        process::exit(1);
    }
}
