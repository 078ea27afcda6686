//! Scenario: run one generation for a fixed position and print the result as JSON.
//!
//! Usage: scenario --storyboard <file> --lat <deg> --lon <deg> --class <name>

use clap::Parser;
use scenario_engine::core::context::MemoryStore;
use scenario_engine::core::location::FixedLocation;
use scenario_engine::core::pipeline::ScenarioEngine;
use scenario_engine::schema::character::Character;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "scenario")]
#[command(about = "Generate a location-driven scenario event")]
struct Args {
    /// Storyboard file (.json or .ron)
    #[arg(short, long)]
    storyboard: PathBuf,

    /// Engine config (.ron); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Character class, used as the storyboard's top-level key
    #[arg(long)]
    class: String,

    /// Character name
    #[arg(long, default_value = "Traveller")]
    name: String,

    /// Seed for the local random generator
    #[arg(long)]
    seed: Option<u64>,

    /// Also print what the player sees once this many seconds have passed
    #[arg(long)]
    elapsed: Option<f64>,
}

#[tokio::main]
async fn main() {
    scenario_engine::init_logging();
    let args = Args::parse();

    let mut builder = ScenarioEngine::builder().storyboard_path(&args.storyboard);
    if let Some(ref path) = args.config {
        builder = builder.config_path(path);
    }
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }

    let mut engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let location = FixedLocation::new(args.lat, args.lon);
    let mut character = Character::new(&args.name, &args.class);
    let mut store = MemoryStore::new();

    let result = match engine.generate(&location, &mut character, &mut store).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(2);
        }
    };

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    }

    if let Some(secs) = args.elapsed.filter(|s| s.is_finite() && *s >= 0.0) {
        println!("\n{:?}", result.outcome_after(Duration::from_secs_f64(secs)));
    }
}
