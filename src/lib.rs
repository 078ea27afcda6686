//! Scenario Engine: location-driven scenario generation for story games.
//!
//! Classifies a player's real-world position into a zone, terrain and
//! weather context, resolves that context against a branching storyboard
//! with cascading fallbacks, and picks one concrete event. Every network
//! stage fails open so a scenario is produced whenever a location is known.

pub mod core;
pub mod schema;

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise logging for the binaries. `RUST_LOG` overrides the default filter.
/// Logs go to stderr so stdout stays machine-readable.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scenario_engine=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
