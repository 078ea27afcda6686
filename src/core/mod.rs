//! Pipeline stages and the orchestrator that sequences them.

pub mod config;
pub mod context;
pub mod location;
pub mod lookup;
pub mod overpass;
pub mod pipeline;
pub mod random;
pub mod resolution;
pub mod retry;
pub mod storyboard;
pub mod terrain;
pub mod weather;
pub mod zone;
