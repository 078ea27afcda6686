//! Data types shared by the pipeline stages.

pub mod character;
pub mod coords;
pub mod event;
pub mod scenario;
pub mod weather;
pub mod zone;
