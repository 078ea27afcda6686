use serde::{Deserialize, Serialize};

use super::event::StoryEvent;

/// The caller-owned player record. The engine reads `class` and
/// overwrites `last_event` after each run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub name: String,
    /// Storyboard class key (e.g., "Warrior").
    pub class: String,
    #[serde(default = "first_level")]
    pub level: u32,
    #[serde(default)]
    pub last_event: Option<StoryEvent>,
}

fn first_level() -> u32 {
    1
}

impl Character {
    pub fn new(name: &str, class: &str) -> Self {
        Self {
            name: name.to_string(),
            class: class.to_string(),
            level: first_level(),
            last_event: None,
        }
    }
}
