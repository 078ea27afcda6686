use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A player choice attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub label: String,
    /// Key of the event this choice leads to, within the same branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_event_key: Option<String>,
}

/// A single authored story event. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryEvent {
    /// Filled from the event's mapping key when the dataset omits it.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, alias = "options")]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animate: Option<bool>,
    /// Seconds the player has to respond before the event expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_response: Option<String>,
}

/// What the player sees for an event once some time has passed.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome<'a> {
    /// Still inside the response window (or the event never expires).
    Pending { text: &'a str, choices: &'a [Choice] },
    /// The response window has passed.
    Expired { text: &'a str, image: String },
}

impl StoryEvent {
    /// Build a description-only event, as used by the stub branch.
    pub fn with_description(id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            ..Self::default()
        }
    }

    /// Animation is on unless the event turns it off.
    pub fn animates(&self) -> bool {
        self.animate.unwrap_or(true)
    }

    /// True once strictly more than `timeout` seconds have elapsed.
    /// Events without a timeout never expire.
    pub fn expired(&self, elapsed: Duration) -> bool {
        match self.timeout {
            Some(limit) => elapsed.as_secs_f64() > limit,
            None => false,
        }
    }
}
