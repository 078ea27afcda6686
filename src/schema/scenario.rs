use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::coords::Coordinates;
use super::event::{EventOutcome, StoryEvent};
use super::weather::Weather;
use super::zone::{Terrain, Zone};

/// Pipeline stage a recovery was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Zone,
    Terrain,
    Weather,
    Storyboard,
    Selection,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Zone => "zone",
            Self::Terrain => "terrain",
            Self::Weather => "weather",
            Self::Storyboard => "storyboard",
            Self::Selection => "selection",
        };
        f.write_str(name)
    }
}

/// A stage that completed through a fallback instead of directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recovery {
    pub stage: Stage,
    pub warning: String,
}

/// The composed output of one generation run, and the context it was
/// generated in. Owned by the caller; the engine keeps no reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub coordinates: Coordinates,
    /// Character class the storyboard was resolved for.
    pub class: String,
    #[serde(rename = "eventZone")]
    pub zone: Zone,
    /// Only set for Wild zones.
    #[serde(rename = "terrainType")]
    pub terrain: Option<Terrain>,
    pub weather: Weather,
    /// Mapping key the event was selected under.
    pub event_key: String,
    pub event: StoryEvent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recoveries: Vec<Recovery>,
}

impl ScenarioResult {
    /// True when every stage resolved without a fallback.
    pub fn is_direct(&self) -> bool {
        self.recoveries.is_empty()
    }

    /// Image shown when the event expires: `assets/images/{terrain}/{condition}`.
    /// Non-Wild zones use the zone name in place of the terrain.
    pub fn expiry_image(&self) -> String {
        let place = match self.terrain {
            Some(terrain) => terrain.label(),
            None => self.zone.as_str(),
        };
        format!("assets/images/{}/{}", place, self.weather.condition)
    }

    /// Resolve what the player sees after `elapsed` time on this event.
    pub fn outcome_after(&self, elapsed: Duration) -> EventOutcome<'_> {
        if self.event.expired(elapsed) {
            EventOutcome::Expired {
                text: self
                    .event
                    .timeout_response
                    .as_deref()
                    .unwrap_or(&self.event.description),
                image: self.expiry_image(),
            }
        } else {
            EventOutcome::Pending {
                text: &self.event.description,
                choices: &self.event.choices,
            }
        }
    }
}
