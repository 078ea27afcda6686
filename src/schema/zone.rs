use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of the player's surroundings by built-structure density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Urban,
    Outskirts,
    Wild,
}

impl Zone {
    /// Storyboard key for this zone (e.g., "Urban").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urban => "Urban",
            Self::Outskirts => "Outskirts",
            Self::Wild => "Wild",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Biome label for Wild zones.
///
/// Labels keep the exact spelling used as storyboard keys: the latitude
/// bands are lowercase, the vegetation override is capitalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    #[serde(rename = "tundra")]
    Tundra,
    #[serde(rename = "taiga")]
    Taiga,
    #[serde(rename = "desert")]
    Desert,
    #[serde(rename = "temperate-plains")]
    TemperatePlains,
    #[serde(rename = "plains")]
    Plains,
    Forest,
}

impl Terrain {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tundra => "tundra",
            Self::Taiga => "taiga",
            Self::Desert => "desert",
            Self::TemperatePlains => "temperate-plains",
            Self::Plains => "plains",
            Self::Forest => "Forest",
        }
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
