use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical weather condition, used as the innermost storyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Fog,
    Rain,
    Thunderstorm,
    Snow,
}

impl WeatherCondition {
    /// Map a WMO weather code onto a condition. Unknown or missing codes are Clear.
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(0 | 1) => Self::Clear,
            Some(2 | 3) => Self::Cloudy,
            Some(45 | 48) => Self::Fog,
            Some(51 | 61 | 63 | 65 | 80) => Self::Rain,
            Some(95 | 96 | 99) => Self::Thunderstorm,
            Some(71 | 73 | 75) => Self::Snow,
            _ => Self::Clear,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Rain => "Rain",
            Self::Thunderstorm => "Thunderstorm",
            Self::Snow => "Snow",
        }
    }
}

impl Default for WeatherCondition {
    fn default() -> Self {
        Self::Clear
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current weather at the player's position. Missing fields take the
/// mild default below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weather {
    pub condition: WeatherCondition,
    /// Degrees Celsius, passed through from the weather service.
    pub temperature: f64,
}

impl Weather {
    pub fn new(condition: WeatherCondition, temperature: f64) -> Self {
        Self {
            condition,
            temperature,
        }
    }
}

/// The mild default used when the weather service cannot be reached.
impl Default for Weather {
    fn default() -> Self {
        Self::new(WeatherCondition::Clear, 20.0)
    }
}
