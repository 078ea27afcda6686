//! Engine configuration, loaded from RON.
//!
//! Every section has defaults, so a config file only needs to name what it
//! overrides.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::core::retry::RetryConfig;
use crate::core::zone::{DensityProbe, ZoneThresholds};
use crate::schema::weather::Weather;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Base URLs of the external services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Overpass interpreter, used for both density and vegetation queries.
    pub overpass: String,
    pub weather: String,
    pub randomness: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            overpass: "https://overpass-api.de/api/interpreter".to_string(),
            weather: "https://api.open-meteo.com/v1/forecast".to_string(),
            randomness: "https://www.random.org/integers/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub endpoints: Endpoints,
    pub retry: RetryConfig,
    pub zones: ZoneThresholds,
    pub vegetation_radius_m: u32,
    /// Weather assumed when the weather service cannot be reached.
    pub fallback_weather: Weather,
    /// Per-request timeout. Unset means requests are bounded only by the transport.
    pub http_timeout_secs: Option<u64>,
    /// Seed for the local generator; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            retry: RetryConfig::default(),
            zones: ZoneThresholds::default(),
            vegetation_radius_m: 500,
            fallback_weather: Weather::default(),
            http_timeout_secs: None,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<EngineConfig, ConfigError> {
        let config: EngineConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        check_probe("zones.urban", &self.zones.urban)?;
        check_probe("zones.outskirts", &self.zones.outskirts)?;
        if self.vegetation_radius_m == 0 {
            return Err(ConfigError::Invalid(
                "vegetation_radius_m must be positive".to_string(),
            ));
        }
        for (name, url) in [
            ("endpoints.overpass", &self.endpoints.overpass),
            ("endpoints.weather", &self.endpoints.weather),
            ("endpoints.randomness", &self.endpoints.randomness),
        ] {
            Url::parse(url).map_err(|e| ConfigError::Invalid(format!("{}: {}", name, e)))?;
        }
        Ok(())
    }
}

fn check_probe(name: &str, probe: &DensityProbe) -> Result<(), ConfigError> {
    if probe.radius_m == 0 {
        return Err(ConfigError::Invalid(format!(
            "{}.radius_m must be positive",
            name
        )));
    }
    Ok(())
}
