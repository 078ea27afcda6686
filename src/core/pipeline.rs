//! The scenario pipeline: position → zone → terrain → weather → event.
//!
//! Every stage below the orchestrator fails open. Only a missing position
//! aborts a run; all other failures are folded into the result as
//! [`Recovery`] entries.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::config::{ConfigError, EngineConfig};
use crate::core::context::{self, ContextStore};
use crate::core::location::{LocationError, LocationProvider};
use crate::core::lookup::{HttpTransport, LookupClient, LookupError, ReqwestTransport};
use crate::core::random::{EventSelector, LocalRandom, RandomError, RandomOrgSource, RandomSource};
use crate::core::resolution::Resolution;
use crate::core::retry::RetryPolicy;
use crate::core::storyboard::{EventBranch, Storyboard, StoryboardError};
use crate::core::terrain::TerrainRefiner;
use crate::core::weather::WeatherResolver;
use crate::core::zone::ZoneClassifier;
use crate::schema::character::Character;
use crate::schema::event::StoryEvent;
use crate::schema::scenario::{Recovery, ScenarioResult, Stage};
use crate::schema::zone::Zone;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("location unavailable: {0}")]
    LocationUnavailable(#[from] LocationError),
    #[error("storyboard error: {0}")]
    Storyboard(#[from] StoryboardError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),
    #[error("event selection failed: {0}")]
    Random(#[from] RandomError),
    #[error("context serialization failed: {0}")]
    Context(#[from] serde_json::Error),
}

/// Branch used when the storyboard has nothing for the player.
pub fn placeholder_events() -> EventBranch {
    [("Event_1", "Nothing here yet."), ("Event_2", "Still nothing.")]
        .into_iter()
        .map(|(key, text)| (key.to_string(), StoryEvent::with_description(key, text)))
        .collect()
}

/// The top-level scenario engine. Built via `ScenarioEngine::builder()`.
pub struct ScenarioEngine {
    storyboard: Storyboard,
    zones: ZoneClassifier,
    terrain: TerrainRefiner,
    weather: WeatherResolver,
    selector: EventSelector,
}

/// Builder for constructing a `ScenarioEngine`.
#[derive(Default)]
pub struct ScenarioEngineBuilder {
    config: Option<EngineConfig>,
    config_path: Option<PathBuf>,
    storyboard: Option<Storyboard>,
    storyboard_path: Option<PathBuf>,
    transport: Option<Arc<dyn HttpTransport>>,
    random_source: Option<Box<dyn RandomSource>>,
    seed: Option<u64>,
}

impl ScenarioEngine {
    pub fn builder() -> ScenarioEngineBuilder {
        ScenarioEngineBuilder::default()
    }

    pub fn storyboard(&self) -> &Storyboard {
        &self.storyboard
    }

    /// Run one generation for `character` at the position `location` reports.
    ///
    /// On success the character's `last_event` is overwritten and the run is
    /// published to `store`. On a location failure nothing is published.
    pub async fn generate(
        &mut self,
        location: &dyn LocationProvider,
        character: &mut Character,
        store: &mut dyn ContextStore,
    ) -> Result<ScenarioResult, ScenarioError> {
        let coords = location.current_position().await.map_err(|e| {
            warn!(error = %e, "No position, aborting run");
            e
        })?;
        info!(location = %coords, class = %character.class, "Generating scenario");

        let mut recoveries = Vec::new();

        let zone = take(&mut recoveries, Stage::Zone, self.zones.classify(coords).await);
        let terrain = if zone == Zone::Wild {
            Some(take(&mut recoveries, Stage::Terrain, self.terrain.refine(coords).await))
        } else {
            None
        };
        let weather = take(&mut recoveries, Stage::Weather, self.weather.resolve(coords).await);

        let biome = terrain.map(|t| t.label()).unwrap_or_else(|| zone.as_str());
        let condition = weather.condition.as_str();

        let placeholder = placeholder_events();
        let events = match self
            .storyboard
            .resolve_branch(&character.class, biome, condition)
        {
            Ok(branch) if branch.events.is_empty() => {
                let warning = format!(
                    "branch {}/{}/{} has no events, using placeholder",
                    character.class, branch.biome, branch.weather
                );
                warn!(%warning, "Empty storyboard branch");
                recoveries.push(Recovery {
                    stage: Stage::Storyboard,
                    warning,
                });
                &placeholder
            }
            Ok(branch) => {
                if branch.fell_back(biome, condition) {
                    info!(
                        biome = branch.biome,
                        weather = branch.weather,
                        "Storyboard fell back to a default branch"
                    );
                }
                branch.events
            }
            Err(e) => {
                warn!(error = %e, "Storyboard lookup failed, using placeholder");
                recoveries.push(Recovery {
                    stage: Stage::Storyboard,
                    warning: e.to_string(),
                });
                &placeholder
            }
        };

        let key = take(&mut recoveries, Stage::Selection, self.selector.select(events).await?);
        let event = events
            .get(key)
            .cloned()
            .unwrap_or_else(|| StoryEvent::with_description(key, ""));

        let result = ScenarioResult {
            coordinates: coords,
            class: character.class.clone(),
            zone,
            terrain,
            weather,
            event_key: key.to_string(),
            event,
            recoveries,
        };

        character.last_event = Some(result.event.clone());
        context::publish(&result, character, store)?;

        info!(
            zone = %result.zone,
            terrain = result.terrain.map(|t| t.label()).unwrap_or("-"),
            weather = %result.weather.condition,
            event = %result.event_key,
            recoveries = result.recoveries.len(),
            "Scenario generated"
        );
        Ok(result)
    }
}

/// Unwrap a stage result, recording the warning when it was recovered.
fn take<T>(recoveries: &mut Vec<Recovery>, stage: Stage, resolution: Resolution<T>) -> T {
    let (value, warning) = resolution.into_parts();
    if let Some(warning) = warning {
        debug!(%stage, %warning, "Stage recovered");
        recoveries.push(Recovery { stage, warning });
    }
    value
}

impl ScenarioEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load the config from a RON file. Ignored when `config` is also given.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Provide the storyboard directly (for testing without files).
    pub fn storyboard(mut self, storyboard: Storyboard) -> Self {
        self.storyboard = Some(storyboard);
        self
    }

    /// Load the storyboard from a `.json` or `.ron` file.
    pub fn storyboard_path(mut self, path: impl AsRef<Path>) -> Self {
        self.storyboard_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Replace the HTTP transport, e.g. with an in-process fake.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the primary randomness source.
    pub fn random_source(mut self, source: Box<dyn RandomSource>) -> Self {
        self.random_source = Some(source);
        self
    }

    /// Seed for the local generator. Overrides the config's seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<ScenarioEngine, ScenarioError> {
        let config = match (self.config, self.config_path) {
            (Some(config), _) => {
                config.validate()?;
                config
            }
            (None, Some(path)) => EngineConfig::load_from_ron(&path)?,
            (None, None) => EngineConfig::default(),
        };

        let storyboard = match (self.storyboard, self.storyboard_path) {
            (Some(storyboard), _) => storyboard,
            (None, Some(path)) => Storyboard::load(&path)?,
            (None, None) => {
                warn!("No storyboard given, every run will use the placeholder branch");
                Storyboard::default()
            }
        };

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(config.http_timeout())?),
        };
        let client = LookupClient::new(transport);
        let retry = RetryPolicy::new(config.retry.clone());

        let primary: Box<dyn RandomSource> = match self.random_source {
            Some(source) => source,
            None => Box::new(RandomOrgSource::new(
                client.clone(),
                config.endpoints.randomness.clone(),
            )),
        };
        let local = LocalRandom::new(self.seed.or(config.seed));

        debug!(
            classes = storyboard.classes.len(),
            random = primary.name(),
            "Scenario engine built"
        );

        Ok(ScenarioEngine {
            zones: ZoneClassifier::new(
                client.clone(),
                retry.clone(),
                config.endpoints.overpass.clone(),
                config.zones.clone(),
            ),
            terrain: TerrainRefiner::new(
                client.clone(),
                retry,
                config.endpoints.overpass.clone(),
                config.vegetation_radius_m,
            ),
            weather: WeatherResolver::new(
                client,
                config.endpoints.weather.clone(),
                config.fallback_weather,
            ),
            selector: EventSelector::new(primary, local),
            storyboard,
        })
    }
}
