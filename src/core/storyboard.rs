//! Storyboard dataset: loading, cascading branch resolution, and linting.
//!
//! The dataset is a three-level mapping, class → biome-or-zone → weather,
//! ending in a mapping of event key → event. All levels keep the insertion
//! order of the source document, which drives both the "first present"
//! fallback and event selection order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::schema::event::{Choice, StoryEvent};

#[derive(Debug, Error)]
pub enum StoryboardError {
    #[error("no storyboard for class '{0}'")]
    UnknownClass(String),
    #[error("class '{class}' has no biome branches")]
    EmptyClass { class: String },
    #[error("biome branch '{biome}' of class '{class}' has no weather branches")]
    EmptyBiome { class: String, biome: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("unsupported storyboard format: {0}")]
    UnsupportedFormat(String),
}

/// Event key → event, the terminal level.
pub type EventBranch = IndexMap<String, StoryEvent>;
/// Weather condition (or "Default") → events.
pub type BiomeBranch = IndexMap<String, EventBranch>;
/// Biome or zone name → weather branches.
pub type ClassBranch = IndexMap<String, BiomeBranch>;

/// Fallback key tried after the requested biome.
pub const DEFAULT_BIOME: &str = "Urban";
/// Fallback key tried after the requested weather.
pub const DEFAULT_WEATHER: &str = "Clear";

/// The loaded story dataset. Read-only after loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Storyboard {
    pub classes: IndexMap<String, ClassBranch>,
}

/// A resolved terminal branch plus the keys the cascade landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedBranch<'a> {
    pub biome: &'a str,
    pub weather: &'a str,
    pub events: &'a EventBranch,
}

impl ResolvedBranch<'_> {
    /// True when either level used a fallback instead of the requested key.
    pub fn fell_back(&self, biome: &str, weather: &str) -> bool {
        self.biome != biome || self.weather != weather
    }
}

/// Return the entry for the first candidate key present in `map`,
/// else the first entry in insertion order, else `None` for an empty map.
pub fn first_present<'a, V>(
    map: &'a IndexMap<String, V>,
    candidates: &[&str],
) -> Option<(&'a str, &'a V)> {
    candidates
        .iter()
        .find_map(|key| map.get_key_value(*key))
        .or_else(|| map.first())
        .map(|(k, v)| (k.as_str(), v))
}

/// Look up a choice's target event within the branch it was offered in.
pub fn next_event<'a>(branch: &'a EventBranch, choice: &Choice) -> Option<&'a StoryEvent> {
    choice
        .next_event_key
        .as_deref()
        .and_then(|key| branch.get(key))
}

/// Severity of a storyboard lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    pub level: LintLevel,
    /// Slash-joined location, e.g. `Warrior/Forest/Rain`.
    pub path: String,
    pub message: String,
}

impl Storyboard {
    /// Load a storyboard file, choosing the parser by extension (`.json` or `.ron`).
    pub fn load(path: &Path) -> Result<Storyboard, StoryboardError> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => Self::load_from_json(path),
            Some("ron") => Self::load_from_ron(path),
            other => Err(StoryboardError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn load_from_json(path: &Path) -> Result<Storyboard, StoryboardError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_json(&contents)
    }

    pub fn parse_json(input: &str) -> Result<Storyboard, StoryboardError> {
        let storyboard: Storyboard = serde_json::from_str(input)?;
        Ok(storyboard.with_event_ids())
    }

    pub fn load_from_ron(path: &Path) -> Result<Storyboard, StoryboardError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<Storyboard, StoryboardError> {
        let storyboard: Storyboard = ron::from_str(input)?;
        Ok(storyboard.with_event_ids())
    }

    /// Events without an explicit id take their mapping key.
    fn with_event_ids(mut self) -> Self {
        for class in self.classes.values_mut() {
            for biome in class.values_mut() {
                for events in biome.values_mut() {
                    for (key, event) in events.iter_mut() {
                        if event.id.is_empty() {
                            event.id = key.clone();
                        }
                    }
                }
            }
        }
        self
    }

    /// Resolve the event branch for a class, biome and weather condition.
    ///
    /// The class must exist. The biome falls back to `Urban`, then to the
    /// first branch; the weather falls back to `Clear`, then to the first
    /// branch. Fallback branches are taken as-is, so an empty terminal
    /// branch is a valid result.
    pub fn resolve_branch<'a>(
        &'a self,
        class: &str,
        biome: &str,
        weather: &str,
    ) -> Result<ResolvedBranch<'a>, StoryboardError> {
        let class_branch = self
            .classes
            .get(class)
            .ok_or_else(|| StoryboardError::UnknownClass(class.to_string()))?;

        let (biome_key, biome_branch) = first_present(class_branch, &[biome, DEFAULT_BIOME])
            .ok_or_else(|| StoryboardError::EmptyClass {
                class: class.to_string(),
            })?;

        let (weather_key, events) = first_present(biome_branch, &[weather, DEFAULT_WEATHER])
            .ok_or_else(|| StoryboardError::EmptyBiome {
                class: class.to_string(),
                biome: biome_key.to_string(),
            })?;

        debug!(
            class,
            requested_biome = biome,
            biome = biome_key,
            requested_weather = weather,
            weather = weather_key,
            events = events.len(),
            "Storyboard branch resolved"
        );

        Ok(ResolvedBranch {
            biome: biome_key,
            weather: weather_key,
            events,
        })
    }

    /// Check the dataset for gaps the fallback cascade would paper over.
    pub fn lint(&self) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let mut push = |level, path: String, message: String| {
            issues.push(LintIssue {
                level,
                path,
                message,
            })
        };

        for (class, class_branch) in &self.classes {
            if class_branch.is_empty() {
                push(LintLevel::Error, class.clone(), "class has no biome branches".to_string());
                continue;
            }
            if !class_branch.contains_key(DEFAULT_BIOME) {
                push(
                    LintLevel::Warning,
                    class.clone(),
                    format!(
                        "no '{}' branch; unknown biomes fall back to '{}'",
                        DEFAULT_BIOME,
                        class_branch.keys().next().map(String::as_str).unwrap_or_default()
                    ),
                );
            }

            for (biome, biome_branch) in class_branch {
                let biome_path = format!("{}/{}", class, biome);
                if biome_branch.is_empty() {
                    push(LintLevel::Error, biome_path, "biome has no weather branches".to_string());
                    continue;
                }
                if !biome_branch.contains_key(DEFAULT_WEATHER) {
                    push(
                        LintLevel::Warning,
                        biome_path.clone(),
                        format!("no '{}' branch", DEFAULT_WEATHER),
                    );
                }

                for (weather, events) in biome_branch {
                    let weather_path = format!("{}/{}", biome_path, weather);
                    if events.is_empty() {
                        push(LintLevel::Warning, weather_path.clone(), "no events".to_string());
                    }

                    for (key, event) in events {
                        let event_path = format!("{}/{}", weather_path, key);
                        for choice in &event.choices {
                            if let Some(target) = &choice.next_event_key {
                                if !events.contains_key(target) {
                                    push(
                                        LintLevel::Error,
                                        event_path.clone(),
                                        format!(
                                            "choice '{}' leads to missing event '{}'",
                                            choice.label, target
                                        ),
                                    );
                                }
                            }
                        }
                        if event.timeout.is_some() && event.timeout_response.is_none() {
                            push(
                                LintLevel::Warning,
                                event_path,
                                "timeout set without a timeoutResponse".to_string(),
                            );
                        }
                    }
                }
            }
        }

        issues
    }
}
