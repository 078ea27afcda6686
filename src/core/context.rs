//! Shared context sink: where a finished run is published for the rendering layer.
//!
//! The engine never reads these keys back; stages hand values to each
//! other directly and the store is written once, at the end of a run.

use rustc_hash::FxHashMap;
use serde_json::{json, Value};

use crate::schema::character::Character;
use crate::schema::scenario::ScenarioResult;

/// Keys written by [`publish`].
pub mod keys {
    pub const LOCATION: &str = "location";
    pub const TERRAIN: &str = "terrainType";
    pub const WEATHER: &str = "weather";
    pub const CLASS: &str = "class";
    pub const CHARACTER: &str = "character-info";
}

/// Key/value persistence owned by the caller.
pub trait ContextStore: Send {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);
}

/// In-memory store, for tests and single-process callers.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: FxHashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ContextStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}

/// Write a finished run and the updated character record. Plain overwrite.
pub fn publish(
    result: &ScenarioResult,
    character: &Character,
    store: &mut dyn ContextStore,
) -> Result<(), serde_json::Error> {
    store.set(keys::LOCATION, Value::String(result.coordinates.to_string()));
    store.set(
        keys::TERRAIN,
        result
            .terrain
            .map(|t| Value::String(t.label().to_string()))
            .unwrap_or(Value::Null),
    );
    store.set(
        keys::WEATHER,
        json!({
            "condition": result.weather.condition.as_str(),
            "temperature": result.weather.temperature,
        }),
    );
    store.set(keys::CLASS, Value::String(result.class.clone()));
    store.set(keys::CHARACTER, serde_json::to_value(character)?);
    Ok(())
}
