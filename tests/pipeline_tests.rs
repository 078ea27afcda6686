//! Pipeline integration tests: position in, scenario out, against a scripted network.

use async_trait::async_trait;
use reqwest::Url;
use scenario_engine::core::config::EngineConfig;
use scenario_engine::core::context::{keys, ContextStore, MemoryStore};
use scenario_engine::core::location::FixedLocation;
use scenario_engine::core::lookup::{HttpResponse, HttpTransport, LookupError};
use scenario_engine::core::pipeline::{placeholder_events, ScenarioEngine};
use scenario_engine::core::storyboard::next_event;
use scenario_engine::schema::character::Character;
use scenario_engine::schema::event::EventOutcome;
use scenario_engine::schema::scenario::Stage;
use scenario_engine::schema::weather::WeatherCondition;
use scenario_engine::schema::zone::{Terrain, Zone};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const STORYBOARD: &str = "tests/fixtures/storyboard.json";
const CONFIG: &str = "tests/fixtures/engine.ron";

/// A fake world. Answers each of the three services from fixed values and
/// records every URL it was asked for.
struct FakeWorld {
    buildings: Option<u64>,
    woods: Option<u64>,
    weather_code: Option<i64>,
    random: &'static str,
    requests: Mutex<Vec<Url>>,
}

impl FakeWorld {
    fn new(buildings: u64, woods: u64, weather_code: i64, random: &'static str) -> Self {
        Self {
            buildings: Some(buildings),
            woods: Some(woods),
            weather_code: Some(weather_code),
            random,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn hosts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.host_str().unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl HttpTransport for FakeWorld {
    async fn get(&self, url: &Url) -> Result<HttpResponse, LookupError> {
        self.requests.lock().unwrap().push(url.clone());
        match url.host_str() {
            Some("overpass.test") => {
                let query: String = url
                    .query_pairs()
                    .find(|(k, _)| k == "data")
                    .map(|(_, v)| v.into_owned())
                    .unwrap_or_default();
                let count = if query.contains("natural") {
                    self.woods
                } else {
                    self.buildings
                };
                match count {
                    Some(total) => Ok(HttpResponse::json(
                        json!({ "elements": [{ "type": "count", "tags": { "total": total.to_string() } }] })
                            .to_string(),
                    )),
                    None => Ok(HttpResponse::status(504)),
                }
            }
            Some("weather.test") => match self.weather_code {
                Some(code) => Ok(HttpResponse::json(
                    json!({ "current_weather": { "weathercode": code, "temperature": 14.2 } })
                        .to_string(),
                )),
                None => Ok(HttpResponse::text("<html>maintenance</html>")),
            },
            Some("random.test") => Ok(HttpResponse::text(self.random)),
            _ => Err(LookupError::Transport(format!("unexpected host in {}", url))),
        }
    }
}

fn fast_config() -> EngineConfig {
    let mut config = EngineConfig::load_from_ron(std::path::Path::new(CONFIG)).unwrap();
    config.retry.base_delay_ms = 1;
    config
}

fn engine(world: Arc<FakeWorld>) -> ScenarioEngine {
    ScenarioEngine::builder()
        .config(fast_config())
        .storyboard_path(STORYBOARD)
        .transport(world)
        .build()
        .unwrap()
}

#[tokio::test]
async fn wild_plains_uses_random_service_index() {
    let world = Arc::new(FakeWorld::new(0, 0, 1, "2\n"));
    let mut engine = engine(world.clone());
    let mut character = Character::new("Ada", "Warrior");
    let mut store = MemoryStore::new();

    let result = engine
        .generate(&FixedLocation::new(47.0, 8.0), &mut character, &mut store)
        .await
        .unwrap();

    assert_eq!(result.zone, Zone::Wild);
    assert_eq!(result.terrain, Some(Terrain::TemperatePlains));
    assert_eq!(result.weather.condition, WeatherCondition::Clear);
    // Insertion order: Event_1, Event_2, Event_3.
    assert_eq!(result.event_key, "Event_3");
    assert_eq!(result.event.description, "Wagon ruts lead east.");
    assert!(result.is_direct());

    // Two density probes, one vegetation probe, one weather, one random draw.
    assert_eq!(
        world.hosts(),
        vec!["overpass.test", "overpass.test", "overpass.test", "weather.test", "random.test"]
    );
}

#[tokio::test]
async fn outskirts_uses_zone_name_as_biome() {
    let world = Arc::new(FakeWorld::new(35, 0, 3, "0"));
    let mut engine = engine(world.clone());
    let mut character = Character::new("Ada", "Warrior");

    let result = engine
        .generate(&FixedLocation::new(47.0, 8.0), &mut character, &mut MemoryStore::new())
        .await
        .unwrap();

    assert_eq!(result.zone, Zone::Outskirts);
    assert_eq!(result.terrain, None);
    assert_eq!(result.weather.condition, WeatherCondition::Cloudy);
    assert_eq!(result.event.description, "A farmer waves you down.");
    // Single-event branch: the random service is never asked.
    assert!(!world.hosts().iter().any(|h| h == "random.test"));
}

#[tokio::test]
async fn urban_rain_and_store_contents() {
    let world = Arc::new(FakeWorld::new(120, 0, 63, "0"));
    let mut engine = engine(world);
    let mut character = Character::new("Ada", "Warrior");
    let mut store = MemoryStore::new();

    let result = engine
        .generate(&FixedLocation::new(51.5, -0.12), &mut character, &mut store)
        .await
        .unwrap();

    assert_eq!(result.zone, Zone::Urban);
    assert_eq!(result.event.id, "Event_1");
    assert_eq!(store.get(keys::LOCATION), Some(json!("51.5,-0.12")));
    assert_eq!(store.get(keys::TERRAIN), Some(serde_json::Value::Null));
    assert_eq!(
        store.get(keys::WEATHER),
        Some(json!({ "condition": "Rain", "temperature": 14.2 }))
    );
    let info = store.get(keys::CHARACTER).unwrap();
    assert_eq!(info["name"], "Ada");
    assert_eq!(info["lastEvent"]["description"], "Gutters overflow into the square.");
}

#[tokio::test]
async fn forest_event_expires_and_choices_resolve() {
    let world = Arc::new(FakeWorld::new(0, 4, 61, "0"));
    let mut engine = engine(world);
    let mut character = Character::new("Ada", "Warrior");

    let result = engine
        .generate(&FixedLocation::new(47.0, 8.0), &mut character, &mut MemoryStore::new())
        .await
        .unwrap();

    assert_eq!(result.terrain, Some(Terrain::Forest));
    assert_eq!(result.event_key, "Event_1");

    match result.outcome_after(Duration::from_secs(3)) {
        EventOutcome::Pending { choices, .. } => assert_eq!(choices.len(), 2),
        other => panic!("expected a pending event, got {:?}", other),
    }
    match result.outcome_after(Duration::from_secs(11)) {
        EventOutcome::Expired { text, image } => {
            assert_eq!(text, "The boar charges before you can react.");
            assert_eq!(image, "assets/images/Forest/Rain");
        }
        other => panic!("expected expiry, got {:?}", other),
    }

    let branch = engine
        .storyboard()
        .resolve_branch("Warrior", "Forest", "Rain")
        .unwrap();
    let next = next_event(branch.events, &result.event.choices[1]).unwrap();
    assert_eq!(next.id, "Event_3");
    assert!(!next.animates());
}

#[tokio::test]
async fn bad_random_answer_falls_back_to_local() {
    let world = Arc::new(FakeWorld::new(0, 0, 0, "Error: You have used your quota"));
    let mut engine = engine(world);
    let mut character = Character::new("Ada", "Warrior");

    let result = engine
        .generate(&FixedLocation::new(47.0, 8.0), &mut character, &mut MemoryStore::new())
        .await
        .unwrap();

    assert!(result.event_key.starts_with("Event_"));
    assert_eq!(result.recoveries.len(), 1);
    assert_eq!(result.recoveries[0].stage, Stage::Selection);
}

#[tokio::test]
async fn weather_format_error_uses_configured_fallback() {
    let mut world = FakeWorld::new(120, 0, 0, "0");
    world.weather_code = None;
    let world = Arc::new(world);
    let mut engine = engine(world.clone());
    let mut character = Character::new("Ada", "Warrior");

    let result = engine
        .generate(&FixedLocation::new(47.0, 8.0), &mut character, &mut MemoryStore::new())
        .await
        .unwrap();

    assert_eq!(result.weather.condition, WeatherCondition::Clear);
    assert_eq!(result.weather.temperature, 20.0);
    assert_eq!(result.recoveries[0].stage, Stage::Weather);
    assert!(result.recoveries[0].warning.contains("expected JSON"));
    // Weather is never retried.
    assert_eq!(world.hosts().iter().filter(|h| *h == "weather.test").count(), 1);
}

// Documented contract: a class the storyboard lacks gets the two-event
// placeholder, not another class's branch.
#[tokio::test]
async fn unknown_class_gets_placeholder_events() {
    let world = Arc::new(FakeWorld::new(120, 0, 0, "1"));
    let mut engine = engine(world);
    let mut character = Character::new("Pip", "Bard");

    let result = engine
        .generate(&FixedLocation::new(47.0, 8.0), &mut character, &mut MemoryStore::new())
        .await
        .unwrap();

    assert_eq!(result.event_key, "Event_2");
    assert_eq!(result.event.description, "Still nothing.");
    assert_eq!(placeholder_events().len(), 2);
    assert_eq!(result.recoveries[0].stage, Stage::Storyboard);
}

#[tokio::test(start_paused = true)]
async fn unreachable_overpass_backs_off_on_every_probe() {
    let mut world = FakeWorld::new(0, 0, 0, "0");
    world.buildings = None;
    world.woods = None;
    let world = Arc::new(world);

    let mut engine = ScenarioEngine::builder()
        .config_path(CONFIG)
        .storyboard_path(STORYBOARD)
        .transport(world.clone())
        .build()
        .unwrap();
    let mut character = Character::new("Ada", "Warrior");

    let started = tokio::time::Instant::now();
    let result = engine
        .generate(&FixedLocation::new(47.0, 8.0), &mut character, &mut MemoryStore::new())
        .await
        .unwrap();
    let elapsed = started.elapsed();

    // Three probes, each waiting 1500ms + 3000ms between its three attempts.
    assert!(
        elapsed >= Duration::from_millis(13_500) && elapsed < Duration::from_millis(13_600),
        "unexpected backoff total {:?}",
        elapsed
    );
    assert_eq!(result.zone, Zone::Wild);
    assert_eq!(result.terrain, Some(Terrain::TemperatePlains));
    let overpass_calls = world.hosts().iter().filter(|h| *h == "overpass.test").count();
    assert_eq!(overpass_calls, 9);
    let stages: Vec<Stage> = result.recoveries.iter().map(|r| r.stage).collect();
    assert_eq!(stages, vec![Stage::Zone, Stage::Terrain]);
}
