//! Storyboard integration tests: fixture loading, cascade resolution and linting.

use scenario_engine::core::storyboard::{LintLevel, Storyboard, StoryboardError};
use std::path::Path;

fn json_fixture() -> Storyboard {
    Storyboard::load(Path::new("tests/fixtures/storyboard.json")).unwrap()
}

#[test]
fn json_fixture_loads_with_ids_and_aliases() {
    let sb = json_fixture();
    assert_eq!(sb.classes.keys().collect::<Vec<_>>(), vec!["Warrior", "Mage"]);

    let branch = sb.resolve_branch("Warrior", "Urban", "Clear").unwrap();
    let first = &branch.events["Event_1"];
    assert_eq!(first.id, "Event_1");
    // `options` is accepted for `choices`.
    assert_eq!(first.choices.len(), 2);
    assert_eq!(first.choices[0].next_event_key.as_deref(), Some("Event_2"));
    assert_eq!(first.choices[1].next_event_key, None);
}

#[test]
fn ron_fixture_matches_json_where_they_overlap() {
    let ron = Storyboard::load(Path::new("tests/fixtures/storyboard.ron")).unwrap();
    let json = json_fixture();

    let from_ron = ron.resolve_branch("Warrior", "Urban", "Clear").unwrap();
    let from_json = json.resolve_branch("Warrior", "Urban", "Clear").unwrap();
    assert_eq!(from_ron.events["Event_1"].choices, from_json.events["Event_1"].choices);
    assert_eq!(
        from_ron.events["Event_2"].description,
        from_json.events["Event_2"].description
    );

    let desert = ron.resolve_branch("Warrior", "desert", "Clear").unwrap();
    assert_eq!(desert.events["Event_1"].timeout, Some(30.0));
}

#[test]
fn cascade_over_fixture() {
    let sb = json_fixture();

    // Terrain not authored for Warrior: Urban, then weather as requested.
    let b = sb.resolve_branch("Warrior", "taiga", "Rain").unwrap();
    assert_eq!((b.biome, b.weather), ("Urban", "Rain"));

    // Weather not authored: Clear.
    let b = sb.resolve_branch("Warrior", "Urban", "Fog").unwrap();
    assert_eq!(b.weather, "Clear");

    // Neither requested weather nor Clear: first authored weather.
    let b = sb.resolve_branch("Warrior", "Outskirts", "Snow").unwrap();
    assert_eq!(b.weather, "Cloudy");

    // No Urban branch for Mage: first authored biome.
    let b = sb.resolve_branch("Mage", "Forest", "Snow").unwrap();
    assert_eq!((b.biome, b.weather), ("tundra", "Snow"));

    assert!(matches!(
        sb.resolve_branch("Bard", "Urban", "Clear"),
        Err(StoryboardError::UnknownClass(_))
    ));
}

#[test]
fn fixture_lints_without_errors() {
    let issues = json_fixture().lint();
    assert!(issues.iter().all(|i| i.level == LintLevel::Warning));

    let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
    assert!(paths.contains(&"Warrior/Outskirts"));
    assert!(paths.contains(&"Warrior/Forest/Clear"));
    assert!(paths.contains(&"Mage"));
    assert!(paths.contains(&"Mage/tundra"));
}

#[test]
fn missing_file_is_io_error() {
    assert!(matches!(
        Storyboard::load(Path::new("tests/fixtures/absent.json")),
        Err(StoryboardError::Io(_))
    ));
}
