//! Overpass `out count` queries shared by the zone and terrain stages.

use serde_json::Value;

use crate::core::lookup::{endpoint_url, LookupClient, LookupError};
use crate::schema::coords::Coordinates;

/// Feature selectors counted by the structure-density probe.
pub const BUILDING_SELECTORS: &[&str] = &[
    r#"node["building"]"#,
    r#"way["building"]"#,
    r#"relation["building"]"#,
];

/// Feature selectors counted by the vegetation probe.
pub const WOODLAND_SELECTORS: &[&str] = &[r#"way["natural"="wood"]"#, r#"relation["natural"="wood"]"#];

/// Build an Overpass QL query counting `selectors` within `radius_m` of `coords`.
pub fn count_query(selectors: &[&str], radius_m: u32, coords: Coordinates) -> String {
    let mut query = String::from("[out:json][timeout:25];\n(\n");
    for selector in selectors {
        query.push_str(&format!(
            "  {}(around:{},{},{});\n",
            selector, radius_m, coords.latitude, coords.longitude
        ));
    }
    query.push_str(");\nout count;");
    query
}

/// Extract the feature count from an `out count` response.
///
/// Reads `elements[0].tags.total` (a number or numeric string) and falls
/// back to the number of elements; a response without elements counts as 0.
pub fn element_count(response: &Value) -> u64 {
    let Some(elements) = response.get("elements").and_then(Value::as_array) else {
        return 0;
    };

    let total = elements
        .first()
        .and_then(|e| e.get("tags"))
        .and_then(|t| t.get("total"))
        .and_then(|total| match total {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

    total.unwrap_or(elements.len() as u64)
}

/// Run one count query against the interpreter at `base_url`. Single-shot.
pub async fn fetch_count(
    client: &LookupClient,
    base_url: &str,
    selectors: &[&str],
    radius_m: u32,
    coords: Coordinates,
) -> Result<u64, LookupError> {
    let query = count_query(selectors, radius_m, coords);
    let url = endpoint_url(base_url, &[("data", query)])?;
    let response = client.fetch_json(&url).await?;
    Ok(element_count(&response))
}
