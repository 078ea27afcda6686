//! Terrain refiner: latitude banding with a woodland override, Wild zones only.

use tracing::{debug, info};

use crate::core::lookup::LookupClient;
use crate::core::overpass::{fetch_count, WOODLAND_SELECTORS};
use crate::core::resolution::Resolution;
use crate::core::retry::RetryPolicy;
use crate::schema::coords::Coordinates;
use crate::schema::zone::Terrain;

/// Macro-climate band for a latitude. First matching rule wins:
/// below -60 tundra, above 60 taiga, strictly inside ±10 desert,
/// 10..=50 temperate plains, anything else plains.
pub fn terrain_for_latitude(latitude: f64) -> Terrain {
    if latitude < -60.0 {
        Terrain::Tundra
    } else if latitude > 60.0 {
        Terrain::Taiga
    } else if latitude > -10.0 && latitude < 10.0 {
        Terrain::Desert
    } else if (10.0..=50.0).contains(&latitude) {
        Terrain::TemperatePlains
    } else {
        Terrain::Plains
    }
}

#[derive(Clone)]
pub struct TerrainRefiner {
    client: LookupClient,
    retry: RetryPolicy,
    overpass_url: String,
    vegetation_radius_m: u32,
}

impl TerrainRefiner {
    pub fn new(
        client: LookupClient,
        retry: RetryPolicy,
        overpass_url: impl Into<String>,
        vegetation_radius_m: u32,
    ) -> Self {
        Self {
            client,
            retry,
            overpass_url: overpass_url.into(),
            vegetation_radius_m,
        }
    }

    /// Band the latitude, then override to Forest when any woodland lies
    /// within the vegetation radius. If the woodland query keeps failing
    /// the band result stands.
    pub async fn refine(&self, coords: Coordinates) -> Resolution<Terrain> {
        let band = terrain_for_latitude(coords.latitude);

        let woodland = self
            .retry
            .run_or(0, || {
                fetch_count(
                    &self.client,
                    &self.overpass_url,
                    WOODLAND_SELECTORS,
                    self.vegetation_radius_m,
                    coords,
                )
            })
            .await
            .map_warning(|w| format!("vegetation query: {}", w));

        debug!(band = %band, woodland = *woodland.value(), "Vegetation probe");
        let terrain = woodland.map(|count| if count > 0 { Terrain::Forest } else { band });
        info!(terrain = %terrain.value(), "Terrain refined");
        terrain
    }
}
