//! Zone classifier: Urban / Outskirts / Wild from building density.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::core::lookup::LookupClient;
use crate::core::overpass::{fetch_count, BUILDING_SELECTORS};
use crate::core::resolution::Resolution;
use crate::core::retry::RetryPolicy;
use crate::schema::coords::Coordinates;
use crate::schema::zone::Zone;

/// One density test: at least `threshold` structures within `radius_m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensityProbe {
    pub radius_m: u32,
    pub threshold: u64,
}

impl DensityProbe {
    pub const fn new(radius_m: u32, threshold: u64) -> Self {
        Self {
            radius_m,
            threshold,
        }
    }

    /// Threshold crossing is inclusive.
    pub fn is_met(&self, count: u64) -> bool {
        count >= self.threshold
    }
}

/// The two density tests, tried in order.
///
/// Deserialises field by field over the defaults, so a config can name
/// just one field of one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ThresholdOverrides")]
pub struct ZoneThresholds {
    pub urban: DensityProbe,
    pub outskirts: DensityProbe,
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            urban: DensityProbe::new(500, 50),
            outskirts: DensityProbe::new(1000, 30),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThresholdOverrides {
    urban: ProbeOverride,
    outskirts: ProbeOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProbeOverride {
    #[serde(deserialize_with = "present")]
    radius_m: Option<u32>,
    #[serde(deserialize_with = "present")]
    threshold: Option<u64>,
}

impl ProbeOverride {
    fn over(self, base: DensityProbe) -> DensityProbe {
        DensityProbe {
            radius_m: self.radius_m.unwrap_or(base.radius_m),
            threshold: self.threshold.unwrap_or(base.threshold),
        }
    }
}

/// A field that is written is a plain value, not `Some(..)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl From<ThresholdOverrides> for ZoneThresholds {
    fn from(overrides: ThresholdOverrides) -> Self {
        let base = ZoneThresholds::default();
        Self {
            urban: overrides.urban.over(base.urban),
            outskirts: overrides.outskirts.over(base.outskirts),
        }
    }
}

/// Classifies coordinates by querying the Overpass interpreter.
#[derive(Clone)]
pub struct ZoneClassifier {
    client: LookupClient,
    retry: RetryPolicy,
    overpass_url: String,
    thresholds: ZoneThresholds,
}

impl ZoneClassifier {
    pub fn new(
        client: LookupClient,
        retry: RetryPolicy,
        overpass_url: impl Into<String>,
        thresholds: ZoneThresholds,
    ) -> Self {
        Self {
            client,
            retry,
            overpass_url: overpass_url.into(),
            thresholds,
        }
    }

    /// Urban if the close-range test passes, else Outskirts if the wide
    /// test passes, else Wild. A probe whose query fails on every attempt
    /// counts 0 structures, which pushes classification towards Wild.
    pub async fn classify(&self, coords: Coordinates) -> Resolution<Zone> {
        let mut warnings = Vec::new();

        let (urban_count, warning) = self.count(coords, self.thresholds.urban).await.into_parts();
        warnings.extend(warning);

        let zone = if self.thresholds.urban.is_met(urban_count) {
            Zone::Urban
        } else {
            let (outskirts_count, warning) =
                self.count(coords, self.thresholds.outskirts).await.into_parts();
            warnings.extend(warning);

            if self.thresholds.outskirts.is_met(outskirts_count) {
                Zone::Outskirts
            } else {
                Zone::Wild
            }
        };

        info!(zone = %zone, "Zone classified");
        if warnings.is_empty() {
            Resolution::Direct(zone)
        } else {
            Resolution::recovered(zone, warnings.join("; "))
        }
    }

    async fn count(&self, coords: Coordinates, probe: DensityProbe) -> Resolution<u64> {
        let resolved = self
            .retry
            .run_or(0, || {
                fetch_count(
                    &self.client,
                    &self.overpass_url,
                    BUILDING_SELECTORS,
                    probe.radius_m,
                    coords,
                )
            })
            .await;
        debug!(
            radius_m = probe.radius_m,
            threshold = probe.threshold,
            count = *resolved.value(),
            "Density probe"
        );
        resolved.map_warning(|w| format!("density query at {}m: {}", probe.radius_m, w))
    }
}
