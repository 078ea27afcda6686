//! Weather resolver: current conditions from a weather-code service.

use serde_json::Value;
use tracing::{info, warn};

use crate::core::lookup::{endpoint_url, LookupClient, LookupError};
use crate::core::resolution::Resolution;
use crate::schema::coords::Coordinates;
use crate::schema::weather::{Weather, WeatherCondition};

#[derive(Clone)]
pub struct WeatherResolver {
    client: LookupClient,
    weather_url: String,
    fallback: Weather,
}

impl WeatherResolver {
    pub fn new(client: LookupClient, weather_url: impl Into<String>, fallback: Weather) -> Self {
        Self {
            client,
            weather_url: weather_url.into(),
            fallback,
        }
    }

    /// Fetch current weather. A single attempt; any failure yields the
    /// configured fallback as a recovery.
    pub async fn resolve(&self, coords: Coordinates) -> Resolution<Weather> {
        match self.fetch(coords).await {
            Ok(weather) => {
                info!(condition = %weather.condition, temperature = weather.temperature, "Weather resolved");
                Resolution::Direct(weather)
            }
            Err(e) => {
                warn!(error = %e, "Weather fetch failed, using default");
                Resolution::recovered(self.fallback, format!("weather fetch: {}", e))
            }
        }
    }

    async fn fetch(&self, coords: Coordinates) -> Result<Weather, LookupError> {
        let url = endpoint_url(
            &self.weather_url,
            &[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("current_weather", "true".to_string()),
                ("timezone", "auto".to_string()),
            ],
        )?;
        let data = self.client.fetch_json(&url).await?;
        parse_current_weather(&data)
    }
}

/// Read `current_weather.{weathercode,temperature}`. A missing or
/// non-integer code maps to Clear; a missing temperature is a format error.
pub fn parse_current_weather(data: &Value) -> Result<Weather, LookupError> {
    let current = data
        .get("current_weather")
        .ok_or_else(|| LookupError::MissingField("current_weather".to_string()))?;

    let code = current.get("weathercode").and_then(|c| {
        c.as_i64()
            .or_else(|| c.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
    });
    let temperature = current
        .get("temperature")
        .and_then(Value::as_f64)
        .ok_or_else(|| LookupError::MissingField("current_weather.temperature".to_string()))?;

    Ok(Weather::new(WeatherCondition::from_code(code), temperature))
}
