use serde_json::Value;

use super::cache::coordinate_key_part;
use super::provider::{HttpWeatherProvider, ProviderApi};
use super::types::WeatherQuery;
use crate::config::ProviderConfig;

/// OpenWeatherMap current-weather API, queried by coordinates.
pub struct OpenWeatherMap;

pub type OpenWeatherMapProvider = HttpWeatherProvider<OpenWeatherMap>;

impl ProviderApi for OpenWeatherMap {
    const NAME: &'static str = "OpenWeatherMap";

    fn cache_key(query: &WeatherQuery) -> String {
        format!(
            "{}:{}:{}",
            Self::NAME,
            coordinate_key_part(query.lon),
            coordinate_key_part(query.lat)
        )
    }

    fn query_params(query: &WeatherQuery, config: &ProviderConfig) -> Vec<(&'static str, String)> {
        vec![
            ("appid", config.api_key.clone()),
            ("units", config.units.clone()),
            ("lon", query.lon.to_string()),
            ("lat", query.lat.to_string()),
        ]
    }

    fn wind_speed(body: &Value) -> Option<f64> {
        body.pointer("/wind/speed")?.as_f64()
    }

    fn temperature(body: &Value) -> Option<f64> {
        body.pointer("/main/temp")?.as_f64()
    }
}
