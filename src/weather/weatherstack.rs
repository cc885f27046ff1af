use serde_json::Value;

use super::cache::location_key_part;
use super::provider::{HttpWeatherProvider, ProviderApi};
use super::types::WeatherQuery;
use crate::config::ProviderConfig;

/// WeatherStack current-weather API, queried by free-text place name.
pub struct WeatherStack;

pub type WeatherStackProvider = HttpWeatherProvider<WeatherStack>;

impl ProviderApi for WeatherStack {
    const NAME: &'static str = "WeatherStack";

    fn cache_key(query: &WeatherQuery) -> String {
        format!("{}:{}", Self::NAME, location_key_part(&query.location))
    }

    fn query_params(query: &WeatherQuery, config: &ProviderConfig) -> Vec<(&'static str, String)> {
        vec![
            ("access_key", config.api_key.clone()),
            ("units", config.units.clone()),
            ("query", query.location.clone()),
        ]
    }

    fn wind_speed(body: &Value) -> Option<f64> {
        body.pointer("/current/wind_speed")?.as_f64()
    }

    fn temperature(body: &Value) -> Option<f64> {
        body.pointer("/current/temperature")?.as_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use crate::weather::cache::testing::ManualClock;
    use crate::weather::provider::{ProviderError, WeatherProvider};
    use crate::weather::types::WeatherDetails;
    use reqwest::Client;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, clock: Arc<ManualClock>) -> WeatherStackProvider {
        let config = ProviderConfig {
            kind: ProviderKind::WeatherStack,
            base_url: server.uri(),
            path: "/current".to_string(),
            api_key: "ws-key".to_string(),
            units: "m".to_string(),
            cache_ttl: Duration::from_secs(3),
        };
        HttpWeatherProvider::new(Client::new(), config, clock)
    }

    async fn mount_for(server: &MockServer, location: &str, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/current"))
            .and(query_param("access_key", "ws-key"))
            .and(query_param("units", "m"))
            .and(query_param("query", location))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "current": { "wind_speed": 15, "temperature": 20 } })),
            )
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_reads_wind_speed_and_temperature() {
        let server = MockServer::start().await;
        mount_for(&server, "Melbourne", 1).await;

        let provider = provider(&server, Arc::new(ManualClock::new()));
        let details = provider
            .get_weather_details(&WeatherQuery::new("Melbourne", 144.94, -37.84))
            .await
            .unwrap();

        assert_eq!(details.wind_speed(), 15.0);
        assert_eq!(details.temperature_degrees(), 20.0);
    }

    #[tokio::test]
    async fn test_server_error_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = provider(&server, Arc::new(ManualClock::new()));
        let err = provider
            .get_weather_details(&WeatherQuery::new("Melbourne", 144.94, -37.84))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProviderError::UpstreamUnavailable { ref provider, .. } if provider == "WeatherStack"
        ));
    }

    #[tokio::test]
    async fn test_unexpected_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "invalid": "response" })),
            )
            .mount(&server)
            .await;

        let provider = provider(&server, Arc::new(ManualClock::new()));
        let err = provider
            .get_weather_details(&WeatherQuery::new("Melbourne", 144.94, -37.84))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProviderError::MalformedResponse {
                provider: "WeatherStack".to_string(),
                reason: "wind speed missing".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_caches_response_for_three_seconds() {
        let server = MockServer::start().await;
        mount_for(&server, "Melbourne", 2).await;

        let clock = Arc::new(ManualClock::new());
        let provider = provider(&server, clock.clone());
        let query = WeatherQuery::new("Melbourne", 144.94, -37.84);

        let first = provider.get_weather_details(&query).await.unwrap();

        clock.advance(chrono::Duration::seconds(1));
        let second = provider.get_weather_details(&query).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);

        clock.advance(chrono::Duration::seconds(3));
        provider.get_weather_details(&query).await.unwrap();
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_new_location_is_not_served_from_cache() {
        let server = MockServer::start().await;
        mount_for(&server, "Melbourne", 1).await;
        mount_for(&server, "Sydney", 1).await;

        let clock = Arc::new(ManualClock::new());
        let provider = provider(&server, clock.clone());

        provider
            .get_weather_details(&WeatherQuery::new("Melbourne", 144.94, -37.84))
            .await
            .unwrap();
        clock.advance(chrono::Duration::seconds(1));
        provider
            .get_weather_details(&WeatherQuery::new("Sydney", 144.94, -37.84))
            .await
            .unwrap();
    }

    #[test]
    fn test_cache_key_ignores_coordinates() {
        let a = WeatherStack::cache_key(&WeatherQuery::new("New York", 1.0, 2.0));
        let b = WeatherStack::cache_key(&WeatherQuery::new("New York", 3.0, 4.0));

        assert_eq!(a, b);
        assert_eq!(a, "WeatherStack:New%20York");
    }
}
