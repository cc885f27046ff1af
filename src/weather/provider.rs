use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

use super::cache::{Clock, ResponseCache};
use super::types::{WeatherDetails, WeatherQuery};
use crate::config::ProviderConfig;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("unable to fetch data from {provider}: {reason}")]
    UpstreamUnavailable { provider: String, reason: String },
    #[error("error parsing {provider} response: {reason}")]
    MalformedResponse { provider: String, reason: String },
}

/// A source of current weather for a location.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn get_weather_details(
        &self,
        query: &WeatherQuery,
    ) -> Result<WeatherDetails, ProviderError>;
}

/// Request and response shape of one upstream API.
pub trait ProviderApi: Send + Sync + 'static {
    const NAME: &'static str;

    /// Cache key for the response cache. Must start with `NAME` and only use
    /// the query fields the request actually sends.
    fn cache_key(query: &WeatherQuery) -> String;

    fn query_params(query: &WeatherQuery, config: &ProviderConfig) -> Vec<(&'static str, String)>;

    fn wind_speed(body: &Value) -> Option<f64>;

    fn temperature(body: &Value) -> Option<f64>;
}

/// HTTP-backed provider with its own short-lived response cache.
pub struct HttpWeatherProvider<A: ProviderApi> {
    client: Client,
    config: ProviderConfig,
    cache: ResponseCache,
    _api: PhantomData<A>,
}

impl<A: ProviderApi> HttpWeatherProvider<A> {
    pub fn new(client: Client, config: ProviderConfig, clock: Arc<dyn Clock>) -> Self {
        let cache = ResponseCache::new(config.cache_ttl, clock);
        Self {
            client,
            config,
            cache,
            _api: PhantomData,
        }
    }

    async fn fetch(&self, query: &WeatherQuery) -> Result<Value, ProviderError> {
        let url = self.config.url();
        let params = A::query_params(query, &self.config);

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| upstream_unavailable::<A>(describe_transport_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(upstream_unavailable::<A>(format!("HTTP {}", status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| upstream_unavailable::<A>(describe_transport_error(&e)))?;

        serde_json::from_str(&text).map_err(|e| ProviderError::MalformedResponse {
            provider: A::NAME.to_string(),
            reason: e.to_string(),
        })
    }

    fn parse(body: &Value) -> Result<WeatherDetails, ProviderError> {
        let wind_speed = A::wind_speed(body).ok_or_else(|| malformed::<A>("wind speed missing"))?;
        let temperature =
            A::temperature(body).ok_or_else(|| malformed::<A>("temperature missing"))?;

        Ok(WeatherDetails::new(wind_speed, temperature))
    }
}

#[async_trait]
impl<A: ProviderApi> WeatherProvider for HttpWeatherProvider<A> {
    fn name(&self) -> &str {
        A::NAME
    }

    async fn get_weather_details(
        &self,
        query: &WeatherQuery,
    ) -> Result<WeatherDetails, ProviderError> {
        let key = A::cache_key(query);

        if let Some(details) = self.cache.get(&key).await {
            tracing::debug!(provider = A::NAME, key = %key, "response cache hit");
            return Ok(details);
        }

        let body = self.fetch(query).await?;
        let details = Self::parse(&body)?;

        tracing::debug!(
            provider = A::NAME,
            wind_speed = details.wind_speed(),
            temperature = details.temperature_degrees(),
            "fetched weather from upstream"
        );
        self.cache.insert(key, details).await;
        Ok(details)
    }
}

fn upstream_unavailable<A: ProviderApi>(reason: String) -> ProviderError {
    ProviderError::UpstreamUnavailable {
        provider: A::NAME.to_string(),
        reason,
    }
}

fn malformed<A: ProviderApi>(reason: &str) -> ProviderError {
    ProviderError::MalformedResponse {
        provider: A::NAME.to_string(),
        reason: reason.to_string(),
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.to_string()
    }
}
