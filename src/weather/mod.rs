pub mod cache;
pub mod openweathermap;
pub mod provider;
pub mod service;
pub mod types;
pub mod weatherstack;

use reqwest::Client;
use std::sync::Arc;

use crate::config::{Config, ProviderConfig, ProviderKind};
use cache::{Clock, DurabilityCache};
use openweathermap::OpenWeatherMapProvider;
use provider::WeatherProvider;
use service::WeatherService;
use weatherstack::WeatherStackProvider;

pub fn build_provider(
    config: &ProviderConfig,
    client: Client,
    clock: Arc<dyn Clock>,
) -> Arc<dyn WeatherProvider> {
    tracing::debug!(kind = %config.kind, url = %config.url(), "configuring weather provider");

    match config.kind {
        ProviderKind::OpenWeatherMap => {
            Arc::new(OpenWeatherMapProvider::new(client, config.clone(), clock))
        }
        ProviderKind::WeatherStack => {
            Arc::new(WeatherStackProvider::new(client, config.clone(), clock))
        }
    }
}

/// Wires the configured providers, in order, into a `WeatherService`.
pub fn build_service(config: &Config, clock: Arc<dyn Clock>) -> anyhow::Result<WeatherService> {
    let client = Client::builder()
        .user_agent("WeatherFailoverServer/1.0")
        .timeout(config.http_timeout)
        .build()?;

    let providers = config
        .providers
        .iter()
        .map(|provider| build_provider(provider, client.clone(), clock.clone()))
        .collect();

    Ok(WeatherService::new(providers, DurabilityCache::new())?)
}
