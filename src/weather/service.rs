use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::cache::{aggregate_key, DurabilityCache};
use super::provider::{ProviderError, WeatherProvider};
use super::types::{WeatherDetails, WeatherQuery};

/// One provider that failed during an aggregation attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: ProviderError,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

#[derive(Error, Debug)]
pub enum WeatherServiceError {
    #[error("unable to fetch weather details for location={location}, lon={lon}, lat={lat}")]
    AllProvidersFailed {
        location: String,
        lon: f64,
        lat: f64,
        failures: Vec<ProviderFailure>,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl WeatherServiceError {
    /// Provider failures behind this error, in the order they were tried.
    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            WeatherServiceError::AllProvidersFailed { failures, .. } => failures,
            WeatherServiceError::Configuration(_) => &[],
        }
    }
}

/// Tries providers in priority order and falls back to the last good answer.
pub struct WeatherService {
    providers: Vec<Arc<dyn WeatherProvider>>,
    durable: DurabilityCache,
}

impl fmt::Debug for WeatherService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherService")
            .field("providers", &self.provider_names())
            .finish_non_exhaustive()
    }
}

impl WeatherService {
    pub fn new(
        providers: Vec<Arc<dyn WeatherProvider>>,
        durable: DurabilityCache,
    ) -> Result<Self, WeatherServiceError> {
        if providers.is_empty() {
            return Err(WeatherServiceError::Configuration(
                "at least one weather provider is required".to_string(),
            ));
        }

        Ok(Self { providers, durable })
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn get_weather_details(
        &self,
        query: &WeatherQuery,
    ) -> Result<WeatherDetails, WeatherServiceError> {
        let key = aggregate_key(query);
        let mut failures = Vec::new();

        for provider in &self.providers {
            match provider.get_weather_details(query).await {
                Ok(details) => {
                    self.durable.put(key, details).await;
                    return Ok(details);
                }
                Err(error) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %error,
                        location = %query.location,
                        "unable to fetch weather from provider"
                    );
                    failures.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        error,
                    });
                }
            }
        }

        // Every provider failed; the last good answer has no staleness limit.
        if let Some(details) = self.durable.get(&key).await {
            tracing::warn!(
                key = %key,
                failed = failures.len(),
                "all providers failed, serving last known weather"
            );
            return Ok(details);
        }

        tracing::error!(
            location = %query.location,
            lon = query.lon,
            lat = query.lat,
            "all providers failed and no previous result is cached"
        );
        Err(WeatherServiceError::AllProvidersFailed {
            location: query.location.clone(),
            lon: query.lon,
            lat: query.lat,
            failures,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Provider returning whatever it is told to, counting calls.
    pub struct StubProvider {
        name: String,
        result: Mutex<Result<WeatherDetails, ProviderError>>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        pub fn ok(name: &str, details: WeatherDetails) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                result: Mutex::new(Ok(details)),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn failing(name: &str) -> Arc<Self> {
            let stub = Self::ok(name, WeatherDetails::new(0.0, 0.0));
            stub.fail();
            stub
        }

        pub fn with_error(name: &str, error: ProviderError) -> Arc<Self> {
            let stub = Self::ok(name, WeatherDetails::new(0.0, 0.0));
            stub.set_error(error);
            stub
        }

        pub fn fail(&self) {
            self.set_error(ProviderError::UpstreamUnavailable {
                provider: self.name.clone(),
                reason: "HTTP 500 Internal Server Error".to_string(),
            });
        }

        pub fn set_error(&self, error: ProviderError) {
            *self.result.lock().unwrap() = Err(error);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for StubProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn get_weather_details(
            &self,
            _query: &WeatherQuery,
        ) -> Result<WeatherDetails, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.lock().unwrap().clone()
        }
    }
}
