use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Upper bound for a response cache TTL.
pub const MAX_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("unknown weather provider: {0}")]
    UnknownProvider(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    OpenWeatherMap,
    WeatherStack,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenWeatherMap => "OpenWeatherMap",
            ProviderKind::WeatherStack => "WeatherStack",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openweathermap" => Ok(ProviderKind::OpenWeatherMap),
            "weatherstack" => Ok(ProviderKind::WeatherStack),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// Connection settings for one upstream weather provider.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: String,
    pub path: String,
    pub api_key: String,
    pub units: String,
    pub cache_ttl: Duration,
}

impl ProviderConfig {
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path)
    }

    fn from_env(kind: ProviderKind) -> Result<Self, ConfigError> {
        match kind {
            ProviderKind::OpenWeatherMap => Ok(ProviderConfig {
                kind,
                base_url: var_or("OPEN_WEATHER_MAP_BASE_URL", "https://api.openweathermap.org"),
                path: var_or("OPEN_WEATHER_MAP_URL_PATH", "/data/2.5/weather"),
                api_key: required("OPEN_WEATHER_MAP_API_KEY")?,
                units: var_or("OPEN_WEATHER_MAP_UNITS", "metric"),
                cache_ttl: secs_or("OPEN_WEATHER_MAP_CACHE_TTL_SECS", 3, MAX_CACHE_TTL_SECS)?,
            }),
            ProviderKind::WeatherStack => Ok(ProviderConfig {
                kind,
                base_url: var_or("WEATHER_STACK_BASE_URL", "http://api.weatherstack.com"),
                path: var_or("WEATHER_STACK_URL_PATH", "/current"),
                api_key: required("WEATHER_STACK_API_KEY")?,
                units: var_or("WEATHER_STACK_UNITS", "m"),
                cache_ttl: secs_or("WEATHER_STACK_CACHE_TTL_SECS", 3, MAX_CACHE_TTL_SECS)?,
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Providers in priority order.
    pub providers: Vec<ProviderConfig>,
    pub http_timeout: Duration,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let kinds = parse_provider_list(&var_or(
            "WEATHER_PROVIDERS",
            "weatherstack,openweathermap",
        ))?;

        let providers = kinds
            .into_iter()
            .map(ProviderConfig::from_env)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Config {
            providers,
            http_timeout: secs_or("HTTP_TIMEOUT_SECS", 10, u64::MAX)?,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:8080"),
        })
    }
}

/// Parses a comma-separated provider list, keeping its order. Blank entries are skipped.
pub fn parse_provider_list(raw: &str) -> Result<Vec<ProviderKind>, ConfigError> {
    raw.split(',')
        .filter(|name| !name.trim().is_empty())
        .map(ProviderKind::from_str)
        .collect()
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn secs_or(name: &'static str, default: u64, max: u64) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(value) => parse_secs(name, value, max),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

/// Parses a whole number of seconds no greater than `max`.
fn parse_secs(name: &'static str, value: String, max: u64) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs <= max => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}
