//! Caches used by the weather pipeline.
//!
//! `ResponseCache` sits inside each provider and absorbs bursts of identical
//! requests for a few seconds. `DurabilityCache` is shared by the service and
//! keeps the last good answer per logical request for total outages.

use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::types::{WeatherDetails, WeatherQuery};

const RESPONSE_CACHE_CAPACITY: u64 = 10_000;

/// Time source for cache expiry.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Clone, Debug)]
struct CacheEntry {
    value: WeatherDetails,
    expires_at: DateTime<Utc>,
}

/// Short-lived per-provider cache keyed by the provider's request key.
///
/// Expiry is decided against the injected [`Clock`]; moka's own TTL only
/// reaps memory and never keeps an entry alive past `expires_at`.
#[derive(Clone, Debug)]
pub struct ResponseCache {
    entries: Cache<String, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let entries = Cache::builder()
            .max_capacity(RESPONSE_CACHE_CAPACITY)
            .time_to_live(ttl.max(Duration::from_secs(1)))
            .build();

        Self {
            entries,
            ttl,
            clock,
        }
    }

    /// Returns the cached value if it has not reached its expiry instant.
    pub async fn get(&self, key: &str) -> Option<WeatherDetails> {
        let entry = self.entries.get(key).await?;
        if self.clock.now() < entry.expires_at {
            Some(entry.value)
        } else {
            None
        }
    }

    pub async fn insert(&self, key: String, value: WeatherDetails) {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero());
        let entry = CacheEntry {
            value,
            expires_at: self.clock.now() + ttl,
        };
        self.entries.insert(key, entry).await;
    }
}

/// Last known good answer per aggregate key. No expiry, overwritten on every success.
#[derive(Clone, Debug)]
pub struct DurabilityCache {
    entries: Cache<String, WeatherDetails>,
}

impl DurabilityCache {
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<WeatherDetails> {
        self.entries.get(key).await
    }

    pub async fn put(&self, key: String, value: WeatherDetails) {
        self.entries.insert(key, value).await;
    }
}

impl Default for DurabilityCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Percent-encodes a free-text location so it cannot contain the `:` separator.
pub fn location_key_part(location: &str) -> String {
    urlencoding::encode(location).into_owned()
}

/// Formats a coordinate for use in a key. `-0.0` and `0.0` map to the same text.
pub fn coordinate_key_part(value: f64) -> String {
    format!("{}", value + 0.0)
}

/// Key for the durability cache, built from the whole logical request.
pub fn aggregate_key(query: &WeatherQuery) -> String {
    format!(
        "{}:{}:{}",
        location_key_part(&query.location),
        coordinate_key_part(query.lon),
        coordinate_key_part(query.lat)
    )
}
