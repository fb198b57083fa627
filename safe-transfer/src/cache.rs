//! Request-scoped cache for bus occupancy lookups.
//!
//! Several candidate routes of one request usually ride the same bus
//! between the same stations at the same time. The first lookup fetches
//! the line detail and computes occupancies; every later lookup with the
//! same key reuses that outcome, failures included. Concurrent misses on
//! one key are coalesced, so a key causes exactly one provider fetch.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use moka::future::Cache as MokaCache;

use crate::domain::{BusId, StationId};
use crate::odsay::ProviderError;
use crate::planner::BusOccupancy;

/// Cache key: the bus line plus the boarding/alighting stations and the
/// predicted boarding time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusLookupKey {
    pub bus_id: BusId,
    pub first_station: StationId,
    pub last_station: StationId,
    pub start_time: NaiveDateTime,
}

/// Cached outcome of one lookup.
pub type BusLookupOutcome = Result<Arc<BusOccupancy>, Arc<ProviderError>>;

/// Configuration for the cache.
///
/// The defaults keep every entry for the life of the cache, so each key is
/// fetched once per request.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Optional TTL for cached entries. `None` (the default) never expires
    /// an entry; set one only if a cache is shared beyond one request.
    pub ttl: Option<Duration>,

    /// Maximum number of cached entries. A request with more distinct keys
    /// than this may evict entries and fetch those keys again.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: None,
            max_capacity: 10_000,
        }
    }
}

impl CacheConfig {
    /// Expire entries `ttl` after insertion.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }
}

/// Cache of bus occupancy lookups for one request.
pub struct BusLookupCache {
    entries: MokaCache<BusLookupKey, BusLookupOutcome>,
}

impl BusLookupCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let mut builder = MokaCache::builder().max_capacity(config.max_capacity);
        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }
        let entries = builder.build();

        Self { entries }
    }

    /// Return the cached outcome for `key`, running `lookup` on a miss.
    ///
    /// If several callers miss on the same key at once, only one `lookup`
    /// runs and the others wait for its outcome.
    pub async fn get_or_lookup(
        &self,
        key: BusLookupKey,
        lookup: impl Future<Output = BusLookupOutcome>,
    ) -> BusLookupOutcome {
        self.entries.get_with(key, lookup).await
    }

    /// Get a cached outcome without looking anything up.
    pub async fn get(&self, key: &BusLookupKey) -> Option<BusLookupOutcome> {
        self.entries.get(key).await
    }

    /// Number of cached entries, after applying pending maintenance.
    pub async fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}
