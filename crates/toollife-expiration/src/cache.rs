//! In-process forecast cache
//!
//! LRU store of the forecast outcomes with a per entry time-to-live,
//! computed by [`ToolLivesByMachine::outcome_cache_timeout`].

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use toollife_core::{Collaborators, MachineId, Result};
use toollife_settings::ConfigSet;

use crate::outcome::Outcome;
use crate::request::{ToolLivesByMachine, CACHE_KEY_PREFIX};
use crate::response::ToolLivesByMachineResponse;

/// Default number of cached forecasts
pub const DEFAULT_CAPACITY: usize = 1_000;

#[derive(Debug, Clone)]
struct CacheEntry {
    outcome: Outcome<ToolLivesByMachineResponse>,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

/// LRU forecast cache with TTL
pub struct ForecastCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
}

impl ForecastCache {
    /// Create a cache of at most `capacity` forecasts (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cached outcome of `request` if still valid, else compute and cache it
    pub fn get_or_compute(
        &self,
        request: &ToolLivesByMachine,
        collaborators: &Collaborators,
        config: &ConfigSet,
    ) -> Result<Outcome<ToolLivesByMachineResponse>> {
        let key = request.cache_key();
        if let Some(outcome) = self.get(&key) {
            tracing::debug!(%key, kind = outcome.kind(), "Forecast cache hit");
            return Ok(outcome);
        }

        let settings = request.settings(config)?;
        let outcome = request.get_with_settings(collaborators, &settings)?;
        match ToolLivesByMachine::outcome_cache_timeout(&outcome, &settings) {
            Some(timeout) => {
                let ttl = timeout.to_std().unwrap_or(Duration::ZERO);
                tracing::debug!(%key, ttl_ms = ttl.as_millis() as u64, "Forecast cached");
                self.insert(key, outcome.clone(), ttl);
            }
            None => tracing::debug!(%key, kind = outcome.kind(), "Forecast not cached"),
        }
        Ok(outcome)
    }

    /// Valid cached outcome
    pub fn get(&self, key: &str) -> Option<Outcome<ToolLivesByMachineResponse>> {
        let mut cache = self.cache.lock();
        let now = Instant::now();

        if let Some(entry) = cache.get(key) {
            if !entry.is_expired(now) {
                return Some(entry.outcome.clone());
            }
            cache.pop(key);
        }
        None
    }

    fn insert(&self, key: String, outcome: Outcome<ToolLivesByMachineResponse>, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        self.cache.lock().put(
            key,
            CacheEntry {
                outcome,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Remove every forecast of a machine, whatever its max expiration time
    pub fn invalidate_machine(&self, machine_id: MachineId) -> usize {
        let prefix = format!("{}.{}", CACHE_KEY_PREFIX, machine_id);
        let mut cache = self.cache.lock();

        let keys: Vec<String> = cache
            .iter()
            .map(|(key, _)| key)
            .filter(|key| {
                key.strip_prefix(&prefix)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('?'))
            })
            .cloned()
            .collect();

        for key in &keys {
            cache.pop(key);
        }
        if !keys.is_empty() {
            tracing::debug!(%machine_id, removed = keys.len(), "Forecast cache invalidated");
        }
        keys.len()
    }

    /// Remove the expired forecasts
    pub fn prune_expired(&self) {
        let mut cache = self.cache.lock();
        let now = Instant::now();

        let expired_keys: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in expired_keys {
            cache.pop(&key);
        }
    }

    /// Remove every forecast
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// Number of cached forecasts, expired ones included
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ForecastCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for ForecastCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastCache")
            .field("len", &self.len())
            .finish()
    }
}
