//! Content-addressed research result cache with TTL expiry and a tiered
//! backend: a shared redb store when available, an in-process map otherwise.
//! Cache trouble never fails a request; at worst the optimization is skipped.

pub mod backend;

use chrono::Utc;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use backend::{CacheBackend, CacheEntry, MemoryBackend, RedbBackend};

/// Derive the storage key for a logical cache key.
///
/// `serde_json` maps iterate in sorted key order, so serialization is
/// canonical: identical fields produce identical keys regardless of
/// insertion order.
pub fn cache_key(data: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

pub struct ResearchCache {
    enabled: bool,
    default_ttl: Duration,
    primary: Option<Box<dyn CacheBackend>>,
    fallback: MemoryBackend,
}

impl ResearchCache {
    /// Probe the shared tier once at construction; a failed probe leaves the
    /// in-memory tier as the only backend.
    pub fn new(config: &CacheConfig) -> Self {
        let primary: Option<Box<dyn CacheBackend>> = if config.enabled {
            match RedbBackend::open(&config.dir) {
                Ok(store) => {
                    info!(dir = %config.dir.display(), ttl_secs = config.ttl.as_secs(), "cache initialized");
                    Some(Box::new(store))
                }
                Err(err) => {
                    warn!(%err, "shared cache store unavailable, using in-memory cache only");
                    None
                }
            }
        } else {
            info!("caching is disabled");
            None
        };

        Self {
            enabled: config.enabled,
            default_ttl: config.ttl,
            primary,
            fallback: MemoryBackend::new(),
        }
    }

    /// Look up a value. Expired entries are treated as absent and purged.
    pub fn get(&self, data: &Value) -> Option<Value> {
        if !self.enabled {
            return None;
        }

        let key = cache_key(data);
        let entry = self.read_entry(&key)?;

        if entry.is_expired(Utc::now()) {
            debug!(key, "cache entry expired");
            self.purge(&key);
            return None;
        }

        info!(key, "cache hit");
        Some(entry.value)
    }

    /// Store a value with the given or default TTL. Returns whether a write
    /// landed in any tier; always `false` when the cache is disabled.
    pub fn set(&self, data: &Value, value: &Value, ttl: Option<Duration>) -> bool {
        if !self.enabled {
            return false;
        }

        let key = cache_key(data);
        let ttl = ttl.unwrap_or(self.default_ttl);
        let entry = CacheEntry::new(value.clone(), ttl.as_millis() as u64);

        if let Some(primary) = &self.primary {
            match primary.write(&key, &entry) {
                Ok(()) => {
                    info!(key, "cached result");
                    return true;
                }
                Err(err) => warn!(%err, "shared cache write failed, falling back"),
            }
        }

        match self.fallback.write(&key, &entry) {
            Ok(()) => {
                info!(key, "cached result in memory");
                true
            }
            Err(err) => {
                warn!(%err, "cache write failed");
                false
            }
        }
    }

    /// Drop a key from every tier. Returns whether anything was removed;
    /// always `false` when the cache is disabled.
    pub fn invalidate(&self, data: &Value) -> bool {
        if !self.enabled {
            return false;
        }

        let key = cache_key(data);
        let removed = self.purge(&key);
        if removed {
            info!(key, "invalidated cache entry");
        }
        removed
    }

    /// Remove expired entries from every tier, returning the count removed.
    pub fn clear_expired(&self) -> usize {
        if !self.enabled {
            return 0;
        }

        let now = Utc::now();
        let mut removed = 0;
        for tier in self.tiers() {
            match tier.entries() {
                Ok(entries) => {
                    for (key, entry) in entries {
                        if entry.is_expired(now) && tier.remove(&key).unwrap_or(false) {
                            removed += 1;
                        }
                    }
                }
                Err(err) => warn!(tier = tier.name(), %err, "cache sweep failed"),
            }
        }
        removed
    }

    /// Remove every entry from every tier, returning the count removed.
    pub fn clear_all(&self) -> usize {
        if !self.enabled {
            return 0;
        }

        let mut removed = 0;
        for tier in self.tiers() {
            match tier.entries() {
                Ok(entries) => {
                    for (key, _) in entries {
                        if tier.remove(&key).unwrap_or(false) {
                            removed += 1;
                        }
                    }
                }
                Err(err) => warn!(tier = tier.name(), %err, "cache clear failed"),
            }
        }
        info!(removed, "cleared cache entries");
        removed
    }

    fn read_entry(&self, key: &str) -> Option<CacheEntry> {
        if let Some(primary) = &self.primary {
            match primary.read(key) {
                Ok(Some(entry)) => return Some(entry),
                Ok(None) => {}
                Err(err) => warn!(%err, "shared cache read failed, falling back"),
            }
        }
        self.fallback.read(key).unwrap_or_default()
    }

    fn purge(&self, key: &str) -> bool {
        let mut removed = false;
        for tier in self.tiers() {
            match tier.remove(key) {
                Ok(hit) => removed |= hit,
                Err(err) => warn!(tier = tier.name(), %err, "cache removal failed"),
            }
        }
        removed
    }

    fn tiers(&self) -> impl Iterator<Item = &dyn CacheBackend> {
        self.primary
            .iter()
            .map(|tier| tier.as_ref())
            .chain(std::iter::once(&self.fallback as &dyn CacheBackend))
    }
}
