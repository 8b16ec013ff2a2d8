//! Cache backends: a shared redb-backed tier and an in-process fallback.

use anyhow::Result;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

const CACHE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("research_cache");

/// One cached value. Entries are replaced, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub stored_at: DateTime<Utc>,
    pub ttl_ms: u64,
    pub value: Value,
}

impl CacheEntry {
    pub fn new(value: Value, ttl_ms: u64) -> Self {
        Self {
            stored_at: Utc::now(),
            ttl_ms,
            value,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age_ms = now
            .signed_duration_since(self.stored_at)
            .num_milliseconds()
            .max(0);
        age_ms as u64 > self.ttl_ms
    }
}

/// Storage interface shared by the cache tiers.
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn read(&self, key: &str) -> Result<Option<CacheEntry>>;
    fn write(&self, key: &str, entry: &CacheEntry) -> Result<()>;
    fn remove(&self, key: &str) -> Result<bool>;
    fn entries(&self) -> Result<Vec<(String, CacheEntry)>>;
}

/// Shared on-disk tier.
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let db = Arc::new(Database::create(dir.join("cache.redb"))?);

        // Ensure the table exists
        let write_txn = db.begin_write()?;
        write_txn.open_table(CACHE_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }
}

impl CacheBackend for RedbBackend {
    fn name(&self) -> &'static str {
        "redb"
    }

    fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CACHE_TABLE)?;

        if let Some(data) = table.get(key)? {
            let entry: CacheEntry = serde_json::from_slice(data.value())?;
            Ok(Some(entry))
        } else {
            Ok(None)
        }
    }

    fn write(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        let serialized = serde_json::to_vec(entry)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CACHE_TABLE)?;
            table.insert(key, serialized.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(CACHE_TABLE)?;
            table.remove(key)?.is_some()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    fn entries(&self) -> Result<Vec<(String, CacheEntry)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CACHE_TABLE)?;
        let mut entries = Vec::new();

        for item in table.iter()? {
            let (key, value) = item?;
            match serde_json::from_slice(value.value()) {
                Ok(entry) => entries.push((key.value().to_string(), entry)),
                Err(err) => {
                    tracing::warn!(key = key.value(), %err, "skipping unreadable cache entry")
                }
            }
        }

        Ok(entries)
    }
}

/// In-process fallback tier.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.lock().expect("cache lock").get(key).cloned())
    }

    fn write(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        self.entries
            .lock()
            .expect("cache lock")
            .insert(key.to_string(), entry.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self
            .entries
            .lock()
            .expect("cache lock")
            .remove(key)
            .is_some())
    }

    fn entries(&self) -> Result<Vec<(String, CacheEntry)>> {
        Ok(self
            .entries
            .lock()
            .expect("cache lock")
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect())
    }
}
