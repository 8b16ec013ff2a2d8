use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;

/// A configured API key. Only the hash is kept in memory.
#[derive(Debug, Clone)]
pub struct ApiKey {
    pub key_hash: String,
    pub last_used: Option<DateTime<Utc>>,
}

/// Validates inbound API credentials against the configured key set.
#[derive(Debug, Default)]
pub struct ApiKeyManager {
    keys_by_hash: RwLock<HashMap<String, ApiKey>>,
}

impl ApiKeyManager {
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys_by_hash = keys
            .into_iter()
            .filter(|key| !key.as_ref().trim().is_empty())
            .map(|key| {
                let key_hash = sha256_hex(key.as_ref().trim());
                (
                    key_hash.clone(),
                    ApiKey {
                        key_hash,
                        last_used: None,
                    },
                )
            })
            .collect();

        Self {
            keys_by_hash: RwLock::new(keys_by_hash),
        }
    }

    pub fn validate_key(&self, key: &str) -> Option<ApiKey> {
        let key_hash = sha256_hex(key);
        let mut keys = self.keys_by_hash.write().expect("api key lock");
        let record = keys.get_mut(&key_hash)?;
        record.last_used = Some(Utc::now());
        Some(record.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.keys_by_hash.read().expect("api key lock").is_empty()
    }
}

pub fn sha256_hex(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validates_configured_key() {
        let manager = ApiKeyManager::from_keys(["alpha", " beta "]);
        assert!(manager.validate_key("alpha").is_some());
        assert!(manager.validate_key("beta").is_some());
        assert!(manager.validate_key("gamma").is_none());
    }

    #[test]
    fn test_tracks_last_used() {
        let manager = ApiKeyManager::from_keys(["alpha"]);
        let first = manager.validate_key("alpha").unwrap();
        assert!(first.last_used.is_some());
    }

    #[test]
    fn test_empty_configuration() {
        let manager = ApiKeyManager::from_keys(Vec::<String>::new());
        assert!(manager.is_empty());
        assert!(manager.validate_key("anything").is_none());
    }
}
