//! Advisory local cache.
//!
//! Versioned, optionally expiring, checksummed JSON entries over a
//! [`BaseKeyValueStore`]. The backend is always the source of truth: any
//! entry that is stale, from another version, or fails its checksum is
//! dropped and reported as absent. Writes fail softly (`false`).

pub mod drafts;
pub mod kv;

pub use drafts::DraftIdea;
pub use kv::{BaseKeyValueStore, FileKeyValueStore, MemoryKeyValueStore};

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const KEY_PREFIX: &str = "gamesta_";
const MAX_STORAGE_BYTES: usize = 5 * 1024 * 1024;
const DAY: Duration = Duration::from_secs(24 * 60 * 60);
/// Entries without their own max age are purged after this long when space runs out.
const FALLBACK_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Identity of a cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    pub key: &'static str,
    pub version: u32,
    pub max_age: Option<Duration>,
}

/// Cached entries used by the application.
pub mod configs {
    use super::{StorageConfig, DAY};
    use std::time::Duration;

    pub const USER: StorageConfig = StorageConfig {
        key: "user",
        version: 1,
        max_age: None,
    };
    pub const USER_SESSION: StorageConfig = StorageConfig {
        key: "user_session",
        version: 1,
        max_age: None,
    };
    pub const IDEAS: StorageConfig = StorageConfig {
        key: "ideas",
        version: 1,
        max_age: Some(Duration::from_secs(7 * DAY.as_secs())),
    };
    pub const DRAFTS: StorageConfig = StorageConfig {
        key: "drafts",
        version: 1,
        max_age: Some(Duration::from_secs(30 * DAY.as_secs())),
    };
    pub const USER_PREFERENCES: StorageConfig = StorageConfig {
        key: "preferences",
        version: 1,
        max_age: None,
    };
    pub const FILTERS: StorageConfig = StorageConfig {
        key: "filters",
        version: 1,
        max_age: Some(DAY),
    };
    pub const SEARCH_HISTORY: StorageConfig = StorageConfig {
        key: "search_history",
        version: 1,
        max_age: Some(Duration::from_secs(7 * DAY.as_secs())),
    };
    pub const OFFLINE_QUEUE: StorageConfig = StorageConfig {
        key: "offline_queue",
        version: 1,
        max_age: None,
    };
}

/// On-disk envelope around every cached value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageItem {
    pub data: serde_json::Value,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

#[derive(Clone)]
pub struct StorageManager {
    store: Arc<dyn BaseKeyValueStore>,
}

impl StorageManager {
    pub fn new(store: Arc<dyn BaseKeyValueStore>) -> Self {
        Self { store }
    }

    /// Manager over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    /// Store `data` under `config`. Returns `false` if it could not be saved.
    pub fn set_item<T: Serialize>(&self, config: &StorageConfig, data: &T) -> bool {
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = config.key, error = %e, "Failed to serialize cache entry");
                return false;
            }
        };
        let item = StorageItem {
            checksum: Some(checksum(&value)),
            data: value,
            timestamp: Utc::now().timestamp_millis(),
            version: config.version,
        };
        self.write_item(config.key, &item)
    }

    /// Read the entry for `config`, dropping it if it is stale or damaged.
    pub fn get_item<T: DeserializeOwned>(&self, config: &StorageConfig) -> Option<T> {
        let key = prefixed(config.key);
        let raw = self.store.get(&key)?;

        let item: StorageItem = match serde_json::from_str(&raw) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Dropping unreadable cache entry");
                self.remove_item(config.key);
                return None;
            }
        };

        if item.version != config.version {
            tracing::warn!(
                key = %key,
                expected = config.version,
                found = item.version,
                "Cache version mismatch"
            );
            self.remove_item(config.key);
            return None;
        }

        if let Some(max_age) = config.max_age {
            if is_older_than(item.timestamp, max_age) {
                tracing::info!(key = %key, "Expired cache entry removed");
                self.remove_item(config.key);
                return None;
            }
        }

        if let Some(expected) = &item.checksum {
            if *expected != checksum(&item.data) {
                tracing::warn!(key = %key, "Cache checksum mismatch, data may be corrupted");
                self.remove_item(config.key);
                return None;
            }
        }

        match serde_json::from_value(item.data) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache entry has unexpected shape");
                self.remove_item(config.key);
                None
            }
        }
    }

    pub fn remove_item(&self, key: &str) -> bool {
        match self.store.remove(&prefixed(key)) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to remove cache entry");
                false
            }
        }
    }

    /// Keys owned by this application, without the prefix.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .store
            .keys()
            .into_iter()
            .filter_map(|k| k.strip_prefix(KEY_PREFIX).map(str::to_string))
            .collect();
        keys.sort();
        keys
    }

    /// Bytes used by this application's keys and values.
    pub fn storage_size(&self) -> usize {
        self.store
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(KEY_PREFIX))
            .map(|k| {
                let value_len = self.store.get(&k).map(|v| v.len()).unwrap_or(0);
                k.len() + value_len
            })
            .sum()
    }

    /// Remove entries older than 30 days and entries that do not parse.
    pub fn cleanup_expired(&self) -> usize {
        let mut removed = 0;
        for key in self.keys() {
            let Some(raw) = self.store.get(&prefixed(&key)) else {
                continue;
            };
            let stale = match serde_json::from_str::<StorageItem>(&raw) {
                Ok(item) => is_older_than(item.timestamp, FALLBACK_MAX_AGE),
                Err(_) => true,
            };
            if stale && self.remove_item(&key) {
                removed += 1;
            }
        }
        removed
    }

    /// Raw envelopes for backup.
    pub fn export(&self) -> BTreeMap<String, serde_json::Value> {
        self.keys()
            .into_iter()
            .filter_map(|key| {
                let raw = self.store.get(&prefixed(&key))?;
                match serde_json::from_str(&raw) {
                    Ok(value) => Some((key, value)),
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Skipping unreadable entry in export");
                        None
                    }
                }
            })
            .collect()
    }

    /// Restore envelopes produced by [`export`](Self::export).
    pub fn import(&self, backup: &BTreeMap<String, serde_json::Value>) -> bool {
        for (key, value) in backup {
            if let Err(e) = self.store.set(&prefixed(key), &value.to_string()) {
                tracing::error!(key = %key, error = %e, "Failed to import cache entry");
                return false;
            }
        }
        true
    }

    /// Remove every key owned by this application.
    pub fn clear_all(&self) -> bool {
        self.keys().iter().all(|key| self.remove_item(key))
    }

    fn write_item(&self, key: &str, item: &StorageItem) -> bool {
        let serialized = match serde_json::to_string(item) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to serialize cache envelope");
                return false;
            }
        };

        if self.storage_size() + serialized.len() > MAX_STORAGE_BYTES {
            self.cleanup_expired();
            if self.storage_size() + serialized.len() > MAX_STORAGE_BYTES {
                tracing::warn!(key, bytes = serialized.len(), "Local storage size limit exceeded");
                return false;
            }
        }

        match self.store.set(&prefixed(key), &serialized) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to save cache entry");
                false
            }
        }
    }
}

fn prefixed(key: &str) -> String {
    format!("{}{}", KEY_PREFIX, key)
}

fn checksum(value: &serde_json::Value) -> String {
    let digest = Sha256::digest(value.to_string().as_bytes());
    hex::encode(&digest[..8])
}

fn is_older_than(timestamp_ms: i64, max_age: Duration) -> bool {
    let age_ms = Utc::now().timestamp_millis() - timestamp_ms;
    age_ms > max_age.as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manager() -> (StorageManager, Arc<MemoryKeyValueStore>) {
        let store = Arc::new(MemoryKeyValueStore::new());
        (StorageManager::new(store.clone()), store)
    }

    fn raw_item(data: serde_json::Value, age: Duration, version: u32) -> String {
        StorageItem {
            checksum: Some(checksum(&data)),
            data,
            timestamp: Utc::now().timestamp_millis() - age.as_millis() as i64,
            version,
        }
        .to_json()
    }

    impl StorageItem {
        fn to_json(&self) -> String {
            serde_json::to_string(self).unwrap()
        }
    }

    #[test]
    fn test_set_then_get() {
        let (storage, store) = manager();
        assert!(storage.set_item(&configs::FILTERS, &json!({"category": "fps"})));

        let filters: serde_json::Value = storage.get_item(&configs::FILTERS).unwrap();
        assert_eq!(filters, json!({"category": "fps"}));
        assert!(store.get("gamesta_filters").is_some());
        assert_eq!(storage.keys(), vec!["filters".to_string()]);
    }

    #[test]
    fn test_version_mismatch_drops_entry() {
        let (storage, store) = manager();
        store
            .set("gamesta_user", &raw_item(json!({"id": "u1"}), Duration::ZERO, 0))
            .unwrap();

        assert_eq!(storage.get_item::<serde_json::Value>(&configs::USER), None);
        assert!(store.get("gamesta_user").is_none());
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let (storage, store) = manager();
        store
            .set(
                "gamesta_filters",
                &raw_item(json!({"q": "cup"}), 2 * DAY, 1),
            )
            .unwrap();

        assert_eq!(storage.get_item::<serde_json::Value>(&configs::FILTERS), None);
        assert!(store.get("gamesta_filters").is_none());
    }

    #[test]
    fn test_entries_without_max_age_never_expire_on_read() {
        let (storage, store) = manager();
        store
            .set("gamesta_user", &raw_item(json!({"id": "u1"}), 90 * DAY, 1))
            .unwrap();

        assert!(storage.get_item::<serde_json::Value>(&configs::USER).is_some());
    }

    #[test]
    fn test_tampered_entry_fails_checksum() {
        let (storage, store) = manager();
        storage.set_item(&configs::SEARCH_HISTORY, &vec!["valorant"]);

        let raw = store.get("gamesta_search_history").unwrap();
        let tampered = raw.replace("valorant", "minecraft");
        store.set("gamesta_search_history", &tampered).unwrap();

        assert_eq!(storage.get_item::<Vec<String>>(&configs::SEARCH_HISTORY), None);
    }

    #[test]
    fn test_corrupt_json_is_dropped() {
        let (storage, store) = manager();
        store.set("gamesta_ideas", "{{{").unwrap();
        assert_eq!(storage.get_item::<serde_json::Value>(&configs::IDEAS), None);
        assert!(store.get("gamesta_ideas").is_none());
    }

    #[test]
    fn test_cleanup_removes_old_and_unreadable_entries() {
        let (storage, store) = manager();
        store
            .set("gamesta_user", &raw_item(json!(1), 31 * DAY, 1))
            .unwrap();
        store.set("gamesta_broken", "nope").unwrap();
        storage.set_item(&configs::FILTERS, &json!(2));
        store.set("other_app_key", "untouched").unwrap();

        assert_eq!(storage.cleanup_expired(), 2);
        assert_eq!(storage.keys(), vec!["filters".to_string()]);
        assert_eq!(store.get("other_app_key").as_deref(), Some("untouched"));
    }

    #[test]
    fn test_oversized_write_fails_softly() {
        let (storage, _store) = manager();
        let huge = "x".repeat(MAX_STORAGE_BYTES);
        assert!(!storage.set_item(&configs::IDEAS, &huge));
        assert!(storage.keys().is_empty());
    }

    #[test]
    fn test_export_import_clear() {
        let (storage, _store) = manager();
        storage.set_item(&configs::USER_PREFERENCES, &json!({"dark_mode": true}));
        storage.set_item(&configs::FILTERS, &json!({"sort": "net_votes"}));

        let backup = storage.export();
        assert_eq!(backup.len(), 2);

        assert!(storage.clear_all());
        assert!(storage.keys().is_empty());

        assert!(storage.import(&backup));
        let prefs: serde_json::Value = storage.get_item(&configs::USER_PREFERENCES).unwrap();
        assert_eq!(prefs["dark_mode"], true);
    }
}
