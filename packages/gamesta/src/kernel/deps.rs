//! Application dependencies (using traits for testability)
//!
//! Every domain action takes a `&GamestaDeps`. External services sit behind
//! the `Base*` traits so tests can swap in the in-memory backend.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::kernel::{BaseAuthBackend, BaseDataStore, ChangeFeed, StreamHub, SupabaseBackend};
use crate::storage::{FileKeyValueStore, StorageManager};

#[derive(Clone)]
pub struct GamestaDeps {
    pub auth: Arc<dyn BaseAuthBackend>,
    pub store: Arc<dyn BaseDataStore>,
    /// Advisory local cache. Never the source of truth.
    pub cache: StorageManager,
    /// Polling stand-in for realtime channels.
    pub change_feed: ChangeFeed,
    pub config: Config,
}

impl GamestaDeps {
    pub fn new(
        auth: Arc<dyn BaseAuthBackend>,
        store: Arc<dyn BaseDataStore>,
        cache: StorageManager,
        config: Config,
    ) -> Self {
        let change_feed = ChangeFeed::new(StreamHub::new(), config.poll_interval);
        Self {
            auth,
            store,
            cache,
            change_feed,
            config,
        }
    }

    /// Wire the live Supabase backend and the file cache from `config`.
    pub fn connect(config: Config) -> Result<Self> {
        let backend = Arc::new(
            SupabaseBackend::new(&config.supabase_url, &config.supabase_anon_key)
                .context("Failed to create Supabase client")?,
        );

        let kv = FileKeyValueStore::open(&config.storage_dir).with_context(|| {
            format!(
                "Failed to open local storage at {}",
                config.storage_dir.display()
            )
        })?;
        let cache = StorageManager::new(Arc::new(kv));

        Ok(Self::new(backend.clone(), backend, cache, config))
    }
}
