//! Polling change feed.
//!
//! One task per topic refetches a snapshot on an interval and publishes it
//! to the [`StreamHub`] only when its SHA-256 fingerprint differs from the
//! last one sent. The task stops once the topic has no subscribers left.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domains::ideas::models::IdeaQuery;
use crate::domains::notifications::actions::DEFAULT_NOTIFICATION_LIMIT;
use crate::kernel::stream_hub::topics;
use crate::kernel::{BackendResult, BaseDataStore, StreamHub};

#[derive(Clone)]
pub struct ChangeFeed {
    hub: StreamHub,
    interval: Duration,
    running: Arc<Mutex<HashSet<String>>>,
}

impl ChangeFeed {
    pub fn new(hub: StreamHub, interval: Duration) -> Self {
        Self {
            hub,
            interval,
            running: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn hub(&self) -> &StreamHub {
        &self.hub
    }

    /// Subscribe to `topic`, starting its poller if none is running.
    ///
    /// The first snapshot is delivered right away; later ones only when
    /// the data changes.
    pub async fn watch<F, Fut>(
        &self,
        topic: &str,
        fetch: F,
    ) -> broadcast::Receiver<serde_json::Value>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BackendResult<serde_json::Value>> + Send + 'static,
    {
        let mut running = self.running.lock().await;
        let rx = self.hub.subscribe(topic).await;
        if running.insert(topic.to_string()) {
            debug!(topic, "Starting change feed poller");
            tokio::spawn(poll(self.clone(), topic.to_string(), fetch));
        }
        rx
    }

    pub async fn is_running(&self, topic: &str) -> bool {
        self.running.lock().await.contains(topic)
    }

    /// Ideas as listed by default (submitted, newest first).
    pub async fn watch_ideas(
        &self,
        store: Arc<dyn BaseDataStore>,
    ) -> broadcast::Receiver<serde_json::Value> {
        self.watch(topics::IDEAS, move || {
            let store = store.clone();
            async move { to_json(store.list_ideas(&IdeaQuery::default()).await?) }
        })
        .await
    }

    pub async fn watch_votes(
        &self,
        store: Arc<dyn BaseDataStore>,
        idea_id: Uuid,
    ) -> broadcast::Receiver<serde_json::Value> {
        self.watch(&topics::votes(idea_id), move || {
            let store = store.clone();
            async move { to_json(store.votes_for_idea(idea_id).await?) }
        })
        .await
    }

    pub async fn watch_notifications(
        &self,
        store: Arc<dyn BaseDataStore>,
        user_id: Uuid,
    ) -> broadcast::Receiver<serde_json::Value> {
        self.watch(&topics::notifications(user_id), move || {
            let store = store.clone();
            async move {
                to_json(
                    store
                        .notifications(user_id, DEFAULT_NOTIFICATION_LIMIT)
                        .await?,
                )
            }
        })
        .await
    }
}

async fn poll<F, Fut>(feed: ChangeFeed, topic: String, fetch: F)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BackendResult<serde_json::Value>> + Send + 'static,
{
    let mut ticker = tokio::time::interval(feed.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_fingerprint: Option<String> = None;

    loop {
        ticker.tick().await;

        {
            let mut running = feed.running.lock().await;
            if feed.hub.subscriber_count(&topic).await == 0 {
                running.remove(&topic);
                feed.hub.cleanup().await;
                debug!(topic = %topic, "No subscribers left, stopping poller");
                return;
            }
        }

        let snapshot = match fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(topic = %topic, error = %e, "Change feed fetch failed");
                continue;
            }
        };

        let fingerprint = fingerprint(&snapshot);
        if last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            continue;
        }
        let delivered = feed.hub.publish(&topic, snapshot).await;
        debug!(topic = %topic, delivered, "Published change");
        last_fingerprint = Some(fingerprint);
    }
}

fn to_json<T: serde::Serialize>(rows: T) -> BackendResult<serde_json::Value> {
    serde_json::to_value(rows)
        .map_err(|e| crate::common::BackendError::service(format!("unserializable rows: {}", e)))
}

pub fn fingerprint(value: &serde_json::Value) -> String {
    hex::encode(Sha256::digest(value.to_string().as_bytes()))
}
