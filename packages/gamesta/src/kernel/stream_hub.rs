//! Topic-keyed broadcast hub for change notifications.
//!
//! The change feed publishes fresh snapshots here; front-ends subscribe to
//! the topics they render. Topics are plain strings built with [`topics`].

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Topic names for the three live views.
pub mod topics {
    use super::Uuid;

    pub const IDEAS: &str = "ideas";

    pub fn votes(idea_id: Uuid) -> String {
        format!("votes:{}", idea_id)
    }

    pub fn notifications(user_id: Uuid) -> String {
        format!("notifications:{}", user_id)
    }
}

/// Cloneable in-process pub/sub over JSON payloads.
#[derive(Clone)]
pub struct StreamHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<serde_json::Value>>>>,
    capacity: usize,
}

impl StreamHub {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Send `value` to every subscriber of `topic`. Returns how many received it.
    pub async fn publish(&self, topic: &str, value: serde_json::Value) -> usize {
        let channels = self.channels.read().await;
        match channels.get(topic) {
            Some(tx) => tx.send(value).unwrap_or(0),
            None => 0,
        }
    }

    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<serde_json::Value> {
        let mut channels = self.channels.write().await;
        channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub async fn subscriber_count(&self, topic: &str) -> usize {
        let channels = self.channels.read().await;
        channels.get(topic).map(|tx| tx.receiver_count()).unwrap_or(0)
    }

    /// Drop channels nobody listens to.
    pub async fn cleanup(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);
    }
}

impl Default for StreamHub {
    fn default() -> Self {
        Self::new()
    }
}
