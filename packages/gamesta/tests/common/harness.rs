//! Test harness around the in-memory backend.
//!
//! Every test builds its own `MockBackend`, so nothing is shared between
//! tests. The harness keeps a handle on the mock for call inspection.

use gamesta_core::config::Config;
use gamesta_core::domains::auth::AuthReconciler;
use gamesta_core::kernel::{GamestaDeps, MockBackend};
use gamesta_core::storage::StorageManager;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct TestHarness {
    pub backend: MockBackend,
    pub deps: GamestaDeps,
    pub reconciler: AuthReconciler,
}

impl TestHarness {
    pub fn new(backend: MockBackend) -> Self {
        Self::with_config(backend, |_| {})
    }

    pub fn with_config(backend: MockBackend, configure: impl FnOnce(&mut Config)) -> Self {
        // Run with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let mut config = Config::new("http://localhost:54321", "test-anon-key");
        configure(&mut config);

        let deps = GamestaDeps::new(
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            StorageManager::in_memory(),
            config,
        );
        let reconciler = AuthReconciler::new(deps.clone());

        Self {
            backend,
            deps,
            reconciler,
        }
    }

    /// Id of the account registered for `email`.
    pub fn user_id(&self, email: &str) -> Uuid {
        self.backend
            .user_id(email)
            .unwrap_or_else(|| panic!("no account for {}", email))
    }

    /// Acting user for actions that take a viewer.
    pub fn viewer(&self, email: &str) -> Option<Uuid> {
        Some(self.user_id(email))
    }

    /// Let spawned tasks run.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
