//! Diagnostics - connection and schema checks against the live project

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::kernel::GamestaDeps;

/// Tables the application reads and writes.
pub const REQUIRED_TABLES: [&str; 8] = [
    "users",
    "ideas",
    "categories",
    "votes",
    "comments",
    "notifications",
    "user_preferences",
    "user_achievements",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionReport {
    pub connected: bool,
    pub error: Option<String>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub table: &'static str,
    pub exists: bool,
    /// Backend message when the probe failed.
    pub error: Option<String>,
}

/// Probe the `users` table.
pub async fn check_connection(deps: &GamestaDeps) -> ConnectionReport {
    let started = Instant::now();
    let result = deps.store.probe_table("users").await;
    let elapsed = started.elapsed();

    match result {
        Ok(()) => {
            info!(elapsed_ms = elapsed.as_millis() as u64, "Backend reachable");
            ConnectionReport {
                connected: true,
                error: None,
                elapsed,
            }
        }
        Err(e) => {
            warn!(error = %e, "Backend connection check failed");
            ConnectionReport {
                connected: false,
                error: Some(e.to_string()),
                elapsed,
            }
        }
    }
}

/// Probe every required table, in order.
pub async fn check_required_tables(deps: &GamestaDeps) -> Vec<TableStatus> {
    let mut statuses = Vec::with_capacity(REQUIRED_TABLES.len());
    for table in REQUIRED_TABLES {
        let status = match deps.store.probe_table(table).await {
            Ok(()) => TableStatus {
                table,
                exists: true,
                error: None,
            },
            Err(e) => {
                warn!(table, error = %e, "Table check failed");
                TableStatus {
                    table,
                    exists: false,
                    error: Some(e.to_string()),
                }
            }
        };
        statuses.push(status);
    }
    statuses
}
