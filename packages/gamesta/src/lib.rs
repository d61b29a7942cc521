// Gamesta - application core
//
// Typed access to the hosted backend (auth + tables), the session
// reconciler that owns the current user, client-side validation, the
// advisory local cache and a polling change feed.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod storage;

pub use config::*;
