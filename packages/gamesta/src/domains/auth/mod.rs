//! Authentication domain
//!
//! Account checks, login/registration flows and the session reconciler
//! that owns the current user.

pub mod actions;
pub mod events;
pub mod reconciler;
pub mod state;

pub use actions::*;
pub use events::{AuthEvent, AuthEventKind};
pub use reconciler::AuthReconciler;
pub use state::{SessionMarker, SessionState};
