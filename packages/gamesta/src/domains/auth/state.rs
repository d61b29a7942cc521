use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domains::profiles::models::UserProfile;

/// The one "current user" value the rest of the app reads.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    /// Signed up (or signed in) but the email address is not confirmed yet.
    AwaitingVerification { email: String },
    ProfileLoading { user_id: Uuid },
    Ready(UserProfile),
    /// The profile did not load in time. Treated as signed out; the backend
    /// session is left alone.
    TimedOut { user_id: Uuid },
    Failed { user_id: Uuid, message: String },
}

impl SessionState {
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            SessionState::Ready(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user().map(|p| p.id)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::ProfileLoading { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::AwaitingVerification { .. } => "awaiting_verification",
            SessionState::ProfileLoading { .. } => "profile_loading",
            SessionState::Ready(_) => "ready",
            SessionState::TimedOut { .. } => "timed_out",
            SessionState::Failed { .. } => "failed",
        }
    }
}

/// Non-sensitive record of who is signed in, kept in the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMarker {
    pub user_id: Uuid,
    pub email: String,
    pub last_activity: DateTime<Utc>,
}

impl SessionMarker {
    pub fn for_profile(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.id,
            email: profile.email.clone(),
            last_activity: Utc::now(),
        }
    }
}
