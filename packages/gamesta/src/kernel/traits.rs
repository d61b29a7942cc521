// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only: one method per backend round trip,
// no decisions. Domain actions combine them.
//
// Naming convention: Base* for trait names (e.g., BaseAuthBackend)

use async_trait::async_trait;
use supabase::{Session, SignUpOptions, SignUpResponse};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::common::BackendError;
use crate::domains::auth::events::AuthEvent;
use crate::domains::categories::models::{Category, NewCategory};
use crate::domains::comments::models::{Comment, NewComment};
use crate::domains::ideas::models::{Idea, IdeaQuery, IdeaUpdate, NewIdea};
use crate::domains::notifications::models::Notification;
use crate::domains::preferences::models::{PreferencesUpdate, UserPreferences};
use crate::domains::profiles::models::{NewProfile, ProfileUpdate, UserAchievement, UserProfile};
use crate::domains::votes::models::{NewVote, Vote, VoteType};

pub type BackendResult<T> = std::result::Result<T, BackendError>;

// =============================================================================
// Auth Backend Trait (Infrastructure - hosted identity service)
// =============================================================================

#[async_trait]
pub trait BaseAuthBackend: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        options: &SignUpOptions,
    ) -> BackendResult<SignUpResponse>;

    /// Exchange credentials for a session. Emits `SignedIn` on success.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session>;

    /// Revoke the current session. The local session is dropped and
    /// `SignedOut` emitted even when the revoke call fails.
    async fn sign_out(&self) -> BackendResult<()>;

    /// Current session, refreshed first if it has expired.
    async fn session(&self) -> BackendResult<Option<Session>>;

    /// Stream of auth-state changes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

// =============================================================================
// Data Store Trait (Infrastructure - row access under row-level security)
// =============================================================================
//
// Single-row reads return `BackendError::NoRows` when nothing matches.

#[async_trait]
pub trait BaseDataStore: Send + Sync {
    // users
    async fn profile_by_id(&self, id: Uuid) -> BackendResult<UserProfile>;
    async fn profile_by_email(&self, email: &str) -> BackendResult<UserProfile>;
    async fn insert_profile(&self, profile: &NewProfile) -> BackendResult<UserProfile>;
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> BackendResult<UserProfile>;
    /// Newest first.
    async fn list_profiles(&self) -> BackendResult<Vec<UserProfile>>;
    /// Newest first, with the achievement embedded.
    async fn user_achievements(&self, user_id: Uuid) -> BackendResult<Vec<UserAchievement>>;

    // user_preferences
    async fn insert_default_preferences(&self, user_id: Uuid) -> BackendResult<()>;
    async fn preferences(&self, user_id: Uuid) -> BackendResult<UserPreferences>;
    async fn update_preferences(
        &self,
        user_id: Uuid,
        update: &PreferencesUpdate,
    ) -> BackendResult<UserPreferences>;

    // categories
    /// Ordered by name.
    async fn list_categories(&self) -> BackendResult<Vec<Category>>;
    async fn insert_category(&self, category: &NewCategory) -> BackendResult<Category>;

    // ideas
    async fn list_ideas(&self, query: &IdeaQuery) -> BackendResult<Vec<Idea>>;
    /// Title or description contains `text`; newest first.
    async fn search_ideas(
        &self,
        text: Option<&str>,
        category_ids: &[Uuid],
    ) -> BackendResult<Vec<Idea>>;
    async fn idea(&self, id: Uuid) -> BackendResult<Idea>;
    async fn insert_idea(&self, idea: &NewIdea) -> BackendResult<Idea>;
    async fn update_idea(&self, id: Uuid, update: &IdeaUpdate) -> BackendResult<Idea>;
    async fn delete_idea(&self, id: Uuid) -> BackendResult<()>;
    /// Every idea regardless of status, newest first.
    async fn list_all_ideas(&self) -> BackendResult<Vec<Idea>>;

    // votes
    async fn vote(&self, user_id: Uuid, idea_id: Uuid) -> BackendResult<Vote>;
    async fn insert_vote(&self, vote: &NewVote) -> BackendResult<Vote>;
    async fn update_vote_type(&self, vote_id: Uuid, vote_type: VoteType) -> BackendResult<Vote>;
    async fn delete_vote(&self, vote_id: Uuid) -> BackendResult<()>;
    async fn votes_by_user(&self, user_id: Uuid, idea_ids: &[Uuid]) -> BackendResult<Vec<Vote>>;
    async fn votes_for_idea(&self, idea_id: Uuid) -> BackendResult<Vec<Vote>>;
    async fn list_all_votes(&self) -> BackendResult<Vec<Vote>>;

    // comments
    /// Oldest first.
    async fn comments_for_idea(&self, idea_id: Uuid) -> BackendResult<Vec<Comment>>;
    async fn insert_comment(&self, comment: &NewComment) -> BackendResult<Comment>;

    // notifications
    /// Newest first.
    async fn notifications(&self, user_id: Uuid, limit: usize) -> BackendResult<Vec<Notification>>;
    async fn mark_notification_read(&self, id: Uuid) -> BackendResult<()>;

    /// Fetch at most one row from `table` to see whether it is reachable.
    async fn probe_table(&self, table: &str) -> BackendResult<()>;
}
