//! Live backend: the auth and data traits over a [`SupabaseClient`].

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use supabase::{Session, SignUpOptions, SignUpResponse, SupabaseClient};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::common::BackendError;
use crate::domains::auth::events::{AuthEvent, AuthEventKind};
use crate::domains::categories::models::{Category, NewCategory};
use crate::domains::comments::models::{Comment, NewComment};
use crate::domains::ideas::models::{Idea, IdeaQuery, IdeaUpdate, NewIdea};
use crate::domains::notifications::models::Notification;
use crate::domains::preferences::models::{PreferencesUpdate, UserPreferences};
use crate::domains::profiles::models::{NewProfile, ProfileUpdate, UserAchievement, UserProfile};
use crate::domains::votes::models::{NewVote, Vote, VoteType};
use crate::kernel::{BackendResult, BaseAuthBackend, BaseDataStore};

const IDEA_SELECT: &str = "*, author:users(username, avatar_url), category:categories(*)";
const COMMENT_SELECT: &str = "*, author:users(username, avatar_url)";
const ACHIEVEMENT_SELECT: &str = "*, achievement:achievements(*)";

pub struct SupabaseBackend {
    client: SupabaseClient,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseBackend {
    pub fn new(url: &str, anon_key: &str) -> Result<Self, supabase::SupabaseError> {
        Ok(Self::from_client(SupabaseClient::new(url, anon_key)?))
    }

    pub fn from_client(client: SupabaseClient) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            client,
            session: RwLock::new(None),
            events,
        }
    }

    pub fn client(&self) -> &SupabaseClient {
        &self.client
    }

    /// The client to use for table calls. An expired access token is
    /// refreshed first; if that fails the call goes out anonymously.
    async fn fresh(&self) -> &SupabaseClient {
        if let Err(e) = self.session().await {
            debug!(error = %e, "Continuing without a session");
        }
        &self.client
    }

    async fn store_session(&self, session: Option<Session>, kind: AuthEventKind) {
        self.client
            .set_access_token(session.as_ref().map(|s| s.access_token.clone()));
        *self.session.write().await = session.clone();
        // No receivers is fine
        let _ = self.events.send(AuthEvent::new(kind, session));
    }
}

#[async_trait]
impl BaseAuthBackend for SupabaseBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        options: &SignUpOptions,
    ) -> BackendResult<SignUpResponse> {
        let response = self.client.auth().sign_up(email, password, options).await?;
        if let Some(session) = &response.session {
            info!(user_id = %session.user.id, "Sign-up returned a session");
            self.store_session(Some(session.clone()), AuthEventKind::SignedIn)
                .await;
        }
        Ok(response)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session> {
        let session = self
            .client
            .auth()
            .sign_in_with_password(email, password)
            .await?;
        self.store_session(Some(session.clone()), AuthEventKind::SignedIn)
            .await;
        Ok(session)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        let previous = self.session.read().await.clone();
        let result = match &previous {
            Some(session) => self
                .client
                .auth()
                .sign_out(&session.access_token)
                .await
                .map_err(BackendError::from),
            None => Ok(()),
        };
        if let Err(e) = &result {
            warn!(error = %e, "Remote sign-out failed; dropping local session anyway");
        }
        self.store_session(None, AuthEventKind::SignedOut).await;
        result
    }

    async fn session(&self) -> BackendResult<Option<Session>> {
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        debug!(user_id = %session.user.id, "Access token expired, refreshing");
        match self
            .client
            .auth()
            .refresh_session(&session.refresh_token)
            .await
        {
            Ok(refreshed) => {
                self.store_session(Some(refreshed.clone()), AuthEventKind::TokenRefreshed)
                    .await;
                Ok(Some(refreshed))
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed");
                self.store_session(None, AuthEventKind::SignedOut).await;
                Err(e.into())
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl BaseDataStore for SupabaseBackend {
    async fn profile_by_id(&self, id: Uuid) -> BackendResult<UserProfile> {
        Ok(self
            .fresh()
            .await
            .from("users")
            .select("*")
            .eq("id", id)
            .single()
            .await?)
    }

    async fn profile_by_email(&self, email: &str) -> BackendResult<UserProfile> {
        Ok(self
            .fresh()
            .await
            .from("users")
            .select("*")
            .eq("email", email)
            .single()
            .await?)
    }

    async fn insert_profile(&self, profile: &NewProfile) -> BackendResult<UserProfile> {
        Ok(self.fresh().await.from("users").insert_single(profile).await?)
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> BackendResult<UserProfile> {
        Ok(self
            .fresh()
            .await
            .from("users")
            .eq("id", id)
            .update_single(update)
            .await?)
    }

    async fn list_profiles(&self) -> BackendResult<Vec<UserProfile>> {
        Ok(self
            .fresh()
            .await
            .from("users")
            .select("*")
            .order("created_at", false)
            .execute()
            .await?)
    }

    async fn user_achievements(&self, user_id: Uuid) -> BackendResult<Vec<UserAchievement>> {
        Ok(self
            .fresh()
            .await
            .from("user_achievements")
            .select(ACHIEVEMENT_SELECT)
            .eq("user_id", user_id)
            .order("earned_at", false)
            .execute()
            .await?)
    }

    async fn insert_default_preferences(&self, user_id: Uuid) -> BackendResult<()> {
        let _: Vec<serde_json::Value> = self
            .fresh()
            .await
            .from("user_preferences")
            .insert(&json!({ "user_id": user_id }))
            .await?;
        Ok(())
    }

    async fn preferences(&self, user_id: Uuid) -> BackendResult<UserPreferences> {
        Ok(self
            .fresh()
            .await
            .from("user_preferences")
            .select("*")
            .eq("user_id", user_id)
            .single()
            .await?)
    }

    async fn update_preferences(
        &self,
        user_id: Uuid,
        update: &PreferencesUpdate,
    ) -> BackendResult<UserPreferences> {
        Ok(self
            .fresh()
            .await
            .from("user_preferences")
            .eq("user_id", user_id)
            .update_single(update)
            .await?)
    }

    async fn list_categories(&self) -> BackendResult<Vec<Category>> {
        Ok(self
            .fresh()
            .await
            .from("categories")
            .select("*")
            .order("name", true)
            .execute()
            .await?)
    }

    async fn insert_category(&self, category: &NewCategory) -> BackendResult<Category> {
        Ok(self.fresh().await.from("categories").insert_single(category).await?)
    }

    async fn list_ideas(&self, query: &IdeaQuery) -> BackendResult<Vec<Idea>> {
        let mut q = self
            .fresh()
            .await
            .from("ideas")
            .select(IDEA_SELECT)
            .eq("status", query.status);
        if let Some(category_id) = query.category_id {
            q = q.eq("category_id", category_id);
        }
        if let Some(featured) = query.featured {
            q = q.eq("featured", featured);
        }
        let last = query.offset + query.limit.max(1) - 1;
        Ok(q.order(query.sort_by.column(), query.ascending)
            .range(query.offset, last)
            .execute()
            .await?)
    }

    async fn search_ideas(
        &self,
        text: Option<&str>,
        category_ids: &[Uuid],
    ) -> BackendResult<Vec<Idea>> {
        let mut q = self.fresh().await.from("ideas").select(IDEA_SELECT);
        if let Some(text) = text.map(or_filter_safe).filter(|t| !t.is_empty()) {
            q = q.or(&format!(
                "title.ilike.*{0}*,description.ilike.*{0}*",
                text
            ));
        }
        if !category_ids.is_empty() {
            q = q.in_("category_id", category_ids);
        }
        Ok(q.order("created_at", false).execute().await?)
    }

    async fn idea(&self, id: Uuid) -> BackendResult<Idea> {
        Ok(self
            .fresh()
            .await
            .from("ideas")
            .select(IDEA_SELECT)
            .eq("id", id)
            .single()
            .await?)
    }

    async fn insert_idea(&self, idea: &NewIdea) -> BackendResult<Idea> {
        Ok(self
            .fresh()
            .await
            .from("ideas")
            .select(IDEA_SELECT)
            .insert_single(idea)
            .await?)
    }

    async fn update_idea(&self, id: Uuid, update: &IdeaUpdate) -> BackendResult<Idea> {
        Ok(self
            .fresh()
            .await
            .from("ideas")
            .select(IDEA_SELECT)
            .eq("id", id)
            .update_single(update)
            .await?)
    }

    async fn delete_idea(&self, id: Uuid) -> BackendResult<()> {
        Ok(self.fresh().await.from("ideas").eq("id", id).delete().await?)
    }

    async fn list_all_ideas(&self) -> BackendResult<Vec<Idea>> {
        Ok(self
            .fresh()
            .await
            .from("ideas")
            .select(IDEA_SELECT)
            .order("created_at", false)
            .execute()
            .await?)
    }

    async fn vote(&self, user_id: Uuid, idea_id: Uuid) -> BackendResult<Vote> {
        Ok(self
            .fresh()
            .await
            .from("votes")
            .select("*")
            .eq("user_id", user_id)
            .eq("idea_id", idea_id)
            .single()
            .await?)
    }

    async fn insert_vote(&self, vote: &NewVote) -> BackendResult<Vote> {
        Ok(self.fresh().await.from("votes").insert_single(vote).await?)
    }

    async fn update_vote_type(&self, vote_id: Uuid, vote_type: VoteType) -> BackendResult<Vote> {
        Ok(self
            .fresh()
            .await
            .from("votes")
            .eq("id", vote_id)
            .update_single(&json!({ "vote_type": vote_type }))
            .await?)
    }

    async fn delete_vote(&self, vote_id: Uuid) -> BackendResult<()> {
        Ok(self.fresh().await.from("votes").eq("id", vote_id).delete().await?)
    }

    async fn votes_by_user(&self, user_id: Uuid, idea_ids: &[Uuid]) -> BackendResult<Vec<Vote>> {
        if idea_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .fresh()
            .await
            .from("votes")
            .select("*")
            .eq("user_id", user_id)
            .in_("idea_id", idea_ids)
            .execute()
            .await?)
    }

    async fn votes_for_idea(&self, idea_id: Uuid) -> BackendResult<Vec<Vote>> {
        Ok(self
            .fresh()
            .await
            .from("votes")
            .select("*")
            .eq("idea_id", idea_id)
            .execute()
            .await?)
    }

    async fn list_all_votes(&self) -> BackendResult<Vec<Vote>> {
        Ok(self
            .fresh()
            .await
            .from("votes")
            .select("*")
            .order("created_at", false)
            .execute()
            .await?)
    }

    async fn comments_for_idea(&self, idea_id: Uuid) -> BackendResult<Vec<Comment>> {
        Ok(self
            .fresh()
            .await
            .from("comments")
            .select(COMMENT_SELECT)
            .eq("idea_id", idea_id)
            .order("created_at", true)
            .execute()
            .await?)
    }

    async fn insert_comment(&self, comment: &NewComment) -> BackendResult<Comment> {
        Ok(self
            .fresh()
            .await
            .from("comments")
            .select(COMMENT_SELECT)
            .insert_single(comment)
            .await?)
    }

    async fn notifications(&self, user_id: Uuid, limit: usize) -> BackendResult<Vec<Notification>> {
        Ok(self
            .fresh()
            .await
            .from("notifications")
            .select("*")
            .eq("user_id", user_id)
            .order("created_at", false)
            .limit(limit)
            .execute()
            .await?)
    }

    async fn mark_notification_read(&self, id: Uuid) -> BackendResult<()> {
        let _: Vec<serde_json::Value> = self
            .fresh()
            .await
            .from("notifications")
            .eq("id", id)
            .update(&json!({ "read": true }))
            .await?;
        Ok(())
    }

    async fn probe_table(&self, table: &str) -> BackendResult<()> {
        let _: Vec<serde_json::Value> = self
            .fresh()
            .await
            .from(table)
            .select("*")
            .limit(1)
            .execute()
            .await?;
        Ok(())
    }
}

// `or=(...)` uses commas and parentheses as syntax.
fn or_filter_safe(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*'))
        .collect()
}
