// MockBackend - in-memory implementation of the backend traits for tests
//
// Holds accounts and table rows in memory, records every call by name, and
// can be told to stall profile loads or fail every data call.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use supabase::{Session, SignUpOptions, SignUpResponse, User};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{BackendResult, BaseAuthBackend, BaseDataStore};
use crate::common::BackendError;
use crate::domains::auth::events::{AuthEvent, AuthEventKind};
use crate::domains::categories::models::{Category, NewCategory};
use crate::domains::comments::models::{Comment, NewComment};
use crate::domains::ideas::models::{Idea, IdeaQuery, IdeaSort, IdeaStatus, IdeaUpdate, NewIdea};
use crate::domains::notifications::models::Notification;
use crate::domains::preferences::models::{PreferencesUpdate, UserPreferences};
use crate::domains::profiles::models::{
    default_avatar_url, AuthorSummary, NewProfile, ProfileUpdate, UserAchievement, UserProfile,
};
use crate::domains::votes::models::{NewVote, Vote, VoteType};

// =============================================================================
// Row builders
// =============================================================================

pub fn profile_row(id: Uuid, email: &str, username: &str) -> UserProfile {
    let now = Utc::now();
    UserProfile {
        id,
        email: email.to_string(),
        username: username.to_string(),
        bio: None,
        avatar_url: Some(default_avatar_url(username)),
        ideas_submitted: 0,
        total_votes_received: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn category_row(name: &str) -> Category {
    Category {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        icon: None,
        color: None,
        created_at: Utc::now(),
    }
}

pub fn idea_row(author_id: Uuid, title: &str) -> Idea {
    let now = Utc::now();
    Idea {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: format!("{} - full description", title),
        category_id: None,
        upvotes: 0,
        downvotes: 0,
        net_votes: 0,
        author_id,
        status: IdeaStatus::Submitted,
        featured: false,
        implementation_date: None,
        created_at: now,
        updated_at: now,
        author: None,
        category: None,
        user_vote: None,
        comments_count: None,
    }
}

pub fn notification_row(user_id: Uuid, title: &str, minutes_ago: i64) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        user_id,
        kind: "vote".to_string(),
        title: title.to_string(),
        message: format!("{} happened", title),
        data: None,
        read: false,
        created_at: Utc::now() - ChronoDuration::minutes(minutes_ago),
    }
}

// =============================================================================
// Mock Backend
// =============================================================================

#[derive(Debug, Clone)]
struct MockAccount {
    user: User,
    password: String,
}

#[derive(Debug, Default)]
struct Tables {
    profiles: Vec<UserProfile>,
    preferences: Vec<UserPreferences>,
    categories: Vec<Category>,
    ideas: Vec<Idea>,
    votes: Vec<Vote>,
    comments: Vec<Comment>,
    notifications: Vec<Notification>,
    achievements: Vec<UserAchievement>,
    missing_tables: Vec<String>,
}

#[derive(Debug, Default)]
struct Knobs {
    profile_delay: Option<Duration>,
    sign_in_delay: Option<Duration>,
    outage: Option<BackendError>,
    sign_out_error: Option<BackendError>,
    auto_confirm: bool,
}

/// In-memory backend implementing both backend traits.
///
/// Cheap to clone; clones share state, so a test can keep a handle after
/// handing one to `GamestaDeps`.
#[derive(Clone)]
pub struct MockBackend {
    accounts: Arc<Mutex<HashMap<String, MockAccount>>>,
    session: Arc<Mutex<Option<Session>>>,
    tables: Arc<Mutex<Tables>>,
    knobs: Arc<Mutex<Knobs>>,
    calls: Arc<Mutex<Vec<String>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl MockBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            accounts: Arc::new(Mutex::new(HashMap::new())),
            session: Arc::new(Mutex::new(None)),
            tables: Arc::new(Mutex::new(Tables::default())),
            knobs: Arc::new(Mutex::new(Knobs::default())),
            calls: Arc::new(Mutex::new(Vec::new())),
            events,
        }
    }

    /// Register an auth account. Returns the new user id via [`user_id`](Self::user_id).
    pub fn with_account(self, email: &str, password: &str, verified: bool) -> Self {
        self.add_account(email, password, verified, serde_json::json!({}));
        self
    }

    /// Register an auth account together with its `users` row.
    pub fn with_user(self, email: &str, password: &str, username: &str) -> Self {
        let id = self.add_account(
            email,
            password,
            true,
            serde_json::json!({ "username": username }),
        );
        self.tables
            .lock()
            .unwrap()
            .profiles
            .push(profile_row(id, email, username));
        self
    }

    pub fn with_profile(self, profile: UserProfile) -> Self {
        self.tables.lock().unwrap().profiles.push(profile);
        self
    }

    pub fn with_category(self, category: Category) -> Self {
        self.tables.lock().unwrap().categories.push(category);
        self
    }

    pub fn with_idea(self, idea: Idea) -> Self {
        self.tables.lock().unwrap().ideas.push(idea);
        self
    }

    pub fn with_notification(self, notification: Notification) -> Self {
        self.tables.lock().unwrap().notifications.push(notification);
        self
    }

    pub fn with_achievement(self, achievement: UserAchievement) -> Self {
        self.tables.lock().unwrap().achievements.push(achievement);
        self
    }

    /// Make `probe_table` fail for `table` as if it did not exist.
    pub fn without_table(self, table: &str) -> Self {
        self.tables
            .lock()
            .unwrap()
            .missing_tables
            .push(table.to_string());
        self
    }

    /// Sign-ups return a session immediately instead of waiting for email confirmation.
    pub fn with_auto_confirm(self) -> Self {
        self.knobs.lock().unwrap().auto_confirm = true;
        self
    }

    pub fn with_profile_delay(self, delay: Duration) -> Self {
        self.set_profile_delay(Some(delay));
        self
    }

    pub fn with_sign_in_delay(self, delay: Duration) -> Self {
        self.knobs.lock().unwrap().sign_in_delay = Some(delay);
        self
    }

    pub fn with_sign_out_error(self, error: BackendError) -> Self {
        self.knobs.lock().unwrap().sign_out_error = Some(error);
        self
    }

    pub fn set_profile_delay(&self, delay: Option<Duration>) {
        self.knobs.lock().unwrap().profile_delay = delay;
    }

    /// Fail every data call with `error` until cleared.
    pub fn set_outage(&self, error: Option<BackendError>) {
        self.knobs.lock().unwrap().outage = error;
    }

    /// Push an auth event to subscribers as if the backend sent it.
    pub fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    /// Session for `email` without going through sign-in (and without emitting).
    pub fn session_for(&self, email: &str) -> Option<Session> {
        let accounts = self.accounts.lock().unwrap();
        accounts.get(email).map(|a| session_for_user(a.user.clone()))
    }

    /// Confirm the account's email and sign it in, as following the
    /// verification link does.
    pub fn confirm_email(&self, email: &str) -> Option<Session> {
        let user = {
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts.get_mut(email)?;
            account.user.email_confirmed_at = Some(Utc::now());
            account.user.clone()
        };
        let session = session_for_user(user);
        *self.session.lock().unwrap() = Some(session.clone());
        self.emit(AuthEvent::signed_in(session.clone()));
        Some(session)
    }

    pub fn user_id(&self, email: &str) -> Option<Uuid> {
        self.accounts.lock().unwrap().get(email).map(|a| a.user.id)
    }

    /// Names of every trait method called, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    pub fn was_called(&self, name: &str) -> bool {
        self.call_count(name) > 0
    }

    pub fn profiles(&self) -> Vec<UserProfile> {
        self.tables.lock().unwrap().profiles.clone()
    }

    pub fn preferences_rows(&self) -> Vec<UserPreferences> {
        self.tables.lock().unwrap().preferences.clone()
    }

    pub fn votes(&self) -> Vec<Vote> {
        self.tables.lock().unwrap().votes.clone()
    }

    pub fn ideas(&self) -> Vec<Idea> {
        self.tables.lock().unwrap().ideas.clone()
    }

    pub fn has_session(&self) -> bool {
        self.session.lock().unwrap().is_some()
    }

    fn add_account(
        &self,
        email: &str,
        password: &str,
        verified: bool,
        metadata: serde_json::Value,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let user = User {
            id,
            email: Some(email.to_string()),
            email_confirmed_at: verified.then(Utc::now),
            user_metadata: metadata,
            created_at: Some(Utc::now()),
        };
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            MockAccount {
                user,
                password: password.to_string(),
            },
        );
        id
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    /// Record a data call and apply any configured outage.
    fn data_call(&self, name: &str) -> BackendResult<()> {
        self.record(name);
        match &self.knobs.lock().unwrap().outage {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn author_of(tables: &Tables, id: Uuid) -> Option<AuthorSummary> {
        tables.profiles.iter().find(|p| p.id == id).map(|p| AuthorSummary {
            username: p.username.clone(),
            avatar_url: p.avatar_url.clone(),
        })
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn session_for_user(user: User) -> Session {
    let now = Utc::now().timestamp();
    Session {
        access_token: format!("access-{}", user.id),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        expires_at: Some(now + 3600),
        refresh_token: format!("refresh-{}", user.id),
        user,
    }
}

fn invalid_credentials() -> BackendError {
    BackendError::Service {
        code: Some("invalid_credentials".into()),
        message: "Invalid login credentials".into(),
    }
}

#[async_trait]
impl BaseAuthBackend for MockBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        options: &SignUpOptions,
    ) -> BackendResult<SignUpResponse> {
        self.record("sign_up");
        if self.accounts.lock().unwrap().contains_key(email) {
            return Err(BackendError::service("User already registered"));
        }

        let auto_confirm = self.knobs.lock().unwrap().auto_confirm;
        let metadata = if options.data.is_null() {
            serde_json::json!({})
        } else {
            options.data.clone()
        };
        self.add_account(email, password, auto_confirm, metadata);
        let user = self.accounts.lock().unwrap().get(email).map(|a| a.user.clone());

        let session = match (&user, auto_confirm) {
            (Some(user), true) => {
                let session = session_for_user(user.clone());
                *self.session.lock().unwrap() = Some(session.clone());
                self.emit(AuthEvent::signed_in(session.clone()));
                Some(session)
            }
            _ => None,
        };
        Ok(SignUpResponse { user, session })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session> {
        self.record("sign_in_with_password");
        let delay = self.knobs.lock().unwrap().sign_in_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let account = self.accounts.lock().unwrap().get(email).cloned();
        let account = match account {
            Some(account) if account.password == password => account,
            _ => return Err(invalid_credentials()),
        };
        if !account.user.is_verified() {
            return Err(BackendError::Service {
                code: Some("email_not_confirmed".into()),
                message: "Email not confirmed".into(),
            });
        }

        let session = session_for_user(account.user);
        *self.session.lock().unwrap() = Some(session.clone());
        self.emit(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        self.record("sign_out");
        let error = self.knobs.lock().unwrap().sign_out_error.clone();
        *self.session.lock().unwrap() = None;
        self.emit(AuthEvent::new(AuthEventKind::SignedOut, None));
        match error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn session(&self) -> BackendResult<Option<Session>> {
        self.record("session");
        Ok(self.session.lock().unwrap().clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl BaseDataStore for MockBackend {
    async fn profile_by_id(&self, id: Uuid) -> BackendResult<UserProfile> {
        self.data_call("profile_by_id")?;
        let delay = self.knobs.lock().unwrap().profile_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let tables = self.tables.lock().unwrap();
        tables
            .profiles
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(BackendError::NoRows)
    }

    async fn profile_by_email(&self, email: &str) -> BackendResult<UserProfile> {
        self.data_call("profile_by_email")?;
        let tables = self.tables.lock().unwrap();
        tables
            .profiles
            .iter()
            .find(|p| p.email == email)
            .cloned()
            .ok_or(BackendError::NoRows)
    }

    async fn insert_profile(&self, profile: &NewProfile) -> BackendResult<UserProfile> {
        self.data_call("insert_profile")?;
        let mut tables = self.tables.lock().unwrap();
        if tables.profiles.iter().any(|p| p.id == profile.id) {
            return Err(BackendError::Service {
                code: Some("23505".into()),
                message: "duplicate key value violates unique constraint \"users_pkey\"".into(),
            });
        }
        let mut row = profile_row(profile.id, &profile.email, &profile.username);
        row.avatar_url = Some(profile.avatar_url.clone());
        tables.profiles.push(row.clone());
        Ok(row)
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> BackendResult<UserProfile> {
        self.data_call("update_profile")?;
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(BackendError::NoRows)?;
        if let Some(username) = &update.username {
            row.username = username.clone();
        }
        if let Some(bio) = &update.bio {
            row.bio = Some(bio.clone());
        }
        if let Some(avatar_url) = &update.avatar_url {
            row.avatar_url = Some(avatar_url.clone());
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn list_profiles(&self) -> BackendResult<Vec<UserProfile>> {
        self.data_call("list_profiles")?;
        let mut rows = self.tables.lock().unwrap().profiles.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn user_achievements(&self, user_id: Uuid) -> BackendResult<Vec<UserAchievement>> {
        self.data_call("user_achievements")?;
        let mut rows: Vec<UserAchievement> = self
            .tables
            .lock()
            .unwrap()
            .achievements
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.earned_at.cmp(&a.earned_at));
        Ok(rows)
    }

    async fn insert_default_preferences(&self, user_id: Uuid) -> BackendResult<()> {
        self.data_call("insert_default_preferences")?;
        let now = Utc::now();
        self.tables.lock().unwrap().preferences.push(UserPreferences {
            id: Uuid::new_v4(),
            user_id,
            default_category: None,
            email_notifications: true,
            push_notifications: true,
            dark_mode: false,
            preferences: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn preferences(&self, user_id: Uuid) -> BackendResult<UserPreferences> {
        self.data_call("preferences")?;
        let tables = self.tables.lock().unwrap();
        tables
            .preferences
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned()
            .ok_or(BackendError::NoRows)
    }

    async fn update_preferences(
        &self,
        user_id: Uuid,
        update: &PreferencesUpdate,
    ) -> BackendResult<UserPreferences> {
        self.data_call("update_preferences")?;
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .preferences
            .iter_mut()
            .find(|p| p.user_id == user_id)
            .ok_or(BackendError::NoRows)?;
        if let Some(category) = update.default_category {
            row.default_category = Some(category);
        }
        if let Some(v) = update.email_notifications {
            row.email_notifications = v;
        }
        if let Some(v) = update.push_notifications {
            row.push_notifications = v;
        }
        if let Some(v) = update.dark_mode {
            row.dark_mode = v;
        }
        if let Some(prefs) = &update.preferences {
            row.preferences = prefs.clone();
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn list_categories(&self) -> BackendResult<Vec<Category>> {
        self.data_call("list_categories")?;
        let mut rows = self.tables.lock().unwrap().categories.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_category(&self, category: &NewCategory) -> BackendResult<Category> {
        self.data_call("insert_category")?;
        let mut row = category_row(&category.name);
        row.description = Some(category.description.clone());
        row.color = Some(category.color.clone());
        self.tables.lock().unwrap().categories.push(row.clone());
        Ok(row)
    }

    async fn list_ideas(&self, query: &IdeaQuery) -> BackendResult<Vec<Idea>> {
        self.data_call("list_ideas")?;
        let mut rows: Vec<Idea> = self
            .tables
            .lock()
            .unwrap()
            .ideas
            .iter()
            .filter(|i| i.status == query.status)
            .filter(|i| query.category_id.map_or(true, |c| i.category_id == Some(c)))
            .filter(|i| query.featured.map_or(true, |f| i.featured == f))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            let ord = match query.sort_by {
                IdeaSort::CreatedAt => a.created_at.cmp(&b.created_at),
                IdeaSort::NetVotes => a.net_votes.cmp(&b.net_votes),
                IdeaSort::Upvotes => a.upvotes.cmp(&b.upvotes),
            };
            if query.ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        Ok(rows
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn search_ideas(
        &self,
        text: Option<&str>,
        category_ids: &[Uuid],
    ) -> BackendResult<Vec<Idea>> {
        self.data_call("search_ideas")?;
        let needle = text.map(|t| t.trim().to_lowercase()).unwrap_or_default();
        let mut rows: Vec<Idea> = self
            .tables
            .lock()
            .unwrap()
            .ideas
            .iter()
            .filter(|i| {
                needle.is_empty()
                    || i.title.to_lowercase().contains(&needle)
                    || i.description.to_lowercase().contains(&needle)
            })
            .filter(|i| {
                category_ids.is_empty()
                    || i.category_id.map_or(false, |c| category_ids.contains(&c))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn idea(&self, id: Uuid) -> BackendResult<Idea> {
        self.data_call("idea")?;
        let tables = self.tables.lock().unwrap();
        tables
            .ideas
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or(BackendError::NoRows)
    }

    async fn insert_idea(&self, idea: &NewIdea) -> BackendResult<Idea> {
        self.data_call("insert_idea")?;
        let mut tables = self.tables.lock().unwrap();
        let mut row = idea_row(idea.author_id, &idea.title);
        row.description = idea.description.clone();
        row.category_id = idea.category_id;
        row.author = Self::author_of(&tables, idea.author_id);
        row.category = idea
            .category_id
            .and_then(|c| tables.categories.iter().find(|cat| cat.id == c).cloned());
        tables.ideas.push(row.clone());
        Ok(row)
    }

    async fn update_idea(&self, id: Uuid, update: &IdeaUpdate) -> BackendResult<Idea> {
        self.data_call("update_idea")?;
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .ideas
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(BackendError::NoRows)?;
        if let Some(title) = &update.title {
            row.title = title.clone();
        }
        if let Some(description) = &update.description {
            row.description = description.clone();
        }
        if let Some(category_id) = update.category_id {
            row.category_id = Some(category_id);
        }
        if let Some(status) = update.status {
            row.status = status;
        }
        if let Some(featured) = update.featured {
            row.featured = featured;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_idea(&self, id: Uuid) -> BackendResult<()> {
        self.data_call("delete_idea")?;
        self.tables.lock().unwrap().ideas.retain(|i| i.id != id);
        Ok(())
    }

    async fn list_all_ideas(&self) -> BackendResult<Vec<Idea>> {
        self.data_call("list_all_ideas")?;
        let mut rows = self.tables.lock().unwrap().ideas.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn vote(&self, user_id: Uuid, idea_id: Uuid) -> BackendResult<Vote> {
        self.data_call("vote")?;
        let tables = self.tables.lock().unwrap();
        tables
            .votes
            .iter()
            .find(|v| v.user_id == user_id && v.idea_id == idea_id)
            .cloned()
            .ok_or(BackendError::NoRows)
    }

    async fn insert_vote(&self, vote: &NewVote) -> BackendResult<Vote> {
        self.data_call("insert_vote")?;
        let mut tables = self.tables.lock().unwrap();
        if tables
            .votes
            .iter()
            .any(|v| v.user_id == vote.user_id && v.idea_id == vote.idea_id)
        {
            return Err(BackendError::Service {
                code: Some("23505".into()),
                message: "duplicate key value violates unique constraint \"votes_user_id_idea_id_key\""
                    .into(),
            });
        }
        let row = Vote {
            id: Uuid::new_v4(),
            user_id: vote.user_id,
            idea_id: vote.idea_id,
            vote_type: vote.vote_type,
            created_at: Utc::now(),
        };
        tables.votes.push(row.clone());
        Ok(row)
    }

    async fn update_vote_type(&self, vote_id: Uuid, vote_type: VoteType) -> BackendResult<Vote> {
        self.data_call("update_vote_type")?;
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .votes
            .iter_mut()
            .find(|v| v.id == vote_id)
            .ok_or(BackendError::NoRows)?;
        row.vote_type = vote_type;
        Ok(row.clone())
    }

    async fn delete_vote(&self, vote_id: Uuid) -> BackendResult<()> {
        self.data_call("delete_vote")?;
        self.tables.lock().unwrap().votes.retain(|v| v.id != vote_id);
        Ok(())
    }

    async fn votes_by_user(&self, user_id: Uuid, idea_ids: &[Uuid]) -> BackendResult<Vec<Vote>> {
        self.data_call("votes_by_user")?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .votes
            .iter()
            .filter(|v| v.user_id == user_id && idea_ids.contains(&v.idea_id))
            .cloned()
            .collect())
    }

    async fn votes_for_idea(&self, idea_id: Uuid) -> BackendResult<Vec<Vote>> {
        self.data_call("votes_for_idea")?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .votes
            .iter()
            .filter(|v| v.idea_id == idea_id)
            .cloned()
            .collect())
    }

    async fn list_all_votes(&self) -> BackendResult<Vec<Vote>> {
        self.data_call("list_all_votes")?;
        let mut rows = self.tables.lock().unwrap().votes.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn comments_for_idea(&self, idea_id: Uuid) -> BackendResult<Vec<Comment>> {
        self.data_call("comments_for_idea")?;
        let mut rows: Vec<Comment> = self
            .tables
            .lock()
            .unwrap()
            .comments
            .iter()
            .filter(|c| c.idea_id == idea_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn insert_comment(&self, comment: &NewComment) -> BackendResult<Comment> {
        self.data_call("insert_comment")?;
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let row = Comment {
            id: Uuid::new_v4(),
            idea_id: comment.idea_id,
            author_id: comment.author_id,
            content: comment.content.clone(),
            parent_id: comment.parent_id,
            created_at: now,
            updated_at: now,
            author: Self::author_of(&tables, comment.author_id),
        };
        tables.comments.push(row.clone());
        Ok(row)
    }

    async fn notifications(&self, user_id: Uuid, limit: usize) -> BackendResult<Vec<Notification>> {
        self.data_call("notifications")?;
        let mut rows: Vec<Notification> = self
            .tables
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn mark_notification_read(&self, id: Uuid) -> BackendResult<()> {
        self.data_call("mark_notification_read")?;
        let mut tables = self.tables.lock().unwrap();
        if let Some(row) = tables.notifications.iter_mut().find(|n| n.id == id) {
            row.read = true;
        }
        Ok(())
    }

    async fn probe_table(&self, table: &str) -> BackendResult<()> {
        self.data_call("probe_table")?;
        let tables = self.tables.lock().unwrap();
        if tables.missing_tables.iter().any(|t| t == table) {
            return Err(BackendError::Service {
                code: Some("42P01".into()),
                message: format!("relation \"public.{}\" does not exist", table),
            });
        }
        Ok(())
    }
}
