//! Auth/session reconciler.
//!
//! Turns the backend's auth events into a single [`SessionState`]:
//!
//! - no session: `Anonymous`, marker removed
//! - session for an unconfirmed account: `AwaitingVerification`
//! - verified session: `ProfileLoading`, then `Ready`, `TimedOut` or `Failed`
//!
//! Each profile load owns a cancellation token. A newer event cancels the
//! running load, and a cancelled load never writes state. Events for the
//! user already loading or ready change nothing.

use std::sync::Arc;
use supabase::User;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::common::validation::RateLimiter;
use crate::common::{BackendError, ServiceError, ServiceResult};
use crate::domains::auth::events::{AuthEvent, AuthEventKind};
use crate::domains::auth::state::{SessionMarker, SessionState};
use crate::domains::profiles::{self, ProfileUpdate, UserProfile};
use crate::kernel::GamestaDeps;
use crate::storage::configs;

/// What an incoming event requires.
enum Step {
    Settled(SessionState),
    /// The same user's profile is already being loaded.
    InFlight,
    Load(ProfileLoad),
}

struct ProfileLoad {
    user: User,
    token: CancellationToken,
}

#[derive(Clone)]
pub struct AuthReconciler {
    deps: GamestaDeps,
    state: Arc<watch::Sender<SessionState>>,
    /// Token of the running profile load. Held while deciding on and
    /// committing state transitions.
    current_load: Arc<Mutex<Option<CancellationToken>>>,
    login_attempts: Arc<RateLimiter>,
}

impl AuthReconciler {
    pub fn new(deps: GamestaDeps) -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        Self {
            deps,
            state: Arc::new(state),
            current_load: Arc::new(Mutex::new(None)),
            login_attempts: Arc::new(RateLimiter::new()),
        }
    }

    pub fn deps(&self) -> &GamestaDeps {
        &self.deps
    }

    pub(crate) fn login_attempts(&self) -> &RateLimiter {
        &self.login_attempts
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The signed-in user's profile. Only set in `Ready`.
    pub fn current_user(&self) -> Option<UserProfile> {
        self.state.borrow().user().cloned()
    }

    pub fn current_user_id(&self) -> Option<Uuid> {
        self.state.borrow().user_id()
    }

    /// Follow the backend's auth events until the stream closes.
    ///
    /// Transitions are applied in event order; profile loads run on their
    /// own tasks so a later event can cancel them.
    pub fn spawn_listener(&self) -> JoinHandle<()> {
        let this = self.clone();
        let mut events = self.deps.auth.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        debug!(kind = ?event.kind, "Auth event received");
                        if let Step::Load(load) = this.begin(event).await {
                            let worker = this.clone();
                            tokio::spawn(async move {
                                worker.run_load(load).await;
                            });
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth listener lagged; resyncing from current session");
                        match this.deps.auth.session().await {
                            Ok(session) => {
                                this.handle_event(AuthEvent::new(AuthEventKind::InitialSession, session))
                                    .await;
                            }
                            Err(e) => warn!(error = %e, "Resync failed"),
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Auth event stream closed");
                        return;
                    }
                }
            }
        })
    }

    /// Apply one event and wait for the resulting state to settle.
    pub async fn handle_event(&self, event: AuthEvent) -> SessionState {
        match self.begin(event).await {
            Step::Settled(state) => state,
            Step::InFlight => self.wait_settled().await,
            Step::Load(load) => self.run_load(load).await,
        }
    }

    /// Mark the session as waiting for email confirmation.
    pub async fn await_verification(&self, email: &str) -> SessionState {
        let mut current = self.current_load.lock().await;
        cancel(&mut current);
        self.publish(SessionState::AwaitingVerification {
            email: email.to_string(),
        })
    }

    /// Drop the current user and the session marker.
    pub async fn clear(&self) -> SessionState {
        let mut current = self.current_load.lock().await;
        cancel(&mut current);
        self.forget();
        self.publish(SessionState::Anonymous)
    }

    /// Validate and save a profile edit for the signed-in user.
    pub async fn update_profile(&self, update: ProfileUpdate) -> ServiceResult<UserProfile> {
        let user_id = self.current_user_id().ok_or(ServiceError::NotAuthenticated)?;
        let updated = profiles::update_profile(&self.deps, user_id, update).await?;

        let _guard = self.current_load.lock().await;
        if self.current_user_id() == Some(user_id) {
            self.remember(&updated);
            self.publish(SessionState::Ready(updated.clone()));
        }
        Ok(updated)
    }

    /// Refresh `last_activity` on the session marker.
    pub fn touch_activity(&self) {
        if let Some(profile) = self.current_user() {
            self.deps
                .cache
                .set_item(&configs::USER_SESSION, &SessionMarker::for_profile(&profile));
        }
    }

    /// The session marker left by the last `Ready` state, if any.
    pub fn session_marker(&self) -> Option<SessionMarker> {
        self.deps.cache.get_item(&configs::USER_SESSION)
    }

    async fn begin(&self, event: AuthEvent) -> Step {
        let Some(session) = event.session else {
            return Step::Settled(self.clear().await);
        };
        let user = session.user;

        let mut current = self.current_load.lock().await;

        if !user.is_verified() {
            cancel(&mut current);
            self.forget();
            debug!(user_id = %user.id, "Session for unverified account");
            let email = user.email.clone().unwrap_or_default();
            return Step::Settled(self.publish(SessionState::AwaitingVerification { email }));
        }

        match &*self.state.borrow() {
            SessionState::Ready(profile) if profile.id == user.id => {
                return Step::Settled(SessionState::Ready(profile.clone()));
            }
            SessionState::ProfileLoading { user_id } if *user_id == user.id => {
                return Step::InFlight;
            }
            _ => {}
        }

        cancel(&mut current);
        let token = CancellationToken::new();
        *current = Some(token.clone());
        self.publish(SessionState::ProfileLoading { user_id: user.id });
        Step::Load(ProfileLoad { user, token })
    }

    async fn run_load(&self, load: ProfileLoad) -> SessionState {
        let user_id = load.user.id;
        let timeout = self.deps.config.profile_timeout;

        let outcome = tokio::select! {
            _ = load.token.cancelled() => {
                debug!(user_id = %user_id, "Profile load superseded");
                return self.wait_settled().await;
            }
            result = tokio::time::timeout(timeout, self.fetch_or_create(&load.user)) => result,
        };

        let mut current = self.current_load.lock().await;
        if load.token.is_cancelled() {
            drop(current);
            return self.wait_settled().await;
        }
        *current = None;

        let next = match outcome {
            Ok(Ok(profile)) => {
                info!(user_id = %user_id, username = %profile.username, "Profile loaded");
                self.remember(&profile);
                SessionState::Ready(profile)
            }
            Ok(Err(e)) => {
                warn!(user_id = %user_id, error = %e, "Profile load failed");
                SessionState::Failed {
                    user_id,
                    message: e.to_string(),
                }
            }
            Err(_) => {
                warn!(
                    user_id = %user_id,
                    timeout_secs = timeout.as_secs(),
                    "Profile load timed out"
                );
                SessionState::TimedOut { user_id }
            }
        };
        self.publish(next)
    }

    /// Load the profile row, creating it on first sign-in after verification.
    async fn fetch_or_create(&self, user: &User) -> ServiceResult<UserProfile> {
        match self.deps.store.profile_by_id(user.id).await {
            Ok(profile) => Ok(profile),
            Err(BackendError::NoRows) => {
                let email = user.email.clone().unwrap_or_default();
                let username = username_for(user);
                info!(user_id = %user.id, "No profile yet, creating one");
                profiles::create_profile(&self.deps, user.id, &email, &username).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Wait until no profile load is running, then return the state.
    async fn wait_settled(&self) -> SessionState {
        let mut rx = self.state.subscribe();
        let settled = rx.wait_for(|s| !s.is_loading()).await.map(|s| s.clone());
        settled.unwrap_or_else(|_| self.state())
    }

    fn remember(&self, profile: &UserProfile) {
        self.deps
            .cache
            .set_item(&configs::USER_SESSION, &SessionMarker::for_profile(profile));
        self.deps.cache.set_item(&configs::USER, profile);
    }

    fn forget(&self) {
        self.deps.cache.remove_item(configs::USER_SESSION.key);
        self.deps.cache.remove_item(configs::USER.key);
    }

    fn publish(&self, state: SessionState) -> SessionState {
        debug!(state = state.label(), "Session state changed");
        self.state.send_replace(state.clone());
        state
    }
}

fn cancel(current: &mut Option<CancellationToken>) {
    if let Some(token) = current.take() {
        token.cancel();
    }
}

/// Username from sign-up metadata, else the email's local part, else `user`.
pub(crate) fn username_for(user: &User) -> String {
    if let Some(name) = user.metadata_str("username").filter(|n| !n.trim().is_empty()) {
        return name.trim().to_string();
    }
    user.email
        .as_deref()
        .and_then(|email| email.split('@').next())
        .filter(|local| !local.is_empty())
        .unwrap_or("user")
        .to_string()
}
