//! Login action

use std::time::Duration;
use supabase::Session;
use tracing::{info, warn};

use crate::common::validation::{rules, validate_form};
use crate::common::{BackendError, ServiceError, ServiceResult, ValidationErrors};
use crate::domains::auth::actions::check_exists::{check_exists, AccountLookup};
use crate::domains::auth::events::AuthEvent;
use crate::domains::auth::reconciler::AuthReconciler;
use crate::domains::auth::state::SessionState;
use crate::kernel::{BackendResult, GamestaDeps};

const MAX_LOGIN_ATTEMPTS: usize = 5;
const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Result of a login attempt
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// No profile exists for the email. Credentials were not checked.
    NoAccount,
    /// Credentials accepted; the state the session settled into.
    Authenticated(SessionState),
    /// The backend refused the credentials. `message` is its own wording.
    Rejected { message: String },
}

/// Sign in with email and password.
///
/// Order: validate, check the account exists, then check credentials.
/// Returns `NoAccount` without calling the credential check when there is
/// no profile for the email.
pub async fn login(
    reconciler: &AuthReconciler,
    email: &str,
    password: &str,
) -> ServiceResult<LoginOutcome> {
    let deps = reconciler.deps();

    let mut data = validate_form(
        &[("email", email), ("password", password)],
        &rules::login(),
    )
    .into_result()?;
    let email = data.remove("email").unwrap_or_default();

    check_throttle(reconciler, &email)?;

    if let AccountLookup::Missing = check_exists(deps, &email).await? {
        info!("Login for unknown account");
        return Ok(LoginOutcome::NoAccount);
    }

    let session = match timed_sign_in(deps, &email, password).await? {
        Ok(session) => session,
        Err(BackendError::Service { message, .. }) => {
            info!(reason = %message, "Credentials rejected");
            return Ok(LoginOutcome::Rejected { message });
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %session.user.id, "Signed in");
    let state = reconciler.handle_event(AuthEvent::signed_in(session)).await;
    Ok(LoginOutcome::Authenticated(state))
}

/// Count an attempt for `email`, failing once the window is full.
pub(super) fn check_throttle(reconciler: &AuthReconciler, email: &str) -> ServiceResult<()> {
    let limiter = reconciler.login_attempts();
    if limiter.is_allowed(email, MAX_LOGIN_ATTEMPTS, LOGIN_WINDOW) {
        return Ok(());
    }
    let wait = limiter.remaining(email, LOGIN_WINDOW);
    Err(ValidationErrors::single(
        "email",
        format!(
            "Too many login attempts. Try again in {} minutes",
            wait.as_secs().div_ceil(60).max(1)
        ),
    )
    .into())
}

/// Credential check raced against the sign-in timeout. The outer error is
/// the timeout; the inner result is the backend's answer.
pub(super) async fn timed_sign_in(
    deps: &GamestaDeps,
    email: &str,
    password: &str,
) -> ServiceResult<BackendResult<Session>> {
    let timeout = deps.config.sign_in_timeout;
    tokio::time::timeout(timeout, deps.auth.sign_in_with_password(email, password))
        .await
        .map_err(|_| {
            warn!(timeout_secs = timeout.as_secs(), "Sign-in timed out");
            ServiceError::Timeout {
                operation: "sign-in",
                after: timeout,
            }
        })
}
