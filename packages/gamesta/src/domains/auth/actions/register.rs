//! Registration action

use serde_json::json;
use supabase::SignUpOptions;
use tracing::info;

use crate::common::validation::{rules, validate_form};
use crate::common::{BackendError, ServiceResult};
use crate::domains::auth::actions::check_exists::{check_exists, AccountLookup};
use crate::domains::auth::events::AuthEvent;
use crate::domains::auth::reconciler::AuthReconciler;
use crate::domains::auth::state::SessionState;

#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    /// An account already exists for the email. Either it has a profile, or
    /// it was confirmed but never completed through
    /// [`complete_email_verification`](super::complete_email_verification).
    AlreadyRegistered,
    /// Account created; a confirmation email is on its way.
    VerificationPending { email: String },
    /// The backend confirmed the account immediately.
    SignedIn(SessionState),
}

/// Create an account.
///
/// The profile row and default preferences are created by the reconciler
/// once a verified session exists, from the username stored in the sign-up
/// metadata.
pub async fn register(
    reconciler: &AuthReconciler,
    email: &str,
    password: &str,
    username: &str,
) -> ServiceResult<RegisterOutcome> {
    let deps = reconciler.deps();

    let mut data = validate_form(
        &[("email", email), ("password", password), ("username", username)],
        &rules::register(),
    )
    .into_result()?;
    let email = data.remove("email").unwrap_or_default();
    let username = data.remove("username").unwrap_or_default();

    if let AccountLookup::Exists(_) = check_exists(deps, &email).await? {
        info!("Registration for existing account");
        return Ok(RegisterOutcome::AlreadyRegistered);
    }

    let options = SignUpOptions {
        data: json!({ "username": username }),
        email_redirect_to: deps.config.email_redirect_url.clone(),
    };
    let response = match deps.auth.sign_up(&email, password, &options).await {
        Ok(response) => response,
        // Account exists without a profile row: confirmed elsewhere, never
        // completed here.
        Err(BackendError::Service { code, message })
            if code.as_deref() == Some("user_already_exists")
                || message.to_lowercase().contains("already registered") =>
        {
            info!("Auth account exists without a profile");
            return Ok(RegisterOutcome::AlreadyRegistered);
        }
        Err(e) => return Err(e.into()),
    };

    match response.session {
        Some(session) => {
            info!(user_id = %session.user.id, "Registered and signed in");
            let state = reconciler.handle_event(AuthEvent::signed_in(session)).await;
            Ok(RegisterOutcome::SignedIn(state))
        }
        None => {
            info!("Registered, awaiting email confirmation");
            reconciler.await_verification(&email).await;
            Ok(RegisterOutcome::VerificationPending { email })
        }
    }
}
