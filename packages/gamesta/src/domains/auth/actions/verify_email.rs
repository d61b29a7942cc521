use tracing::{debug, info};

use crate::common::validation::{rules, validate_form};
use crate::common::{BackendError, ServiceResult};
use crate::domains::auth::actions::login::{check_throttle, timed_sign_in};
use crate::domains::auth::events::AuthEvent;
use crate::domains::auth::reconciler::AuthReconciler;
use crate::domains::auth::state::SessionState;

#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    Verified(SessionState),
    NotVerified,
    /// The backend refused the credentials for a reason other than an
    /// unconfirmed email.
    Rejected { message: String },
}

/// Finish sign-up after the user followed the confirmation link.
///
/// The link is usually opened in a browser, so this client may hold no
/// session. Without a verified session for `email`, signs in directly:
/// there is no profile row to gate on yet. The profile is created on the
/// way to `Ready` if it does not exist.
pub async fn complete_email_verification(
    reconciler: &AuthReconciler,
    email: &str,
    password: &str,
) -> ServiceResult<VerificationOutcome> {
    let deps = reconciler.deps();

    let mut data = validate_form(
        &[("email", email), ("password", password)],
        &rules::login(),
    )
    .into_result()?;
    let email = data.remove("email").unwrap_or_default();

    if let Some(session) = deps.auth.session().await? {
        let same_account = session.user.email.as_deref() == Some(email.as_str());
        if same_account && session.user.is_verified() {
            info!(user_id = %session.user.id, "Email verified");
            let state = reconciler.handle_event(AuthEvent::signed_in(session)).await;
            return Ok(VerificationOutcome::Verified(state));
        }
    }

    check_throttle(reconciler, &email)?;

    match timed_sign_in(deps, &email, password).await? {
        Ok(session) => {
            info!(user_id = %session.user.id, "Email verified, signed in");
            let state = reconciler.handle_event(AuthEvent::signed_in(session)).await;
            Ok(VerificationOutcome::Verified(state))
        }
        Err(BackendError::Service { code, message }) if is_unconfirmed(code.as_deref(), &message) => {
            debug!("Email not confirmed yet");
            Ok(VerificationOutcome::NotVerified)
        }
        Err(BackendError::Service { message, .. }) => {
            info!(reason = %message, "Credentials rejected");
            Ok(VerificationOutcome::Rejected { message })
        }
        Err(e) => Err(e.into()),
    }
}

fn is_unconfirmed(code: Option<&str>, message: &str) -> bool {
    code == Some("email_not_confirmed") || message.to_lowercase().contains("not confirmed")
}
