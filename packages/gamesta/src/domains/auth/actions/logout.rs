use tracing::{info, warn};

use crate::common::ServiceResult;
use crate::domains::auth::reconciler::AuthReconciler;

/// Sign out.
///
/// Local state and the session marker are cleared even when the backend
/// call fails; that failure is returned afterwards.
pub async fn logout(reconciler: &AuthReconciler) -> ServiceResult<()> {
    let result = reconciler.deps().auth.sign_out().await;
    reconciler.clear().await;

    match result {
        Ok(()) => {
            info!("Signed out");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Backend sign-out failed; local session cleared");
            Err(e.into())
        }
    }
}
