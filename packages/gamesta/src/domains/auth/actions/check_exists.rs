//! Account existence check

use tracing::{debug, warn};

use crate::common::validation::validate_email;
use crate::common::{BackendError, ServiceResult, ValidationErrors};
use crate::domains::profiles::UserProfile;
use crate::kernel::GamestaDeps;

/// Result of looking an email up in the profile table.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountLookup {
    Exists(UserProfile),
    Missing,
}

impl AccountLookup {
    pub fn exists(&self) -> bool {
        matches!(self, AccountLookup::Exists(_))
    }
}

/// Look up the profile for `email`.
///
/// Only a "no rows" answer means the account is missing. Any other backend
/// failure is returned as an error so callers never mistake an outage for
/// "does not exist".
pub async fn check_exists(deps: &GamestaDeps, email: &str) -> ServiceResult<AccountLookup> {
    let email = validate_email(email).map_err(|e| ValidationErrors::single("email", e))?;

    match deps.store.profile_by_email(&email).await {
        Ok(profile) => {
            debug!(user_id = %profile.id, "Account exists");
            Ok(AccountLookup::Exists(profile))
        }
        Err(BackendError::NoRows) => {
            debug!("No account for email");
            Ok(AccountLookup::Missing)
        }
        Err(e) => {
            warn!(error = %e, "Account lookup failed");
            Err(e.into())
        }
    }
}
