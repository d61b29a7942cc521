use uuid::Uuid;

use super::{ServiceError, ServiceResult};

/// The signed-in user an action runs for. Fails before any network call
/// when nobody is signed in.
pub fn require_user(viewer: Option<Uuid>) -> ServiceResult<Uuid> {
    viewer.ok_or(ServiceError::NotAuthenticated)
}
