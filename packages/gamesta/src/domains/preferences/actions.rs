use tracing::debug;
use uuid::Uuid;

use crate::common::{require_user, BackendError, ServiceResult};
use crate::domains::preferences::models::{PreferencesUpdate, UserPreferences};
use crate::kernel::GamestaDeps;
use crate::storage::configs;

/// The viewer's preferences row, or `None` if it was never created.
pub async fn get_preferences(
    deps: &GamestaDeps,
    viewer: Option<Uuid>,
) -> ServiceResult<Option<UserPreferences>> {
    let user_id = require_user(viewer)?;
    match deps.store.preferences(user_id).await {
        Ok(prefs) => {
            deps.cache.set_item(&configs::USER_PREFERENCES, &prefs);
            Ok(Some(prefs))
        }
        Err(BackendError::NoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub async fn update_preferences(
    deps: &GamestaDeps,
    viewer: Option<Uuid>,
    update: PreferencesUpdate,
) -> ServiceResult<UserPreferences> {
    let user_id = require_user(viewer)?;
    let prefs = deps.store.update_preferences(user_id, &update).await?;
    deps.cache.set_item(&configs::USER_PREFERENCES, &prefs);
    debug!(user_id = %user_id, "Preferences updated");
    Ok(prefs)
}
