//! Profile actions - reads and writes on the `users` table

use tracing::{info, warn};
use uuid::Uuid;

use crate::common::validation::{rules, validate_form};
use crate::common::{BackendError, ServiceError, ServiceResult};
use crate::domains::profiles::models::{NewProfile, ProfileUpdate, UserAchievement, UserProfile};
use crate::kernel::GamestaDeps;

/// Profile row for `user_id`, or `None` if there is none.
pub async fn get_profile(deps: &GamestaDeps, user_id: Uuid) -> ServiceResult<Option<UserProfile>> {
    match deps.store.profile_by_id(user_id).await {
        Ok(profile) => Ok(Some(profile)),
        Err(BackendError::NoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Every profile, newest first.
pub async fn list_all_users(deps: &GamestaDeps) -> ServiceResult<Vec<UserProfile>> {
    Ok(deps.store.list_profiles().await?)
}

pub async fn list_user_achievements(
    deps: &GamestaDeps,
    user_id: Uuid,
) -> ServiceResult<Vec<UserAchievement>> {
    Ok(deps.store.user_achievements(user_id).await?)
}

/// Insert the profile row plus default preferences.
///
/// A failed preferences insert is logged and otherwise ignored.
pub async fn create_profile(
    deps: &GamestaDeps,
    user_id: Uuid,
    email: &str,
    username: &str,
) -> ServiceResult<UserProfile> {
    let profile = deps
        .store
        .insert_profile(&NewProfile::new(user_id, email, username))
        .await?;

    if let Err(e) = deps.store.insert_default_preferences(user_id).await {
        warn!(user_id = %user_id, error = %e, "Default preferences could not be created");
    }

    info!(user_id = %user_id, username, "Profile created");
    Ok(profile)
}

/// Validate and apply a profile edit.
pub async fn update_profile(
    deps: &GamestaDeps,
    user_id: Uuid,
    update: ProfileUpdate,
) -> ServiceResult<UserProfile> {
    let update = validate_update(update)?;
    if update.is_empty() {
        return get_profile(deps, user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("profile".into()));
    }
    Ok(deps.store.update_profile(user_id, &update).await?)
}

fn validate_update(update: ProfileUpdate) -> ServiceResult<ProfileUpdate> {
    // Only the fields being changed are validated.
    let rule_set: Vec<_> = rules::profile_update()
        .into_iter()
        .filter(|(field, _)| match *field {
            "username" => update.username.is_some(),
            "bio" => update.bio.is_some(),
            _ => false,
        })
        .collect();

    let mut fields = Vec::new();
    if let Some(username) = &update.username {
        fields.push(("username", username.as_str()));
    }
    if let Some(bio) = &update.bio {
        fields.push(("bio", bio.as_str()));
    }

    let mut data = validate_form(&fields, &rule_set).into_result()?;
    Ok(ProfileUpdate {
        username: data.remove("username"),
        bio: data.remove("bio"),
        avatar_url: update.avatar_url,
    })
}
