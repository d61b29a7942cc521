use uuid::Uuid;

use crate::common::{require_user, ServiceResult};
use crate::domains::notifications::models::Notification;
use crate::kernel::GamestaDeps;

pub const DEFAULT_NOTIFICATION_LIMIT: usize = 20;

/// The viewer's notifications, newest first.
pub async fn list_notifications(
    deps: &GamestaDeps,
    viewer: Option<Uuid>,
    limit: usize,
) -> ServiceResult<Vec<Notification>> {
    let user_id = require_user(viewer)?;
    Ok(deps.store.notifications(user_id, limit).await?)
}

pub async fn mark_notification_read(
    deps: &GamestaDeps,
    viewer: Option<Uuid>,
    notification_id: Uuid,
) -> ServiceResult<()> {
    require_user(viewer)?;
    Ok(deps.store.mark_notification_read(notification_id).await?)
}
