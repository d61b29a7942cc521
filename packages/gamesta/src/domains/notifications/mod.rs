pub mod actions;
pub mod models;

pub use actions::{list_notifications, mark_notification_read, DEFAULT_NOTIFICATION_LIMIT};
pub use models::Notification;
