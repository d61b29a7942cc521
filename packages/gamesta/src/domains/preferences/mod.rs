pub mod actions;
pub mod models;

pub use actions::{get_preferences, update_preferences};
pub use models::{PreferencesUpdate, UserPreferences};
