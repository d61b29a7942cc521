//! Profiles domain - the `users` table and achievements

pub mod actions;
pub mod models;

pub use actions::{
    create_profile, get_profile, list_all_users, list_user_achievements, update_profile,
};
pub use models::{Achievement, AuthorSummary, NewProfile, ProfileUpdate, UserAchievement, UserProfile};
