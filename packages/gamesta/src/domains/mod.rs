// Business domains
pub mod auth;
pub mod categories;
pub mod comments;
pub mod diagnostics;
pub mod ideas;
pub mod notifications;
pub mod preferences;
pub mod profiles;
pub mod votes;
