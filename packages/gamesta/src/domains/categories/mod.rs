pub mod actions;
pub mod models;

pub use actions::{create_category, list_categories};
pub use models::{Category, NewCategory};
