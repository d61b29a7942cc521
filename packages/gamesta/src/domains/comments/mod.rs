pub mod actions;
pub mod models;

pub use actions::{add_comment, list_comments};
pub use models::{Comment, NewComment};
