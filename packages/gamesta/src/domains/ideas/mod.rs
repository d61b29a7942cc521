//! Ideas domain - proposals users submit and vote on

pub mod actions;
pub mod models;

pub use actions::{
    cached_ideas, delete_idea, get_idea, list_all_ideas, list_ideas, search_ideas, submit_idea,
    update_idea, IdeaSubmission,
};
pub use models::{Idea, IdeaQuery, IdeaSort, IdeaStatus, IdeaUpdate, NewIdea};
