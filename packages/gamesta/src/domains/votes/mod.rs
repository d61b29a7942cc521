pub mod actions;
pub mod models;

pub use actions::{cast_vote, get_user_vote, list_all_votes, list_votes_for_idea};
pub use models::{NewVote, Vote, VoteType};
