//! Vote actions
//!
//! A user has at most one vote per idea. Casting the same vote again takes
//! it back; casting the other type switches it.

use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::common::{require_user, BackendError, ServiceResult};
use crate::domains::votes::models::{NewVote, Vote, VoteType};
use crate::kernel::GamestaDeps;

/// Toggle the viewer's vote on an idea.
///
/// Returns the vote as stored, or `None` when the vote was removed.
pub async fn cast_vote(
    deps: &GamestaDeps,
    viewer: Option<Uuid>,
    idea_id: Uuid,
    vote_type: VoteType,
) -> ServiceResult<Option<Vote>> {
    let user_id = require_user(viewer)?;

    let existing = match deps.store.vote(user_id, idea_id).await {
        Ok(vote) => Some(vote),
        Err(BackendError::NoRows) => None,
        Err(e) => return Err(e.into()),
    };

    match existing {
        None => {
            let vote = deps
                .store
                .insert_vote(&NewVote {
                    user_id,
                    idea_id,
                    vote_type,
                })
                .await?;
            debug!(idea_id = %idea_id, %vote_type, "Vote cast");
            Ok(Some(vote))
        }
        Some(vote) if vote.vote_type == vote_type => {
            deps.store.delete_vote(vote.id).await?;
            debug!(idea_id = %idea_id, %vote_type, "Vote withdrawn");
            Ok(None)
        }
        Some(vote) => {
            let vote = deps.store.update_vote_type(vote.id, vote_type).await?;
            debug!(idea_id = %idea_id, %vote_type, "Vote switched");
            Ok(Some(vote))
        }
    }
}

/// The viewer's vote on an idea. Nobody signed in means no vote.
pub async fn get_user_vote(
    deps: &GamestaDeps,
    viewer: Option<Uuid>,
    idea_id: Uuid,
) -> ServiceResult<Option<Vote>> {
    let Some(user_id) = viewer else {
        return Ok(None);
    };
    match deps.store.vote(user_id, idea_id).await {
        Ok(vote) => Ok(Some(vote)),
        Err(BackendError::NoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub async fn list_votes_for_idea(deps: &GamestaDeps, idea_id: Uuid) -> ServiceResult<Vec<Vote>> {
    Ok(deps.store.votes_for_idea(idea_id).await?)
}

/// Every vote, newest first.
pub async fn list_all_votes(deps: &GamestaDeps) -> ServiceResult<Vec<Vote>> {
    Ok(deps.store.list_all_votes().await?)
}

/// The viewer's votes keyed by idea.
///
/// Lookup failures are logged and yield an empty map; vote badges are
/// decoration on top of the listing.
pub(crate) async fn viewer_votes(
    deps: &GamestaDeps,
    viewer: Option<Uuid>,
    idea_ids: &[Uuid],
) -> HashMap<Uuid, VoteType> {
    let Some(user_id) = viewer else {
        return HashMap::new();
    };
    if idea_ids.is_empty() {
        return HashMap::new();
    }
    match deps.store.votes_by_user(user_id, idea_ids).await {
        Ok(votes) => votes.into_iter().map(|v| (v.idea_id, v.vote_type)).collect(),
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Could not load viewer votes");
            HashMap::new()
        }
    }
}
