use tracing::info;
use uuid::Uuid;

use crate::common::validation::{rules, validate_form};
use crate::common::{require_user, ServiceResult};
use crate::domains::comments::models::{Comment, NewComment};
use crate::kernel::GamestaDeps;

/// Comments on an idea, oldest first.
pub async fn list_comments(deps: &GamestaDeps, idea_id: Uuid) -> ServiceResult<Vec<Comment>> {
    Ok(deps.store.comments_for_idea(idea_id).await?)
}

/// Post a comment (or a reply when `parent_id` is set) as the viewer.
pub async fn add_comment(
    deps: &GamestaDeps,
    viewer: Option<Uuid>,
    idea_id: Uuid,
    content: &str,
    parent_id: Option<Uuid>,
) -> ServiceResult<Comment> {
    let author_id = require_user(viewer)?;

    let mut data = validate_form(&[("content", content)], &rules::comment()).into_result()?;
    let comment = deps
        .store
        .insert_comment(&NewComment {
            idea_id,
            author_id,
            content: data.remove("content").unwrap_or_default(),
            parent_id,
        })
        .await?;

    info!(comment_id = %comment.id, idea_id = %idea_id, "Comment added");
    Ok(comment)
}
