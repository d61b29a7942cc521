//! Idea actions - listing, search and submission

use tracing::{debug, info};
use uuid::Uuid;

use crate::common::validation::{rules, validate_form};
use crate::common::{require_user, BackendError, ServiceResult};
use crate::domains::ideas::models::{Idea, IdeaQuery, IdeaUpdate, NewIdea};
use crate::domains::votes::actions::viewer_votes;
use crate::kernel::GamestaDeps;
use crate::storage::configs;

/// Fields of the idea form.
#[derive(Debug, Clone, Default)]
pub struct IdeaSubmission {
    pub title: String,
    pub description: String,
    pub category_id: Option<Uuid>,
}

/// List ideas, annotated with the viewer's votes when signed in.
///
/// The default listing is also written to the local cache.
pub async fn list_ideas(
    deps: &GamestaDeps,
    viewer: Option<Uuid>,
    query: &IdeaQuery,
) -> ServiceResult<Vec<Idea>> {
    let mut ideas = deps.store.list_ideas(query).await?;
    debug!(count = ideas.len(), status = %query.status, "Ideas fetched");

    attach_votes(deps, viewer, &mut ideas).await;

    if *query == IdeaQuery::default() {
        deps.cache.set_item(&configs::IDEAS, &ideas);
    }
    Ok(ideas)
}

/// Last default listing from the local cache, if still fresh.
pub fn cached_ideas(deps: &GamestaDeps) -> Option<Vec<Idea>> {
    deps.cache.get_item(&configs::IDEAS)
}

/// One idea with the viewer's vote, or `None` if it does not exist.
pub async fn get_idea(
    deps: &GamestaDeps,
    viewer: Option<Uuid>,
    id: Uuid,
) -> ServiceResult<Option<Idea>> {
    let idea = match deps.store.idea(id).await {
        Ok(idea) => idea,
        Err(BackendError::NoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut ideas = vec![idea];
    attach_votes(deps, viewer, &mut ideas).await;
    Ok(ideas.pop())
}

/// Validate and submit a new idea as the viewer.
pub async fn submit_idea(
    deps: &GamestaDeps,
    viewer: Option<Uuid>,
    submission: IdeaSubmission,
) -> ServiceResult<Idea> {
    let author_id = require_user(viewer)?;

    let mut data = validate_form(
        &[
            ("title", submission.title.as_str()),
            ("description", submission.description.as_str()),
        ],
        &rules::idea_submission(),
    )
    .into_result()?;

    let idea = deps
        .store
        .insert_idea(&NewIdea {
            title: data.remove("title").unwrap_or_default(),
            description: data.remove("description").unwrap_or_default(),
            category_id: submission.category_id,
            author_id,
        })
        .await?;

    info!(idea_id = %idea.id, author_id = %author_id, "Idea submitted");
    Ok(idea)
}

/// Apply an edit. Title and description are validated when present.
pub async fn update_idea(
    deps: &GamestaDeps,
    viewer: Option<Uuid>,
    id: Uuid,
    update: IdeaUpdate,
) -> ServiceResult<Idea> {
    require_user(viewer)?;

    let rule_set: Vec<_> = rules::idea_submission()
        .into_iter()
        .filter(|(field, _)| match *field {
            "title" => update.title.is_some(),
            "description" => update.description.is_some(),
            _ => false,
        })
        .collect();
    let mut fields = Vec::new();
    if let Some(title) = &update.title {
        fields.push(("title", title.as_str()));
    }
    if let Some(description) = &update.description {
        fields.push(("description", description.as_str()));
    }
    let mut data = validate_form(&fields, &rule_set).into_result()?;

    let update = IdeaUpdate {
        title: data.remove("title"),
        description: data.remove("description"),
        ..update
    };
    Ok(deps.store.update_idea(id, &update).await?)
}

pub async fn delete_idea(deps: &GamestaDeps, viewer: Option<Uuid>, id: Uuid) -> ServiceResult<()> {
    require_user(viewer)?;
    deps.store.delete_idea(id).await?;
    info!(idea_id = %id, "Idea deleted");
    Ok(())
}

/// Ideas whose title or description contains `text`, optionally limited
/// to some categories. Non-empty terms are added to the search history.
pub async fn search_ideas(
    deps: &GamestaDeps,
    text: &str,
    category_ids: &[Uuid],
) -> ServiceResult<Vec<Idea>> {
    let text = text.trim();
    let ideas = deps
        .store
        .search_ideas((!text.is_empty()).then_some(text), category_ids)
        .await?;
    if !text.is_empty() {
        deps.cache.push_search(text);
    }
    Ok(ideas)
}

/// Every idea regardless of status, newest first.
pub async fn list_all_ideas(deps: &GamestaDeps) -> ServiceResult<Vec<Idea>> {
    Ok(deps.store.list_all_ideas().await?)
}

async fn attach_votes(deps: &GamestaDeps, viewer: Option<Uuid>, ideas: &mut [Idea]) {
    let ids: Vec<Uuid> = ideas.iter().map(|i| i.id).collect();
    let votes = viewer_votes(deps, viewer, &ids).await;
    for idea in ideas.iter_mut() {
        idea.user_vote = votes.get(&idea.id).copied();
    }
}
