use tracing::info;
use uuid::Uuid;

use crate::common::validation::{validate_content, ContentRules};
use crate::common::{require_user, ServiceResult, ValidationErrors};
use crate::domains::categories::models::{Category, NewCategory};
use crate::kernel::GamestaDeps;

const DEFAULT_COLOR: &str = "#6366f1";

/// All categories ordered by name.
pub async fn list_categories(deps: &GamestaDeps) -> ServiceResult<Vec<Category>> {
    Ok(deps.store.list_categories().await?)
}

pub async fn create_category(
    deps: &GamestaDeps,
    viewer: Option<Uuid>,
    category: NewCategory,
) -> ServiceResult<Category> {
    require_user(viewer)?;

    let name = validate_content(
        &category.name,
        &ContentRules {
            min_length: 2,
            max_length: 50,
            field_name: "Name",
        },
    )
    .map_err(|e| ValidationErrors::single("name", e))?;
    let color = match category.color.trim() {
        "" => DEFAULT_COLOR.to_string(),
        color => color.to_string(),
    };

    let created = deps
        .store
        .insert_category(&NewCategory {
            name,
            description: category.description.trim().to_string(),
            color,
        })
        .await?;
    info!(category_id = %created.id, name = %created.name, "Category created");
    Ok(created)
}
