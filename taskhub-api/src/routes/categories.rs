/// Category endpoints
///
/// Categories are not stored on their own; they are the distinct labels on
/// the caller's tasks. Rename and delete rewrite every task carrying the label.
///
/// # Endpoints
///
/// - `GET /v1/categories` - `{categories: [{name, taskCount}]}`
/// - `PUT /v1/categories/:name` - Rename, body `{newName}`
/// - `DELETE /v1/categories/:name` - Clear the label from its tasks

use crate::{
    app::AppState, error::ApiResult, extract::ValidatedJson, middleware::session::AuthContext,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhub_shared::models::CategoryCount;
use validator::Validate;

/// Category listing
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryCount>,
}

/// Rename request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RenameCategoryRequest {
    /// Replacement label
    #[validate(length(min = 1, message = "New name is required"))]
    pub new_name: String,
}

/// Result of a rename or delete
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryChangeResponse {
    /// The label tasks now carry (rename) or the label removed (delete)
    pub name: String,

    /// Number of tasks rewritten
    pub updated_tasks: usize,
}

/// Lists the caller's categories with task counts, sorted by name
pub async fn list_categories(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<CategoriesResponse>> {
    let categories = state.tasks.get_user_categories(auth.user.id).await?;
    Ok(Json(CategoriesResponse { categories }))
}

/// Renames a category across the caller's tasks
///
/// # Errors
///
/// - `404 Not Found`: No task carries the category
/// - `422 Unprocessable Entity`: Missing `newName`
pub async fn rename_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(name): Path<String>,
    ValidatedJson(req): ValidatedJson<RenameCategoryRequest>,
) -> ApiResult<Json<CategoryChangeResponse>> {
    let updated_tasks = state
        .tasks
        .rename_category(auth.user.id, &name, &req.new_name)
        .await?;

    Ok(Json(CategoryChangeResponse {
        name: req.new_name.trim().to_string(),
        updated_tasks,
    }))
}

/// Removes a category from the caller's tasks
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(name): Path<String>,
) -> ApiResult<Json<CategoryChangeResponse>> {
    let updated_tasks = state.tasks.delete_category(auth.user.id, &name).await?;

    Ok(Json(CategoryChangeResponse {
        name: name.trim().to_string(),
        updated_tasks,
    }))
}
