/// Task endpoints
///
/// Every handler works on the signed-in user's tasks only. A task id that
/// belongs to someone else answers exactly like a missing one (404).
///
/// # Endpoints
///
/// - `GET /v1/tasks` - List tasks (`category`, `completed`, `includeDeleted`, `limit`, `offset`)
/// - `POST /v1/tasks` - Create task
/// - `GET /v1/tasks/:id` - Get task
/// - `PUT /v1/tasks/:id/complete` - Set completion
/// - `DELETE /v1/tasks/:id` - Soft delete
/// - `POST /v1/tasks/:id/restore` - Restore

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiQuery},
    middleware::session::AuthContext,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhub_shared::error::ErrorCode;
use taskhub_shared::models::{Task, TaskFilters, TaskPage};
use uuid::Uuid;

/// Query parameters for listing tasks
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    pub category: Option<String>,
    pub completed: Option<bool>,
    pub include_deleted: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<ListTasksQuery> for TaskFilters {
    fn from(query: ListTasksQuery) -> Self {
        TaskFilters {
            category: query.category,
            completed: query.completed,
            include_deleted: query.include_deleted.unwrap_or(false),
            limit: query.limit.unwrap_or(0),
            offset: query.offset.unwrap_or(0),
        }
    }
}

/// Create task request
///
/// Length and blank checks happen in the task service.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    /// What needs doing
    pub description: String,

    /// Optional category label; absent and `null` both mean none
    #[serde(default)]
    pub category: Option<String>,
}

/// Completion update request
#[derive(Debug, Deserialize)]
pub struct UpdateCompletionRequest {
    pub completed: bool,
}

/// Lists the caller's tasks
///
/// # Response
///
/// ```json
/// { "tasks": [ ... ], "total": 3 }
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ListTasksQuery>,
) -> ApiResult<Json<TaskPage>> {
    let filters = TaskFilters::from(query);
    let page = state.tasks.list_tasks(auth.user.id, &filters).await?;
    Ok(Json(page))
}

/// Creates a task
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let category = req.category.unwrap_or_default();
    let task = state
        .tasks
        .create_task(auth.user.id, &req.description, &category)
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Gets one of the caller's tasks
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;
    let task = state.tasks.get_task_for_user(auth.user.id, id).await?;
    Ok(Json(task))
}

/// Sets the completion flag
pub async fn update_completion(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateCompletionRequest>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;
    state.tasks.get_task_for_user(auth.user.id, id).await?;
    let task = state.tasks.update_task_completion(id, req.completed).await?;
    Ok(Json(task))
}

/// Soft-deletes a task, returning it with `deletedAt` set
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;
    state.tasks.get_task_for_user(auth.user.id, id).await?;
    let task = state.tasks.soft_delete_task(id).await?;
    Ok(Json(task))
}

/// Restores a soft-deleted task
pub async fn restore_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;
    state.tasks.get_task_for_user(auth.user.id, id).await?;
    let task = state.tasks.restore_task(id).await?;
    Ok(Json(task))
}

/// A malformed id cannot name an existing task
fn parse_task_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::NotFound(ErrorCode::TaskNotFound, "task not found".to_string()))
}
