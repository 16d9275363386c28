/// Task service
///
/// Task CRUD, the soft-delete lifecycle and category fan-out.
///
/// # Policies
///
/// - Soft-deleting a task that is already deleted fails with `TaskAlreadyDeleted`
/// - Restoring a task that is not deleted fails with `TaskNotDeleted`
/// - Restoring after the retention window fails with `RestoreWindowExpired`,
///   even if the sweep has not purged the task yet
/// - Categories are derived from every non-purged task, soft-deleted ones
///   included, so rename and delete reach those tasks too
/// - Category fan-out updates one task at a time; a failure part-way leaves
///   the earlier tasks updated
///
/// `get_task_by_id`, `update_task_completion`, `soft_delete_task` and
/// `restore_task` do not check ownership. Callers acting for a user go
/// through [`TaskService::get_task_for_user`] first.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::{is_blank, ServiceError, ServiceResult};
use crate::models::category::count_categories;
use crate::models::task::{
    DEFAULT_RETENTION_DAYS, MAX_CATEGORY_LENGTH, MAX_DESCRIPTION_LENGTH,
};
use crate::models::{CategoryCount, CreateTask, Task, TaskFilters, TaskPage};
use crate::repository::TaskRepository;

/// Task and category operations
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    retention: Duration,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskRepository>) -> Self {
        Self {
            tasks,
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
        }
    }

    /// Overrides the soft-delete recovery window
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Creates an active, undeleted task
    pub async fn create_task(
        &self,
        user_id: Uuid,
        description: &str,
        category: &str,
    ) -> ServiceResult<Task> {
        if user_id.is_nil() {
            return Err(ServiceError::MissingField("user id"));
        }

        let description = validate_description(description)?;
        let category = normalize_category(category)?;

        let task = Task::new(CreateTask {
            user_id,
            description,
            category,
        });
        self.tasks.create(&task).await?;

        tracing::debug!(user_id = %user_id, task_id = %task.id, "Task created");
        Ok(task)
    }

    /// Loads a task regardless of owner
    pub async fn get_task_by_id(&self, id: Uuid) -> ServiceResult<Task> {
        self.tasks
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::TaskNotFound)
    }

    /// Loads a task owned by `user_id`
    ///
    /// Another user's task is reported as not found.
    pub async fn get_task_for_user(&self, user_id: Uuid, id: Uuid) -> ServiceResult<Task> {
        let task = self.get_task_by_id(id).await?;

        if task.user_id != user_id {
            tracing::debug!(user_id = %user_id, task_id = %id, "Task owned by another user");
            return Err(ServiceError::TaskNotFound);
        }

        Ok(task)
    }

    /// Lists a user's tasks matching `filters`
    ///
    /// Newest first, ties broken by id, then paginated.
    pub async fn list_tasks(&self, user_id: Uuid, filters: &TaskFilters) -> ServiceResult<TaskPage> {
        filters.validate().map_err(ServiceError::InvalidFilters)?;

        let mut tasks: Vec<Task> = self
            .tasks
            .list_by_user(user_id)
            .await?
            .into_iter()
            .filter(|t| filters.matches(t))
            .collect();

        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = tasks.len();
        let offset = filters.offset as usize;
        let page: Vec<Task> = if filters.limit == 0 {
            tasks.into_iter().skip(offset).collect()
        } else {
            tasks
                .into_iter()
                .skip(offset)
                .take(filters.limit as usize)
                .collect()
        };

        Ok(TaskPage { tasks: page, total })
    }

    /// Sets the completion flag; deleted tasks may be toggled too
    pub async fn update_task_completion(&self, id: Uuid, completed: bool) -> ServiceResult<Task> {
        let mut task = self.get_task_by_id(id).await?;

        task.set_completed(completed, Utc::now());
        self.tasks.update(&task).await?;

        tracing::debug!(task_id = %id, completed, "Task completion updated");
        Ok(task)
    }

    /// Marks a task deleted, starting its recovery window
    pub async fn soft_delete_task(&self, id: Uuid) -> ServiceResult<Task> {
        let mut task = self.get_task_by_id(id).await?;

        if task.is_deleted() {
            return Err(ServiceError::TaskAlreadyDeleted);
        }

        task.soft_delete(Utc::now());
        self.tasks.update(&task).await?;

        tracing::info!(task_id = %id, user_id = %task.user_id, "Task soft-deleted");
        Ok(task)
    }

    /// Brings a soft-deleted task back, keeping its completion state
    pub async fn restore_task(&self, id: Uuid) -> ServiceResult<Task> {
        let mut task = self.get_task_by_id(id).await?;
        let now = Utc::now();

        if !task.is_deleted() {
            return Err(ServiceError::TaskNotDeleted);
        }

        if task.is_expired(now, self.retention) {
            return Err(ServiceError::RestoreWindowExpired);
        }

        task.restore(now);
        self.tasks.update(&task).await?;

        tracing::info!(task_id = %id, user_id = %task.user_id, "Task restored");
        Ok(task)
    }

    /// Distinct non-empty categories with task counts, sorted by name
    pub async fn get_user_categories(&self, user_id: Uuid) -> ServiceResult<Vec<CategoryCount>> {
        let tasks = self.tasks.list_by_user(user_id).await?;
        Ok(count_categories(&tasks))
    }

    /// Relabels every task in `old_name` as `new_name`
    ///
    /// Returns the number of tasks carrying the category. Renaming to the
    /// same name touches nothing.
    pub async fn rename_category(
        &self,
        user_id: Uuid,
        old_name: &str,
        new_name: &str,
    ) -> ServiceResult<usize> {
        let old_name = old_name.trim();
        if old_name.is_empty() {
            return Err(ServiceError::MissingField("category name"));
        }

        let new_name = normalize_category(new_name)?;
        if new_name.is_empty() {
            return Err(ServiceError::MissingField("new category name"));
        }

        let affected = self.tasks_in_category(user_id, old_name).await?;

        if old_name == new_name {
            return Ok(affected.len());
        }

        let now = Utc::now();
        for mut task in affected.iter().cloned() {
            task.set_category(new_name.clone(), now);
            self.tasks.update(&task).await?;
        }

        tracing::info!(
            user_id = %user_id,
            from = %old_name,
            to = %new_name,
            count = affected.len(),
            "Category renamed"
        );
        Ok(affected.len())
    }

    /// Clears `name` from every task carrying it
    ///
    /// Returns the number of tasks left uncategorized.
    pub async fn delete_category(&self, user_id: Uuid, name: &str) -> ServiceResult<usize> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::MissingField("category name"));
        }

        let affected = self.tasks_in_category(user_id, name).await?;

        let now = Utc::now();
        for mut task in affected.iter().cloned() {
            task.set_category(String::new(), now);
            self.tasks.update(&task).await?;
        }

        tracing::info!(
            user_id = %user_id,
            category = %name,
            count = affected.len(),
            "Category deleted"
        );
        Ok(affected.len())
    }

    /// Purges tasks deleted longer ago than the retention window
    pub async fn cleanup_expired_tasks(&self) -> ServiceResult<usize> {
        self.cleanup_expired_tasks_before(Utc::now() - self.retention)
            .await
    }

    /// Purges tasks whose `deleted_at` is strictly before `cutoff`
    pub async fn cleanup_expired_tasks_before(&self, cutoff: DateTime<Utc>) -> ServiceResult<usize> {
        let candidates = self.tasks.list_deleted_before(cutoff).await?;

        let mut purged = 0;
        for task in candidates {
            // The store index has whole-second scores
            if !matches!(task.deleted_at, Some(deleted_at) if deleted_at < cutoff) {
                continue;
            }

            if self.tasks.delete(&task).await? {
                purged += 1;
                tracing::debug!(task_id = %task.id, user_id = %task.user_id, "Task purged");
            }
        }

        if purged > 0 {
            tracing::info!(count = purged, cutoff = %cutoff, "Expired tasks purged");
        }
        Ok(purged)
    }

    async fn tasks_in_category(&self, user_id: Uuid, name: &str) -> ServiceResult<Vec<Task>> {
        let affected: Vec<Task> = self
            .tasks
            .list_by_user(user_id)
            .await?
            .into_iter()
            .filter(|t| t.has_category(name))
            .collect();

        if affected.is_empty() {
            return Err(ServiceError::CategoryNotFound);
        }
        Ok(affected)
    }
}

fn validate_description(description: &str) -> ServiceResult<String> {
    if is_blank(description) {
        return Err(ServiceError::MissingField("description"));
    }

    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ServiceError::InvalidDescription(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }

    Ok(description.to_string())
}

fn normalize_category(category: &str) -> ServiceResult<String> {
    let trimmed = category.trim();
    if trimmed.chars().count() > MAX_CATEGORY_LENGTH {
        return Err(ServiceError::InvalidCategory(format!(
            "category must be at most {} characters",
            MAX_CATEGORY_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}
