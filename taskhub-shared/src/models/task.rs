/// Task model
///
/// Tasks are the unit of user work tracking. Completion and deletion are two
/// independent axes:
///
/// # State Machine
///
/// ```text
///               toggle completion
///   (Active, Present) <──────────> (Completed, Present)
///         │   ▲                          │   ▲
/// soft    │   │ restore          soft    │   │ restore
/// delete  ▼   │                  delete  ▼   │
///   (Active, Deleted) <──────────> (Completed, Deleted)
///         │                              │
///         └──── purge after 7 days ──────┘   (terminal)
/// ```
///
/// Soft delete and restore preserve the completion state.
///
/// # Storage
///
/// ```text
/// task:{id}            HASH  id, user_id, description, category, completed,
///                            created_at, updated_at, deleted_at ("" when null)
/// user:{id}:tasks      SET   ids of the user's non-purged tasks
/// tasks:deleted        ZSET  soft-deleted task ids scored by deleted_at
/// ```
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use taskhub_shared::models::task::{CreateTask, Task};
/// use uuid::Uuid;
///
/// let mut task = Task::new(CreateTask {
///     user_id: Uuid::new_v4(),
///     description: "buy milk".to_string(),
///     category: "errands".to_string(),
/// });
///
/// task.set_completed(true, Utc::now());
/// task.soft_delete(Utc::now());
/// assert!(task.is_deleted());
///
/// task.restore(Utc::now());
/// assert!(!task.is_deleted());
/// assert!(task.completed);
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum description length (characters)
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Maximum category label length (characters)
pub const MAX_CATEGORY_LENGTH: usize = 255;

/// Maximum page size for task listings
pub const MAX_LIST_LIMIT: i64 = 1000;

/// Default soft-delete recovery window (7 days)
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// A user's task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID (UUID v4)
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// What needs doing (1-10000 characters, never blank)
    pub description: String,

    /// Free-text grouping label, empty when uncategorized
    pub category: String,

    /// Completion flag
    pub completed: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last changed
    pub updated_at: DateTime<Utc>,

    /// When the task was soft-deleted (None while present)
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Owning user
    pub user_id: Uuid,

    /// Description, already validated
    pub description: String,

    /// Category label, already normalized
    pub category: String,
}

impl Task {
    /// Builds a fresh task: not completed, not deleted, timestamps set to now
    pub fn new(data: CreateTask) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            description: data.description,
            category: data.category,
            completed: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Returns true while the task is soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns true when the task has been deleted for longer than `retention`
    pub fn is_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        match self.deleted_at {
            Some(deleted_at) => deleted_at < now - retention,
            None => false,
        }
    }

    /// Returns true when the task carries the given category label
    pub fn has_category(&self, name: &str) -> bool {
        !self.category.is_empty() && self.category == name
    }

    /// Sets the completion flag
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        self.completed = completed;
        self.updated_at = now;
    }

    /// Marks the task deleted; completion is untouched
    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    /// Clears the deletion marker; completion is untouched
    pub fn restore(&mut self, now: DateTime<Utc>) {
        self.deleted_at = None;
        self.updated_at = now;
    }

    /// Replaces the category label
    pub fn set_category(&mut self, category: String, now: DateTime<Utc>) {
        self.category = category;
        self.updated_at = now;
    }
}

/// Query filters for listing a user's tasks
///
/// `limit == 0` means "no limit".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskFilters {
    /// Exact category match
    pub category: Option<String>,

    /// Completion state; None matches both
    pub completed: Option<bool>,

    /// Whether soft-deleted tasks are included
    pub include_deleted: bool,

    /// Page size (0-1000, 0 = unlimited)
    pub limit: i64,

    /// Number of matching tasks to skip (>= 0)
    pub offset: i64,
}

impl TaskFilters {
    /// Checks the pagination bounds
    ///
    /// # Example
    ///
    /// ```
    /// use taskhub_shared::models::task::TaskFilters;
    ///
    /// assert!(TaskFilters { limit: 1000, offset: 0, ..Default::default() }.validate().is_ok());
    /// assert!(TaskFilters { limit: 1001, ..Default::default() }.validate().is_err());
    /// assert!(TaskFilters { offset: -1, ..Default::default() }.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), String> {
        if self.limit < 0 {
            return Err("limit must not be negative".to_string());
        }

        if self.limit > MAX_LIST_LIMIT {
            return Err(format!("limit must not exceed {}", MAX_LIST_LIMIT));
        }

        if self.offset < 0 {
            return Err("offset must not be negative".to_string());
        }

        Ok(())
    }

    /// Returns true when the task passes the category/completed/deleted filters
    pub fn matches(&self, task: &Task) -> bool {
        if !self.include_deleted && task.is_deleted() {
            return false;
        }

        if let Some(completed) = self.completed {
            if task.completed != completed {
                return false;
            }
        }

        // Stored labels are trimmed, so the filter is too
        if let Some(ref category) = self.category {
            if task.category != category.trim() {
                return false;
            }
        }

        true
    }
}

/// One page of a task listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    /// Tasks on this page
    pub tasks: Vec<Task>,

    /// Number of tasks matching the filters before pagination
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Task {
        Task::new(CreateTask {
            user_id: Uuid::new_v4(),
            description: "write report".to_string(),
            category: "work".to_string(),
        })
    }

    #[test]
    fn test_new_task_defaults() {
        let task = sample();
        assert!(!task.completed);
        assert!(task.deleted_at.is_none());
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn test_soft_delete_preserves_completion() {
        let mut task = sample();
        let now = Utc::now();
        task.set_completed(true, now);
        task.soft_delete(now + Duration::seconds(1));

        assert!(task.completed);
        assert_eq!(task.deleted_at, Some(now + Duration::seconds(1)));
        assert_eq!(task.updated_at, now + Duration::seconds(1));
    }

    #[test]
    fn test_is_expired() {
        let mut task = sample();
        let now = Utc::now();
        assert!(!task.is_expired(now, Duration::days(7)));

        task.soft_delete(now - Duration::days(8));
        assert!(task.is_expired(now, Duration::days(7)));

        task.soft_delete(now - Duration::days(6));
        assert!(!task.is_expired(now, Duration::days(7)));
    }

    #[test]
    fn test_filters_exclude_deleted_by_default() {
        let mut task = sample();
        task.soft_delete(Utc::now());

        assert!(!TaskFilters::default().matches(&task));
        assert!(TaskFilters {
            include_deleted: true,
            ..Default::default()
        }
        .matches(&task));
    }

    #[test]
    fn test_filters_completed_and_category() {
        let task = sample();

        let only_done = TaskFilters {
            completed: Some(true),
            ..Default::default()
        };
        assert!(!only_done.matches(&task));

        let work = TaskFilters {
            category: Some("work".to_string()),
            ..Default::default()
        };
        assert!(work.matches(&task));

        let home = TaskFilters {
            category: Some("home".to_string()),
            ..Default::default()
        };
        assert!(!home.matches(&task));
    }

    #[test]
    fn test_filters_trim_category() {
        let padded = TaskFilters {
            category: Some("  work ".to_string()),
            ..Default::default()
        };
        assert!(padded.matches(&sample()));
    }

    #[test]
    fn test_filter_validation_bounds() {
        assert!(TaskFilters {
            limit: 1001,
            ..Default::default()
        }
        .validate()
        .is_err());
        assert!(TaskFilters {
            offset: -1,
            ..Default::default()
        }
        .validate()
        .is_err());
        assert!(TaskFilters {
            limit: 1000,
            offset: 0,
            ..Default::default()
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn test_task_wire_format() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("deletedAt").is_some());
        assert!(json["deletedAt"].is_null());
    }
}
