/// Category model
///
/// Categories are not stored. They are derived from a user's non-purged tasks:
/// a category exists exactly while at least one of those tasks carries its label.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::task::Task;

/// A category label with the number of tasks carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Category label
    pub name: String,

    /// Number of the user's tasks with this label
    pub task_count: usize,
}

/// Derives per-category counts from a set of tasks
///
/// Uncategorized tasks are skipped. Output is sorted by name.
pub fn count_categories<'a, I>(tasks: I) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

    for task in tasks {
        if !task.category.is_empty() {
            *counts.entry(task.category.as_str()).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .map(|(name, task_count)| CategoryCount {
            name: name.to_string(),
            task_count,
        })
        .collect()
}
