//! Search and filter state for the task list

use std::fmt;
use std::str::FromStr;

use super::model::{Task, TaskPriority, TaskStatus};
use crate::Error;

/// Priority filter: everything, or one priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityFilter {
    #[default]
    All,
    Is(TaskPriority),
}

impl PriorityFilter {
    pub fn matches(self, priority: TaskPriority) -> bool {
        match self {
            Self::All => true,
            Self::Is(wanted) => wanted == priority,
        }
    }
}

impl FromStr for PriorityFilter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        value.parse().map(Self::Is)
    }
}

impl fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Is(priority) => write!(f, "{}", priority),
        }
    }
}

/// Status filter: everything, tasks without a status, or one status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    /// Only tasks whose status is absent (`NONE`)
    Unset,
    Is(TaskStatus),
}

impl StatusFilter {
    pub fn matches(self, status: Option<TaskStatus>) -> bool {
        match (self, status) {
            (Self::All, _) => true,
            (Self::Unset, None) => true,
            (Self::Unset, Some(_)) => false,
            (Self::Is(wanted), Some(actual)) => wanted == actual,
            (Self::Is(_), None) => false,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else if trimmed.eq_ignore_ascii_case("none") {
            Ok(Self::Unset)
        } else {
            trimmed.parse().map(Self::Is)
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Unset => f.write_str("NONE"),
            Self::Is(status) => write!(f, "{}", status),
        }
    }
}

/// Ephemeral filter state; never persisted or sent to the server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub search: String,
    pub priority: PriorityFilter,
    pub status: StatusFilter,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_priority(mut self, priority: PriorityFilter) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        matches_search(task, &self.search.to_lowercase())
            && self.priority.matches(task.priority)
            && self.status.matches(task.status)
    }

    /// Tasks passing the filter, in collection order
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        filtered_view(tasks, self)
    }
}

fn matches_search(task: &Task, needle: &str) -> bool {
    needle.is_empty()
        || task.title.to_lowercase().contains(needle)
        || task.description.to_lowercase().contains(needle)
}

/// Subsequence of `tasks` matching `filter`. Order is preserved; nothing is sorted.
pub fn filtered_view<'a>(tasks: &'a [Task], filter: &TaskFilter) -> Vec<&'a Task> {
    let needle = filter.search.to_lowercase();
    tasks
        .iter()
        .filter(|task| {
            matches_search(task, &needle)
                && filter.priority.matches(task.priority)
                && filter.status.matches(task.status)
        })
        .collect()
}
