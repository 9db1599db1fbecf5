//! Core data model: tasks, categories and the to-do list aggregate.
//!
//! `Task::category`, `Task::category_color`, `Task::in_shared_category` and
//! `Task::category_shared_with` are denormalized copies of the owning
//! category. Only the store writes them.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;
const DEFAULT_PRIORITY: u8 = 3;
const DEFAULT_CATEGORY_COLOR: &str = "#5da6d9";

/// A single actionable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub category_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    pub priority: u8,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub shared_with: BTreeSet<String>,
    #[serde(default)]
    pub in_shared_category: bool,
    #[serde(default)]
    pub category_shared_with: BTreeSet<String>,
}

impl Task {
    /// Create an open task with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string().to_lowercase(),
            name: name.into(),
            description: String::new(),
            category: String::new(),
            category_color: String::new(),
            deadline: None,
            priority: DEFAULT_PRIORITY,
            is_completed: false,
            shared_with: BTreeSet::new(),
            in_shared_category: false,
            category_shared_with: BTreeSet::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn shared_with<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared_with = users.into_iter().map(Into::into).collect();
        self
    }

    /// Copy the owning category's display and sharing fields onto the task.
    pub(crate) fn assign_category(&mut self, category: &Category) {
        self.category = category.name.clone();
        self.category_color = category.color.clone();
        self.in_shared_category = category.shared;
        self.category_shared_with = category.shared_with.clone();
    }
}

pub(crate) fn validate_priority(priority: u8) -> Result<()> {
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        return Err(Error::InvalidArgument(format!(
            "priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}, got {priority}"
        )));
    }
    Ok(())
}

/// Which collection of a category a task currently lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSlot {
    Open(usize),
    Completed(usize),
}

/// Named, colored grouping of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub completed_tasks: Vec<Task>,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub shared_with: BTreeSet<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            tasks: Vec::new(),
            completed_tasks: Vec::new(),
            shared: false,
            shared_with: BTreeSet::new(),
        }
    }

    /// A category named `name` with the default color.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_CATEGORY_COLOR)
    }

    pub fn with_shared_with<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_shared_with(users.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the shared-with set, keeping `shared` in step with it.
    pub fn set_shared_with(&mut self, users: BTreeSet<String>) {
        self.shared = !users.is_empty();
        self.shared_with = users;
    }

    /// Push the category's name, color and sharing onto every task it holds.
    pub(crate) fn refresh_task_fields(&mut self) {
        let Category {
            name,
            color,
            tasks,
            completed_tasks,
            shared,
            shared_with,
        } = self;
        for task in tasks.iter_mut().chain(completed_tasks.iter_mut()) {
            task.category = name.clone();
            task.category_color = color.clone();
            task.in_shared_category = *shared;
            task.category_shared_with = shared_with.clone();
        }
    }

    pub fn locate(&self, task_id: &str) -> Option<TaskSlot> {
        if let Some(idx) = self.tasks.iter().position(|task| task.id == task_id) {
            return Some(TaskSlot::Open(idx));
        }
        self.completed_tasks
            .iter()
            .position(|task| task.id == task_id)
            .map(TaskSlot::Completed)
    }

    pub fn task(&self, slot: TaskSlot) -> &Task {
        match slot {
            TaskSlot::Open(idx) => &self.tasks[idx],
            TaskSlot::Completed(idx) => &self.completed_tasks[idx],
        }
    }

    pub fn task_mut(&mut self, slot: TaskSlot) -> &mut Task {
        match slot {
            TaskSlot::Open(idx) => &mut self.tasks[idx],
            TaskSlot::Completed(idx) => &mut self.completed_tasks[idx],
        }
    }

    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().chain(self.completed_tasks.iter())
    }

    pub fn total_tasks(&self) -> usize {
        self.tasks.len() + self.completed_tasks.len()
    }
}

/// The root aggregate: categories in display order, names unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToDoList {
    pub categories: Vec<Category>,
}

impl ToDoList {
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.name == name)
    }

    pub(crate) fn category_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories
            .iter_mut()
            .find(|category| category.name == name)
    }

    pub fn contains_category(&self, name: &str) -> bool {
        self.category(name).is_some()
    }

    /// Find a task anywhere in the list, returning its category index and slot.
    pub fn locate_task(&self, task_id: &str) -> Option<(usize, TaskSlot)> {
        self.categories
            .iter()
            .enumerate()
            .find_map(|(idx, category)| category.locate(task_id).map(|slot| (idx, slot)))
    }

    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.locate_task(task_id)
            .map(|(idx, slot)| self.categories[idx].task(slot))
    }

    pub fn open_tasks(&self) -> impl Iterator<Item = &Task> {
        self.categories.iter().flat_map(|category| category.tasks.iter())
    }

    pub fn open_task_count(&self) -> usize {
        self.categories.iter().map(|category| category.tasks.len()).sum()
    }

    pub fn completed_task_count(&self) -> usize {
        self.categories
            .iter()
            .map(|category| category.completed_tasks.len())
            .sum()
    }

    pub fn category_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|category| category.name.clone())
            .collect()
    }
}

/// One closed day: the date and how many tasks were completed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyHistoryEntry {
    pub date: NaiveDate,
    pub tasks_completed: u32,
}

/// Presentation order for a category's tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    /// Highest priority first
    #[default]
    Priority,
    /// Nearest deadline first, tasks without a deadline last
    Deadline,
    /// Most shared first
    Shared,
}

impl SortOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::Priority => "priority",
            SortOption::Deadline => "deadline",
            SortOption::Shared => "shared",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "priority" => Ok(SortOption::Priority),
            "deadline" => Ok(SortOption::Deadline),
            "shared" => Ok(SortOption::Shared),
            other => Err(Error::InvalidArgument(format!(
                "unknown sort option '{other}' (expected priority|deadline|shared)"
            ))),
        }
    }
}
