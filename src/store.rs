//! Task and category store.
//!
//! The store is the single owner of the to-do list and its derived read
//! models: the daily task subset, the daily history and the per-date
//! completion counts. Every mutation takes the state lock for its whole
//! duration, including the await on share acknowledgment, so operations
//! never interleave and a failed operation leaves the state untouched.
//! Readers get owned snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::Settings;
use crate::daily::{daily_task_subset, sort_tasks, DailyTasks};
use crate::error::{Error, Result};
use crate::events::{event_bus, EventRx, EventTx, StoreEvent};
use crate::model::{
    validate_priority, Category, DailyHistoryEntry, SortOption, Task, TaskSlot, ToDoList,
};
use crate::notify::Notifier;
use crate::share::{Acknowledger, ShareNotice, ShareOutcome};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// New name, color and sharing for an existing category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub name: String,
    pub color: String,
    pub shared_with: BTreeSet<String>,
}

impl CategoryUpdate {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            shared_with: BTreeSet::new(),
        }
    }

    pub fn shared_with<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared_with = users.into_iter().map(Into::into).collect();
        self
    }
}

/// Result of advancing the simulated date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rollover {
    /// Day that was closed
    pub closed: NaiveDate,
    /// New current day
    pub date: NaiveDate,
    /// Completions recorded for the closed day
    pub tasks_completed: u32,
    /// Daily subset for the new day
    pub daily_tasks: DailyTasks,
}

/// Owned copy of everything the store exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSnapshot {
    pub list: ToDoList,
    pub daily_tasks: DailyTasks,
    pub daily_history: Vec<DailyHistoryEntry>,
    pub daily_task_completions: BTreeMap<NaiveDate, u32>,
    pub current_date: NaiveDate,
    pub has_generated: bool,
}

#[derive(Debug)]
struct StoreState {
    list: ToDoList,
    /// Task ids of the daily subset, per category name
    daily_task_ids: BTreeMap<String, Vec<String>>,
    daily_history: Vec<DailyHistoryEntry>,
    daily_task_completions: BTreeMap<NaiveDate, u32>,
    current_date: NaiveDate,
    has_generated: bool,
    sort_options: BTreeMap<String, SortOption>,
}

impl StoreState {
    fn new(current_date: NaiveDate) -> Self {
        Self {
            list: ToDoList::default(),
            daily_task_ids: BTreeMap::new(),
            daily_history: Vec::new(),
            daily_task_completions: BTreeMap::new(),
            current_date,
            has_generated: false,
            sort_options: BTreeMap::new(),
        }
    }

    /// Resolve the stored daily ids against the current list.
    fn daily_tasks(&self) -> DailyTasks {
        self.daily_task_ids
            .iter()
            .map(|(name, ids)| {
                let tasks = match self.list.category(name) {
                    Some(category) => ids
                        .iter()
                        .filter_map(|id| category.locate(id).map(|slot| category.task(slot).clone()))
                        .collect(),
                    None => Vec::new(),
                };
                (name.clone(), tasks)
            })
            .collect()
    }

    fn remove_task(&mut self, task_id: &str) -> Option<Task> {
        let (idx, slot) = self.list.locate_task(task_id)?;
        let category = &mut self.list.categories[idx];
        let removed = match slot {
            TaskSlot::Open(pos) => category.tasks.remove(pos),
            TaskSlot::Completed(pos) => category.completed_tasks.remove(pos),
        };
        if let Some(ids) = self.daily_task_ids.get_mut(&category.name) {
            ids.retain(|id| id != task_id);
        }
        Some(removed)
    }

    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            list: self.list.clone(),
            daily_tasks: self.daily_tasks(),
            daily_history: self.daily_history.clone(),
            daily_task_completions: self.daily_task_completions.clone(),
            current_date: self.current_date,
            has_generated: self.has_generated,
        }
    }
}

/// Single source of truth for categories and tasks.
pub struct TodoStore {
    state: Mutex<StoreState>,
    acknowledger: Arc<dyn Acknowledger>,
    notifier: Arc<dyn Notifier>,
    notifications_enabled: AtomicBool,
    events: EventTx,
}

impl TodoStore {
    pub fn new(acknowledger: Arc<dyn Acknowledger>, notifier: Arc<dyn Notifier>) -> Self {
        let (events, _) = event_bus();
        Self {
            state: Mutex::new(StoreState::new(today())),
            acknowledger,
            notifier,
            notifications_enabled: AtomicBool::new(true),
            events,
        }
    }

    /// Start the simulated calendar at `date` instead of today.
    pub fn starting_on(mut self, date: NaiveDate) -> Self {
        self.state.get_mut().current_date = date;
        self
    }

    pub fn subscribe(&self) -> EventRx {
        self.events.subscribe()
    }

    pub fn set_notifications_enabled(&self, enabled: bool) {
        self.notifications_enabled.store(enabled, Ordering::Relaxed);
    }

    pub async fn add_category(&self, category: Category) -> Result<()> {
        let mut state = self.state.lock().await;
        validate_category_name(&category.name)?;
        if state.list.contains_category(&category.name) {
            return Err(Error::DuplicateName(category.name));
        }

        let mut category = Category {
            tasks: Vec::new(),
            completed_tasks: Vec::new(),
            ..category
        };
        let shared_with = std::mem::take(&mut category.shared_with);
        category.set_shared_with(shared_with);

        let name = category.name.clone();
        state.list.categories.push(category);
        drop(state);

        debug!(category = %name, "category added");
        self.emit(StoreEvent::CategoryAdded { name });
        Ok(())
    }

    /// Add an open task to `category_name`.
    ///
    /// Users in `task.shared_with` are proposed through the acknowledgment
    /// protocol first; only those who accept are stored.
    pub async fn add_task(&self, task: Task, category_name: &str) -> Result<Task> {
        let mut state = self.state.lock().await;
        validate_task_fields(&task)?;
        if !state.list.contains_category(category_name) {
            return Err(Error::CategoryNotFound(category_name.to_string()));
        }
        if state.list.locate_task(&task.id).is_some() {
            return Err(Error::InvalidArgument(format!(
                "task id already exists: {}",
                task.id
            )));
        }

        let outcome = self.resolve_shares(&task.name, &task.shared_with).await;

        let category = state
            .list
            .category_mut(category_name)
            .ok_or_else(|| Error::CategoryNotFound(category_name.to_string()))?;
        let mut task = Task {
            is_completed: false,
            shared_with: outcome.accepted.clone(),
            ..task
        };
        task.assign_category(category);
        category.tasks.push(task.clone());
        drop(state);

        debug!(task_id = %task.id, category = category_name, "task added");
        self.emit(StoreEvent::TaskAdded {
            task_id: task.id.clone(),
            category: category_name.to_string(),
        });
        self.deliver(&outcome.notices(&task.name));
        Ok(task)
    }

    /// Remove a task from wherever it lives. Unknown ids are a no-op.
    pub async fn delete_task(&self, task_id: &str) -> bool {
        let mut state = self.state.lock().await;
        let removed = state.remove_task(task_id).is_some();
        drop(state);

        if removed {
            debug!(task_id, "task deleted");
            self.emit(StoreEvent::TaskDeleted {
                task_id: task_id.to_string(),
            });
        }
        removed
    }

    /// Delete a category together with all of its tasks.
    pub async fn delete_category(&self, name: &str) -> Result<usize> {
        let mut state = self.state.lock().await;
        let Some(category) = state.list.category(name) else {
            return Err(Error::CategoryNotFound(name.to_string()));
        };

        let task_ids: Vec<String> = category.all_tasks().map(|task| task.id.clone()).collect();
        for task_id in &task_ids {
            state.remove_task(task_id);
        }
        state.list.categories.retain(|category| category.name != name);
        state.daily_task_ids.remove(name);
        state.sort_options.remove(name);
        drop(state);

        debug!(category = name, removed = task_ids.len(), "category deleted");
        for task_id in &task_ids {
            self.emit(StoreEvent::TaskDeleted {
                task_id: task_id.clone(),
            });
        }
        self.emit(StoreEvent::CategoryDeleted {
            name: name.to_string(),
            removed_tasks: task_ids.len(),
        });
        Ok(task_ids.len())
    }

    /// Rename, recolor or reshare a category and propagate to its tasks.
    pub async fn update_category(&self, old_name: &str, update: CategoryUpdate) -> Result<()> {
        let mut state = self.state.lock().await;
        validate_category_name(&update.name)?;
        if !state.list.contains_category(old_name) {
            return Err(Error::CategoryNotFound(old_name.to_string()));
        }
        if update.name != old_name && state.list.contains_category(&update.name) {
            return Err(Error::DuplicateName(update.name));
        }

        let category = state
            .list
            .category_mut(old_name)
            .ok_or_else(|| Error::CategoryNotFound(old_name.to_string()))?;
        category.name = update.name.clone();
        category.color = update.color;
        category.set_shared_with(update.shared_with);
        category.refresh_task_fields();

        if update.name != old_name {
            if let Some(ids) = state.daily_task_ids.remove(old_name) {
                state.daily_task_ids.insert(update.name.clone(), ids);
            }
            if let Some(option) = state.sort_options.remove(old_name) {
                state.sort_options.insert(update.name.clone(), option);
            }
        }
        drop(state);

        debug!(old_name, name = %update.name, "category updated");
        self.emit(StoreEvent::CategoryUpdated {
            old_name: old_name.to_string(),
            name: update.name,
        });
        Ok(())
    }

    /// Overwrite a task's editable fields.
    ///
    /// Newly added `shared_with` users go through acknowledgment; removed
    /// users are dropped at once and notified. Category fields, completion
    /// state and id stay under store control.
    pub async fn update_task(&self, updated: Task) -> Result<Task> {
        let mut state = self.state.lock().await;
        let Some((idx, slot)) = state.list.locate_task(&updated.id) else {
            return Err(Error::TaskNotFound(updated.id));
        };
        validate_task_fields(&updated)?;

        let stored = state.list.categories[idx].task(slot).clone();
        let added: BTreeSet<String> = updated
            .shared_with
            .difference(&stored.shared_with)
            .cloned()
            .collect();
        let removed: BTreeSet<String> = stored
            .shared_with
            .difference(&updated.shared_with)
            .cloned()
            .collect();

        let outcome = self.resolve_shares(&updated.name, &added).await;

        let task = state.list.categories[idx].task_mut(slot);
        task.name = updated.name;
        task.description = updated.description;
        task.deadline = updated.deadline;
        task.priority = updated.priority;
        task.shared_with = stored
            .shared_with
            .difference(&removed)
            .cloned()
            .chain(outcome.accepted.iter().cloned())
            .collect();
        let task = task.clone();
        drop(state);

        debug!(task_id = %task.id, "task updated");
        self.emit(StoreEvent::TaskUpdated {
            task_id: task.id.clone(),
        });
        let mut notices = outcome.notices(&task.name);
        notices.extend(removed.into_iter().map(|user| ShareNotice::Removed {
            user,
            task: task.name.clone(),
        }));
        self.deliver(&notices);
        Ok(task)
    }

    /// Move a task between open and completed within `category_name` and
    /// adjust today's completion count.
    pub async fn toggle_complete(&self, task_id: &str, category_name: &str) -> Result<Task> {
        let mut state = self.state.lock().await;
        let current_date = state.current_date;
        let category = state
            .list
            .category_mut(category_name)
            .ok_or_else(|| Error::CategoryNotFound(category_name.to_string()))?;
        let slot = category
            .locate(task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;

        let task = match slot {
            TaskSlot::Open(pos) => {
                let mut task = category.tasks.remove(pos);
                task.is_completed = true;
                category.completed_tasks.push(task.clone());
                task
            }
            TaskSlot::Completed(pos) => {
                let mut task = category.completed_tasks.remove(pos);
                task.is_completed = false;
                category.tasks.push(task.clone());
                task
            }
        };

        let count = state
            .daily_task_completions
            .entry(current_date)
            .or_insert(0);
        if task.is_completed {
            *count += 1;
        } else {
            *count = count.saturating_sub(1);
        }
        drop(state);

        debug!(task_id, completed = task.is_completed, "task toggled");
        self.emit(StoreEvent::TaskToggled {
            task_id: task_id.to_string(),
            completed: task.is_completed,
        });
        Ok(task)
    }

    /// Drop every completed task; open tasks are untouched.
    pub async fn clear_completed_tasks(&self) -> usize {
        let mut state = self.state.lock().await;
        let mut removed = 0;
        for category in &mut state.list.categories {
            removed += category.completed_tasks.len();
            category.completed_tasks.clear();
        }
        drop(state);

        self.emit(StoreEvent::CompletedCleared {
            removed_tasks: removed,
        });
        removed
    }

    /// Close the current day and start the next one.
    ///
    /// Today's completion count becomes final and is appended to the daily
    /// history, the date advances by one day and the daily subset is
    /// recomputed from `settings`. Streak evaluation is left to the caller.
    pub async fn reset_tasks_for_new_day(&self, settings: &Settings) -> Result<Rollover> {
        let mut state = self.state.lock().await;
        let closed = state.current_date;
        let next = closed
            .checked_add_days(Days::new(1))
            .ok_or_else(|| Error::InvalidArgument(format!("cannot advance past {closed}")))?;

        let tasks_completed = state
            .daily_task_completions
            .get(&closed)
            .copied()
            .unwrap_or(0);
        state.daily_task_completions.insert(closed, tasks_completed);
        state.daily_task_completions.insert(next, 0);
        state.daily_history.push(DailyHistoryEntry {
            date: closed,
            tasks_completed,
        });
        state.current_date = next;

        let daily = daily_task_subset(&state.list, settings);
        state.daily_task_ids = daily
            .iter()
            .map(|(name, tasks)| {
                (
                    name.clone(),
                    tasks.iter().map(|task| task.id.clone()).collect(),
                )
            })
            .collect();
        drop(state);

        info!(
            closed = %closed,
            date = %next,
            tasks_completed,
            "rolled over to new day"
        );
        self.emit(StoreEvent::DayRolledOver {
            closed,
            date: next,
            tasks_completed,
        });
        Ok(Rollover {
            closed,
            date: next,
            tasks_completed,
            daily_tasks: daily,
        })
    }

    /// Wipe all state and restart the calendar at today.
    pub async fn delete_all(&self) {
        let mut state = self.state.lock().await;
        *state = StoreState::new(today());
        drop(state);

        info!("store cleared");
        self.emit(StoreEvent::Cleared);
    }

    pub async fn update_category_sort_option(&self, name: &str, option: SortOption) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.list.contains_category(name) {
            return Err(Error::CategoryNotFound(name.to_string()));
        }
        state.sort_options.insert(name.to_string(), option);
        drop(state);

        self.emit(StoreEvent::SortOptionChanged {
            category: name.to_string(),
        });
        Ok(())
    }

    pub async fn category_sort_option(&self, name: &str) -> SortOption {
        let state = self.state.lock().await;
        state.sort_options.get(name).copied().unwrap_or_default()
    }

    /// Open tasks of a category in its chosen display order.
    pub async fn sorted_tasks(&self, name: &str) -> Result<Vec<Task>> {
        let state = self.state.lock().await;
        let category = state
            .list
            .category(name)
            .ok_or_else(|| Error::CategoryNotFound(name.to_string()))?;
        let mut tasks = category.tasks.clone();
        sort_tasks(
            &mut tasks,
            state.sort_options.get(name).copied().unwrap_or_default(),
        );
        Ok(tasks)
    }

    /// Set the generated-data flag. Returns false if it was already set.
    pub async fn mark_generated(&self) -> bool {
        let mut state = self.state.lock().await;
        !std::mem::replace(&mut state.has_generated, true)
    }

    pub async fn snapshot(&self) -> ToDoList {
        self.state.lock().await.list.clone()
    }

    pub async fn snapshot_all(&self) -> StoreSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn daily_tasks(&self) -> DailyTasks {
        self.state.lock().await.daily_tasks()
    }

    pub async fn daily_history(&self) -> Vec<DailyHistoryEntry> {
        self.state.lock().await.daily_history.clone()
    }

    pub async fn daily_task_completions(&self) -> BTreeMap<NaiveDate, u32> {
        self.state.lock().await.daily_task_completions.clone()
    }

    pub async fn current_date(&self) -> NaiveDate {
        self.state.lock().await.current_date
    }

    pub async fn has_generated(&self) -> bool {
        self.state.lock().await.has_generated
    }

    /// True when no category holds an open or completed task.
    pub async fn is_empty(&self) -> bool {
        let state = self.state.lock().await;
        state
            .list
            .categories
            .iter()
            .all(|category| category.total_tasks() == 0)
    }

    pub async fn find_task(&self, task_id: &str) -> Option<Task> {
        self.state.lock().await.list.find_task(task_id).cloned()
    }

    async fn resolve_shares(&self, task_name: &str, users: &BTreeSet<String>) -> ShareOutcome {
        if users.is_empty() {
            return ShareOutcome::default();
        }
        self.acknowledger.resolve(task_name, users).await
    }

    fn deliver(&self, notices: &[ShareNotice]) {
        if !self.notifications_enabled.load(Ordering::Relaxed) {
            debug!(count = notices.len(), "notifications disabled, skipping");
            return;
        }
        for notice in notices {
            self.notifier.notify(notice.title(), &notice.body());
        }
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn validate_category_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidArgument(
            "category name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_fields(task: &Task) -> Result<()> {
    if task.name.trim().is_empty() {
        return Err(Error::InvalidArgument("task name cannot be empty".to_string()));
    }
    validate_priority(task.priority)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemoryNotifier;
    use crate::share::{FixedAcceptance, ScriptedAcceptance, SimulatedAcknowledger};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 11).expect("date")
    }

    fn store_with(acceptance: impl crate::share::AcceptanceSource + 'static) -> (TodoStore, Arc<MemoryNotifier>) {
        let notifier = Arc::new(MemoryNotifier::new());
        let store = TodoStore::new(
            Arc::new(SimulatedAcknowledger::new(acceptance)),
            notifier.clone(),
        )
        .starting_on(start());
        (store, notifier)
    }

    fn store() -> TodoStore {
        store_with(FixedAcceptance(true)).0
    }

    #[tokio::test]
    async fn add_category_rejects_duplicates() {
        let store = store();
        store.add_category(Category::named("Work")).await.expect("add");
        let err = store
            .add_category(Category::named("Work"))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, Error::DuplicateName(name) if name == "Work"));
        assert_eq!(store.snapshot().await.categories.len(), 1);
    }

    #[tokio::test]
    async fn add_category_starts_empty_and_derives_shared() {
        let store = store();
        let mut category = Category::named("Home");
        category.tasks.push(Task::new("stray"));
        category.shared_with = ["Anna".to_string()].into_iter().collect();
        category.shared = false;
        store.add_category(category).await.expect("add");

        let list = store.snapshot().await;
        assert!(list.categories[0].tasks.is_empty());
        assert!(list.categories[0].shared);
    }

    #[tokio::test]
    async fn add_task_copies_category_fields() {
        let store = store();
        store
            .add_category(Category::new("Home", "#ff0000").with_shared_with(["Anna"]))
            .await
            .expect("category");
        let mut task = Task::new("Dishes");
        task.is_completed = true;
        let stored = store.add_task(task, "Home").await.expect("task");

        assert!(!stored.is_completed);
        assert_eq!(stored.category, "Home");
        assert_eq!(stored.category_color, "#ff0000");
        assert!(stored.in_shared_category);
        assert!(stored.category_shared_with.contains("Anna"));
    }

    #[tokio::test]
    async fn add_task_keeps_only_accepting_users() {
        let (store, notifier) = store_with(ScriptedAcceptance::accepting(["Anna"]));
        store.add_category(Category::named("Home")).await.expect("category");
        let stored = store
            .add_task(Task::new("Laundry").shared_with(["Anna", "Ben"]), "Home")
            .await
            .expect("task");

        assert_eq!(stored.shared_with.len(), 1);
        assert!(stored.shared_with.contains("Anna"));
        let delivered = notifier.delivered();
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[1].body, "Ben rejected the task \"Laundry\".");
    }

    #[tokio::test]
    async fn add_task_requires_category() {
        let store = store();
        let err = store
            .add_task(Task::new("Orphan"), "Nowhere")
            .await
            .expect_err("missing");
        assert!(matches!(err, Error::CategoryNotFound(_)));
    }

    #[tokio::test]
    async fn add_task_rejects_bad_priority_and_duplicate_ids() {
        let store = store();
        store.add_category(Category::named("Work")).await.expect("category");
        let err = store
            .add_task(Task::new("Bad").with_priority(9), "Work")
            .await
            .expect_err("priority");
        assert!(matches!(err, Error::InvalidArgument(_)));

        let task = store.add_task(Task::new("Once"), "Work").await.expect("task");
        let err = store.add_task(task, "Work").await.expect_err("duplicate id");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn delete_task_is_idempotent() {
        let store = store();
        store.add_category(Category::named("Work")).await.expect("category");
        let task = store.add_task(Task::new("Report"), "Work").await.expect("task");

        assert!(store.delete_task(&task.id).await);
        assert!(!store.delete_task(&task.id).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn delete_category_removes_open_and_completed_tasks() {
        let store = store();
        store.add_category(Category::named("Work")).await.expect("category");
        let open = store.add_task(Task::new("open"), "Work").await.expect("task");
        let done = store.add_task(Task::new("done"), "Work").await.expect("task");
        store.toggle_complete(&done.id, "Work").await.expect("toggle");

        let removed = store.delete_category("Work").await.expect("delete");
        assert_eq!(removed, 2);
        assert!(store.find_task(&open.id).await.is_none());
        assert!(store.snapshot().await.categories.is_empty());

        let err = store.delete_category("Work").await.expect_err("gone");
        assert!(matches!(err, Error::CategoryNotFound(_)));
    }

    #[tokio::test]
    async fn update_category_propagates_to_tasks() {
        let store = store();
        store.add_category(Category::named("Work")).await.expect("category");
        let open = store.add_task(Task::new("open"), "Work").await.expect("task");
        let done = store.add_task(Task::new("done"), "Work").await.expect("task");
        store.toggle_complete(&done.id, "Work").await.expect("toggle");

        store
            .update_category(
                "Work",
                CategoryUpdate::new("Office", "#000000").shared_with(["Ben"]),
            )
            .await
            .expect("update");

        for id in [&open.id, &done.id] {
            let task = store.find_task(id).await.expect("task");
            assert_eq!(task.category, "Office");
            assert_eq!(task.category_color, "#000000");
            assert!(task.in_shared_category);
            assert!(task.category_shared_with.contains("Ben"));
        }
        let list = store.snapshot().await;
        assert!(list.categories[0].shared);
    }

    #[tokio::test]
    async fn update_category_collision_changes_nothing() {
        let store = store();
        store.add_category(Category::named("Work")).await.expect("category");
        store.add_category(Category::named("Home")).await.expect("category");
        let task = store.add_task(Task::new("Report"), "Work").await.expect("task");
        let before = store.snapshot().await;

        let err = store
            .update_category("Work", CategoryUpdate::new("Home", "#111111"))
            .await
            .expect_err("collision");
        assert!(matches!(err, Error::DuplicateName(_)));
        assert_eq!(store.snapshot().await, before);
        assert_eq!(store.find_task(&task.id).await.expect("task").category, "Work");
    }

    #[tokio::test]
    async fn update_category_clearing_shares_unsets_shared() {
        let store = store();
        store
            .add_category(Category::named("Home").with_shared_with(["Anna"]))
            .await
            .expect("category");
        store
            .update_category("Home", CategoryUpdate::new("Home", "#5da6d9"))
            .await
            .expect("update");
        let list = store.snapshot().await;
        assert!(!list.categories[0].shared);
        assert!(list.categories[0].shared_with.is_empty());
    }

    #[tokio::test]
    async fn update_task_diffs_shared_users() {
        let (store, notifier) = store_with(ScriptedAcceptance::accepting(["Anna", "Cleo"]));
        store.add_category(Category::named("Home")).await.expect("category");
        let task = store
            .add_task(Task::new("Cook").shared_with(["Anna"]), "Home")
            .await
            .expect("task");
        notifier.clear();

        let mut edited = task.clone().shared_with(["Cleo", "Dana"]);
        edited.name = "Cook dinner".to_string();
        edited.priority = 5;
        let updated = store.update_task(edited).await.expect("update");

        assert_eq!(updated.name, "Cook dinner");
        assert_eq!(updated.priority, 5);
        let users: Vec<&str> = updated.shared_with.iter().map(String::as_str).collect();
        assert_eq!(users, vec!["Cleo"]);

        let titles: Vec<String> = notifier
            .delivered()
            .into_iter()
            .map(|notification| notification.title)
            .collect();
        assert_eq!(
            titles,
            vec!["Task Sharing Accepted", "Task Sharing Rejected", "Task Unshared"]
        );
    }

    #[tokio::test]
    async fn update_task_ignores_store_owned_fields() {
        let store = store();
        store.add_category(Category::named("Work")).await.expect("category");
        let task = store.add_task(Task::new("Report"), "Work").await.expect("task");

        let mut edited = task.clone();
        edited.category = "Elsewhere".to_string();
        edited.is_completed = true;
        let updated = store.update_task(edited).await.expect("update");
        assert_eq!(updated.category, "Work");
        assert!(!updated.is_completed);
    }

    #[tokio::test]
    async fn update_unknown_task_fails() {
        let store = store();
        let err = store
            .update_task(Task::new("ghost"))
            .await
            .expect_err("missing");
        assert!(matches!(err, Error::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn toggle_complete_round_trips_and_counts() {
        let store = store();
        store.add_category(Category::named("Work")).await.expect("category");
        let task = store.add_task(Task::new("Report"), "Work").await.expect("task");

        let done = store.toggle_complete(&task.id, "Work").await.expect("toggle");
        assert!(done.is_completed);
        let list = store.snapshot().await;
        assert!(list.categories[0].tasks.is_empty());
        assert_eq!(list.categories[0].completed_tasks.len(), 1);
        assert_eq!(store.daily_task_completions().await[&start()], 1);

        let reopened = store.toggle_complete(&task.id, "Work").await.expect("toggle");
        assert!(!reopened.is_completed);
        let list = store.snapshot().await;
        assert_eq!(list.categories[0].tasks.len(), 1);
        assert!(list.categories[0].completed_tasks.is_empty());
        assert_eq!(store.daily_task_completions().await[&start()], 0);
    }

    #[tokio::test]
    async fn uncompleting_never_goes_negative() {
        let store = store();
        store.add_category(Category::named("Work")).await.expect("category");
        let task = store.add_task(Task::new("Report"), "Work").await.expect("task");
        store.toggle_complete(&task.id, "Work").await.expect("toggle");
        store
            .reset_tasks_for_new_day(&Settings::default())
            .await
            .expect("rollover");

        store.toggle_complete(&task.id, "Work").await.expect("toggle");
        let next = start().succ_opt().expect("date");
        assert_eq!(store.daily_task_completions().await[&next], 0);
    }

    #[tokio::test]
    async fn toggle_reports_missing_category_and_task() {
        let store = store();
        store.add_category(Category::named("Work")).await.expect("category");
        let task = store.add_task(Task::new("Report"), "Work").await.expect("task");

        let err = store
            .toggle_complete(&task.id, "Home")
            .await
            .expect_err("category");
        assert!(matches!(err, Error::CategoryNotFound(_)));
        let err = store
            .toggle_complete("missing", "Work")
            .await
            .expect_err("task");
        assert!(matches!(err, Error::TaskNotFound(_)));
        assert!(store.daily_task_completions().await.is_empty());
    }

    #[tokio::test]
    async fn clear_completed_keeps_open_tasks() {
        let store = store();
        store.add_category(Category::named("Work")).await.expect("category");
        store.add_task(Task::new("open"), "Work").await.expect("task");
        let done = store.add_task(Task::new("done"), "Work").await.expect("task");
        store.toggle_complete(&done.id, "Work").await.expect("toggle");

        assert_eq!(store.clear_completed_tasks().await, 1);
        let list = store.snapshot().await;
        assert_eq!(list.categories[0].tasks.len(), 1);
        assert!(list.categories[0].completed_tasks.is_empty());
    }

    #[tokio::test]
    async fn rollover_records_history_and_daily_subset() {
        let store = store();
        store.add_category(Category::named("Work")).await.expect("category");
        let first = store.add_task(Task::new("one"), "Work").await.expect("task");
        store.add_task(Task::new("two"), "Work").await.expect("task");
        store.add_task(Task::new("three"), "Work").await.expect("task");
        store.toggle_complete(&first.id, "Work").await.expect("toggle");

        let settings = Settings {
            category_limits: [("Work".to_string(), 1)].into_iter().collect(),
            ..Settings::default()
        };
        let rollover = store.reset_tasks_for_new_day(&settings).await.expect("rollover");

        assert_eq!(rollover.closed, start());
        assert_eq!(rollover.date, start().succ_opt().expect("date"));
        assert_eq!(rollover.tasks_completed, 1);
        assert_eq!(rollover.daily_tasks["Work"].len(), 1);
        assert_eq!(rollover.daily_tasks["Work"][0].name, "two");
        assert_eq!(store.current_date().await, rollover.date);
        assert_eq!(store.daily_task_completions().await[&rollover.date], 0);
        assert_eq!(
            store.daily_history().await,
            vec![DailyHistoryEntry {
                date: start(),
                tasks_completed: 1
            }]
        );
    }

    #[tokio::test]
    async fn daily_tasks_follow_deletes_and_renames() {
        let store = store();
        store.add_category(Category::named("Work")).await.expect("category");
        let first = store.add_task(Task::new("one"), "Work").await.expect("task");
        store.add_task(Task::new("two"), "Work").await.expect("task");
        let settings = Settings {
            category_limits: [("Work".to_string(), 2)].into_iter().collect(),
            ..Settings::default()
        };
        store.reset_tasks_for_new_day(&settings).await.expect("rollover");

        store.delete_task(&first.id).await;
        store
            .update_category("Work", CategoryUpdate::new("Office", "#123456"))
            .await
            .expect("rename");

        let daily = store.daily_tasks().await;
        assert!(!daily.contains_key("Work"));
        assert_eq!(daily["Office"].len(), 1);
        assert_eq!(daily["Office"][0].category, "Office");
    }

    #[tokio::test]
    async fn delete_all_resets_everything() {
        let store = store();
        let mut events = store.subscribe();
        store.add_category(Category::named("Work")).await.expect("category");
        assert!(store.mark_generated().await);
        store
            .reset_tasks_for_new_day(&Settings::default())
            .await
            .expect("rollover");

        store.delete_all().await;
        let snapshot = store.snapshot_all().await;
        assert!(snapshot.list.categories.is_empty());
        assert!(snapshot.daily_tasks.is_empty());
        assert!(snapshot.daily_history.is_empty());
        assert!(snapshot.daily_task_completions.is_empty());
        assert!(!snapshot.has_generated);
        assert_eq!(snapshot.current_date, Local::now().date_naive());

        let mut last = None;
        while let Ok(event) = events.try_recv() {
            last = Some(event);
        }
        assert_eq!(last, Some(StoreEvent::Cleared));
    }

    #[tokio::test]
    async fn disabled_notifications_are_not_delivered() {
        let (store, notifier) = store_with(FixedAcceptance(false));
        store.set_notifications_enabled(false);
        store.add_category(Category::named("Home")).await.expect("category");
        let task = store
            .add_task(Task::new("Vacuum").shared_with(["Anna"]), "Home")
            .await
            .expect("task");
        assert!(task.shared_with.is_empty());
        assert!(notifier.is_empty());
    }

    #[tokio::test]
    async fn sort_options_follow_category() {
        let store = store();
        store.add_category(Category::named("Work")).await.expect("category");
        store.add_task(Task::new("low").with_priority(1), "Work").await.expect("task");
        store.add_task(Task::new("high").with_priority(5), "Work").await.expect("task");

        assert_eq!(store.category_sort_option("Work").await, SortOption::Priority);
        let sorted = store.sorted_tasks("Work").await.expect("sorted");
        assert_eq!(sorted[0].name, "high");

        store
            .update_category_sort_option("Work", SortOption::Shared)
            .await
            .expect("sort");
        store
            .update_category("Work", CategoryUpdate::new("Office", "#5da6d9"))
            .await
            .expect("rename");
        assert_eq!(store.category_sort_option("Office").await, SortOption::Shared);

        let err = store
            .update_category_sort_option("Work", SortOption::Deadline)
            .await
            .expect_err("missing");
        assert!(matches!(err, Error::CategoryNotFound(_)));
    }

    #[tokio::test]
    async fn mark_generated_only_once() {
        let store = store();
        assert!(store.mark_generated().await);
        assert!(!store.mark_generated().await);
        assert!(store.has_generated().await);
    }
}
