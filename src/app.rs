//! Application context.
//!
//! Composes the settings store, the streak engine and the task store in
//! dependency order and runs the flows that span more than one of them:
//! keeping category limits aligned with categories, feeding completions to
//! the streak engine and closing a day.
//!
//! Lock order is always session first, then the task store.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{Config, Settings, SettingsStore, SettingsUpdate};
use crate::daily::{compute_daily_categories, planned_total};
use crate::error::{Error, Result};
use crate::model::{Category, Task, ToDoList};
use crate::notify::{LogNotifier, Notifier};
use crate::share::{Acknowledger, SimulatedAcknowledger};
use crate::stats::{completion_trend, TrendPoint, TrendWindow};
use crate::store::{CategoryUpdate, Rollover, TodoStore};
use crate::streak::{DayOutcome, StreakEngine, StreakStatus};

#[derive(Debug)]
struct Session {
    settings: SettingsStore,
    streak: StreakEngine,
    /// Plan of the day in progress, fixed at rollover or at the day's first
    /// completion
    plan: Option<DayPlan>,
    /// Planned tasks whose completion counts toward today's streak
    credited: BTreeSet<String>,
}

impl Session {
    fn current_plan(&self, list: &ToDoList) -> DayPlan {
        match &self.plan {
            Some(plan) => plan.clone(),
            None => DayPlan::compute(list, self.settings.settings()),
        }
    }

    /// Forget today's credited completions.
    fn clear_credit(&mut self) {
        self.credited.clear();
        self.streak.reset_completed_tasks();
    }
}

/// Tasks selected for a day and the total the streak is measured against.
#[derive(Debug, Clone)]
struct DayPlan {
    total: u32,
    task_ids: BTreeSet<String>,
}

impl DayPlan {
    fn compute(list: &ToDoList, settings: &Settings) -> Self {
        let daily = compute_daily_categories(list, settings);
        Self {
            total: planned_total(&daily, settings),
            task_ids: daily
                .iter()
                .flat_map(|category| category.tasks.iter().map(|task| task.id.clone()))
                .collect(),
        }
    }
}

/// What happened when a day was closed.
#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    #[serde(flatten)]
    pub rollover: Rollover,
    /// Planned total the closed day was measured against
    pub closed_planned_total: u32,
    /// Planned total for the new day
    pub planned_total: u32,
    /// `None` when streak tracking is disabled
    pub streak_outcome: Option<DayOutcome>,
    pub streak: StreakStatus,
}

pub struct App {
    session: Mutex<Session>,
    store: Arc<TodoStore>,
}

impl App {
    pub fn new(settings: Settings, store: TodoStore) -> Result<Self> {
        let settings = SettingsStore::new(settings)?;
        store.set_notifications_enabled(settings.settings().notifications_enabled);
        Ok(Self {
            session: Mutex::new(Session {
                settings,
                streak: StreakEngine::new(),
                plan: None,
                credited: BTreeSet::new(),
            }),
            store: Arc::new(store),
        })
    }

    /// Build an app with a simulated acknowledger and log notifications.
    pub fn from_config(config: &Config) -> Result<Self> {
        let acknowledger: Arc<dyn Acknowledger> =
            Arc::new(SimulatedAcknowledger::from_config(&config.sharing));
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        Self::new(config.settings.clone(), TodoStore::new(acknowledger, notifier))
    }

    pub fn store(&self) -> &TodoStore {
        &self.store
    }

    pub async fn settings(&self) -> Settings {
        self.session.lock().await.settings.get_settings()
    }

    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<()> {
        let mut session = self.session.lock().await;
        let disabling_streak = update.enable_streak == Some(false);
        session.settings.update(update)?;
        session.plan = None;
        if disabling_streak {
            session.streak.reset_streak();
            session.clear_credit();
        }
        self.store
            .set_notifications_enabled(session.settings.settings().notifications_enabled);
        Ok(())
    }

    pub async fn set_category_limit(&self, name: &str, limit: u32) -> Result<()> {
        let mut session = self.session.lock().await;
        if !self.store.snapshot().await.contains_category(name) {
            return Err(Error::CategoryNotFound(name.to_string()));
        }
        session.settings.set_category_limit(name, limit)?;
        session.plan = None;
        Ok(())
    }

    pub async fn reset_settings_to_default(&self) {
        let mut session = self.session.lock().await;
        session.settings.reset_to_default();
        session.plan = None;
        let names = self.store.snapshot().await.category_names();
        session.settings.sync_categories(&names);
        self.store
            .set_notifications_enabled(session.settings.settings().notifications_enabled);
    }

    /// Turn streak tracking on or off. Turning it off clears progress.
    pub async fn set_streak_enabled(&self, enabled: bool) -> Result<()> {
        self.update_settings(SettingsUpdate {
            enable_streak: Some(enabled),
            ..SettingsUpdate::default()
        })
        .await
    }

    pub async fn add_category(&self, category: Category) -> Result<()> {
        let mut session = self.session.lock().await;
        self.store.add_category(category).await?;
        let names = self.store.snapshot().await.category_names();
        session.settings.sync_categories(&names);
        Ok(())
    }

    pub async fn update_category(&self, old_name: &str, update: CategoryUpdate) -> Result<()> {
        let mut session = self.session.lock().await;
        let new_name = update.name.clone();
        self.store.update_category(old_name, update).await?;
        session.settings.rename_category(old_name, &new_name);
        let names = self.store.snapshot().await.category_names();
        session.settings.sync_categories(&names);
        Ok(())
    }

    pub async fn delete_category(&self, name: &str) -> Result<usize> {
        let mut session = self.session.lock().await;
        let removed = self.store.delete_category(name).await?;
        let names = self.store.snapshot().await.category_names();
        session.settings.sync_categories(&names);
        Ok(removed)
    }

    pub async fn add_task(&self, task: Task, category_name: &str) -> Result<Task> {
        self.store.add_task(task, category_name).await
    }

    pub async fn update_task(&self, task: Task) -> Result<Task> {
        self.store.update_task(task).await
    }

    pub async fn delete_task(&self, task_id: &str) -> bool {
        self.store.delete_task(task_id).await
    }

    /// Toggle completion and keep today's streak count in step.
    ///
    /// Only tasks in today's plan count, each at most once. Reopening a
    /// counted task takes its credit back.
    pub async fn toggle_complete(&self, task_id: &str, category_name: &str) -> Result<Task> {
        let mut session = self.session.lock().await;
        if session.plan.is_none() {
            let list = self.store.snapshot().await;
            session.plan = Some(session.current_plan(&list));
        }
        let task = self.store.toggle_complete(task_id, category_name).await?;

        let planned = session
            .plan
            .as_ref()
            .is_some_and(|plan| plan.task_ids.contains(&task.id));
        if task.is_completed {
            if planned && session.credited.insert(task.id.clone()) {
                session.streak.increment_completed_tasks();
            }
        } else if session.credited.remove(&task.id) {
            session.streak.decrement_completed_tasks();
        }
        Ok(task)
    }

    /// Today's categories limited by settings.
    pub async fn daily_categories(&self) -> Vec<Category> {
        let session = self.session.lock().await;
        let list = self.store.snapshot().await;
        compute_daily_categories(&list, session.settings.settings())
    }

    /// Tasks the user is expected to finish today.
    pub async fn planned_total(&self) -> u32 {
        let session = self.session.lock().await;
        let list = self.store.snapshot().await;
        session.current_plan(&list).total
    }

    /// Close the current day.
    ///
    /// Refuses when the store holds no tasks, or when open tasks exist but
    /// no category holding them has a daily limit. Otherwise rolls the store
    /// over, evaluates the streak against the closed day's planned total
    /// and fixes the planned total for the new day.
    pub async fn start_new_day(&self) -> Result<DaySummary> {
        let mut session = self.session.lock().await;
        let list = self.store.snapshot().await;
        let settings = session.settings.get_settings();

        if list.open_task_count() + list.completed_task_count() == 0 {
            return Err(Error::NothingScheduled("no tasks".to_string()));
        }
        let has_allocation = list.categories.iter().any(|category| {
            !category.tasks.is_empty() && settings.category_limit(&category.name) > 0
        });
        if list.open_task_count() > 0 && !has_allocation {
            return Err(Error::NothingScheduled(
                "no category with open tasks has a daily limit".to_string(),
            ));
        }

        let closed_planned_total = session.current_plan(&list).total;
        let rollover = self.store.reset_tasks_for_new_day(&settings).await?;

        let streak_outcome = if settings.enable_streak {
            Some(session.streak.reset_streak_for_new_day(closed_planned_total))
        } else {
            None
        };
        session.clear_credit();

        let list = self.store.snapshot().await;
        let next = DayPlan::compute(&list, &settings);
        let next_total = next.total;
        session.plan = Some(next);

        let streak = session.streak.status(&settings);
        info!(
            closed = %rollover.closed,
            completed = rollover.tasks_completed,
            planned = closed_planned_total,
            streak = streak.state.current_streak,
            "day closed"
        );
        Ok(DaySummary {
            rollover,
            closed_planned_total,
            planned_total: next_total,
            streak_outcome,
            streak,
        })
    }

    pub async fn streak_status(&self) -> StreakStatus {
        let session = self.session.lock().await;
        session.streak.status(session.settings.settings())
    }

    pub async fn reset_streak(&self) {
        self.session.lock().await.streak.reset_streak();
    }

    pub async fn reset_completed_tasks(&self) {
        self.session.lock().await.clear_credit();
    }

    /// Completion counts for the window ending today.
    pub async fn completion_trend(&self, window: TrendWindow) -> Vec<TrendPoint> {
        let completions = self.store.daily_task_completions().await;
        let current = self.store.current_date().await;
        completion_trend(&completions, current, window)
    }

    /// Wipe the store; settings and streak survive, limits of the removed
    /// categories are dropped.
    pub async fn delete_all(&self) {
        let mut session = self.session.lock().await;
        self.store.delete_all().await;
        session.settings.sync_categories(&[]);
        session.plan = None;
        session.clear_credit();
    }
}
