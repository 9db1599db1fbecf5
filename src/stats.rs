//! Aggregate statistics over store snapshots.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::model::ToDoList;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendWindow {
    #[default]
    Weekly,
    Monthly,
}

impl TrendWindow {
    pub fn days(&self) -> u64 {
        match self {
            TrendWindow::Weekly => 7,
            TrendWindow::Monthly => 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub completed: u32,
    pub is_today: bool,
}

/// Completions per day for the window ending at `current`, oldest first.
/// Days without a record count as 0.
pub fn completion_trend(
    completions: &BTreeMap<NaiveDate, u32>,
    current: NaiveDate,
    window: TrendWindow,
) -> Vec<TrendPoint> {
    (0..window.days())
        .rev()
        .filter_map(|offset| current.checked_sub_days(Days::new(offset)))
        .map(|date| TrendPoint {
            date,
            completed: completions.get(&date).copied().unwrap_or(0),
            is_today: date == current,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryProgress {
    pub name: String,
    pub color: String,
    pub completed: usize,
    pub total: usize,
    pub ratio: f64,
}

/// Completed share of each category that holds any task.
pub fn category_progress(list: &ToDoList) -> Vec<CategoryProgress> {
    list.categories
        .iter()
        .filter(|category| category.total_tasks() > 0)
        .map(|category| {
            let completed = category.completed_tasks.len();
            let total = category.total_tasks();
            CategoryProgress {
                name: category.name.clone(),
                color: category.color.clone(),
                completed,
                total,
                ratio: completed as f64 / total as f64,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SharedLoad {
    /// Open tasks shared with each user
    pub per_user: BTreeMap<String, usize>,
    /// Open tasks nobody else shares
    pub unshared: usize,
}

/// How open tasks are spread across the household.
pub fn shared_load(list: &ToDoList) -> SharedLoad {
    let mut load = SharedLoad::default();
    for task in list.open_tasks() {
        if task.shared_with.is_empty() {
            load.unshared += 1;
        }
        for user in &task.shared_with {
            *load.per_user.entry(user.clone()).or_insert(0) += 1;
        }
    }
    load
}
