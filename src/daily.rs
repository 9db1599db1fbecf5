//! Daily task selection.
//!
//! Pure functions over a [`ToDoList`] snapshot and [`Settings`]. Selection
//! keeps store order; [`sort_tasks`] is applied by presentation code only.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::Settings;
use crate::model::{Category, SortOption, Task, ToDoList};

/// Daily subset keyed by category name.
pub type DailyTasks = BTreeMap<String, Vec<Task>>;

/// Categories to work on today, each limited to its daily allocation.
///
/// Categories with a zero or unset limit, or without open tasks, are left
/// out. The result only depends on the inputs, so equal inputs give equal
/// output.
pub fn compute_daily_categories(list: &ToDoList, settings: &Settings) -> Vec<Category> {
    list.categories
        .iter()
        .filter_map(|category| {
            let limit = settings.category_limit(&category.name) as usize;
            if limit == 0 || category.tasks.is_empty() {
                return None;
            }
            Some(Category {
                name: category.name.clone(),
                color: category.color.clone(),
                tasks: category.tasks.iter().take(limit).cloned().collect(),
                completed_tasks: category.completed_tasks.clone(),
                shared: category.shared,
                shared_with: category.shared_with.clone(),
            })
        })
        .collect()
}

/// First `limit` incomplete tasks of every category, including empty
/// entries for categories without an allocation.
pub fn daily_task_subset(list: &ToDoList, settings: &Settings) -> DailyTasks {
    list.categories
        .iter()
        .map(|category| {
            let limit = settings.category_limit(&category.name) as usize;
            let tasks = category
                .tasks
                .iter()
                .filter(|task| !task.is_completed)
                .take(limit)
                .cloned()
                .collect();
            (category.name.clone(), tasks)
        })
        .collect()
}

/// Number of tasks the user is expected to finish today.
pub fn planned_total(daily: &[Category], settings: &Settings) -> u32 {
    let selected: usize = daily.iter().map(|category| category.tasks.len()).sum();
    (selected as u32).min(settings.daily_task_limit)
}

/// Order tasks for display.
pub fn sort_tasks(tasks: &mut [Task], option: SortOption) {
    match option {
        SortOption::Priority => tasks.sort_by(|left, right| right.priority.cmp(&left.priority)),
        SortOption::Deadline => tasks.sort_by(|left, right| match (left.deadline, right.deadline) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        SortOption::Shared => {
            tasks.sort_by(|left, right| right.shared_with.len().cmp(&left.shared_with.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn category_with(name: &str, count: usize) -> Category {
        let mut category = Category::named(name);
        for idx in 0..count {
            let mut task = Task::new(format!("{name}-{idx}"));
            task.assign_category(&category);
            category.tasks.push(task);
        }
        category
    }

    fn settings_with(limits: &[(&str, u32)], daily: u32) -> Settings {
        Settings {
            daily_task_limit: daily,
            category_limits: limits
                .iter()
                .map(|(name, limit)| (name.to_string(), *limit))
                .collect(),
            ..Settings::default()
        }
    }

    #[test]
    fn limits_tasks_per_category() {
        let list = ToDoList {
            categories: vec![category_with("Work", 3)],
        };
        let settings = settings_with(&[("Work", 2)], 2);

        let daily = compute_daily_categories(&list, &settings);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].tasks.len(), 2);
        assert_eq!(daily[0].tasks[0].name, "Work-0");
        assert_eq!(daily[0].tasks[1].name, "Work-1");
    }

    #[test]
    fn excludes_unset_zero_and_empty_categories() {
        let list = ToDoList {
            categories: vec![
                category_with("Work", 2),
                category_with("Home", 2),
                category_with("Garden", 0),
                category_with("Errands", 1),
            ],
        };
        let settings = settings_with(&[("Work", 1), ("Home", 0), ("Garden", 2)], 4);

        let daily = compute_daily_categories(&list, &settings);
        let names: Vec<&str> = daily.iter().map(|category| category.name.as_str()).collect();
        assert_eq!(names, vec!["Work"]);
    }

    #[test]
    fn selection_is_stable() {
        let list = ToDoList {
            categories: vec![category_with("Work", 4), category_with("Home", 2)],
        };
        let settings = settings_with(&[("Work", 2), ("Home", 1)], 3);
        assert_eq!(
            compute_daily_categories(&list, &settings),
            compute_daily_categories(&list, &settings)
        );
    }

    #[test]
    fn subset_keeps_every_category() {
        let list = ToDoList {
            categories: vec![category_with("Work", 3), category_with("Home", 1)],
        };
        let settings = settings_with(&[("Work", 2)], 2);

        let subset = daily_task_subset(&list, &settings);
        assert_eq!(subset["Work"].len(), 2);
        assert!(subset["Home"].is_empty());
    }

    #[test]
    fn planned_total_is_capped_by_daily_limit() {
        let list = ToDoList {
            categories: vec![category_with("Work", 3), category_with("Home", 3)],
        };
        let settings = settings_with(&[("Work", 3), ("Home", 3)], 4);
        let daily = compute_daily_categories(&list, &settings);
        assert_eq!(planned_total(&daily, &settings), 4);
    }

    #[test]
    fn sort_by_priority_descending() {
        let mut tasks = vec![
            Task::new("low").with_priority(1),
            Task::new("high").with_priority(5),
            Task::new("mid").with_priority(3),
        ];
        sort_tasks(&mut tasks, SortOption::Priority);
        let names: Vec<&str> = tasks.iter().map(|task| task.name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }

    #[test]
    fn sort_by_deadline_puts_missing_last() {
        let soon = Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let mut tasks = vec![
            Task::new("none"),
            Task::new("later").with_deadline(later),
            Task::new("soon").with_deadline(soon),
        ];
        sort_tasks(&mut tasks, SortOption::Deadline);
        let names: Vec<&str> = tasks.iter().map(|task| task.name.as_str()).collect();
        assert_eq!(names, vec!["soon", "later", "none"]);
    }

    #[test]
    fn sort_by_shared_count_descending() {
        let mut tasks = vec![
            Task::new("solo"),
            Task::new("pair").shared_with(["Anna", "Ben"]),
            Task::new("one").shared_with(["Anna"]),
        ];
        sort_tasks(&mut tasks, SortOption::Shared);
        let names: Vec<&str> = tasks.iter().map(|task| task.name.as_str()).collect();
        assert_eq!(names, vec!["pair", "one", "solo"]);
    }
}
