//! One-shot household sample data.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use crate::app::App;
use crate::error::{Error, Result};
use crate::model::{Category, Task};

struct SampleCategory {
    name: &'static str,
    color: &'static str,
    shared_with: &'static [&'static str],
}

struct SampleTask {
    name: &'static str,
    description: &'static str,
    category: &'static str,
    priority: u8,
    /// Days from the current date; `None` for no deadline
    due_in: Option<u64>,
    shared_with: &'static [&'static str],
}

const CATEGORIES: &[SampleCategory] = &[
    SampleCategory {
        name: "Household",
        color: "#f4a261",
        shared_with: &["Partner"],
    },
    SampleCategory {
        name: "Work",
        color: "#5da6d9",
        shared_with: &[],
    },
    SampleCategory {
        name: "Kids",
        color: "#e76f51",
        shared_with: &["Partner", "Grandma"],
    },
    SampleCategory {
        name: "Health",
        color: "#2a9d8f",
        shared_with: &[],
    },
];

const TASKS: &[SampleTask] = &[
    SampleTask {
        name: "Groceries",
        description: "Weekly shop, check the freezer first",
        category: "Household",
        priority: 4,
        due_in: Some(1),
        shared_with: &["Partner"],
    },
    SampleTask {
        name: "Laundry",
        description: "",
        category: "Household",
        priority: 2,
        due_in: None,
        shared_with: &[],
    },
    SampleTask {
        name: "Fix the kitchen tap",
        description: "Washer is worn",
        category: "Household",
        priority: 3,
        due_in: Some(7),
        shared_with: &["Partner"],
    },
    SampleTask {
        name: "Quarterly report",
        description: "Numbers from finance are in the shared drive",
        category: "Work",
        priority: 5,
        due_in: Some(3),
        shared_with: &[],
    },
    SampleTask {
        name: "Reply to client emails",
        description: "",
        category: "Work",
        priority: 3,
        due_in: None,
        shared_with: &[],
    },
    SampleTask {
        name: "Book dentist",
        description: "",
        category: "Kids",
        priority: 3,
        due_in: Some(14),
        shared_with: &["Partner"],
    },
    SampleTask {
        name: "Pack school bags",
        description: "Gym kit on Thursdays",
        category: "Kids",
        priority: 4,
        due_in: Some(1),
        shared_with: &["Partner", "Grandma"],
    },
    SampleTask {
        name: "Evening run",
        description: "5k",
        category: "Health",
        priority: 2,
        due_in: None,
        shared_with: &[],
    },
    SampleTask {
        name: "Refill prescription",
        description: "",
        category: "Health",
        priority: 5,
        due_in: Some(2),
        shared_with: &[],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleSummary {
    pub categories: usize,
    pub tasks: usize,
}

/// Load the sample household into `app`.
///
/// Allowed once until the store is cleared with `delete_all`.
pub async fn generate_sample_data(app: &App) -> Result<SampleSummary> {
    if !app.store().mark_generated().await {
        return Err(Error::AlreadyGenerated);
    }

    let today = app.store().current_date().await;
    let mut summary = SampleSummary {
        categories: 0,
        tasks: 0,
    };

    for sample in CATEGORIES {
        if app.store().snapshot().await.contains_category(sample.name) {
            continue;
        }
        let category = Category::new(sample.name, sample.color)
            .with_shared_with(sample.shared_with.iter().copied());
        app.add_category(category).await?;
        summary.categories += 1;
    }

    for sample in TASKS {
        let mut task = Task::new(sample.name)
            .with_description(sample.description)
            .with_priority(sample.priority)
            .shared_with(sample.shared_with.iter().copied());
        if let Some(deadline) = sample.due_in.and_then(|days| deadline_after(today, days)) {
            task = task.with_deadline(deadline);
        }
        app.add_task(task, sample.category).await?;
        summary.tasks += 1;
    }

    info!(
        categories = summary.categories,
        tasks = summary.tasks,
        "generated sample data"
    );
    Ok(summary)
}

fn deadline_after(today: NaiveDate, days: u64) -> Option<DateTime<Utc>> {
    today
        .checked_add_days(Days::new(days))
        .and_then(|date| date.and_hms_opt(18, 0, 0))
        .map(|datetime| datetime.and_utc())
}
