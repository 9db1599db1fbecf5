//! tasknest simulate command implementation
//!
//! Loads the sample household into an in-memory app, then closes `days`
//! days in a row. Each day a random share of the daily tasks is completed
//! before the day is closed.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, warn};

use crate::app::{App, DaySummary};
use crate::config::{Config, SettingsUpdate};
use crate::error::{Error, Result};
use crate::model::DailyHistoryEntry;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::sample::{generate_sample_data, SampleSummary};
use crate::stats::{
    category_progress, shared_load, CategoryProgress, SharedLoad, TrendPoint, TrendWindow,
};
use crate::streak::{DayOutcome, StreakStatus};

#[derive(Debug, Clone, Copy)]
pub struct SimulateOptions {
    pub days: u32,
    pub seed: Option<u64>,
    pub complete_ratio: f64,
}

#[derive(Serialize)]
struct SimulateReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    days_requested: u32,
    days_simulated: usize,
    sample: SampleSummary,
    days: Vec<DayReport>,
    streak: StreakStatus,
    history: Vec<DailyHistoryEntry>,
    trend: Vec<TrendPoint>,
    progress: Vec<CategoryProgress>,
    shared_load: SharedLoad,
}

/// Compact view of a closed day.
#[derive(Serialize)]
struct DayReport {
    date: NaiveDate,
    completed: u32,
    planned: u32,
    next_planned: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<DayOutcome>,
    current_streak: u32,
}

impl From<&DaySummary> for DayReport {
    fn from(summary: &DaySummary) -> Self {
        Self {
            date: summary.rollover.closed,
            completed: summary.rollover.tasks_completed,
            planned: summary.closed_planned_total,
            next_planned: summary.planned_total,
            outcome: summary.streak_outcome,
            current_streak: summary.streak.state.current_streak,
        }
    }
}

pub async fn run(options: SimulateOptions, mut config: Config, output: OutputOptions) -> Result<()> {
    if !(0.0..=1.0).contains(&options.complete_ratio) {
        return Err(Error::InvalidArgument(format!(
            "--complete-ratio must be within [0, 1], got {}",
            options.complete_ratio
        )));
    }
    if options.seed.is_some() {
        config.sharing.seed = options.seed;
    }
    let seed = config.sharing.seed;

    let app = App::from_config(&config)?;
    let sample = generate_sample_data(&app).await?;

    let mut human = HumanOutput::new(format!("tasknest simulate: {} days", options.days));
    apply_configured_limits(&app, &config.settings.category_limits, &mut human).await?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut days = Vec::new();
    for _ in 0..options.days {
        for category in app.daily_categories().await {
            for task in &category.tasks {
                if rng.gen_bool(options.complete_ratio) {
                    app.toggle_complete(&task.id, &category.name).await?;
                }
            }
        }

        match app.start_new_day().await {
            Ok(summary) => days.push(DayReport::from(&summary)),
            Err(Error::NothingScheduled(reason)) => {
                warn!(%reason, "simulation stopped early");
                human.push_warning(format!("stopped after {} days: {reason}", days.len()));
                break;
            }
            Err(err) => return Err(err),
        }
    }

    let list = app.store().snapshot().await;
    let report = SimulateReport {
        seed,
        days_requested: options.days,
        days_simulated: days.len(),
        sample,
        streak: app.streak_status().await,
        history: app.store().daily_history().await,
        trend: app.completion_trend(TrendWindow::Weekly).await,
        progress: category_progress(&list),
        shared_load: shared_load(&list),
        days,
    };
    debug!(days = report.days_simulated, "simulation finished");

    human.push_summary("days simulated", report.days_simulated.to_string());
    human.push_summary(
        "sample",
        format!("{} categories, {} tasks", sample.categories, sample.tasks),
    );
    human.push_summary("current streak", report.streak.state.current_streak.to_string());
    human.push_summary("high score", report.streak.state.high_score.to_string());
    human.push_summary(
        "goal reached",
        if report.streak.goal_reached { "yes" } else { "no" },
    );
    for day in &report.days {
        human.push_detail(format!(
            "{}: {}/{} completed, streak {}",
            day.date, day.completed, day.planned, day.current_streak
        ));
    }
    for progress in &report.progress {
        human.push_detail(format!(
            "{}: {}/{} done",
            progress.name, progress.completed, progress.total
        ));
    }

    emit_success(output, "simulate", &report, Some(&human))
}

/// Limits from the config file only make sense once the categories exist.
async fn apply_configured_limits(
    app: &App,
    limits: &BTreeMap<String, u32>,
    human: &mut HumanOutput,
) -> Result<()> {
    if limits.is_empty() {
        return Ok(());
    }

    let list = app.store().snapshot().await;
    let mut known = BTreeMap::new();
    for (name, limit) in limits {
        if list.contains_category(name) {
            known.insert(name.clone(), *limit);
        } else {
            human.push_warning(format!("ignoring limit for unknown category '{name}'"));
        }
    }

    app.update_settings(SettingsUpdate {
        category_limits: Some(known),
        ..SettingsUpdate::default()
    })
    .await
}
