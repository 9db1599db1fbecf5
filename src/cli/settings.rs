//! tasknest settings command implementation

use serde::Serialize;

use crate::config::{Config, SettingsStore};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::ConfigSource;

#[derive(Serialize)]
struct ShowReport<'a> {
    source: &'a ConfigSource,
    config: &'a Config,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    source: &'a ConfigSource,
    valid: bool,
    daily_task_limit: u32,
    category_limit_total: u32,
    available_spots: u32,
}

pub fn show(source: &ConfigSource, config: &Config, output: OutputOptions) -> Result<()> {
    let mut human = HumanOutput::new(format!("tasknest settings: {source}"));
    let settings = &config.settings;
    human.push_summary("daily task limit", settings.daily_task_limit.to_string());
    human.push_summary("streak", streak_label(config));
    human.push_summary(
        "notifications",
        if settings.notifications_enabled {
            "on"
        } else {
            "off"
        },
    );
    human.push_summary(
        "acceptance probability",
        config.sharing.acceptance_probability.to_string(),
    );
    if let Some(seed) = config.sharing.seed {
        human.push_summary("seed", seed.to_string());
    }
    for (name, limit) in &settings.category_limits {
        human.push_detail(format!("{name}: {limit}"));
    }

    emit_success(
        output,
        "settings show",
        &ShowReport { source, config },
        Some(&human),
    )
}

/// Loading already validated the file; this also runs the settings store's
/// reconciliation so the reported numbers match what the app would use.
pub fn check(source: &ConfigSource, config: &Config, output: OutputOptions) -> Result<()> {
    let store = SettingsStore::new(config.settings.clone())?;
    let settings = store.settings();

    let report = CheckReport {
        source,
        valid: true,
        daily_task_limit: settings.daily_task_limit,
        category_limit_total: settings.category_limit_total(),
        available_spots: store.available_spots(),
    };

    let mut human = HumanOutput::new("tasknest settings check: ok");
    human.push_summary("source", source.to_string());
    human.push_summary("daily task limit", report.daily_task_limit.to_string());
    human.push_summary("category limits", report.category_limit_total.to_string());
    if report.daily_task_limit > config.settings.daily_task_limit {
        human.push_warning(format!(
            "category limits exceed daily_task_limit {}; it will be raised to {}",
            config.settings.daily_task_limit, report.daily_task_limit
        ));
    }

    emit_success(output, "settings check", &report, Some(&human))
}

fn streak_label(config: &Config) -> String {
    if config.settings.enable_streak {
        format!("on (goal {})", config.settings.streak_goal)
    } else {
        "off".to_string()
    }
}
