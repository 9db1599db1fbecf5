//! Configuration loading and the settings store
//!
//! Handles parsing of `.tasknest.toml` and owns the user-facing daily
//! policy: how many tasks to surface per day, per category limits and the
//! streak goal.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::share::DEFAULT_ACCEPTANCE_PROBABILITY;

/// Config file name looked up in a directory
pub const CONFIG_FILE: &str = ".tasknest.toml";

pub const MIN_DAILY_TASK_LIMIT: u32 = 1;
pub const MAX_DAILY_TASK_LIMIT: u32 = 5;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Daily policy settings
    #[serde(default)]
    pub settings: Settings,

    /// Sharing simulation configuration
    #[serde(default)]
    pub sharing: SharingConfig,
}

/// User-configurable daily policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Total tasks to surface per day
    #[serde(default = "default_daily_task_limit")]
    pub daily_task_limit: u32,

    /// Tasks to surface per category per day
    #[serde(default)]
    pub category_limits: BTreeMap<String, u32>,

    /// Track consecutive days on which the daily goal was met
    #[serde(default = "default_true")]
    pub enable_streak: bool,

    /// Consecutive days needed to reach the streak goal
    #[serde(default = "default_streak_goal")]
    pub streak_goal: u32,

    /// Deliver sharing notifications
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

fn default_daily_task_limit() -> u32 {
    4
}

fn default_streak_goal() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_task_limit: default_daily_task_limit(),
            category_limits: BTreeMap::new(),
            enable_streak: true,
            streak_goal: default_streak_goal(),
            notifications_enabled: true,
        }
    }
}

impl Settings {
    /// Limit for a category; unset means 0.
    pub fn category_limit(&self, name: &str) -> u32 {
        self.category_limits.get(name).copied().unwrap_or(0)
    }

    pub fn category_limit_total(&self) -> u32 {
        self.category_limits.values().sum()
    }

    fn validate(&self) -> Result<()> {
        validate_daily_task_limit(self.daily_task_limit)?;
        validate_streak_goal(self.streak_goal)?;
        for (name, limit) in &self.category_limits {
            validate_category_limit(name, *limit)?;
        }
        Ok(())
    }
}

fn validate_daily_task_limit(limit: u32) -> Result<()> {
    if !(MIN_DAILY_TASK_LIMIT..=MAX_DAILY_TASK_LIMIT).contains(&limit) {
        return Err(Error::InvalidLimit(format!(
            "daily_task_limit must be between {MIN_DAILY_TASK_LIMIT} and {MAX_DAILY_TASK_LIMIT}, got {limit}"
        )));
    }
    Ok(())
}

fn validate_streak_goal(goal: u32) -> Result<()> {
    if goal == 0 {
        return Err(Error::InvalidLimit("streak_goal must be >= 1".to_string()));
    }
    Ok(())
}

fn validate_category_limit(name: &str, limit: u32) -> Result<()> {
    if limit > MAX_DAILY_TASK_LIMIT {
        return Err(Error::InvalidLimit(format!(
            "category limit for '{name}' must be <= {MAX_DAILY_TASK_LIMIT}, got {limit}"
        )));
    }
    Ok(())
}

/// Sharing simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharingConfig {
    /// Probability that a proposed user accepts a shared task
    #[serde(default = "default_acceptance_probability")]
    pub acceptance_probability: f64,

    /// Fixed seed for reproducible acceptance draws
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_acceptance_probability() -> f64 {
    DEFAULT_ACCEPTANCE_PROBABILITY
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            acceptance_probability: default_acceptance_probability(),
            seed: None,
        }
    }
}

impl SharingConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.acceptance_probability) {
            return Err(Error::InvalidConfig(format!(
                "sharing.acceptance_probability must be within [0, 1], got {}",
                self.acceptance_probability
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a `.tasknest.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %config_path.display(), %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.settings
            .validate()
            .map_err(|err| Error::InvalidConfig(format!("settings: {err}")))?;
        self.sharing.validate()?;
        Ok(())
    }
}

/// Partial settings update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub daily_task_limit: Option<u32>,
    pub category_limits: Option<BTreeMap<String, u32>>,
    pub enable_streak: Option<bool>,
    pub streak_goal: Option<u32>,
    pub notifications_enabled: Option<bool>,
}

/// Holds the live settings and reconciles category limits against the
/// daily limit.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    settings: Settings,
    user_updated: bool,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let mut store = Self {
            settings,
            user_updated: false,
        };
        store.reconcile();
        Ok(store)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn get_settings(&self) -> Settings {
        self.settings.clone()
    }

    /// Whether the user has changed settings since the last reset.
    pub fn has_user_updated(&self) -> bool {
        self.user_updated
    }

    /// Apply a partial update. Nothing changes when validation fails.
    pub fn update(&mut self, update: SettingsUpdate) -> Result<()> {
        let mut next = self.settings.clone();
        if let Some(limit) = update.daily_task_limit {
            validate_daily_task_limit(limit)?;
            next.daily_task_limit = limit;
        }
        if let Some(limits) = update.category_limits {
            for (name, limit) in &limits {
                validate_category_limit(name, *limit)?;
            }
            next.category_limits = limits;
        }
        if let Some(goal) = update.streak_goal {
            validate_streak_goal(goal)?;
            next.streak_goal = goal;
        }
        if let Some(enabled) = update.enable_streak {
            next.enable_streak = enabled;
        }
        if let Some(enabled) = update.notifications_enabled {
            next.notifications_enabled = enabled;
        }

        self.settings = next;
        self.user_updated = true;
        self.reconcile();
        Ok(())
    }

    pub fn set_category_limit(&mut self, name: &str, limit: u32) -> Result<()> {
        validate_category_limit(name, limit)?;
        self.settings
            .category_limits
            .insert(name.to_string(), limit);
        self.user_updated = true;
        self.reconcile();
        Ok(())
    }

    pub fn reset_to_default(&mut self) {
        self.settings = Settings::default();
        self.user_updated = false;
    }

    /// Align category limits with the current category names.
    ///
    /// Limits of vanished categories are dropped. Until the user edits
    /// settings, each newly seen category gets a limit of 1 while this
    /// pass has handed out fewer than `daily_task_limit` slots, and 0
    /// after that.
    pub fn sync_categories(&mut self, names: &[String]) {
        self.settings
            .category_limits
            .retain(|name, _| names.iter().any(|candidate| candidate == name));

        if !self.user_updated {
            let mut assigned = 0;
            for name in names {
                if self.settings.category_limits.contains_key(name) {
                    continue;
                }
                let limit = if assigned < self.settings.daily_task_limit {
                    assigned += 1;
                    1
                } else {
                    0
                };
                debug!(category = %name, limit, "derived category limit");
                self.settings.category_limits.insert(name.clone(), limit);
            }
        }

        self.reconcile();
    }

    /// Move a category's limit to its new name.
    pub fn rename_category(&mut self, old_name: &str, new_name: &str) {
        if old_name == new_name {
            return;
        }
        if let Some(limit) = self.settings.category_limits.remove(old_name) {
            self.settings
                .category_limits
                .insert(new_name.to_string(), limit);
        }
    }

    /// Daily slots not yet allocated to a category.
    pub fn available_spots(&self) -> u32 {
        self.settings
            .daily_task_limit
            .saturating_sub(self.settings.category_limit_total())
    }

    // The daily limit follows the allocations upward; allocations are never
    // trimmed to fit.
    fn reconcile(&mut self) {
        let total = self.settings.category_limit_total();
        if total > self.settings.daily_task_limit {
            debug!(
                from = self.settings.daily_task_limit,
                to = total,
                "raising daily task limit to cover category limits"
            );
            self.settings.daily_task_limit = total;
        }
    }
}
