//! Streak tracking.
//!
//! Completions accumulate during a day. At rollover the day's count is
//! compared with the day's planned total: meeting it extends the streak,
//! missing it resets the streak to zero. The completion count always
//! starts over for the next day.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;

/// Counters kept by the streak engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Tasks completed since the last rollover
    pub completed_tasks: u32,
    /// Consecutive days on which the planned total was met
    pub current_streak: u32,
    /// Longest streak observed
    pub high_score: u32,
}

/// How a day ended for the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOutcome {
    Incremented,
    Reset,
}

/// Streak state combined with the goal from settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakStatus {
    #[serde(flatten)]
    pub state: StreakState,
    pub enabled: bool,
    pub goal: u32,
    pub goal_reached: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StreakEngine {
    state: StreakState,
}

impl StreakEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StreakState {
        self.state
    }

    /// Record one task entering the completed state today.
    pub fn increment_completed_tasks(&mut self) {
        self.state.completed_tasks += 1;
    }

    /// Take back one completion when a counted task is reopened.
    pub fn decrement_completed_tasks(&mut self) {
        self.state.completed_tasks = self.state.completed_tasks.saturating_sub(1);
    }

    /// Close the day against `daily_limit_total`.
    ///
    /// Must run exactly once per rollover; a second call for the same day
    /// evaluates an empty count.
    pub fn reset_streak_for_new_day(&mut self, daily_limit_total: u32) -> DayOutcome {
        let outcome = if self.state.completed_tasks >= daily_limit_total {
            self.state.current_streak += 1;
            self.state.high_score = self.state.high_score.max(self.state.current_streak);
            DayOutcome::Incremented
        } else {
            self.state.current_streak = 0;
            DayOutcome::Reset
        };
        debug!(
            completed = self.state.completed_tasks,
            total = daily_limit_total,
            streak = self.state.current_streak,
            ?outcome,
            "streak evaluated"
        );
        self.state.completed_tasks = 0;
        outcome
    }

    pub fn reset_streak(&mut self) {
        self.state.current_streak = 0;
    }

    pub fn reset_completed_tasks(&mut self) {
        self.state.completed_tasks = 0;
    }

    /// True while tracking is enabled and the streak is at or past the goal.
    /// Level-triggered: stays true until the streak drops.
    pub fn goal_reached(&self, settings: &Settings) -> bool {
        settings.enable_streak && self.state.current_streak >= settings.streak_goal
    }

    pub fn status(&self, settings: &Settings) -> StreakStatus {
        StreakStatus {
            state: self.state,
            enabled: settings.enable_streak,
            goal: settings.streak_goal,
            goal_reached: self.goal_reached(settings),
        }
    }
}
