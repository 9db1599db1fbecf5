//! tasknest - household task planning library
//!
//! This library holds the state manager behind the tasknest CLI: categories
//! of tasks shared between household members, a daily selection policy
//! driven by per-category limits, and a streak that rewards finishing the
//! planned tasks day after day.
//!
//! # Core Concepts
//!
//! - **Categories**: named, colored groups of tasks, optionally shared
//! - **Daily tasks**: the first N open tasks of each category, N set per category
//! - **Rollover**: closing the simulated day and recording its completions
//! - **Streak**: consecutive days on which the planned total was met
//! - **Acknowledgment**: simulated accept/reject when a task is shared
//!
//! # Module Organization
//!
//! - `app`: Composed application context and the day-closing flow
//! - `cli`: Command-line interface using clap
//! - `config`: Settings, the settings store and `.tasknest.toml` loading
//! - `daily`: Daily selection policy and presentation sort
//! - `error`: Error types and result aliases
//! - `events`: Store change events for subscribers
//! - `model`: Tasks, categories and the to-do list
//! - `notify`: Notification collaborators
//! - `output`: CLI output envelopes
//! - `sample`: One-shot sample household
//! - `share`: Sharing acknowledgment protocol
//! - `stats`: Completion trends and progress figures
//! - `store`: The task/category store
//! - `streak`: Streak engine

pub mod app;
pub mod cli;
pub mod config;
pub mod daily;
pub mod error;
pub mod events;
pub mod model;
pub mod notify;
pub mod output;
pub mod sample;
pub mod share;
pub mod stats;
pub mod store;
pub mod streak;

pub use error::{Error, Result};
