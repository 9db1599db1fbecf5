//! Command-line interface for tasknest
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule. The binary drives the
//! library in memory; nothing is persisted between runs.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::{Config, CONFIG_FILE};
use crate::error::Result;
use crate::output::OutputOptions;

mod settings;
mod simulate;

/// tasknest - household task planning with daily limits and streaks
#[derive(Parser, Debug)]
#[command(name = "tasknest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file (defaults to ./.tasknest.toml)
    #[arg(long, global = true, env = "TASKNEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the sample household and simulate a run of days
    Simulate {
        /// Number of days to close
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=365))]
        days: u32,

        /// Seed for sharing acknowledgments and completions
        #[arg(long)]
        seed: Option<u64>,

        /// Chance that each daily task gets completed, in [0, 1]
        #[arg(long, default_value_t = 0.75)]
        complete_ratio: f64,
    },

    /// Inspect the config file
    #[command(subcommand)]
    Settings(SettingsCommands),
}

/// Settings subcommands
#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Print the effective configuration
    Show,

    /// Validate the configuration
    Check,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        let (source, config) = resolve_config(self.config.as_deref())?;

        match self.command {
            Commands::Simulate {
                days,
                seed,
                complete_ratio,
            } => {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()?;
                runtime.block_on(simulate::run(
                    simulate::SimulateOptions {
                        days,
                        seed,
                        complete_ratio,
                    },
                    config,
                    output,
                ))
            }
            Commands::Settings(SettingsCommands::Show) => settings::show(&source, &config, output),
            Commands::Settings(SettingsCommands::Check) => settings::check(&source, &config, output),
        }
    }
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => f.write_str("defaults"),
        }
    }
}

/// An explicit path must load; the default file is optional but must be
/// valid when present.
fn resolve_config(explicit: Option<&Path>) -> Result<(ConfigSource, Config)> {
    if let Some(path) = explicit {
        return Ok((ConfigSource::File(path.to_path_buf()), Config::load(path)?));
    }

    let path = std::env::current_dir()?.join(CONFIG_FILE);
    if path.exists() {
        let config = Config::load(&path)?;
        Ok((ConfigSource::File(path), config))
    } else {
        Ok((ConfigSource::Defaults, Config::default()))
    }
}
