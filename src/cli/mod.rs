//! Command-line interface for depflow.
//!
//! Each command lives in its own module with a clap `Args` struct and an
//! `execute` method. The root [`Cli`] owns the global flags and dispatches.
//!
//! # Available Commands
//!
//! - `incoming` - Report how far behind each direct dependency of a repository's
//!   latest build is, classified against the SLA table
//! - `latest` - Show the latest build of a repository and its direct dependencies
//! - `config` - Manage the user configuration file
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug logging
//! - `--quiet` - Only log errors
//! - `--no-progress` - Disable the spinner
//! - `--config` - Path to a custom config file
//!
//! # Example
//!
//! ```bash
//! depflow incoming dotnet/aspnetcore --channel 1299
//! depflow incoming https://github.com/dotnet/runtime --channel 1299 --format json --check
//! depflow latest dotnet/sdk --channel 1299
//! depflow config show
//! ```

pub mod common;
mod config;
mod incoming;
mod latest;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

pub use incoming::IncomingCommand;
pub use latest::LatestCommand;

use crate::config::GlobalConfig;

/// Settings derived from the global flags and handed to every command.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Default log directive (`debug`, `error`, ...); `None` defers to `RUST_LOG`
    pub log_level: Option<String>,

    /// Hide the spinner
    pub no_progress: bool,

    /// Config file override
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the user configuration this run should use.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or validated.
    pub async fn load_global_config(&self) -> Result<GlobalConfig> {
        GlobalConfig::load_with_optional(self.config_path.clone()).await
    }

    /// Log filter: the explicit level when set, else `RUST_LOG`, else `warn`.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        }
    }
}

/// Dependency freshness reporting for build graphs.
#[derive(Parser, Debug)]
#[command(
    name = "depflow",
    about = "Report how stale the dependencies of a repository's latest build are",
    version,
    author,
    long_about = "depflow walks the build graph of a repository's latest build, compares \
                  each direct dependency's commit against its branch on GitHub, and \
                  classifies the lag against configurable SLA thresholds."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a custom config file (default: ~/.depflow/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable the progress spinner
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report commit lag and SLA status for each dependency of the latest build
    Incoming(incoming::IncomingCommand),

    /// Show the latest build of a repository and its direct dependencies
    Latest(latest::LatestCommand),

    /// Manage the depflow configuration file
    Config(config::ConfigCommand),
}

impl Cli {
    /// Run the selected command. `cancel` is triggered by Ctrl-C in `main`.
    ///
    /// # Errors
    ///
    /// Propagates any failure of the selected command.
    pub async fn execute(self, cancel: CancellationToken) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config, cancel).await
    }

    /// Collapse the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress,
            config_path: self.config.clone(),
        }
    }

    /// Run the selected command with an explicit [`CliConfig`].
    ///
    /// # Errors
    ///
    /// Propagates any failure of the selected command.
    pub async fn execute_with_config(
        self,
        config: CliConfig,
        cancel: CancellationToken,
    ) -> Result<()> {
        match self.command {
            Commands::Incoming(mut cmd) => {
                cmd.no_progress |= config.no_progress;
                cmd.execute(&config, &cancel).await
            }
            Commands::Latest(mut cmd) => {
                cmd.no_progress |= config.no_progress;
                cmd.execute(&config, &cancel).await
            }
            Commands::Config(cmd) => cmd.execute(config.config_path).await,
        }
    }
}
