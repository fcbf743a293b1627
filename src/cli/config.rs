//! Manage the depflow configuration file.
//!
//! The configuration file (`~/.depflow/config.toml`) holds service endpoints,
//! access tokens, the exclusion list, and the SLA table. It is optional; every
//! setting has a default.
//!
//! # Examples
//!
//! ```bash
//! depflow config init          # write an example file
//! depflow config show          # print the effective configuration, tokens masked
//! depflow config               # same as show
//! depflow config path          # print the file location
//! ```
//!
//! # Security Considerations
//!
//! - The file is written with `0600` permissions on Unix
//! - `show` never prints token values
//! - Prefer `GITHUB_TOKEN` / `DEPFLOW_BUILD_GRAPH_TOKEN` in CI

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::GlobalConfig;

/// Arguments for `depflow config`.
#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Debug, Subcommand)]
enum ConfigSubcommands {
    /// Create an example configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration with tokens masked
    Show,

    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    /// Run the subcommand against `config_path` or the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or written.
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        match self.command {
            Some(ConfigSubcommands::Init {
                force,
            }) => Self::init(force, config_path).await,
            Some(ConfigSubcommands::Show) | None => Self::show(config_path).await,
            Some(ConfigSubcommands::Path) => Self::show_path(config_path),
        }
    }

    fn resolve_path(config_path: Option<PathBuf>) -> PathBuf {
        config_path.unwrap_or_else(|| {
            GlobalConfig::default_path().unwrap_or_else(|_| PathBuf::from("~/.depflow/config.toml"))
        })
    }

    async fn init(force: bool, config_path: Option<PathBuf>) -> Result<()> {
        let config_path = Self::resolve_path(config_path);

        if tokio::fs::try_exists(&config_path).await.unwrap_or(false) && !force {
            println!("❌ Config already exists at: {}", config_path.display());
            println!("   Use --force to overwrite");
            return Ok(());
        }

        let config = GlobalConfig::init_example();
        config.save_to(&config_path).await?;

        println!("✅ Created config at: {}", config_path.display());
        println!("\n{}", "Example configuration:".bold());
        println!("{}", toml::to_string_pretty(&config.masked())?);
        println!("\n{}", "Next steps:".yellow());
        println!("  1. Replace 'YOUR_GITHUB_TOKEN' with a token that can read your repositories");
        println!("  2. Adjust the [sla] thresholds and excluded_repositories as needed");

        Ok(())
    }

    async fn show(config_path: Option<PathBuf>) -> Result<()> {
        let config = GlobalConfig::load_with_optional(config_path.clone()).await?;
        let config_path = Self::resolve_path(config_path);

        println!("{}", "depflow Configuration".bold());
        println!("Location: {}", config_path.display());
        if !tokio::fs::try_exists(&config_path).await.unwrap_or(false) {
            println!("{}", "(file not found, showing defaults)".bright_black());
            println!("\n{}", "Tip:".yellow());
            println!("  Run 'depflow config init' to create an example configuration");
        }
        println!();
        println!("{}", toml::to_string_pretty(&config.masked())?);

        Ok(())
    }

    fn show_path(config_path: Option<PathBuf>) -> Result<()> {
        println!("{}", Self::resolve_path(config_path).display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_path() {
        let result = ConfigCommand::show_path(None);
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_config_init_respects_force() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");

        ConfigCommand::init(false, Some(config_path.clone())).await.unwrap();
        let created = tokio::fs::read_to_string(&config_path).await.unwrap();
        assert!(created.contains("YOUR_GITHUB_TOKEN"));

        // Existing file is left alone without --force
        tokio::fs::write(&config_path, "max_parallel = 3\n").await.unwrap();
        ConfigCommand::init(false, Some(config_path.clone())).await.unwrap();
        let kept = GlobalConfig::load_from(&config_path).await.unwrap();
        assert_eq!(kept.max_parallel, 3);

        ConfigCommand::init(true, Some(config_path.clone())).await.unwrap();
        let replaced = GlobalConfig::load_from(&config_path).await.unwrap();
        assert_eq!(replaced, GlobalConfig::init_example());
    }

    #[tokio::test]
    async fn test_config_show_missing_and_invalid() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");

        assert!(ConfigCommand::show(Some(config_path.clone())).await.is_ok());

        tokio::fs::write(&config_path, "max_parallel = 0\n").await.unwrap();
        assert!(ConfigCommand::show(Some(config_path)).await.is_err());
    }
}
