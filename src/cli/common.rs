//! Shared setup for the analysis commands

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use super::CliConfig;
use crate::config::GlobalConfig;
use crate::freshness::{AnalysisRequest, IncomingAnalyzer};
use crate::github::GitHubClient;
use crate::graph::BuildGraphClient;
use crate::source::normalize_repository_argument;

/// Effective configuration for one command run, with flag overrides applied.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: GlobalConfig,
}

impl CommandContext {
    /// Load the configuration file and apply token/parallelism overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or validated.
    pub async fn load(
        cli: &CliConfig,
        github_token: Option<String>,
        build_graph_token: Option<String>,
        max_parallel: Option<usize>,
    ) -> Result<Self> {
        let config = cli
            .load_global_config()
            .await?
            .with_overrides(github_token, build_graph_token, max_parallel);
        debug!(
            github_api_url = %config.github_api_url,
            build_graph_url = %config.build_graph_url,
            max_parallel = config.max_parallel,
            "Loaded configuration"
        );
        Ok(Self {
            config,
        })
    }

    /// Build an analysis request from the `REPOSITORY` argument.
    ///
    /// # Errors
    ///
    /// [`crate::core::DepflowError::InvalidRepository`] for an empty argument.
    pub fn request(repository: &str, channel_id: u32) -> Result<AnalysisRequest> {
        let repository = normalize_repository_argument(repository)?;
        Ok(AnalysisRequest::new(repository, channel_id))
    }

    /// Wire the HTTP clients, exclusion list, and SLA table into an analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the exclusion list
    /// is malformed.
    pub fn analyzer(&self) -> Result<IncomingAnalyzer> {
        let config = &self.config;
        let graph =
            BuildGraphClient::new(config.build_graph_url.clone(), config.build_graph_token.as_deref())
                .context("Failed to create build graph client")?;
        let history = GitHubClient::new(config.github_api_url.clone(), config.github_token.as_deref())
            .context("Failed to create GitHub client")?;

        Ok(IncomingAnalyzer::new(Arc::new(graph), Arc::new(history))
            .with_exclusions(config.exclusion_policy()?)
            .with_sla(config.sla_evaluator())
            .with_max_parallel(config.max_parallel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_overrides_win_over_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "github_token = \"from-file\"\nmax_parallel = 3\n").await.unwrap();

        let cli = CliConfig {
            config_path: Some(path),
            ..CliConfig::new()
        };
        let context = CommandContext::load(&cli, Some("from-flag".into()), None, None).await.unwrap();
        assert_eq!(context.config.github_token.as_deref(), Some("from-flag"));
        assert_eq!(context.config.max_parallel, 3);
        assert!(context.analyzer().is_ok());
    }

    #[test]
    fn test_request_normalizes_shorthand() {
        let request = CommandContext::request("dotnet/runtime", 1299).unwrap();
        assert_eq!(request.repository, "https://github.com/dotnet/runtime");
        assert_eq!(request.channel_id, 1299);
        assert!(CommandContext::request("  ", 1).is_err());
    }
}
