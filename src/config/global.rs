//! Global configuration for depflow.
//!
//! This module handles the user configuration file (`~/.depflow/config.toml`)
//! which stores service endpoints, access tokens, the exclusion list, and the
//! SLA table. The file may hold credentials, so it is written with owner-only
//! permissions on Unix.
//!
//! # Configuration File Location
//!
//! - **Unix/macOS**: `~/.depflow/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\depflow\config.toml`
//! - **Override**: `--config <path>` on the command line
//!
//! A missing file is not an error; every field has a default.
//!
//! # File Format
//!
//! ```toml
//! github_api_url = "https://api.github.com"
//! github_token = "ghp_xxxxxxxxxxxx"
//! build_graph_url = "https://maestro-prod.westus2.cloudapp.azure.com"
//! build_graph_token = "xxxxxxxx"
//! max_parallel = 8
//! excluded_repositories = ["dotnet/blazor"]
//!
//! [sla]
//! organization = "dotnet"
//!
//! [sla.repositories."[Default]"]
//! warning_unconsumed_commit_age = 5
//! fail_unconsumed_commit_age = 7
//! ```
//!
//! # Token Precedence
//!
//! Tokens given on the command line or through `GITHUB_TOKEN` /
//! `DEPFLOW_BUILD_GRAPH_TOKEN` override the file (see [`GlobalConfig::with_overrides`]).
//!
//! # Examples
//!
//! ```rust,no_run
//! use depflow_cli::config::GlobalConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = GlobalConfig::load().await?;
//! println!("Comparing against {}", config.github_api_url);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use url::Url;

use crate::constants::{
    DEFAULT_BUILD_GRAPH_URL, DEFAULT_EXCLUDED_REPOSITORIES, DEFAULT_GITHUB_API_URL,
    DEFAULT_MAX_PARALLEL,
};
use crate::core::DepflowError;
use crate::freshness::{SlaEvaluator, SlaOptions};
use crate::source::ExclusionPolicy;

const MASK: &str = "********";

fn default_github_api_url() -> String {
    DEFAULT_GITHUB_API_URL.to_string()
}

fn default_build_graph_url() -> String {
    DEFAULT_BUILD_GRAPH_URL.to_string()
}

const fn default_max_parallel() -> usize {
    DEFAULT_MAX_PARALLEL
}

fn default_excluded_repositories() -> Vec<String> {
    DEFAULT_EXCLUDED_REPOSITORIES.iter().map(|r| (*r).to_string()).collect()
}

/// User-wide depflow configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// GitHub REST API endpoint
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    /// Token used for comparison requests; anonymous when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,

    /// Build-graph provider endpoint
    #[serde(default = "default_build_graph_url")]
    pub build_graph_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_graph_token: Option<String>,

    /// Concurrent comparison requests per analysis
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// `owner/repo` entries left out of every report
    #[serde(default = "default_excluded_repositories")]
    pub excluded_repositories: Vec<String>,

    #[serde(default)]
    pub sla: SlaOptions,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            github_api_url: default_github_api_url(),
            github_token: None,
            build_graph_url: default_build_graph_url(),
            build_graph_token: None,
            max_parallel: default_max_parallel(),
            excluded_repositories: default_excluded_repositories(),
            sla: SlaOptions::default(),
        }
    }
}

impl GlobalConfig {
    /// Load the configuration from the default location, or defaults if the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path` when given, else from the default location.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load the configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or fails [`validate`](Self::validate).
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize global config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write global config to {}", path.display()))?;

        // Tokens live here; keep the file private
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(path)
                .await
                .with_context(|| format!("Failed to read permissions for {}", path.display()))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).await.with_context(|| {
                format!("Failed to set secure permissions on {}", path.display())
            })?;
        }

        Ok(())
    }

    /// Platform default configuration path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data) directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("depflow")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".depflow")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Check values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// [`DepflowError::ConfigError`] for unparsable endpoints, a zero
    /// `max_parallel`, or malformed exclusion entries.
    pub fn validate(&self) -> Result<(), DepflowError> {
        for (field, value) in
            [("github_api_url", &self.github_api_url), ("build_graph_url", &self.build_graph_url)]
        {
            Url::parse(value).map_err(|e| DepflowError::ConfigError {
                message: format!("{field} '{value}' is not a valid URL: {e}"),
            })?;
        }

        if self.max_parallel == 0 {
            return Err(DepflowError::ConfigError {
                message: "max_parallel must be at least 1".to_string(),
            });
        }

        ExclusionPolicy::new(&self.excluded_repositories)?;
        Ok(())
    }

    /// Apply command-line and environment overrides. `None` keeps the file value.
    #[must_use]
    pub fn with_overrides(
        mut self,
        github_token: Option<String>,
        build_graph_token: Option<String>,
        max_parallel: Option<usize>,
    ) -> Self {
        if github_token.is_some() {
            self.github_token = github_token;
        }
        if build_graph_token.is_some() {
            self.build_graph_token = build_graph_token;
        }
        if let Some(max_parallel) = max_parallel {
            self.max_parallel = max_parallel.max(1);
        }
        self
    }

    /// The configured exclusion list.
    ///
    /// # Errors
    ///
    /// [`DepflowError::ConfigError`] for malformed entries.
    pub fn exclusion_policy(&self) -> Result<ExclusionPolicy, DepflowError> {
        ExclusionPolicy::new(&self.excluded_repositories)
    }

    #[must_use]
    pub fn sla_evaluator(&self) -> SlaEvaluator {
        SlaEvaluator::new(self.sla.clone())
    }

    /// Copy with tokens replaced by a mask, for display.
    #[must_use]
    pub fn masked(&self) -> Self {
        let mask = |token: &Option<String>| token.as_ref().map(|_| MASK.to_string());
        Self {
            github_token: mask(&self.github_token),
            build_graph_token: mask(&self.build_graph_token),
            ..self.clone()
        }
    }

    /// Starter configuration written by `depflow config init`.
    #[must_use]
    pub fn init_example() -> Self {
        Self {
            github_token: Some("YOUR_GITHUB_TOKEN".to_string()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freshness::Sla;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config =
            GlobalConfig::load_with_optional(Some(temp.path().join("absent.toml"))).await.unwrap();
        assert_eq!(config, GlobalConfig::default());
        assert_eq!(config.excluded_repositories, vec!["dotnet/blazor".to_string()]);
        assert_eq!(config.max_parallel, DEFAULT_MAX_PARALLEL);
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = GlobalConfig::default();
        config.github_token = Some("ghp_secret".to_string());
        config.excluded_repositories = vec!["dotnet/blazor".into(), "contoso/legacy".into()];
        config.sla.repositories.insert(
            "dotnet/runtime".into(),
            Sla {
                warning_unconsumed_commit_age: 2,
                fail_unconsumed_commit_age: 3,
            },
        );

        config.save_to(&path).await.unwrap();
        let loaded = GlobalConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "max_parallel = 2\n").await.unwrap();

        let config = GlobalConfig::load_from(&path).await.unwrap();
        assert_eq!(config.max_parallel, 2);
        assert_eq!(config.github_api_url, DEFAULT_GITHUB_API_URL);
        assert_eq!(config.sla, SlaOptions::default());
    }

    #[tokio::test]
    async fn test_invalid_values_are_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        for content in [
            "max_parallel = 0\n",
            "github_api_url = \"not a url\"\n",
            "excluded_repositories = [\"blazor\"]\n",
        ] {
            tokio::fs::write(&path, content).await.unwrap();
            let err = GlobalConfig::load_from(&path).await.unwrap_err();
            assert!(
                matches!(err.downcast_ref::<DepflowError>(), Some(DepflowError::ConfigError { .. })),
                "{content} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_toml_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "max_parallel = [").await.unwrap();

        let err = GlobalConfig::load_from(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse global config"));
    }

    #[test]
    fn test_overrides_and_masking() {
        let mut config = GlobalConfig::default();
        config.github_token = Some("from-file".into());

        let config = config.with_overrides(None, Some("graph".into()), Some(0));
        assert_eq!(config.github_token.as_deref(), Some("from-file"));
        assert_eq!(config.build_graph_token.as_deref(), Some("graph"));
        assert_eq!(config.max_parallel, 1);

        let masked = config.masked();
        assert_eq!(masked.github_token.as_deref(), Some(MASK));
        assert_eq!(masked.build_graph_token.as_deref(), Some(MASK));
        assert_eq!(GlobalConfig::default().masked().github_token, None);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_config_file_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        GlobalConfig::init_example().save_to(&path).await.unwrap();

        let mode = tokio::fs::metadata(&path).await.unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "Config file should have 600 permissions");
    }
}
