//! Show the latest build of a repository and its direct dependencies.
//!
//! Unlike `incoming`, this command only talks to the build-graph service; no
//! GitHub comparison requests are made.
//!
//! ```bash
//! depflow latest dotnet/sdk --channel 1299
//! depflow latest dotnet/sdk --channel 1299 --format json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::CliConfig;
use super::common::CommandContext;
use crate::core::DepflowError;
use crate::freshness::LatestBuild;
use crate::freshness::report::{BuildJson, build_url, commit_url};
use crate::graph::Build;
use crate::source::RepoReference;
use crate::utils::ProgressBar;

/// Arguments for `depflow latest`.
#[derive(Debug, Args)]
pub struct LatestCommand {
    /// Repository URL or `owner/repo` shorthand
    #[arg(value_name = "REPOSITORY")]
    pub repository: String,

    /// Build-graph channel id
    #[arg(long, value_name = "ID")]
    pub channel: u32,

    /// Output format: table or json
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Token for the build-graph service
    #[arg(long, env = "DEPFLOW_BUILD_GRAPH_TOKEN", hide_env_values = true)]
    pub build_graph_token: Option<String>,

    #[arg(skip)]
    pub no_progress: bool,
}

#[derive(Debug, Serialize)]
struct LatestBuildJson {
    build: BuildJson,
    build_url: Option<String>,
    commit_url: Option<String>,
    dependencies: Vec<DependencyJson>,
}

#[derive(Debug, Serialize)]
struct DependencyJson {
    name: Option<String>,
    #[serde(flatten)]
    build: BuildJson,
    commit_url: Option<String>,
}

impl From<&LatestBuild> for LatestBuildJson {
    fn from(latest: &LatestBuild) -> Self {
        Self {
            build: BuildJson::from(&latest.root),
            build_url: build_url(&latest.root),
            commit_url: commit_url(&latest.root),
            dependencies: latest
                .dependencies
                .iter()
                .map(|dep| DependencyJson {
                    name: short_name(dep),
                    build: BuildJson::from(dep),
                    commit_url: commit_url(dep),
                })
                .collect(),
        }
    }
}

fn short_name(build: &Build) -> Option<String> {
    RepoReference::resolve(build.repository()).map(|r| r.short_name().to_string())
}

impl LatestCommand {
    /// Fetch and print the latest build.
    ///
    /// # Errors
    ///
    /// Configuration errors, build-graph failures, graph integrity violations,
    /// and cancellation.
    pub async fn execute(self, cli: &CliConfig, cancel: &CancellationToken) -> Result<()> {
        let request = CommandContext::request(&self.repository, self.channel)?;
        let context = CommandContext::load(cli, None, self.build_graph_token.clone(), None).await?;
        let analyzer = context.analyzer()?;

        let spinner = ProgressBar::new_spinner(!self.no_progress);
        spinner.set_message(format!("Fetching latest build of {}", request.repository));
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(DepflowError::Cancelled.into()),
            latest = analyzer.latest(&request) => latest,
        };
        spinner.finish_and_clear();
        let latest = result?;

        match self.format.as_str() {
            "json" => {
                println!("{}", serde_json::to_string_pretty(&LatestBuildJson::from(&latest))?);
            }
            _ => Self::display_table(&latest),
        }
        Ok(())
    }

    fn display_table(latest: &LatestBuild) {
        let root = &latest.root;
        println!("{}", "Latest build".bold());
        println!("  Id:        {}", root.id);
        if let Some(number) = &root.azure_dev_ops_build_number {
            println!("  Number:    {number}");
        }
        println!("  Commit:    {}", root.commit);
        println!("  Produced:  {}", root.date_produced.format("%Y-%m-%d %H:%M:%S UTC"));
        if let Some(url) = build_url(root) {
            println!("  Build:     {}", url.cyan());
        }

        if latest.dependencies.is_empty() {
            println!("\n{}", "No direct dependencies.".green());
            return;
        }

        println!(
            "\n{:<30} {:<10} {:<42} {:<20}",
            "Dependency".bold(),
            "Build".bold(),
            "Commit".bold(),
            "Branch".bold()
        );
        println!("{}", "─".repeat(105));
        for dep in &latest.dependencies {
            let name = short_name(dep)
                .or_else(|| dep.repository().map(str::to_string))
                .unwrap_or_else(|| "(unknown repository)".to_string());
            let branch =
                dep.github_branch.as_deref().or(dep.azure_dev_ops_branch.as_deref()).unwrap_or("-");
            println!(
                "{:<30} {:<10} {:<42} {:<20}",
                name,
                dep.id.to_string(),
                dep.commit,
                branch.bright_black()
            );
        }
    }
}
