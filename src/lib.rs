//! depflow - dependency freshness analysis for build graphs
//!
//! Given a repository and a build channel, depflow fetches the latest build of
//! that repository from the build-graph service, looks at each direct
//! dependency build, and asks GitHub how far the dependency's branch has moved
//! past the commit that was consumed. Each dependency is then classified as
//! OK, Warning, or Fail against a per-repository SLA of day thresholds.
//!
//! # Architecture Overview
//!
//! ```text
//! BuildGraphProvider ──► IncomingAnalyzer ──► FreshnessReport ──► CLI table / JSON
//!                             │
//!         ExclusionPolicy ◄───┤
//!         RepoReference   ◄───┤
//!    CommitComparisonClient ◄─┤──► HistoryProvider (GitHub compare API)
//!         CommitAge walk  ◄───┤
//!         SlaEvaluator    ◄───┘
//! ```
//!
//! # Core Modules
//!
//! - [`graph`] - Builds, typed build ids, the build graph and its HTTP client
//! - [`source`] - Repository URL resolution and the exclusion list
//! - [`github`] - Commit comparison through the GitHub REST API
//! - [`freshness`] - Commit lag and age resolution, SLA classification, the analyzer
//! - [`config`] - The user configuration file (`~/.depflow/config.toml`)
//! - [`core`] - Error types and user-facing error formatting
//! - [`cli`] - The `depflow` command-line interface
//! - [`utils`] - Progress spinner and small helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use depflow_cli::freshness::{AnalysisRequest, IncomingAnalyzer};
//! use depflow_cli::github::GitHubClient;
//! use depflow_cli::graph::BuildGraphClient;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let graph = BuildGraphClient::new("https://maestro-prod.westus2.cloudapp.azure.com", None)?;
//! let github = GitHubClient::new("https://api.github.com", None)?;
//! let analyzer = IncomingAnalyzer::new(Arc::new(graph), Arc::new(github));
//!
//! let request = AnalysisRequest::new("https://github.com/dotnet/aspnetcore", 1299);
//! let report = analyzer.analyze(&request, &CancellationToken::new()).await?;
//! for entry in &report.entries {
//!     println!("{}: {}", entry.display_name(), entry.sla);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod freshness;
pub mod github;
pub mod graph;
pub mod source;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
