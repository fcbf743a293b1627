//! Incoming-dependency freshness analysis.
//!
//! [`IncomingAnalyzer`] ties the pieces together for one repository and
//! channel:
//!
//! 1. Fetch the latest build and the graph rooted at it
//! 2. Resolve every direct dependency edge (a dangling edge aborts here,
//!    before any history request is made)
//! 3. Drop dependencies excluded by the [`ExclusionPolicy`]
//! 4. Compare each remaining dependency with its branch, at most
//!    `max_parallel` at a time
//! 5. Resolve the commit age, classify it, and render links
//!
//! History failures are recorded on the affected entry and never fail the
//! report. Cancellation does: a cancelled analysis yields
//! [`DepflowError::Cancelled`] and no partial report.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::report::{build_url, commit_url};
use super::{CommitLag, DependencyFreshnessEntry, FreshnessReport, SlaEvaluator, resolve_lag};
use crate::constants::DEFAULT_MAX_PARALLEL;
use crate::core::DepflowError;
use crate::github::{CommitComparisonClient, HistoryProvider};
use crate::graph::{Build, BuildGraph, BuildGraphProvider, BuildId};
use crate::source::{ExclusionPolicy, RepoReference};

/// What to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Repository URL as known to the build-graph provider
    pub repository: String,
    pub channel_id: u32,
}

impl AnalysisRequest {
    pub fn new(repository: impl Into<String>, channel_id: u32) -> Self {
        Self {
            repository: repository.into(),
            channel_id,
        }
    }
}

/// The latest build of a repository and its direct dependencies.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestBuild {
    pub root: Build,
    /// Direct dependencies in edge order, exclusions not applied
    pub dependencies: Vec<Build>,
}

/// Computes a [`FreshnessReport`] for the latest build of a repository.
///
/// # Examples
///
/// ```rust,no_run
/// use depflow_cli::freshness::{AnalysisRequest, IncomingAnalyzer};
/// use depflow_cli::github::GitHubClient;
/// use depflow_cli::graph::BuildGraphClient;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> anyhow::Result<()> {
/// let analyzer = IncomingAnalyzer::new(
///     Arc::new(BuildGraphClient::new("https://maestro.example", None)?),
///     Arc::new(GitHubClient::new("https://api.github.com", None)?),
/// )
/// .with_max_parallel(4);
///
/// let request = AnalysisRequest::new("https://github.com/dotnet/sdk", 131);
/// let report = analyzer.analyze(&request, &CancellationToken::new()).await?;
/// println!("{} dependencies", report.entries.len());
/// # Ok(())
/// # }
/// ```
pub struct IncomingAnalyzer {
    graph: Arc<dyn BuildGraphProvider>,
    history: CommitComparisonClient,
    exclusions: ExclusionPolicy,
    sla: SlaEvaluator,
    max_parallel: usize,
}

impl IncomingAnalyzer {
    /// Analyzer with the built-in exclusions and SLA table.
    pub fn new(graph: Arc<dyn BuildGraphProvider>, history: Arc<dyn HistoryProvider>) -> Self {
        Self {
            graph,
            history: CommitComparisonClient::new(history),
            exclusions: ExclusionPolicy::default(),
            sla: SlaEvaluator::default(),
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }

    #[must_use]
    pub fn with_exclusions(mut self, exclusions: ExclusionPolicy) -> Self {
        self.exclusions = exclusions;
        self
    }

    #[must_use]
    pub fn with_sla(mut self, sla: SlaEvaluator) -> Self {
        self.sla = sla;
        self
    }

    /// Bound the number of concurrent comparisons (at least 1).
    #[must_use]
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Analyze the latest build of `request.repository`, classifying ages as of now.
    ///
    /// # Errors
    ///
    /// Build-graph provider failures, [`DepflowError::RootBuildMissing`],
    /// [`DepflowError::DanglingDependency`] and [`DepflowError::Cancelled`].
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<FreshnessReport> {
        self.analyze_at(request, cancel, Utc::now()).await
    }

    /// Same as [`analyze`](Self::analyze) with an explicit classification instant.
    pub async fn analyze_at(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
        now: DateTime<Utc>,
    ) -> Result<FreshnessReport> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(DepflowError::Cancelled.into()),
            report = self.run(request, cancel, now) => report,
        }
    }

    /// Fetch the latest build and its direct dependencies without consulting
    /// the history provider.
    ///
    /// # Errors
    ///
    /// Build-graph provider failures and graph integrity violations.
    pub async fn latest(&self, request: &AnalysisRequest) -> Result<LatestBuild> {
        let (root, graph) = self.fetch_graph(request).await?;
        let root = graph.root(root)?;
        let dependencies = graph.direct_dependencies(root)?.into_iter().cloned().collect();
        Ok(LatestBuild {
            root: root.clone(),
            dependencies,
        })
    }

    async fn fetch_graph(
        &self,
        request: &AnalysisRequest,
    ) -> Result<(BuildId, BuildGraph)> {
        let latest = self
            .graph
            .get_latest(&request.repository, request.channel_id)
            .await
            .with_context(|| {
                format!(
                    "Failed to find the latest build of '{}' on channel {}",
                    request.repository, request.channel_id
                )
            })?;
        debug!("Latest build of {} is {}", request.repository, latest.id);

        let graph = self
            .graph
            .get_build_graph(latest.id)
            .await
            .with_context(|| format!("Failed to fetch the build graph of build {}", latest.id))?;
        debug!("Build graph of {} has {} builds", latest.id, graph.len());

        Ok((latest.id, graph))
    }

    async fn run(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
        now: DateTime<Utc>,
    ) -> Result<FreshnessReport> {
        let (root_id, graph) = self.fetch_graph(request).await?;
        let root = graph.root(root_id)?;
        let dependencies = graph.direct_dependencies(root)?;

        let candidates: Vec<(&Build, Option<RepoReference>)> = dependencies
            .into_iter()
            .map(|build| (build, RepoReference::resolve(build.github_repository.as_deref())))
            .filter(|(build, reference)| {
                let include = self.exclusions.should_include(reference.as_ref());
                if !include {
                    debug!("Skipping excluded dependency {} (build {})", build.commit, build.id);
                }
                include
            })
            .collect();

        info!(
            "Evaluating {} dependencies of build {} with up to {} in parallel",
            candidates.len(),
            root.id,
            self.max_parallel
        );

        let mut evaluated: Vec<(usize, DependencyFreshnessEntry)> =
            stream::iter(candidates.into_iter().enumerate())
                .map(|(index, (build, reference))| {
                    let scope = cancel.child_token();
                    async move { (index, self.evaluate(build, reference, &scope, now).await) }
                })
                .buffer_unordered(self.max_parallel)
                .collect()
                .await;

        // buffer_unordered yields in completion order
        evaluated.sort_by_key(|(index, _)| *index);

        Ok(FreshnessReport {
            root: root.clone(),
            entries: evaluated.into_iter().map(|(_, entry)| entry).collect(),
            api_info: self.history.last_api_info(),
            evaluated_at: now,
        })
    }

    async fn evaluate(
        &self,
        build: &Build,
        reference: Option<RepoReference>,
        scope: &CancellationToken,
        now: DateTime<Utc>,
    ) -> DependencyFreshnessEntry {
        let lag = self.measure(build, reference.as_ref(), scope).await;
        let short_name = reference.as_ref().map(|r| r.short_name().to_string());
        let sla = self.sla.classify(short_name.as_deref(), lag.age(), now);

        debug!(
            "Build {} ({}): {} distance={:?} sla={}",
            build.id,
            short_name.as_deref().unwrap_or("-"),
            lag.state(),
            lag.distance(),
            sla
        );

        DependencyFreshnessEntry {
            short_name,
            lag,
            commit_url: commit_url(build),
            build_url: build_url(build),
            sla,
            build: build.clone(),
        }
    }

    async fn measure(
        &self,
        build: &Build,
        reference: Option<&RepoReference>,
        scope: &CancellationToken,
    ) -> CommitLag {
        let Some(reference) = reference else {
            return CommitLag::NoRepository;
        };
        let Some(branch) = build.github_branch.as_deref().filter(|b| !b.is_empty()) else {
            return CommitLag::NoBranch;
        };

        let compared = tokio::select! {
            () = scope.cancelled() => {
                return CommitLag::Failed {
                    reason: DepflowError::Cancelled.to_string(),
                };
            }
            compared = self.history.compare(&reference.owner, &reference.repo, &build.commit, branch) => compared,
        };

        match compared {
            Ok(outcome) => resolve_lag(&outcome, &build.commit),
            Err(e) => {
                error!("Failed to compare {} at {} with '{}': {}", reference, build.commit, branch, e);
                CommitLag::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for IncomingAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingAnalyzer")
            .field("exclusions", &self.exclusions)
            .field("sla", &self.sla)
            .field("max_parallel", &self.max_parallel)
            .finish_non_exhaustive()
    }
}
