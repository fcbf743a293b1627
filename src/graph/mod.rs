//! Build graph model and the build-graph provider interface.
//!
//! A build graph is the transitive closure of build-to-build dependency edges
//! rooted at one build (the latest build of a repository on a channel). The
//! graph is fetched once per analysis and never mutated.
//!
//! # Integrity
//!
//! The provider guarantees that every dependency edge points at a build that
//! is a key of the graph. [`BuildGraph::dependency`] enforces this and turns a
//! violation into [`DepflowError::DanglingDependency`] rather than a generic
//! "not found".
//!
//! # Example
//!
//! ```rust
//! use depflow_cli::graph::{Build, BuildGraph, BuildId, BuildRef};
//! use chrono::Utc;
//!
//! let mut root = Build::new(BuildId(1), "abc123", Utc::now());
//! root.dependencies.push(BuildRef::new(BuildId(2)));
//! let dep = Build::new(BuildId(2), "def456", Utc::now());
//!
//! let graph = BuildGraph::new([root, dep]);
//! let root = graph.root(BuildId(1))?;
//! let first = graph.dependency(root, &root.dependencies[0])?;
//! assert_eq!(first.commit, "def456");
//! # Ok::<(), depflow_cli::core::DepflowError>(())
//! ```

pub mod client;

pub use client::BuildGraphClient;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::core::DepflowError;

/// Typed identity of a build in the build-graph provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(pub i64);

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A dependency edge from one build to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRef {
    /// Target of the edge
    pub build_id: BuildId,
    /// Whether the dependency ships as part of the product
    #[serde(default)]
    pub is_product: bool,
}

impl BuildRef {
    /// Edge to `build_id`, not marked as a product dependency.
    #[must_use]
    pub const fn new(build_id: BuildId) -> Self {
        Self {
            build_id,
            is_product: false,
        }
    }
}

/// One produced artifact with a known source commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: BuildId,
    /// Source-control hash the build was produced from
    pub commit: String,
    #[serde(default, rename = "gitHubRepository")]
    pub github_repository: Option<String>,
    #[serde(default, rename = "gitHubBranch")]
    pub github_branch: Option<String>,
    #[serde(default)]
    pub azure_dev_ops_repository: Option<String>,
    #[serde(default)]
    pub azure_dev_ops_branch: Option<String>,
    #[serde(default)]
    pub azure_dev_ops_account: Option<String>,
    #[serde(default)]
    pub azure_dev_ops_project: Option<String>,
    #[serde(default)]
    pub azure_dev_ops_build_id: Option<i64>,
    #[serde(default)]
    pub azure_dev_ops_build_number: Option<String>,
    pub date_produced: DateTime<Utc>,
    /// Dependency edges in provider order
    #[serde(default)]
    pub dependencies: Vec<BuildRef>,
}

impl Build {
    /// Minimal build with no repository information and no dependencies.
    pub fn new(id: BuildId, commit: impl Into<String>, date_produced: DateTime<Utc>) -> Self {
        Self {
            id,
            commit: commit.into(),
            github_repository: None,
            github_branch: None,
            azure_dev_ops_repository: None,
            azure_dev_ops_branch: None,
            azure_dev_ops_account: None,
            azure_dev_ops_project: None,
            azure_dev_ops_build_id: None,
            azure_dev_ops_build_number: None,
            date_produced,
            dependencies: Vec::new(),
        }
    }

    /// The repository URL to show for this build, preferring GitHub.
    #[must_use]
    pub fn repository(&self) -> Option<&str> {
        self.github_repository.as_deref().or(self.azure_dev_ops_repository.as_deref())
    }
}

/// The subset of a build returned by the latest-build lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    pub id: BuildId,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub date_produced: Option<DateTime<Utc>>,
}

/// Mapping from build identity to build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildGraph {
    builds: HashMap<BuildId, Build>,
}

impl BuildGraph {
    /// Build a graph keyed by each build's own id.
    pub fn new(builds: impl IntoIterator<Item = Build>) -> Self {
        Self {
            builds: builds.into_iter().map(|b| (b.id, b)).collect(),
        }
    }

    /// Look up a build by id.
    #[must_use]
    pub fn get(&self, id: BuildId) -> Option<&Build> {
        self.builds.get(&id)
    }

    /// Look up the designated root of the graph.
    ///
    /// # Errors
    ///
    /// Returns [`DepflowError::RootBuildMissing`] when `id` is not part of the graph.
    pub fn root(&self, id: BuildId) -> Result<&Build, DepflowError> {
        self.get(id).ok_or(DepflowError::RootBuildMissing {
            build: id,
        })
    }

    /// Resolve the target of one of `from`'s dependency edges.
    ///
    /// # Errors
    ///
    /// Returns [`DepflowError::DanglingDependency`] when the edge target is
    /// not a key of the graph.
    pub fn dependency(&self, from: &Build, edge: &BuildRef) -> Result<&Build, DepflowError> {
        self.get(edge.build_id).ok_or(DepflowError::DanglingDependency {
            build: from.id,
            missing: edge.build_id,
        })
    }

    /// Resolve every direct dependency of `from`, in edge order.
    ///
    /// Fails on the first dangling edge.
    pub fn direct_dependencies<'a>(
        &'a self,
        from: &'a Build,
    ) -> Result<Vec<&'a Build>, DepflowError> {
        from.dependencies.iter().map(|edge| self.dependency(from, edge)).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.builds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }
}

/// Read access to the build-graph provider.
///
/// Implemented over HTTP by [`BuildGraphClient`]; tests use in-memory fakes.
#[async_trait]
pub trait BuildGraphProvider: Send + Sync {
    /// Latest build of `repository` published to `channel_id`.
    async fn get_latest(&self, repository: &str, channel_id: u32) -> Result<BuildSummary>;

    /// Graph rooted at `build_id`.
    async fn get_build_graph(&self, build_id: BuildId) -> Result<BuildGraph>;
}
