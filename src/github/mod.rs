//! Access to upstream source-control history on GitHub.
//!
//! The freshness analysis needs exactly one history operation: comparing the
//! commit a dependency was built from with the tip of its tracked branch. This
//! module defines that operation as the [`HistoryProvider`] trait, the data it
//! returns, and two layers on top of it:
//!
//! - [`GitHubClient`] - `reqwest` implementation against the GitHub REST API,
//!   with rate-limit tracking and retry of transient failures
//! - [`CommitComparisonClient`] - Turns "not found" into a recoverable
//!   [`ComparisonOutcome::NotFound`] and logs it
//!
//! # Direction
//!
//! Comparisons are always `base = consumed commit`, `head = branch`. The
//! provider's `ahead_by` therefore counts commits the branch has gained since
//! the commit was consumed, which is how far the dependency lags.

pub mod client;
pub mod comparison;
pub mod error;

pub use client::GitHubClient;
pub use comparison::{CommitComparisonClient, ComparisonOutcome};
pub use error::HistoryError;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of comparing a base commit with a head ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitComparison {
    /// Number of commits head has that base does not
    pub ahead_by: u32,
    /// Commits between base and head in provider order (oldest first)
    pub commits: Vec<ComparedCommit>,
}

/// One commit of a comparison window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparedCommit {
    pub sha: String,
    /// Parent hashes, first parent first
    pub parents: Vec<String>,
    pub committer_date: DateTime<Utc>,
}

impl ComparedCommit {
    /// The mainline predecessor of this commit, if any.
    #[must_use]
    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }
}

/// Rate-limit quota reported by the history provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: u32,
    pub remaining: u32,
    /// When the quota window resets
    pub reset: DateTime<Utc>,
}

/// Metadata about the most recent provider response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiInfo {
    pub rate_limit: RateLimit,
}

/// Read access to source-control history.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Compare `base` with `head` in `owner/repo`.
    ///
    /// # Errors
    ///
    /// [`HistoryError::NotFound`] when the repository or either ref is unknown
    /// to the provider; other variants for authorization, quota, transport and
    /// decoding failures.
    async fn compare(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<CommitComparison, HistoryError>;

    /// Metadata recorded from the last response, if any request has completed.
    fn last_api_info(&self) -> Option<ApiInfo>;
}
