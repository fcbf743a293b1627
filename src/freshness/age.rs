//! Commit lag and commit age resolution.
//!
//! A dependency was built from some commit `C` of its repository. Its *lag* is
//! measured by comparing `C` (base) with the tracked branch (head):
//!
//! - **Distance** is the provider's `ahead_by`, i.e. how many commits the
//!   branch gained after `C`. That is exactly how far the dependency is
//!   behind.
//! - **Age** is the moment `C` stopped being current: the committer date of
//!   its *mainline successor*, the commit on the branch's first-parent chain
//!   whose first parent is `C`.
//!
//! Neither the build's own production date nor the oldest commit of the
//! window is used for age. CI lags real time, and a comparison window also
//! contains side-branch commits brought in by merges whose dates say nothing
//! about when `C` was superseded.
//!
//! # Mainline walk
//!
//! The walk starts at the newest commit of the window (last in provider
//! order) and follows first parents by hash through the window until it finds
//! the commit whose first parent is `C`:
//!
//! ```text
//!   C ── m1 ── m2 ── m3 (head)
//!         \        /
//!          s1 ── s2
//!
//!   m3 → m2 → m1, and m1's first parent is C  ⇒  age = m1.committer_date
//! ```
//!
//! It gives up when a first parent is outside the window, when a commit has no
//! parents, or after visiting as many commits as the window holds. A rebased or
//! force-pushed branch typically ends up here.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::warn;

use crate::github::{CommitComparison, ComparedCommit, ComparisonOutcome};

/// How long ago the consumed commit was superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitAge {
    /// Committer date of the mainline successor
    Resolved(DateTime<Utc>),
    /// The branch has no commits the consumed commit lacks
    NoNewerCommits,
    /// The mainline walk could not connect the window to the consumed commit
    Unresolvable,
}

impl CommitAge {
    #[must_use]
    pub const fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Resolved(at) => Some(*at),
            Self::NoNewerCommits | Self::Unresolvable => None,
        }
    }
}

/// Freshness measurement of one dependency.
///
/// Each variant is a distinct reason why distance or age may be unknown, so
/// "nothing to compare" and "comparison failed" never collapse into the same
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitLag {
    /// The build has no GitHub repository reference
    NoRepository,
    /// The build has a repository but no tracked branch to compare with
    NoBranch,
    /// The history provider does not know the repository, commit, or branch
    NotFound,
    /// The comparison failed (authorization, quota, transport, ...)
    Failed {
        reason: String,
    },
    /// The comparison succeeded
    Compared {
        distance: u32,
        age: CommitAge,
    },
}

impl CommitLag {
    /// Commits the dependency is behind its branch, when known.
    #[must_use]
    pub const fn distance(&self) -> Option<u32> {
        match self {
            Self::Compared {
                distance,
                ..
            } => Some(*distance),
            _ => None,
        }
    }

    /// When the consumed commit was superseded, when known.
    #[must_use]
    pub const fn age(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Compared {
                age,
                ..
            } => age.timestamp(),
            _ => None,
        }
    }

    /// Short machine-readable name of the state.
    #[must_use]
    pub const fn state(&self) -> &'static str {
        match self {
            Self::NoRepository => "no_repository",
            Self::NoBranch => "no_branch",
            Self::NotFound => "not_found",
            Self::Failed {
                ..
            } => "failed",
            Self::Compared {
                age: CommitAge::Resolved(_),
                ..
            } => "compared",
            Self::Compared {
                age: CommitAge::NoNewerCommits,
                ..
            } => "up_to_date",
            Self::Compared {
                age: CommitAge::Unresolvable,
                ..
            } => "unresolved_history",
        }
    }
}

/// Turn a comparison outcome into a [`CommitLag`].
#[must_use]
pub fn resolve_lag(outcome: &ComparisonOutcome, consumed: &str) -> CommitLag {
    match outcome {
        ComparisonOutcome::NotFound => CommitLag::NotFound,
        ComparisonOutcome::Found(comparison) => CommitLag::Compared {
            distance: comparison.ahead_by,
            age: resolve_age(comparison, consumed),
        },
    }
}

/// Resolve the age of `consumed` from a comparison whose base is `consumed`.
#[must_use]
pub fn resolve_age(comparison: &CommitComparison, consumed: &str) -> CommitAge {
    if comparison.commits.is_empty() {
        return CommitAge::NoNewerCommits;
    }

    match mainline_successor(&comparison.commits, consumed) {
        Some(successor) => CommitAge::Resolved(successor.committer_date),
        None => {
            warn!(
                consumed,
                window = comparison.commits.len(),
                "Could not find the mainline successor of '{}' in the comparison window",
                consumed
            );
            CommitAge::Unresolvable
        }
    }
}

/// The commit of `window` whose first parent is `consumed`, reached from the
/// newest commit through first-parent links only.
#[must_use]
pub fn mainline_successor<'a>(
    window: &'a [ComparedCommit],
    consumed: &str,
) -> Option<&'a ComparedCommit> {
    let by_sha: HashMap<&str, &ComparedCommit> =
        window.iter().map(|c| (c.sha.as_str(), c)).collect();

    let mut current = window.last()?;
    for _ in 0..window.len() {
        let parent = current.first_parent()?;
        if parent == consumed {
            return Some(current);
        }
        current = *by_sha.get(parent)?;
    }
    None
}
