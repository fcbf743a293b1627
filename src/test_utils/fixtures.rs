//! Fixture builders for builds and comparison windows.

use chrono::{DateTime, TimeZone, Utc};

use crate::github::{CommitComparison, ComparedCommit};
use crate::graph::{Build, BuildId};

/// Midnight UTC on the given day.
///
/// # Panics
///
/// Panics on an invalid date.
#[must_use]
pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single().expect("valid fixture date")
}

/// A build with no repository and no dependencies, produced on 2024-01-01.
#[must_use]
pub fn build(id: i64, commit: &str) -> Build {
    Build::new(BuildId(id), commit, utc(2024, 1, 1))
}

/// A build from a GitHub repository, optionally tracking `branch`.
#[must_use]
pub fn github_build(id: i64, commit: &str, repository: &str, branch: Option<&str>) -> Build {
    let mut build = build(id, commit);
    build.github_repository = Some(repository.to_string());
    build.github_branch = branch.map(str::to_string);
    build
}

/// A commit of a comparison window.
#[must_use]
pub fn commit(sha: &str, parents: &[&str], committer_date: DateTime<Utc>) -> ComparedCommit {
    ComparedCommit {
        sha: sha.to_string(),
        parents: parents.iter().map(|p| (*p).to_string()).collect(),
        committer_date,
    }
}

/// A comparison result.
#[must_use]
pub fn comparison(ahead_by: u32, commits: Vec<ComparedCommit>) -> CommitComparison {
    CommitComparison {
        ahead_by,
        commits,
    }
}
