//! Dependency freshness analysis.
//!
//! Answers, for every direct dependency of a repository's latest build: how
//! many commits behind its branch is it, since when, and is that within the
//! agreed service level?
//!
//! # Components
//!
//! - [`age`] - [`CommitLag`] / [`CommitAge`] and the first-parent mainline walk
//! - [`sla`] - [`SlaOptions`] lookup and [`SlaEvaluator`] classification
//! - [`report`] - [`FreshnessReport`], per-dependency entries, link rendering
//! - [`analyzer`] - [`IncomingAnalyzer`], the bounded-parallel orchestration
//!
//! # Data flow
//!
//! ```text
//! build graph ─▶ RepoReference ─▶ ExclusionPolicy ─▶ compare ─▶ CommitLag ─▶ SlaStatus ─▶ entry
//! ```

pub mod age;
pub mod analyzer;
pub mod report;
pub mod sla;

pub use age::{CommitAge, CommitLag, mainline_successor, resolve_age, resolve_lag};
pub use analyzer::{AnalysisRequest, IncomingAnalyzer, LatestBuild};
pub use report::{DependencyFreshnessEntry, FreshnessReport, FreshnessSummary};
pub use sla::{Sla, SlaEvaluator, SlaOptions, SlaStatus};
