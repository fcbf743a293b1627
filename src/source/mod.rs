//! Upstream source repository handling.
//!
//! Builds carry free-form repository identifiers. This module turns them into
//! structured references and decides which repositories take part in
//! freshness tracking.
//!
//! # Components
//!
//! - [`RepoReference`] - `owner/repo` pair parsed from a GitHub URL
//! - [`normalize_repository_argument`] - Accept `owner/repo` shorthand and URL-encoded input
//! - [`ExclusionPolicy`] - Case-insensitive deny list of repositories

pub mod exclusion;
pub mod reference;

pub use exclusion::ExclusionPolicy;
pub use reference::{RepoReference, normalize_repository_argument};
