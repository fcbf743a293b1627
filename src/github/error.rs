//! Errors returned by the history provider.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure of a single history comparison.
///
/// These never abort an analysis on their own. [`NotFound`] becomes an entry
/// with unknown lag; every other variant is recorded on the affected entry.
///
/// [`NotFound`]: HistoryError::NotFound
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// Repository, base commit, or head ref is unknown to GitHub.
    #[error("Repository or commit not found")]
    NotFound,

    /// The configured credentials were rejected.
    #[error("GitHub rejected the configured credentials (HTTP 401)")]
    Unauthorized,

    /// The API quota is exhausted.
    #[error("GitHub API rate limit exceeded{}", reset_suffix(.reset_at))]
    RateLimited {
        /// When the quota resets, if the response said so
        reset_at: Option<DateTime<Utc>>,
    },

    /// Access denied for a reason other than the rate limit.
    #[error("GitHub denied access (HTTP 403): {message}")]
    Forbidden {
        message: String,
    },

    /// Any other non-success status.
    #[error("GitHub returned HTTP {status}: {message}")]
    UnexpectedStatus {
        status: u16,
        message: String,
    },

    /// The request never produced a response.
    #[error("Network error talking to GitHub: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("Failed to decode GitHub response: {0}")]
    Decode(String),
}

impl HistoryError {
    /// Whether retrying the same request may succeed.
    ///
    /// Only transport failures and server-side (5xx) errors qualify.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::UnexpectedStatus {
                status,
                ..
            } => *status >= 500,
            _ => false,
        }
    }
}

fn reset_suffix(reset_at: &Option<DateTime<Utc>>) -> String {
    reset_at.map(|at| format!(" (resets at {})", at.to_rfc3339())).unwrap_or_default()
}
