//! Error handling for depflow
//!
//! This module provides the typed error enum and the user-facing error
//! reporting used by the `depflow` binary. The error system follows two rules:
//! 1. **Strongly-typed errors** for failures callers must tell apart
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`DepflowError`] - Enumerated error types for failures of a whole analysis
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! Per-dependency failures of the history provider are *not* represented here:
//! they are recorded on the affected report entry (see
//! [`crate::freshness::CommitLag::Failed`]) so that a single dependency never
//! blanks the whole report. Only when such an error escapes to `main` (for
//! example from a direct client call) does [`user_friendly_error`] translate a
//! [`HistoryError`] into a suggestion.
//!
//! # Examples
//!
//! ```rust,no_run
//! use depflow_cli::core::{DepflowError, ErrorContext, user_friendly_error};
//!
//! let error = anyhow::Error::from(DepflowError::Cancelled);
//! let context = user_friendly_error(error);
//! context.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::github::HistoryError;
use crate::graph::BuildId;

/// The main error type for depflow operations.
///
/// Each variant describes a failure that aborts the analysis as a whole.
/// Recoverable, per-dependency conditions never show up here.
///
/// # Error Categories
///
/// ## Build graph integrity
/// - [`DanglingDependency`] - An edge references a build the graph does not contain
/// - [`RootBuildMissing`] - The latest build is absent from its own graph
///
/// ## Build graph provider
/// - [`BuildGraphRequestFailed`] - Transport or HTTP failure talking to the provider
/// - [`LatestBuildNotFound`] - No build of the repository exists on the channel
///
/// ## Input and configuration
/// - [`InvalidRepository`] - The repository argument cannot be used
/// - [`ConfigError`] - Configuration file issues
///
/// ## Control flow
/// - [`Cancelled`] - The analysis was cancelled before it completed
///
/// [`DanglingDependency`]: DepflowError::DanglingDependency
/// [`RootBuildMissing`]: DepflowError::RootBuildMissing
/// [`BuildGraphRequestFailed`]: DepflowError::BuildGraphRequestFailed
/// [`LatestBuildNotFound`]: DepflowError::LatestBuildNotFound
/// [`InvalidRepository`]: DepflowError::InvalidRepository
/// [`ConfigError`]: DepflowError::ConfigError
/// [`Cancelled`]: DepflowError::Cancelled
#[derive(Error, Debug)]
pub enum DepflowError {
    /// A dependency edge points at a build id that is not a key of the graph.
    ///
    /// The build-graph provider guarantees that every edge target is part of
    /// the graph, so this is a data-integrity violation. The analysis fails
    /// instead of silently dropping the entry.
    #[error("Build {build} depends on build {missing}, which is missing from the build graph")]
    DanglingDependency {
        /// The build whose dependency list contains the dangling edge
        build: BuildId,
        /// The edge target that could not be found
        missing: BuildId,
    },

    /// The root ("latest") build is not part of the graph fetched for it.
    #[error("Build {build} is missing from its own build graph")]
    RootBuildMissing {
        /// The id returned by the latest-build lookup
        build: BuildId,
    },

    /// A request to the build-graph provider failed.
    #[error("Build graph request failed: {operation}")]
    BuildGraphRequestFailed {
        /// The operation that failed (e.g. "get latest build", "get build graph")
        operation: String,
        /// The underlying reason
        reason: String,
    },

    /// The provider has no build of the repository on the requested channel.
    #[error("No build of '{repository}' found on channel {channel_id}")]
    LatestBuildNotFound {
        /// Repository URL that was looked up
        repository: String,
        /// Channel that was searched
        channel_id: u32,
    },

    /// The repository argument is empty or otherwise unusable.
    #[error("Invalid repository: '{input}'")]
    InvalidRepository {
        /// The raw argument as given
        input: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// The analysis was cancelled; no partial report is produced.
    #[error("Analysis was cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for DepflowError {
    fn clone(&self) -> Self {
        match self {
            Self::DanglingDependency {
                build,
                missing,
            } => Self::DanglingDependency {
                build: *build,
                missing: *missing,
            },
            Self::RootBuildMissing {
                build,
            } => Self::RootBuildMissing {
                build: *build,
            },
            Self::BuildGraphRequestFailed {
                operation,
                reason,
            } => Self::BuildGraphRequestFailed {
                operation: operation.clone(),
                reason: reason.clone(),
            },
            Self::LatestBuildNotFound {
                repository,
                channel_id,
            } => Self::LatestBuildNotFound {
                repository: repository.clone(),
                channel_id: *channel_id,
            },
            Self::InvalidRepository {
                input,
            } => Self::InvalidRepository {
                input: input.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::Cancelled => Self::Cancelled,
            // io::Error is not Clone; keep kind and message
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            // toml::de::Error is not Clone either
            Self::TomlError(e) => Self::ConfigError {
                message: e.to_string(),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information.
///
/// Combines a [`DepflowError`] with an optional suggestion (printed in green)
/// and optional details (printed in yellow).
///
/// # Examples
///
/// ```rust,no_run
/// use depflow_cli::core::{DepflowError, ErrorContext};
///
/// let context = ErrorContext::new(DepflowError::Cancelled)
///     .with_suggestion("Re-run the command and let it finish")
///     .with_details("Cancelled analyses never produce a partial report");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: DepflowError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: DepflowError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions.
///
/// Recognizes [`DepflowError`], [`HistoryError`], [`std::io::Error`] and
/// [`toml::de::Error`]; everything else is reported with its full cause chain.
///
/// # Examples
///
/// ```rust,no_run
/// use depflow_cli::core::user_friendly_error;
///
/// let error = anyhow::anyhow!("Something went wrong");
/// let context = user_friendly_error(error);
///
/// context.display();
/// ```
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(depflow_error) = error.downcast_ref::<DepflowError>() {
        return create_error_context(depflow_error.clone());
    }

    if let Some(history_error) = error.downcast_ref::<HistoryError>() {
        return create_history_error_context(history_error);
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(DepflowError::IoError(std::io::Error::new(
                    io_error.kind(),
                    io_error.to_string(),
                )))
                .with_suggestion("Check the ownership and permissions of the configuration file")
                .with_details("depflow could not read or write a file it needs");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(DepflowError::IoError(std::io::Error::new(
                    io_error.kind(),
                    io_error.to_string(),
                )))
                .with_suggestion("Check that the file exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(DepflowError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of your depflow configuration file")
        .with_details("Run 'depflow config path' to see which file is being read");
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(DepflowError::Other {
        message,
    })
}

fn create_history_error_context(error: &HistoryError) -> ErrorContext {
    let context = ErrorContext::new(DepflowError::Other {
        message: error.to_string(),
    });
    match error {
        HistoryError::Unauthorized => context
            .with_suggestion("Set GITHUB_TOKEN or 'github_token' in the depflow config to a valid token")
            .with_details("GitHub rejected the credentials used for the comparison request"),
        HistoryError::RateLimited {
            ..
        } => context
            .with_suggestion("Wait for the rate limit to reset or configure an authenticated GitHub token")
            .with_details("Unauthenticated GitHub requests share a small hourly quota"),
        _ => context,
    }
}

/// Attach suggestions and details to a specific [`DepflowError`].
fn create_error_context(error: DepflowError) -> ErrorContext {
    match &error {
        DepflowError::DanglingDependency {
            build,
            missing,
        } => {
            let details = format!(
                "Build {build} lists build {missing} as a dependency, but the provider did not include it in the graph"
            );
            ErrorContext::new(error)
                .with_suggestion("Report the inconsistent build graph to the build-graph provider owners")
                .with_details(details)
        }

        DepflowError::RootBuildMissing {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Retry the analysis; the graph may have been fetched while the build was being registered"),

        DepflowError::BuildGraphRequestFailed {
            reason,
            ..
        } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_suggestion("Check 'build_graph_url' and 'build_graph_token' in the depflow config")
                .with_details(details)
        }

        DepflowError::LatestBuildNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Verify the repository URL and the channel id; use 'depflow latest' to probe a channel"),

        DepflowError::InvalidRepository {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pass a repository URL such as https://github.com/dotnet/runtime or the shorthand dotnet/runtime"),

        DepflowError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run 'depflow config show' to inspect the effective configuration"),

        DepflowError::Cancelled => ErrorContext::new(error)
            .with_details("Cancelled analyses never produce a partial report"),

        _ => ErrorContext::new(error),
    }
}
