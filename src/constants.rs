//! Global constants used throughout the depflow codebase.
//!
//! This module contains endpoints, timeouts, retry parameters, and SLA
//! defaults that are shared across multiple modules. Defining them centrally
//! keeps magic numbers discoverable.

use std::time::Duration;

/// User agent sent with every outbound HTTP request.
pub const USER_AGENT: &str = "DependencyFlow";

/// Default GitHub REST API endpoint.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default build-graph (Maestro) API endpoint.
pub const DEFAULT_BUILD_GRAPH_URL: &str = "https://maestro-prod.westus2.cloudapp.azure.com";

/// API version pinned for build-graph requests.
pub const BUILD_GRAPH_API_VERSION: &str = "2019-01-16";

/// Timeout applied to each individual HTTP request (30 seconds).
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of dependencies evaluated concurrently.
///
/// Each evaluation performs one comparison call against the history
/// provider, so this bounds the number of in-flight GitHub requests.
pub const DEFAULT_MAX_PARALLEL: usize = 8;

/// Starting delay for comparison retries (100ms).
pub const COMPARE_RETRY_BASE_DELAY_MS: u64 = 100;

/// Maximum delay between comparison retries (2 seconds).
pub const COMPARE_RETRY_MAX_DELAY: Duration = Duration::from_secs(2);

/// Number of retries for transient comparison failures.
pub const COMPARE_RETRY_ATTEMPTS: usize = 3;

/// Key of the mandatory fallback SLA entry.
pub const DEFAULT_SLA_KEY: &str = "[Default]";

/// Organization prefix used when looking up repository-specific SLAs.
pub const DEFAULT_SLA_ORGANIZATION: &str = "dotnet";

/// Default warning threshold, in days since the consumed commit was superseded.
pub const DEFAULT_WARNING_UNCONSUMED_COMMIT_AGE: i64 = 5;

/// Default failure threshold, in days since the consumed commit was superseded.
pub const DEFAULT_FAIL_UNCONSUMED_COMMIT_AGE: i64 = 7;

/// Repositories excluded from freshness tracking unless configured otherwise.
///
/// Blazor does not take part in automated dependency-update PRs, so its lag
/// is not actionable.
pub const DEFAULT_EXCLUDED_REPOSITORIES: &[&str] = &["dotnet/blazor"];
