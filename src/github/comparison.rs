//! Commit comparison with recoverable "not found".
//!
//! A dependency may reference a repository that was renamed, deleted, or made
//! private, or a commit that never reached GitHub. None of those should fail
//! the analysis, so [`CommitComparisonClient`] turns
//! [`HistoryError::NotFound`] into [`ComparisonOutcome::NotFound`] and logs a
//! warning. Every other error still propagates.

use std::sync::Arc;
use tracing::warn;

use super::{ApiInfo, CommitComparison, HistoryError, HistoryProvider};

/// Outcome of a comparison that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonOutcome {
    Found(CommitComparison),
    /// The provider does not know the repository, the base, or the head
    NotFound,
}

/// Thin wrapper over a [`HistoryProvider`].
#[derive(Clone)]
pub struct CommitComparisonClient {
    provider: Arc<dyn HistoryProvider>,
}

impl CommitComparisonClient {
    pub fn new(provider: Arc<dyn HistoryProvider>) -> Self {
        Self {
            provider,
        }
    }

    /// Compare `base` (the consumed commit) with `head` (the tracked branch).
    ///
    /// # Errors
    ///
    /// Any [`HistoryError`] other than [`HistoryError::NotFound`].
    pub async fn compare(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<ComparisonOutcome, HistoryError> {
        match self.provider.compare(owner, repo, base, head).await {
            Ok(comparison) => Ok(ComparisonOutcome::Found(comparison)),
            Err(HistoryError::NotFound) => {
                warn!(
                    owner,
                    repo,
                    base,
                    head,
                    "Failed to compare commit history for '{}/{}' between '{}' and '{}'",
                    owner,
                    repo,
                    base,
                    head
                );
                Ok(ComparisonOutcome::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    /// Rate-limit metadata of the underlying provider.
    #[must_use]
    pub fn last_api_info(&self) -> Option<ApiInfo> {
        self.provider.last_api_info()
    }
}

impl std::fmt::Debug for CommitComparisonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitComparisonClient").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeHistoryProvider, LogCapture, comparison};

    #[tokio::test]
    async fn test_found_passes_through() {
        let fake = Arc::new(
            FakeHistoryProvider::new().with_comparison("dotnet", "runtime", comparison(3, vec![])),
        );
        let client = CommitComparisonClient::new(fake.clone());

        let outcome = client.compare("dotnet", "runtime", "abc", "main").await.unwrap();
        assert_eq!(outcome, ComparisonOutcome::Found(comparison(3, vec![])));
        assert_eq!(fake.calls().len(), 1);
        assert_eq!(fake.calls()[0].base, "abc");
        assert_eq!(fake.calls()[0].head, "main");
    }

    #[tokio::test]
    async fn test_not_found_is_recoverable() {
        let logs = LogCapture::new();
        let _guard = logs.install();
        let client = CommitComparisonClient::new(Arc::new(FakeHistoryProvider::new()));

        let outcome = client.compare("dotnet", "gone", "abc123", "main").await.unwrap();
        assert_eq!(outcome, ComparisonOutcome::NotFound);

        let warnings = logs.lines_containing("WARN");
        assert_eq!(warnings.len(), 1, "captured: {}", logs.contents());
        for field in [r#"owner="dotnet""#, r#"repo="gone""#, r#"base="abc123""#, r#"head="main""#] {
            assert!(warnings[0].contains(field), "missing {field} in {}", warnings[0]);
        }
    }

    #[tokio::test]
    async fn test_found_logs_nothing() {
        let logs = LogCapture::new();
        let _guard = logs.install();
        let fake =
            FakeHistoryProvider::new().with_comparison("dotnet", "runtime", comparison(1, vec![]));
        let client = CommitComparisonClient::new(Arc::new(fake));

        client.compare("dotnet", "runtime", "abc", "main").await.unwrap();
        assert!(logs.lines_containing("WARN").is_empty());
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let fake = FakeHistoryProvider::new().with_error("dotnet", "runtime", HistoryError::Unauthorized);
        let client = CommitComparisonClient::new(Arc::new(fake));

        let err = client.compare("dotnet", "runtime", "abc", "main").await.unwrap_err();
        assert_eq!(err, HistoryError::Unauthorized);
    }
}
