//! GitHub REST implementation of [`HistoryProvider`].
//!
//! Calls `GET {api}/repos/{owner}/{repo}/compare/{base}...{head}` and maps the
//! response onto [`CommitComparison`]. After every response, successful or
//! not, the `x-ratelimit-*` headers are recorded so the front end can show the
//! remaining quota.
//!
//! Transport failures and 5xx responses are retried with exponential backoff
//! (see [`COMPARE_RETRY_ATTEMPTS`]); everything else is returned immediately.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::debug;
use url::Url;

use super::{ApiInfo, CommitComparison, ComparedCommit, HistoryError, HistoryProvider, RateLimit};
use crate::constants::{
    COMPARE_RETRY_ATTEMPTS, COMPARE_RETRY_BASE_DELAY_MS, COMPARE_RETRY_MAX_DELAY,
    HTTP_REQUEST_TIMEOUT, USER_AGENT,
};

const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

#[derive(Debug, Deserialize)]
struct CompareResponse {
    ahead_by: u32,
    #[serde(default)]
    commits: Vec<CompareCommit>,
}

#[derive(Debug, Deserialize)]
struct CompareCommit {
    sha: String,
    #[serde(default)]
    parents: Vec<ParentRef>,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct ParentRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: Signature,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl From<CompareResponse> for CommitComparison {
    fn from(response: CompareResponse) -> Self {
        Self {
            ahead_by: response.ahead_by,
            commits: response
                .commits
                .into_iter()
                .map(|c| ComparedCommit {
                    sha: c.sha,
                    parents: c.parents.into_iter().map(|p| p.sha).collect(),
                    committer_date: c.commit.committer.date,
                })
                .collect(),
        }
    }
}

/// History provider backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: Url,
    retry_attempts: usize,
    last_api_info: Arc<RwLock<Option<ApiInfo>>>,
}

impl GitHubClient {
    /// Create a client for `api_url` (usually `https://api.github.com`).
    ///
    /// Without a token requests are anonymous and share GitHub's small
    /// unauthenticated quota.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_url` is not an absolute http(s) URL, the token
    /// is not a valid header value, or the underlying HTTP client cannot be
    /// built.
    pub fn new(api_url: impl Into<String>, token: Option<&str>) -> Result<Self> {
        let api_url = api_url.into();
        let api_url = Url::parse(api_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid GitHub API URL: {api_url}"))?;
        if api_url.cannot_be_a_base() {
            bail!("GitHub API URL cannot carry a path: {api_url}");
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .context("GitHub token contains invalid characters")?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for GitHub")?;

        Ok(Self {
            client,
            api_url,
            retry_attempts: COMPARE_RETRY_ATTEMPTS,
            last_api_info: Arc::new(RwLock::new(None)),
        })
    }

    /// Override how many times a transient failure is retried.
    #[must_use]
    pub fn with_retry_attempts(mut self, attempts: usize) -> Self {
        self.retry_attempts = attempts;
        self
    }

    async fn compare_once(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<CommitComparison, HistoryError> {
        let url = self.compare_url(owner, repo, base, head);
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HistoryError::Network(e.to_string()))?;

        let rate_limit = parse_rate_limit(response.headers());
        if let Some(rate_limit) = rate_limit {
            self.record(ApiInfo {
                rate_limit,
            });
        }

        let status = response.status();
        if status.is_success() {
            let body: CompareResponse =
                response.json().await.map_err(|e| HistoryError::Decode(e.to_string()))?;
            return Ok(body.into());
        }

        let remaining = header_value::<u32>(response.headers(), RATE_LIMIT_REMAINING);
        let reset_at = header_value::<i64>(response.headers(), RATE_LIMIT_RESET)
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text).map_or(text, |body| body.message);

        Err(match status {
            StatusCode::NOT_FOUND => HistoryError::NotFound,
            StatusCode::UNAUTHORIZED => HistoryError::Unauthorized,
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS if remaining == Some(0) => {
                HistoryError::RateLimited {
                    reset_at,
                }
            }
            StatusCode::FORBIDDEN => HistoryError::Forbidden {
                message,
            },
            _ => HistoryError::UnexpectedStatus {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// `{api}/repos/{owner}/{repo}/compare/{base}...{head}` with every path
    /// segment percent-encoded. Slashes in branch names stay path separators.
    fn compare_url(&self, owner: &str, repo: &str, base: &str, head: &str) -> Url {
        let mut url = self.api_url.clone();
        let range = format!("{base}...{head}");
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", owner, repo, "compare"])
                .extend(range.split('/'));
        }
        url
    }

    fn record(&self, info: ApiInfo) {
        if let Ok(mut last) = self.last_api_info.write() {
            *last = Some(info);
        }
    }
}

#[async_trait]
impl HistoryProvider for GitHubClient {
    async fn compare(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<CommitComparison, HistoryError> {
        let strategy = ExponentialBackoff::from_millis(COMPARE_RETRY_BASE_DELAY_MS)
            .max_delay(COMPARE_RETRY_MAX_DELAY)
            .take(self.retry_attempts);

        RetryIf::spawn(
            strategy,
            || self.compare_once(owner, repo, base, head),
            |e: &HistoryError| {
                if e.is_retryable() {
                    debug!("Retrying comparison of {}/{} after: {}", owner, repo, e);
                }
                e.is_retryable()
            },
        )
        .await
    }

    fn last_api_info(&self) -> Option<ApiInfo> {
        self.last_api_info.read().ok().and_then(|last| *last)
    }
}

fn header_value<T: std::str::FromStr>(headers: &header::HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

fn parse_rate_limit(headers: &header::HeaderMap) -> Option<RateLimit> {
    Some(RateLimit {
        limit: header_value(headers, RATE_LIMIT_LIMIT)?,
        remaining: header_value(headers, RATE_LIMIT_REMAINING)?,
        reset: DateTime::from_timestamp(header_value(headers, RATE_LIMIT_RESET)?, 0)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPARE_PATH: &str = "/repos/dotnet/runtime/compare/base1...main";

    const COMPARE_JSON: &str = r#"{
        "status": "ahead",
        "ahead_by": 2,
        "behind_by": 0,
        "commits": [
            {
                "sha": "c1",
                "parents": [{ "sha": "base1", "url": "ignored" }],
                "commit": { "committer": { "name": "bot", "date": "2024-03-01T12:00:00Z" } }
            },
            {
                "sha": "c2",
                "parents": [{ "sha": "c1" }, { "sha": "side" }],
                "commit": { "committer": { "name": "bot", "date": "2024-03-02T12:00:00Z" } }
            }
        ]
    }"#;

    fn client(server: &mockito::Server) -> GitHubClient {
        GitHubClient::new(server.url(), Some("ghp_test")).unwrap().with_retry_attempts(0)
    }

    #[tokio::test]
    async fn test_compare_decodes_and_records_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", COMPARE_PATH)
            .match_header("authorization", "Bearer ghp_test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("x-ratelimit-limit", "5000")
            .with_header("x-ratelimit-remaining", "4990")
            .with_header("x-ratelimit-reset", "1700000000")
            .with_body(COMPARE_JSON)
            .create_async()
            .await;

        let client = client(&server);
        assert!(client.last_api_info().is_none());

        let comparison = client.compare("dotnet", "runtime", "base1", "main").await.unwrap();
        mock.assert_async().await;

        assert_eq!(comparison.ahead_by, 2);
        assert_eq!(comparison.commits.len(), 2);
        assert_eq!(comparison.commits[1].parents, vec!["c1".to_string(), "side".to_string()]);
        assert_eq!(comparison.commits[0].first_parent(), Some("base1"));

        let info = client.last_api_info().unwrap();
        assert_eq!(info.rate_limit.limit, 5000);
        assert_eq!(info.rate_limit.remaining, 4990);
        assert_eq!(info.rate_limit.reset.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases: Vec<(usize, Vec<(&str, &str)>, fn(&HistoryError) -> bool)> = vec![
            (404, vec![], |e| matches!(e, HistoryError::NotFound)),
            (401, vec![], |e| matches!(e, HistoryError::Unauthorized)),
            (
                403,
                vec![("x-ratelimit-remaining", "0"), ("x-ratelimit-reset", "1700000000")],
                |e| matches!(e, HistoryError::RateLimited { reset_at: Some(_) }),
            ),
            (429, vec![("x-ratelimit-remaining", "0")], |e| {
                matches!(e, HistoryError::RateLimited { reset_at: None })
            }),
            (403, vec![("x-ratelimit-remaining", "12")], |e| {
                matches!(e, HistoryError::Forbidden { message } if message == "nope")
            }),
            (422, vec![], |e| matches!(e, HistoryError::UnexpectedStatus { status: 422, .. })),
        ];

        for (status, headers, check) in cases {
            let mut server = mockito::Server::new_async().await;
            let mut mock = server.mock("GET", COMPARE_PATH).with_status(status);
            for (name, value) in headers {
                mock = mock.with_header(name, value);
            }
            let _mock = mock.with_body(r#"{ "message": "nope" }"#).create_async().await;

            let err = client(&server).compare("dotnet", "runtime", "base1", "main").await.unwrap_err();
            assert!(check(&err), "status {status} mapped to {err:?}");
        }
    }

    #[tokio::test]
    async fn test_rate_limit_recorded_on_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", COMPARE_PATH)
            .with_status(403)
            .with_header("x-ratelimit-limit", "60")
            .with_header("x-ratelimit-remaining", "0")
            .with_header("x-ratelimit-reset", "1700000000")
            .create_async()
            .await;

        let client = client(&server);
        let _ = client.compare("dotnet", "runtime", "base1", "main").await;

        assert_eq!(client.last_api_info().unwrap().rate_limit.remaining, 0);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", COMPARE_PATH)
            .with_status(502)
            .expect(2)
            .create_async()
            .await;

        let client = GitHubClient::new(server.url(), None).unwrap().with_retry_attempts(1);
        let err = client.compare("dotnet", "runtime", "base1", "main").await.unwrap_err();

        assert!(matches!(err, HistoryError::UnexpectedStatus { status: 502, .. }));
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", COMPARE_PATH).with_status(404).expect(1).create_async().await;

        let client = GitHubClient::new(server.url(), None).unwrap();
        let err = client.compare("dotnet", "runtime", "base1", "main").await.unwrap_err();

        assert_eq!(err, HistoryError::NotFound);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_branch_with_reserved_characters_is_encoded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/dotnet/runtime/compare/base1...release/9.0%23hot%3Ffix")
            .with_status(200)
            .with_body(r#"{ "ahead_by": 0, "commits": [] }"#)
            .create_async()
            .await;

        let comparison = client(&server)
            .compare("dotnet", "runtime", "base1", "release/9.0#hot?fix")
            .await
            .unwrap();

        assert_eq!(comparison.ahead_by, 0);
        mock.assert_async().await;
    }

    #[test]
    fn test_compare_url_keeps_api_path_prefix() {
        let client = GitHubClient::new("https://ghe.example.com/api/v3/", None).unwrap();
        let url = client.compare_url("dotnet", "runtime", "abc", "feature/x y");
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/dotnet/runtime/compare/abc...feature/x%20y"
        );
    }

    #[test]
    fn test_invalid_api_url_is_rejected() {
        assert!(GitHubClient::new("not a url", None).is_err());
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", COMPARE_PATH)
            .with_status(200)
            .with_body(r#"{ "commits": "nope" }"#)
            .create_async()
            .await;

        let err = client(&server).compare("dotnet", "runtime", "base1", "main").await.unwrap_err();
        assert!(matches!(err, HistoryError::Decode(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let client = GitHubClient::new("http://127.0.0.1:1", None).unwrap().with_retry_attempts(0);
        let err = client.compare("dotnet", "runtime", "base1", "main").await.unwrap_err();
        assert!(matches!(err, HistoryError::Network(_)));
        assert!(client.last_api_info().is_none());
    }
}
