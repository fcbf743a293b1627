//! Parsing of GitHub repository references.
//!
//! Only URLs of the shape `http(s)://[www.]github.com/{owner}/{repo}[/...]`
//! produce a reference. Owner and repo may contain ASCII letters, digits,
//! hyphen, underscore and dot. Anything else (other hosts, other schemes,
//! ports, credentials, a single path segment) yields `None`; an unparsable
//! repository is never an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use url::Url;

use crate::core::DepflowError;

static SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("segment pattern is valid"));

static SHORTHAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<owner>[A-Za-z0-9_.\-]+)/(?<repo>[A-Za-z0-9_.\-]+)")
        .expect("shorthand pattern is valid")
});

/// An `owner/repo` pair on GitHub. Both parts are always present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoReference {
    pub owner: String,
    pub repo: String,
}

impl RepoReference {
    /// Resolve a repository URL into a reference.
    ///
    /// Returns `None` for `None` input, non-GitHub hosts and malformed paths.
    /// Trailing path segments and a `.git` suffix on the repository are ignored.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use depflow_cli::source::RepoReference;
    ///
    /// let r = RepoReference::resolve(Some("https://github.com/dotnet/runtime/tree/main")).unwrap();
    /// assert_eq!(r.owner, "dotnet");
    /// assert_eq!(r.repo, "runtime");
    ///
    /// assert!(RepoReference::resolve(Some("https://dev.azure.com/dnceng/internal")).is_none());
    /// assert!(RepoReference::resolve(None).is_none());
    /// ```
    #[must_use]
    pub fn resolve(repository_url: Option<&str>) -> Option<Self> {
        let url = Url::parse(repository_url?.trim()).ok()?;

        if !matches!(url.scheme(), "http" | "https")
            || url.port().is_some()
            || !url.username().is_empty()
            || url.password().is_some()
        {
            return None;
        }
        // Url lowercases the host
        if !matches!(url.host_str()?, "github.com" | "www.github.com") {
            return None;
        }

        let mut segments = url.path_segments()?;
        let owner = segments.next()?;
        let repo = segments.next()?;
        let repo = repo.strip_suffix(".git").unwrap_or(repo);

        if !SEGMENT.is_match(owner) || !SEGMENT.is_match(repo) {
            return None;
        }

        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Repository short name, used for SLA lookup and display.
    #[must_use]
    pub fn short_name(&self) -> &str {
        &self.repo
    }

    /// Canonical `https://github.com/{owner}/{repo}` URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }

    /// Case-insensitive comparison against an `owner`/`repo` pair.
    #[must_use]
    pub fn matches(&self, owner: &str, repo: &str) -> bool {
        self.owner.eq_ignore_ascii_case(owner) && self.repo.eq_ignore_ascii_case(repo)
    }
}

impl fmt::Display for RepoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Normalize a repository argument given on the command line.
///
/// - URL-encoded input (`https%3A%2F%2Fgithub.com%2F...`) is decoded first
/// - `owner/repo` shorthand becomes `https://github.com/owner/repo`
/// - Everything else is returned trimmed and otherwise unchanged
///
/// # Errors
///
/// Returns [`DepflowError::InvalidRepository`] for empty input.
///
/// # Examples
///
/// ```rust
/// use depflow_cli::source::normalize_repository_argument;
///
/// assert_eq!(
///     normalize_repository_argument("dotnet/runtime").unwrap(),
///     "https://github.com/dotnet/runtime"
/// );
/// assert_eq!(
///     normalize_repository_argument("https%3A%2F%2Fgithub.com%2Fdotnet%2Fsdk").unwrap(),
///     "https://github.com/dotnet/sdk"
/// );
/// ```
pub fn normalize_repository_argument(input: &str) -> Result<String, DepflowError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DepflowError::InvalidRepository {
            input: input.to_string(),
        });
    }

    let decoded = percent_decode(trimmed);

    if let Some(captures) = SHORTHAND.captures(&decoded) {
        return Ok(format!("https://github.com/{}/{}", &captures["owner"], &captures["repo"]));
    }

    Ok(decoded)
}

fn percent_decode(input: &str) -> String {
    // form_urlencoded splits on '&' and '=', so only use it when neither is present
    if !input.contains('%') || input.contains('&') || input.contains('=') {
        return input.to_string();
    }
    url::form_urlencoded::parse(input.as_bytes())
        .next()
        .map_or_else(|| input.to_string(), |(decoded, _)| decoded.into_owned())
}
