//! Repository exclusion policy.
//!
//! Some repositories take no part in the automated dependency-update process,
//! so reporting their lag is noise. The policy is a case-insensitive deny list
//! of `owner/repo` entries, defaulting to [`DEFAULT_EXCLUDED_REPOSITORIES`]
//! and overridable through `excluded_repositories` in the global config.

use super::RepoReference;
use crate::constants::DEFAULT_EXCLUDED_REPOSITORIES;
use crate::core::DepflowError;

/// Case-insensitive deny list of `owner/repo` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionPolicy {
    // Stored lowercased
    entries: Vec<(String, String)>,
}

impl ExclusionPolicy {
    /// Build a policy from `owner/repo` entries.
    ///
    /// # Errors
    ///
    /// Returns [`DepflowError::ConfigError`] if an entry is not of the form
    /// `owner/repo`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use depflow_cli::source::{ExclusionPolicy, RepoReference};
    ///
    /// let policy = ExclusionPolicy::new(["Contoso/Legacy"])?;
    /// let legacy = RepoReference::resolve(Some("https://github.com/contoso/legacy"));
    /// assert!(!policy.should_include(legacy.as_ref()));
    /// assert!(policy.should_include(None));
    /// # Ok::<(), depflow_cli::core::DepflowError>(())
    /// ```
    pub fn new<I, S>(entries: I) -> Result<Self, DepflowError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|entry| {
                let entry = entry.as_ref().trim();
                match entry.split_once('/') {
                    Some((owner, repo))
                        if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
                    {
                        Ok((owner.to_ascii_lowercase(), repo.to_ascii_lowercase()))
                    }
                    _ => Err(DepflowError::ConfigError {
                        message: format!(
                            "excluded repository '{entry}' must have the form 'owner/repo'"
                        ),
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            entries,
        })
    }

    /// The built-in policy.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            entries: DEFAULT_EXCLUDED_REPOSITORIES
                .iter()
                .filter_map(|entry| entry.split_once('/'))
                .map(|(owner, repo)| (owner.to_ascii_lowercase(), repo.to_ascii_lowercase()))
                .collect(),
        }
    }

    /// Whether a dependency with this reference should appear in the report.
    ///
    /// Dependencies without a resolvable reference are always included; they
    /// show up with unknown freshness.
    #[must_use]
    pub fn should_include(&self, reference: Option<&RepoReference>) -> bool {
        let Some(reference) = reference else {
            return true;
        };
        !self.entries.iter().any(|(owner, repo)| reference.matches(owner, repo))
    }

    /// Excluded entries rendered as `owner/repo`.
    pub fn entries(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().map(|(owner, repo)| format!("{owner}/{repo}"))
    }
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(url: &str) -> RepoReference {
        RepoReference::resolve(Some(url)).unwrap()
    }

    #[test]
    fn test_builtin_excludes_blazor_case_insensitively() {
        let policy = ExclusionPolicy::default();
        assert!(!policy.should_include(Some(&reference("https://github.com/dotnet/blazor"))));
        assert!(!policy.should_include(Some(&reference("https://github.com/DotNet/Blazor"))));
        assert!(policy.should_include(Some(&reference("https://github.com/dotnet/runtime"))));
        assert!(policy.should_include(Some(&reference("https://github.com/aspnet/blazor"))));
    }

    #[test]
    fn test_absent_reference_is_included() {
        assert!(ExclusionPolicy::builtin().should_include(None));
        assert!(ExclusionPolicy::new(Vec::<String>::new()).unwrap().should_include(None));
    }

    #[test]
    fn test_configured_entries_replace_builtin() {
        let policy = ExclusionPolicy::new(["dotnet/runtime"]).unwrap();
        assert!(policy.should_include(Some(&reference("https://github.com/dotnet/blazor"))));
        assert!(!policy.should_include(Some(&reference("https://github.com/dotnet/runtime"))));
        assert_eq!(policy.entries().collect::<Vec<_>>(), vec!["dotnet/runtime"]);
    }

    #[test]
    fn test_malformed_entries_are_rejected() {
        for bad in ["blazor", "/blazor", "dotnet/", "a/b/c"] {
            assert!(
                matches!(ExclusionPolicy::new([bad]), Err(DepflowError::ConfigError { .. })),
                "{bad} should be rejected"
            );
        }
    }
}
