//! Freshness service-level agreements.
//!
//! An [`Sla`] is a pair of day thresholds measured from the moment the
//! consumed commit was superseded. SLAs are looked up per repository as
//! `"{organization}/{short_name}"`, falling back to the mandatory
//! [`DEFAULT_SLA_KEY`] entry.
//!
//! ```toml
//! [sla]
//! organization = "dotnet"
//!
//! [sla.repositories."[Default]"]
//! warning_unconsumed_commit_age = 5
//! fail_unconsumed_commit_age = 7
//!
//! [sla.repositories."dotnet/runtime"]
//! warning_unconsumed_commit_age = 2
//! fail_unconsumed_commit_age = 4
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{
    DEFAULT_FAIL_UNCONSUMED_COMMIT_AGE, DEFAULT_SLA_KEY, DEFAULT_SLA_ORGANIZATION,
    DEFAULT_WARNING_UNCONSUMED_COMMIT_AGE,
};

/// Day thresholds for one repository.
///
/// `warning <= fail` by convention; it is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sla {
    pub warning_unconsumed_commit_age: i64,
    pub fail_unconsumed_commit_age: i64,
}

impl Default for Sla {
    fn default() -> Self {
        Self {
            warning_unconsumed_commit_age: DEFAULT_WARNING_UNCONSUMED_COMMIT_AGE,
            fail_unconsumed_commit_age: DEFAULT_FAIL_UNCONSUMED_COMMIT_AGE,
        }
    }
}

impl fmt::Display for Sla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sla(Warn: {}, Fail: {})",
            self.warning_unconsumed_commit_age, self.fail_unconsumed_commit_age
        )
    }
}

/// SLA table as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaOptions {
    /// Prefix combined with a repository short name for lookup
    #[serde(default = "default_organization")]
    pub organization: String,

    /// Entries keyed by `organization/short_name`, plus `[Default]`
    #[serde(default = "default_repositories")]
    pub repositories: BTreeMap<String, Sla>,
}

fn default_organization() -> String {
    DEFAULT_SLA_ORGANIZATION.to_string()
}

fn default_repositories() -> BTreeMap<String, Sla> {
    BTreeMap::from([(DEFAULT_SLA_KEY.to_string(), Sla::default())])
}

impl Default for SlaOptions {
    fn default() -> Self {
        Self {
            organization: default_organization(),
            repositories: default_repositories(),
        }
    }
}

impl SlaOptions {
    /// The SLA for a repository short name.
    ///
    /// A configured table without a `[Default]` entry falls back to the
    /// built-in thresholds.
    #[must_use]
    pub fn get_for_repo(&self, short_name: Option<&str>) -> Sla {
        short_name
            .and_then(|name| self.repositories.get(&format!("{}/{name}", self.organization)))
            .or_else(|| self.repositories.get(DEFAULT_SLA_KEY))
            .copied()
            .unwrap_or_default()
    }
}

/// Classification of a dependency's staleness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlaStatus {
    Ok,
    Warning,
    Fail,
    /// No age is known
    Unknown,
}

impl fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ok => "OK",
            Self::Warning => "Warning",
            Self::Fail => "Fail",
            Self::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Classifies commit ages against an [`SlaOptions`] table.
#[derive(Debug, Clone, Default)]
pub struct SlaEvaluator {
    options: SlaOptions,
}

impl SlaEvaluator {
    #[must_use]
    pub const fn new(options: SlaOptions) -> Self {
        Self {
            options,
        }
    }

    #[must_use]
    pub const fn options(&self) -> &SlaOptions {
        &self.options
    }

    /// Classify `age` as of `now`.
    ///
    /// Elapsed time is counted in whole days, truncated. An age in the
    /// future counts as zero days.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::{Duration, Utc};
    /// use depflow_cli::freshness::{SlaEvaluator, SlaStatus};
    ///
    /// let evaluator = SlaEvaluator::default();
    /// let now = Utc::now();
    /// assert_eq!(evaluator.classify(Some("runtime"), Some(now - Duration::days(6)), now), SlaStatus::Warning);
    /// assert_eq!(evaluator.classify(Some("runtime"), None, now), SlaStatus::Unknown);
    /// ```
    #[must_use]
    pub fn classify(
        &self,
        short_name: Option<&str>,
        age: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> SlaStatus {
        let Some(age) = age else {
            return SlaStatus::Unknown;
        };

        let sla = self.options.get_for_repo(short_name);
        let days = (now - age).num_days();

        if days >= sla.fail_unconsumed_commit_age {
            SlaStatus::Fail
        } else if days >= sla.warning_unconsumed_commit_age {
            SlaStatus::Warning
        } else {
            SlaStatus::Ok
        }
    }
}
