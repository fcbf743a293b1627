//! Freshness report types and link rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CommitLag, SlaStatus};
use crate::github::{ApiInfo, RateLimit};
use crate::graph::{Build, BuildId};

/// Freshness of one direct dependency of the root build.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyFreshnessEntry {
    /// The dependency's build
    pub build: Build,
    /// Repository short name, when the build has a GitHub reference
    pub short_name: Option<String>,
    pub lag: CommitLag,
    pub commit_url: Option<String>,
    pub build_url: Option<String>,
    /// Classification at the time the report was produced
    pub sla: SlaStatus,
}

impl DependencyFreshnessEntry {
    /// Display name: the short name, else the repository URL, else the build id.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.short_name
            .clone()
            .or_else(|| self.build.repository().map(str::to_string))
            .unwrap_or_else(|| format!("build {}", self.build.id))
    }

    /// Whether this entry should fail a `--check` run.
    #[must_use]
    pub const fn is_failing(&self) -> bool {
        matches!(self.sla, SlaStatus::Fail)
            || matches!(
                self.lag,
                CommitLag::Failed {
                    ..
                }
            )
    }
}

/// Result of one incoming-freshness analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct FreshnessReport {
    /// The latest build of the analyzed repository
    pub root: Build,
    /// One entry per non-excluded direct dependency, in graph edge order
    pub entries: Vec<DependencyFreshnessEntry>,
    /// History provider quota after the analysis
    pub api_info: Option<ApiInfo>,
    /// The instant SLA classification was computed against
    pub evaluated_at: DateTime<Utc>,
}

/// Counts per classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessSummary {
    pub total: usize,
    pub ok: usize,
    pub warning: usize,
    pub fail: usize,
    pub unknown: usize,
    /// Entries whose comparison failed
    pub failed_comparisons: usize,
}

impl FreshnessReport {
    #[must_use]
    pub fn summary(&self) -> FreshnessSummary {
        let mut summary = FreshnessSummary {
            total: self.entries.len(),
            ..FreshnessSummary::default()
        };
        for entry in &self.entries {
            match entry.sla {
                SlaStatus::Ok => summary.ok += 1,
                SlaStatus::Warning => summary.warning += 1,
                SlaStatus::Fail => summary.fail += 1,
                SlaStatus::Unknown => summary.unknown += 1,
            }
            if matches!(entry.lag, CommitLag::Failed { .. }) {
                summary.failed_comparisons += 1;
            }
        }
        summary
    }

    /// Whether any entry is classified Fail or could not be compared.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(DependencyFreshnessEntry::is_failing)
    }

    /// Serializable view of the report.
    #[must_use]
    pub fn to_json_view(&self) -> FreshnessReportJson {
        FreshnessReportJson {
            root: BuildJson::from(&self.root),
            evaluated_at: self.evaluated_at,
            entries: self.entries.iter().map(EntryJson::from).collect(),
            summary: self.summary(),
            rate_limit: self.api_info.map(|info| info.rate_limit),
        }
    }
}

/// JSON shape of a [`FreshnessReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreshnessReportJson {
    pub root: BuildJson,
    pub evaluated_at: DateTime<Utc>,
    pub entries: Vec<EntryJson>,
    pub summary: FreshnessSummary,
    pub rate_limit: Option<RateLimit>,
}

/// JSON shape of a build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildJson {
    pub id: BuildId,
    pub commit: String,
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub build_number: Option<String>,
    pub date_produced: DateTime<Utc>,
}

impl From<&Build> for BuildJson {
    fn from(build: &Build) -> Self {
        Self {
            id: build.id,
            commit: build.commit.clone(),
            repository: build.repository().map(str::to_string),
            branch: build.github_branch.clone().or_else(|| build.azure_dev_ops_branch.clone()),
            build_number: build.azure_dev_ops_build_number.clone(),
            date_produced: build.date_produced,
        }
    }
}

/// JSON shape of a [`DependencyFreshnessEntry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryJson {
    pub name: String,
    pub build: BuildJson,
    /// Machine-readable lag state, see [`CommitLag::state`]
    pub state: String,
    pub distance: Option<u32>,
    pub age: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub sla: SlaStatus,
    pub commit_url: Option<String>,
    pub build_url: Option<String>,
}

impl From<&DependencyFreshnessEntry> for EntryJson {
    fn from(entry: &DependencyFreshnessEntry) -> Self {
        Self {
            name: entry.display_name(),
            build: BuildJson::from(&entry.build),
            state: entry.lag.state().to_string(),
            distance: entry.lag.distance(),
            age: entry.lag.age(),
            error: match &entry.lag {
                CommitLag::Failed {
                    reason,
                } => Some(reason.clone()),
                _ => None,
            },
            sla: entry.sla,
            commit_url: entry.commit_url.clone(),
            build_url: entry.build_url.clone(),
        }
    }
}

/// Link to the build's commit.
///
/// GitHub repositories link to `{repo}/commits/{sha}`; Azure DevOps
/// repositories to the commit history filtered at that version.
#[must_use]
pub fn commit_url(build: &Build) -> Option<String> {
    if let Some(repository) = build.github_repository.as_deref().filter(|r| !r.is_empty()) {
        return Some(format!("{repository}/commits/{}", build.commit));
    }
    build
        .azure_dev_ops_repository
        .as_deref()
        .filter(|r| !r.is_empty())
        .map(|repository| {
            format!("{repository}/commits?itemPath=%2F&itemVersion=GC{}", build.commit)
        })
}

/// Link to the Azure DevOps build results page, when the build came from one.
#[must_use]
pub fn build_url(build: &Build) -> Option<String> {
    let account = build.azure_dev_ops_account.as_deref()?;
    let project = build.azure_dev_ops_project.as_deref()?;
    let id = build.azure_dev_ops_build_id?;
    Some(format!(
        "https://dev.azure.com/{account}/{project}/_build/results?buildId={id}&view=results"
    ))
}
