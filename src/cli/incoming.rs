//! Report how stale the dependencies of a repository's latest build are.
//!
//! The `incoming` command looks up the latest build of a repository on a
//! channel, walks its direct dependencies, and for each one asks GitHub how far
//! the dependency's branch has moved past the consumed commit. The lag is then
//! classified against the SLA table from the configuration file.
//!
//! # Command Usage
//!
//! ```bash
//! # Table output
//! depflow incoming dotnet/aspnetcore --channel 1299
//!
//! # JSON for scripting
//! depflow incoming https://github.com/dotnet/aspnetcore --channel 1299 --format json
//!
//! # Exit non-zero when any dependency fails its SLA or could not be compared
//! depflow incoming dotnet/aspnetcore --channel 1299 --check
//! ```
//!
//! ## Table Format (Default)
//!
//! ```text
//! Dependency                     Behind     Oldest     SLA        State
//! ──────────────────────────────────────────────────────────────────────────────────
//! runtime                        3          10d        Fail       compared
//! arcade                         0          -          OK         up_to_date
//! internal-tools                 -          -          Unknown    no_repository
//!
//! Summary:
//!   Total dependencies: 3
//!   1 OK, 0 Warning, 1 Fail, 1 Unknown
//!
//! GitHub API: 4987/5000 requests remaining (resets 2024-01-01 13:00:00 UTC)
//! ```
//!
//! "Oldest" is how many days ago the consumed commit was superseded, i.e. the
//! age of its mainline successor on the tracked branch, measured at the same
//! instant the SLA was evaluated.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use colored::{ColoredString, Colorize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::CliConfig;
use super::common::CommandContext;
use crate::freshness::{CommitAge, CommitLag, DependencyFreshnessEntry, FreshnessReport, SlaStatus};
use crate::github::ApiInfo;
use crate::utils::ProgressBar;

/// Arguments for `depflow incoming`.
#[derive(Debug, Args)]
pub struct IncomingCommand {
    /// Repository URL or `owner/repo` shorthand (URL-encoded input is accepted)
    #[arg(value_name = "REPOSITORY")]
    pub repository: String,

    /// Build-graph channel id
    #[arg(long, value_name = "ID")]
    pub channel: u32,

    /// Output format: table or json
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Exit with a non-zero code if any dependency fails its SLA or could not be compared
    #[arg(long)]
    pub check: bool,

    /// Maximum number of concurrent comparison requests
    #[arg(long, value_name = "NUMBER")]
    pub max_parallel: Option<usize>,

    /// GitHub token for comparison requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Token for the build-graph service
    #[arg(long, env = "DEPFLOW_BUILD_GRAPH_TOKEN", hide_env_values = true)]
    pub build_graph_token: Option<String>,

    /// Set from the global `--no-progress` flag
    #[arg(skip)]
    pub no_progress: bool,
}

impl IncomingCommand {
    /// Run the analysis and print the report.
    ///
    /// # Errors
    ///
    /// Configuration errors, build-graph failures, graph integrity violations,
    /// and cancellation. Per-dependency comparison failures are reported in the
    /// output instead.
    pub async fn execute(self, cli: &CliConfig, cancel: &CancellationToken) -> Result<()> {
        let request = CommandContext::request(&self.repository, self.channel)?;
        let context = CommandContext::load(
            cli,
            self.github_token.clone(),
            self.build_graph_token.clone(),
            self.max_parallel,
        )
        .await?;
        let analyzer = context.analyzer()?;

        info!(repository = %request.repository, channel = request.channel_id, "Analyzing incoming dependencies");

        let spinner = ProgressBar::new_spinner(!self.no_progress);
        spinner.set_message(format!("Analyzing dependencies of {}", request.repository));
        let result = analyzer.analyze(&request, cancel).await;
        spinner.finish_and_clear();
        let report = result?;

        self.display_results(&report)?;

        if self.check && report.has_failures() {
            std::process::exit(1);
        }

        Ok(())
    }

    fn display_results(&self, report: &FreshnessReport) -> Result<()> {
        match self.format.as_str() {
            "json" => Self::display_json(report),
            _ => {
                Self::display_table(report);
                Ok(())
            }
        }
    }

    fn display_json(report: &FreshnessReport) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(&report.to_json_view())?);
        Ok(())
    }

    fn display_table(report: &FreshnessReport) {
        let root = &report.root;
        println!(
            "{} {} ({})",
            "Latest build:".bold(),
            root.azure_dev_ops_build_number.as_deref().unwrap_or("unnumbered"),
            short_sha(&root.commit)
        );

        if report.entries.is_empty() {
            println!("{}", "The latest build has no tracked dependencies.".green());
            Self::display_rate_limit(report.api_info);
            return;
        }

        println!(
            "\n{:<30} {:<10} {:<10} {:<10} {:<20}",
            "Dependency".bold(),
            "Behind".bold(),
            "Oldest".bold(),
            "SLA".bold(),
            "State".bold()
        );
        println!("{}", "─".repeat(82));

        for (entry, row) in report.entries.iter().zip(TableRow::for_report(report)) {
            println!(
                "{:<30} {:<10} {:<10} {:<10} {:<20}",
                colorize(&row.name, entry.sla),
                row.behind,
                row.oldest,
                colorize(&entry.sla.to_string(), entry.sla),
                row.state.bright_black()
            );
            if let CommitLag::Failed {
                reason,
            } = &entry.lag
            {
                println!("  {} {}", "↳".red(), reason.red());
            }
        }

        let summary = report.summary();
        println!("\n{}", "Summary:".bold());
        println!("  Total dependencies: {}", summary.total);
        println!(
            "  {} OK, {} Warning, {} Fail, {} Unknown",
            summary.ok.to_string().green(),
            summary.warning.to_string().yellow(),
            summary.fail.to_string().red(),
            summary.unknown
        );
        if summary.failed_comparisons > 0 {
            println!(
                "  {} dependencies could not be compared",
                summary.failed_comparisons.to_string().red()
            );
        }

        Self::display_rate_limit(report.api_info);
    }

    fn display_rate_limit(api_info: Option<ApiInfo>) {
        if let Some(info) = api_info {
            let limit = info.rate_limit;
            println!(
                "\n{}",
                format!(
                    "GitHub API: {}/{} requests remaining (resets {})",
                    limit.remaining,
                    limit.limit,
                    limit.reset.format("%Y-%m-%d %H:%M:%S UTC")
                )
                .bright_black()
            );
        }
    }
}

/// Plain-text cells of one table row.
#[derive(Debug, PartialEq, Eq)]
struct TableRow {
    name: String,
    behind: String,
    oldest: String,
    state: &'static str,
}

impl TableRow {
    /// Rows aged against the instant the SLA was evaluated, so "Oldest" and
    /// the SLA column always agree.
    fn for_report(report: &FreshnessReport) -> Vec<Self> {
        report.entries.iter().map(|entry| Self::new(entry, report.evaluated_at)).collect()
    }

    fn new(entry: &DependencyFreshnessEntry, now: DateTime<Utc>) -> Self {
        let behind = entry.lag.distance().map_or_else(|| "-".to_string(), |d| d.to_string());
        let oldest = match &entry.lag {
            CommitLag::Compared {
                age: CommitAge::Resolved(timestamp),
                ..
            } => format!("{}d", (now - *timestamp).num_days().max(0)),
            CommitLag::Compared {
                age: CommitAge::Unresolvable,
                ..
            } => "?".to_string(),
            _ => "-".to_string(),
        };
        Self {
            name: entry.display_name(),
            behind,
            oldest,
            state: entry.lag.state(),
        }
    }
}

fn colorize(text: &str, sla: SlaStatus) -> ColoredString {
    match sla {
        SlaStatus::Ok => text.green(),
        SlaStatus::Warning => text.yellow(),
        SlaStatus::Fail => text.red(),
        SlaStatus::Unknown => text.normal(),
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..8).unwrap_or(sha)
}
