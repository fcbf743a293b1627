use depflow_cli::config::GlobalConfig;
use depflow_cli::freshness::{
    AnalysisRequest, CommitAge, CommitLag, FreshnessReport, IncomingAnalyzer, SlaStatus,
};
use depflow_cli::github::{ApiInfo, HistoryError, RateLimit};
use depflow_cli::graph::{Build, BuildId, BuildRef};
use depflow_cli::test_utils::{
    FakeBuildGraphProvider, FakeHistoryProvider, build, commit, comparison, github_build,
    init_test_logging, utc,
};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const SDK: &str = "https://github.com/dotnet/sdk";
const RUNTIME: &str = "https://github.com/dotnet/runtime";
const AZURE_ONLY: &str = "https://dev.azure.com/dnceng/internal/_git/dotnet-tools";

fn root(deps: &[i64]) -> Build {
    let mut root = github_build(1, "sdk-head", SDK, Some("main"));
    root.azure_dev_ops_build_number = Some("20240311.4".to_string());
    root.dependencies = deps.iter().map(|id| BuildRef::new(BuildId(*id))).collect();
    root
}

fn azure_only(id: i64) -> Build {
    let mut dep = build(id, "tools-sha");
    dep.azure_dev_ops_repository = Some(AZURE_ONLY.to_string());
    dep.azure_dev_ops_branch = Some("main".to_string());
    dep.azure_dev_ops_account = Some("dnceng".to_string());
    dep.azure_dev_ops_project = Some("internal".to_string());
    dep.azure_dev_ops_build_id = Some(2_417_000);
    dep
}

/// runtime is 3 commits behind; the oldest unconsumed commit is from 2024-03-01.
fn runtime_history() -> FakeHistoryProvider {
    FakeHistoryProvider::new().with_comparison(
        "dotnet",
        "runtime",
        comparison(
            3,
            vec![
                commit("c1", &["rt-consumed"], utc(2024, 3, 1)),
                commit("c2", &["c1"], utc(2024, 3, 5)),
                commit("c3", &["c2"], utc(2024, 3, 8)),
            ],
        ),
    )
}

async fn run(analyzer: &IncomingAnalyzer) -> FreshnessReport {
    analyzer
        .analyze_at(&AnalysisRequest::new(SDK, 1299), &CancellationToken::new(), utc(2024, 3, 11))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_report_classifies_dependencies_in_edge_order() {
    init_test_logging(None);

    let builds = vec![
        root(&[2, 3]),
        github_build(2, "rt-consumed", RUNTIME, Some("main")),
        azure_only(3),
    ];
    let history = runtime_history().with_api_info(ApiInfo {
        rate_limit: RateLimit {
            limit: 5000,
            remaining: 4998,
            reset: utc(2024, 3, 11),
        },
    });
    let analyzer = IncomingAnalyzer::new(
        Arc::new(FakeBuildGraphProvider::new(BuildId(1), builds)),
        Arc::new(history),
    );

    let report = run(&analyzer).await;

    assert_eq!(report.entries.len(), 2);
    let runtime = &report.entries[0];
    assert_eq!(runtime.build.id, BuildId(2));
    assert_eq!(
        runtime.lag,
        CommitLag::Compared {
            distance: 3,
            age: CommitAge::Resolved(utc(2024, 3, 1)),
        }
    );
    assert_eq!(runtime.sla, SlaStatus::Fail);
    assert_eq!(
        runtime.commit_url.as_deref(),
        Some("https://github.com/dotnet/runtime/commits/rt-consumed")
    );

    let tools = &report.entries[1];
    assert_eq!(tools.lag, CommitLag::NoRepository);
    assert_eq!(tools.sla, SlaStatus::Unknown);
    assert_eq!(tools.display_name(), AZURE_ONLY);
    assert!(tools.build_url.as_deref().is_some_and(|url| url.contains("buildId=2417000")));

    let summary = report.summary();
    assert_eq!((summary.total, summary.fail, summary.unknown), (2, 1, 1));
    assert!(report.has_failures());
    assert_eq!(report.api_info.map(|info| info.rate_limit.remaining), Some(4998));
}

#[tokio::test]
async fn test_configured_sla_and_exclusions_apply() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    tokio::fs::write(
        &path,
        r#"
excluded_repositories = ["dotnet/arcade"]

[sla]
organization = "dotnet"

[sla.repositories."dotnet/runtime"]
warning_unconsumed_commit_age = 14
fail_unconsumed_commit_age = 30
"#,
    )
    .await
    .unwrap();
    let config = GlobalConfig::load_from(&path).await.unwrap();

    let builds = vec![
        root(&[2, 3]),
        github_build(2, "rt-consumed", RUNTIME, Some("main")),
        github_build(3, "arcade-sha", "https://github.com/dotnet/arcade", Some("main")),
    ];
    let history = Arc::new(runtime_history());
    let analyzer = IncomingAnalyzer::new(
        Arc::new(FakeBuildGraphProvider::new(BuildId(1), builds)),
        history.clone(),
    )
    .with_exclusions(config.exclusion_policy().unwrap())
    .with_sla(config.sla_evaluator());

    let report = run(&analyzer).await;

    // 10 days old is within the relaxed runtime SLA
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].sla, SlaStatus::Ok);
    assert!(!report.has_failures());
    assert!(history.calls().iter().all(|call| call.repo != "arcade"));
}

#[tokio::test]
async fn test_rate_limited_dependency_degrades_alone() {
    let builds = vec![
        root(&[2, 3]),
        github_build(2, "rt-consumed", RUNTIME, Some("main")),
        github_build(3, "aspnet-sha", "https://github.com/dotnet/aspnetcore", Some("main")),
    ];
    let history = runtime_history().with_error(
        "dotnet",
        "aspnetcore",
        HistoryError::RateLimited {
            reset_at: None,
        },
    );
    let analyzer = IncomingAnalyzer::new(
        Arc::new(FakeBuildGraphProvider::new(BuildId(1), builds)),
        Arc::new(history),
    );

    let report = run(&analyzer).await;

    assert_eq!(report.entries[0].sla, SlaStatus::Fail);
    assert!(matches!(
        &report.entries[1].lag,
        CommitLag::Failed { reason } if reason.contains("rate limit")
    ));
    assert_eq!(report.entries[1].sla, SlaStatus::Unknown);
    assert_eq!(report.summary().failed_comparisons, 1);

    let json = serde_json::to_value(report.to_json_view()).unwrap();
    assert_eq!(json["entries"][1]["state"], "failed");
    assert!(json["entries"][1]["error"].as_str().is_some_and(|e| e.contains("rate limit")));
    assert_eq!(json["entries"][0]["distance"], 3);
}

#[tokio::test]
async fn test_latest_does_not_touch_history() {
    let builds = vec![root(&[2]), github_build(2, "rt-consumed", RUNTIME, Some("main"))];
    let history = Arc::new(FakeHistoryProvider::new());
    let analyzer = IncomingAnalyzer::new(
        Arc::new(FakeBuildGraphProvider::new(BuildId(1), builds)),
        history.clone(),
    );

    let latest = analyzer.latest(&AnalysisRequest::new(SDK, 1299)).await.unwrap();

    assert_eq!(latest.root.azure_dev_ops_build_number.as_deref(), Some("20240311.4"));
    assert_eq!(latest.dependencies.len(), 1);
    assert!(history.calls().is_empty());
}
