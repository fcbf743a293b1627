use assert_cmd::Command;
use mockito::{Matcher, Mock, Server, ServerGuard};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const GRAPH_JSON: &str = r#"{
    "builds": {
        "10": {
            "id": 10,
            "commit": "sdk-head",
            "gitHubRepository": "https://github.com/dotnet/sdk",
            "gitHubBranch": "main",
            "azureDevOpsBuildNumber": "20240311.4",
            "dateProduced": "2024-03-11T00:00:00Z",
            "dependencies": [
                { "buildId": 20, "isProduct": true },
                { "buildId": 30, "isProduct": false }
            ]
        },
        "20": {
            "id": 20,
            "commit": "rt-consumed",
            "gitHubRepository": "https://github.com/dotnet/runtime",
            "gitHubBranch": "main",
            "dateProduced": "2024-03-01T00:00:00Z"
        },
        "30": {
            "id": 30,
            "commit": "tools-sha",
            "azureDevOpsRepository": "https://dev.azure.com/dnceng/internal/_git/dotnet-tools",
            "dateProduced": "2024-03-01T00:00:00Z"
        }
    }
}"#;

const COMPARE_JSON: &str = r#"{
    "ahead_by": 2,
    "commits": [
        {
            "sha": "c1",
            "parents": [{ "sha": "rt-consumed" }],
            "commit": { "committer": { "date": "2024-03-01T00:00:00Z" } }
        },
        {
            "sha": "c2",
            "parents": [{ "sha": "c1" }],
            "commit": { "committer": { "date": "2024-03-02T00:00:00Z" } }
        }
    ]
}"#;

struct Services {
    graph: ServerGuard,
    github: ServerGuard,
    _mocks: Vec<Mock>,
}

fn start_services() -> Services {
    let mut graph = Server::new();
    let mut github = Server::new();

    let mocks = vec![
        graph
            .mock("GET", "/api/builds/latest")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("repository".into(), "https://github.com/dotnet/sdk".into()),
                Matcher::UrlEncoded("channelId".into(), "1299".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(r#"{ "id": 10, "commit": "sdk-head" }"#)
            .create(),
        graph
            .mock("GET", "/api/builds/10/graph")
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(GRAPH_JSON)
            .create(),
        github
            .mock("GET", "/repos/dotnet/runtime/compare/rt-consumed...main")
            .with_header("content-type", "application/json")
            .with_header("x-ratelimit-limit", "60")
            .with_header("x-ratelimit-remaining", "59")
            .with_header("x-ratelimit-reset", "1710000000")
            .with_body(COMPARE_JSON)
            .create(),
    ];

    Services {
        graph,
        github,
        _mocks: mocks,
    }
}

fn write_config(dir: &Path, services: &Services) -> PathBuf {
    let path = dir.join("config.toml");
    let content = format!(
        "github_api_url = \"{}\"\nbuild_graph_url = \"{}\"\nmax_parallel = 2\n",
        services.github.url(),
        services.graph.url()
    );
    std::fs::write(&path, content).unwrap();
    path
}

fn depflow(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("depflow").unwrap();
    cmd.env_remove("GITHUB_TOKEN")
        .env_remove("DEPFLOW_BUILD_GRAPH_TOKEN")
        .env_remove("RUST_LOG")
        .arg("--no-progress")
        .arg("--config")
        .arg(config);
    cmd
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("depflow")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("incoming"))
        .stdout(predicate::str::contains("latest"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_path_honors_override() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("custom.toml");

    Command::cargo_bin("depflow")
        .unwrap()
        .args(["config", "path", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_show_masks_tokens() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "github_token = \"ghp_super_secret\"\n").unwrap();

    Command::cargo_bin("depflow")
        .unwrap()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("ghp_super_secret").not())
        .stdout(predicate::str::contains("********"));
}

#[test]
fn test_incoming_json_report() {
    let services = start_services();
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), &services);

    let output = depflow(&config)
        .args(["incoming", "dotnet/sdk", "--channel", "1299", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["root"]["id"], 10);

    let entries = report["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["name"], "runtime");
    assert_eq!(entries[0]["distance"], 2);
    assert_eq!(entries[0]["age"], "2024-03-01T00:00:00Z");
    assert_eq!(entries[0]["sla"], "fail");
    assert_eq!(entries[1]["state"], "no_repository");
    assert_eq!(entries[1]["sla"], "unknown");

    assert_eq!(report["rate_limit"]["remaining"], 59);
}

#[test]
fn test_incoming_table_and_check_exit_code() {
    let services = start_services();
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), &services);

    depflow(&config)
        .args(["incoming", "https://github.com/dotnet/sdk", "--channel", "1299"])
        .assert()
        .success()
        .stdout(predicate::str::contains("runtime"))
        .stdout(predicate::str::contains("Fail"))
        .stdout(predicate::str::contains("Summary:"))
        .stdout(predicate::str::contains("59/60"));

    depflow(&config)
        .args(["incoming", "dotnet/sdk", "--channel", "1299", "--check"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_latest_json() {
    let services = start_services();
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), &services);

    let output = depflow(&config)
        .args(["latest", "dotnet/sdk", "--channel", "1299", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let latest: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(latest["build"]["build_number"], "20240311.4");
    assert_eq!(latest["dependencies"][0]["name"], "runtime");
    assert_eq!(latest["dependencies"][1]["commit"], "tools-sha");
}

#[test]
fn test_unknown_repository_reports_error() {
    let mut graph = Server::new();
    let _latest = graph
        .mock("GET", "/api/builds/latest")
        .match_query(Matcher::Any)
        .with_status(404)
        .create();
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");
    std::fs::write(&config, format!("build_graph_url = \"{}\"\n", graph.url())).unwrap();

    depflow(&config)
        .args(["incoming", "dotnet/nope", "--channel", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dotnet/nope"));
}
