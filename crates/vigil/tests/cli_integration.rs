//! CLI integration tests for the Vigil command-line interface.
//!
//! Most tests only exercise argument parsing and help output. The tests at
//! the end run commands against a mock server.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the vigil binary, isolated from the user's config.
fn vigil(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vigil").unwrap();
    cmd.arg("--config-dir")
        .arg(config_dir.path())
        .env_remove("VIGIL_SERVER_URL")
        .env_remove("VIGIL_TENANT")
        .env_remove("VIGIL_TOKEN")
        .env_remove("VIGIL_EXECUTION_ID")
        .current_dir(config_dir.path());
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("executions"))
        .stdout(predicate::str::contains("logs"))
        .stdout(predicate::str::contains("namespaces"))
        .stdout(predicate::str::contains("assets"))
        .stdout(predicate::str::contains("triggers"))
        .stdout(predicate::str::contains("tests"))
        .stdout(predicate::str::contains("monitor"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vigil"));
}

#[test]
fn test_monitor_help() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["monitor", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("schedules"))
        .stdout(predicate::str::contains("freshness"))
        .stdout(predicate::str::contains("--once"));
}

#[test]
fn test_global_flags_accepted() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args([
            "--verbose",
            "--json",
            "--server",
            "http://localhost:9999",
            "--tenant",
            "acme",
            "--help",
        ])
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────────────────
// Invalid Input Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_state_rejected() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["executions", "query", "--state", "exploded"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown execution state"));
}

#[test]
fn test_unknown_fetch_mode_rejected() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["logs", "--fetch", "everything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown fetch mode"));
}

#[test]
fn test_zero_page_rejected() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["namespaces", "--page", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--page starts at 1"));
}

#[test]
fn test_count_expectations_conflict() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["executions", "count", "--eq", "1", "--gte", "2"])
        .assert()
        .failure();
}

#[test]
fn test_targeted_toggle_requires_flow() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["triggers", "toggle", "disable", "--trigger-id", "daily"])
        .assert()
        .failure();
}

#[test]
fn test_purge_requires_end_date() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["assets", "purge"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--end-date"));
}

#[test]
fn test_unknown_monitor_reported() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["monitor", "schedules", "nightly", "--once"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nightly"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_path_uses_config_dir() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_lists_monitors() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        r#"
[server]
url = "https://orchestrator.example.com/"

[[monitors.schedule]]
name = "nightly"
interval_secs = 60
"#,
    )
    .unwrap();

    vigil(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://orchestrator.example.com"))
        .stdout(predicate::str::contains("nightly"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock Server Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_count_against_server() {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/main/executions/search"))
        .and(query_param("size", "1"))
        .and(query_param("filters[namespace][EQUALS]", "company"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [],
            "total": 7
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        let dir = TempDir::new().unwrap();
        vigil(&dir)
            .args(["--server", &uri, "--json"])
            .args(["executions", "count", "--namespace", "company"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["count"], 7);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_schedule_monitor_once_against_server() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/main/triggers/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{
                "abstractTrigger": {"type": "io.example.trigger.Schedule"},
                "triggerContext": {"namespace": "company", "flowId": "etl", "triggerId": "daily"}
            }],
            "total": 1
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[[monitors.schedule]]\nname = \"nightly\"\ninterval_secs = 60\n",
        )
        .unwrap();
        vigil(&dir)
            .args(["--server", &uri, "--json"])
            .args(["monitor", "schedules", "nightly", "--once"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["emitted"], true);
    assert_eq!(body["execution"]["records"], 1);
}

#[test]
fn test_tests_run_requires_suite() {
    let dir = TempDir::new().unwrap();
    vigil(&dir)
        .args(["tests", "run", "company.team"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TEST_ID"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_suite_exit_status_follows_flag() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/main/tests/company.team/smoke/run"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "state": "FAILED",
            "results": [{"testId": "case_1", "state": "FAILED"}]
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let (lenient, strict) = tokio::task::spawn_blocking(move || {
        let dir = TempDir::new().unwrap();
        let lenient = vigil(&dir)
            .args(["--server", &uri, "--json"])
            .args(["tests", "run", "company.team", "smoke"])
            .output()
            .unwrap();
        let strict = vigil(&dir)
            .args(["--server", &uri, "--json"])
            .args(["tests", "run", "company.team", "smoke", "--fail-on-test-failure"])
            .output()
            .unwrap();
        (lenient, strict)
    })
    .await
    .unwrap();

    assert!(lenient.status.success());
    let body: serde_json::Value = serde_json::from_slice(&lenient.stdout).unwrap();
    assert_eq!(body["stateOverride"], "WARNING");
    assert_eq!(body["result"]["results"][0]["testId"], "case_1");

    assert!(!strict.status.success());
    assert!(String::from_utf8_lossy(&strict.stderr).contains("ended with FAILED"));
}
