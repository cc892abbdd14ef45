//! End-to-end runs of the `vlt` binary against a local mock server
//!
//! Runs are kept to a couple of seconds; the binary is driven on a
//! blocking thread while the mock server answers on the test runtime.

use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::process::{Command, Output};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

async fn server_answering(status: u16, delay_ms: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string("ok")
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(&server)
        .await;
    server
}

async fn run_vlt(args: Vec<String>) -> Output {
    tokio::task::spawn_blocking(move || {
        let mut cmd = Command::cargo_bin("vlt").unwrap();
        for var in ["LOAD_TARGET_URL", "LOAD_VUS", "LOAD_DURATION", "LOAD_SLEEP", "LOAD_TIMEOUT", "LOAD_GRACE_PERIOD"] {
            cmd.env_remove(var);
        }
        cmd.arg("--no-color").args(args).output().unwrap()
    })
    .await
    .unwrap()
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_healthy_target_passes() {
    let server = server_answering(200, 50).await;
    let url = format!("{}/", server.uri());

    let output = run_vlt(args(&[
        "--url", &url,
        "--vus", "5",
        "--duration", "2s",
        "--sleep", "100ms",
        "--threshold", "http_req_duration:p(95)<500",
        "--threshold", "http_req_failed:rate<0.01",
    ]))
    .await;

    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(0), "{}", text);
    assert!(text.contains("RESULT: PASSED"));
    assert!(text.contains("✓ http_req_duration p(95)<500"));
    assert!(text.contains("status is 200: 100.00%"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failing_target_exits_with_threshold_code() {
    let server = server_answering(500, 5).await;
    let url = format!("{}/", server.uri());

    let output = run_vlt(args(&[
        "--url", &url,
        "--vus", "3",
        "--duration", "1s",
        "--sleep", "100ms",
        "--threshold", "http_req_duration:p(95)<500",
        "--threshold", "http_req_failed:rate<0.01",
    ]))
    .await;

    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(99), "{}", text);
    assert!(text.contains("✗ http_req_failed rate<0.01  observed 1.0000"));
    assert!(text.contains("RESULT: FAILED (1 of 2 thresholds)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_thresholds_passes_even_when_everything_fails() {
    let server = server_answering(503, 5).await;
    let url = format!("{}/", server.uri());

    let output = run_vlt(args(&["--url", &url, "--vus", "2", "--duration", "1s", "--sleep", "200ms"])).await;

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("(none defined)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_target_is_recorded_not_fatal() {
    // Bind then drop a listener to get a port nothing listens on
    let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let url = format!("http://127.0.0.1:{}/", port);

    let output = run_vlt(args(&[
        "--url", &url,
        "--vus", "2",
        "--duration", "1s",
        "--sleep", "200ms",
        "--timeout", "500ms",
        "--threshold", "http_req_failed:rate<0.01",
        "--threshold", "http_req_duration:p(95)<500",
    ]))
    .await;

    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(99), "{}", text);
    assert!(text.contains("ERRORS"));
    // No request was answered, so the latency threshold has nothing to judge
    assert!(text.contains("? http_req_duration p(95)<500  observed no samples"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scenario_file_with_summary_export() {
    let server = server_answering(200, 20).await;
    let dir = TempDir::new().unwrap();
    let scenario = dir.path().join("scenario.json");
    let summary = dir.path().join("summary.json");

    fs::write(
        &scenario,
        format!(
            r#"{{
                "url": "{}/",
                "vus": 4,
                "duration": "2s",
                "sleep": "250ms",
                "thresholds": {{
                    "http_req_duration": ["p(95)<500", "max<2000"],
                    "http_req_failed": ["rate<0.01"],
                    "checks": ["rate>0.99"]
                }}
            }}"#,
            server.uri()
        ),
    )
    .unwrap();

    let output = run_vlt(vec![
        "-c".to_string(),
        scenario.to_str().unwrap().to_string(),
        "--summary-export".to_string(),
        summary.to_str().unwrap().to_string(),
    ])
    .await;
    assert_eq!(output.status.code(), Some(0), "{}", stdout(&output));

    let json: Value = serde_json::from_str(&fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(json["overall_passed"], true);
    assert_eq!(json["vus"], 4);
    assert!(json["total_requests"].as_u64().unwrap() > 0);
    assert_eq!(json["per_threshold"].as_array().unwrap().len(), 4);
    assert_eq!(json["per_threshold"][3]["threshold"]["source"], "rate>0.99");
    assert_eq!(json["summary"]["status_codes"]["200"], json["total_requests"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_debug_prints_configuration_summary_once() {
    let server = server_answering(200, 5).await;
    let url = format!("{}/", server.uri());

    let output = run_vlt(args(&["--url", &url, "--vus", "1", "--duration", "1s", "--sleep", "200ms", "--debug"])).await;

    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("Configuration Summary:").count(), 1, "{}", stderr);
    assert_eq!(stderr.matches("Grace Period: ").count(), 1, "{}", stderr);
}
