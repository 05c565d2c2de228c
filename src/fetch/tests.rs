//! Tests for the fetch module

use super::*;
use crate::types::SleepRange;
use crate::Error;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESOURCE: &str = "/resource/trips.json";

fn test_config(server: &MockServer, dir: &Path) -> FetchConfig {
    FetchConfig::new()
        .with_base_url(format!("{}{RESOURCE}", server.uri()))
        .with_page_size(10)
        .with_output_dir(dir)
        .with_request_sleep(SleepRange::zero())
        .with_backoff(RetryBackoff::none())
        .with_timeout(Duration::from_secs(5))
}

async fn mount_page(server: &MockServer, offset: u64, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .and(query_param("$offset", offset.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ============================================================================
// Backoff and User-Agent Tests
// ============================================================================

#[test]
fn test_backoff_switches_to_long_range() {
    let backoff = RetryBackoff::default();
    assert_eq!(backoff.range_for(1).min(), 5.0);
    assert_eq!(backoff.range_for(10).max(), 15.0);
    assert_eq!(backoff.range_for(11).min(), 30.0);
    assert_eq!(backoff.range_for(40).max(), 60.0);
    assert_eq!(RetryBackoff::none().delay_for(3), Duration::ZERO);
}

#[test]
fn test_user_agent_pool() {
    let pool = UserAgentPool::default();
    assert_eq!(pool.len(), 4);
    assert!(!pool.is_empty());
    for _ in 0..20 {
        let agent = pool.choose();
        assert!(pool.agents().iter().any(|a| a == agent));
    }
    assert!(UserAgentPool::new(Vec::new()).is_err());
}

#[test]
fn test_fetcher_rejects_bad_config() {
    let err = Fetcher::new(FetchConfig::new().with_base_url("not a url")).err();
    assert!(matches!(err, Some(Error::InvalidUrl(_))));

    let err = Fetcher::new(FetchConfig::new().with_max_retries(0)).err();
    assert!(matches!(err, Some(Error::InvalidConfigValue { .. })));

    let err = Fetcher::new(FetchConfig::new().with_page_size(0)).err();
    assert!(matches!(err, Some(Error::InvalidConfigValue { .. })));
}

// ============================================================================
// HTTP Client Tests
// ============================================================================

#[tokio::test]
async fn test_client_returns_body_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .and(query_param("$limit", "10"))
        .and(header("user-agent", "agent/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let url = format!("{}{RESOURCE}", server.uri());
    let response = client
        .get(&url, &[("$limit", "10".to_string())], Some("agent/1.0"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(&response.body[..], b"[]");
}

#[tokio::test]
async fn test_client_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let err = client.get(&server.uri(), &[], None).await.unwrap_err();

    match &err {
        Error::HttpStatus { status, body } => {
            assert_eq!(*status, 503);
            assert_eq!(body, "busy");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_client_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("[]")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = HttpClient::with_config(
        HttpClientConfig::builder()
            .timeout(Duration::from_millis(50))
            .build(),
    )
    .unwrap();
    let err = client.get(&server.uri(), &[], None).await.unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 50 }));
}

// ============================================================================
// Fetcher Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_writes_pages_verbatim() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .and(query_param("$limit", "10"))
        .and(query_param("$offset", "0"))
        .and(query_param("$order", "trip_start_timestamp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"trip_id":"a"}]"#))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, 10, json!([{"trip_id": "b"}])).await;

    let log_path = dir.path().join("file_download.log.txt");
    let fetcher = Fetcher::new(
        test_config(&server, dir.path())
            .with_pages(0, 2)
            .with_run_log(&log_path),
    )
    .unwrap();
    let report = fetcher.run().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(
        report.pages_written,
        vec![
            dir.path().join("trip_data_page_00001.json"),
            dir.path().join("trip_data_page_00002.json"),
        ]
    );
    assert_eq!(
        std::fs::read_to_string(&report.pages_written[0]).unwrap(),
        r#"[{"trip_id":"a"}]"#
    );

    let log = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with("] Page: 2, File: trip_data_page_00002.json"));
}

#[tokio::test]
async fn test_fetch_resumes_from_start_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_page(&server, 30, json!([])).await;

    let fetcher = Fetcher::new(test_config(&server, dir.path()).with_pages(3, 4)).unwrap();
    let report = fetcher.run().await.unwrap();

    assert_eq!(
        report.pages_written,
        vec![dir.path().join("trip_data_page_00004.json")]
    );
}

#[tokio::test]
async fn test_fetch_halts_after_exhausted_retries() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    for offset in [0, 10, 20, 30] {
        mount_page(&server, offset, json!([{"trip_id": offset}])).await;
    }
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .and(query_param("$offset", "40"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .and(query_param("$offset", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(
        test_config(&server, dir.path())
            .with_pages(0, 10)
            .with_max_retries(3),
    )
    .unwrap();
    let report = fetcher.run().await.unwrap();

    assert_eq!(report.pages_written.len(), 4);
    assert_eq!(report.halted_at, Some(5));
    assert!(matches!(
        report.error,
        Some(Error::MaxRetriesExceeded {
            page: 5,
            max_retries: 3
        })
    ));
    assert!(!dir.path().join("trip_data_page_00005.json").exists());
    assert!(!dir.path().join("trip_data_page_00006.json").exists());
}

#[tokio::test]
async fn test_fetch_retries_non_array_body() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "throttled"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, 0, json!([{"trip_id": "a"}])).await;

    let fetcher = Fetcher::new(test_config(&server, dir.path()).with_pages(0, 1)).unwrap();
    let report = fetcher.run().await.unwrap();

    assert!(report.is_complete());
    let saved = std::fs::read_to_string(dir.path().join("trip_data_page_00001.json")).unwrap();
    assert!(saved.contains("\"trip_id\""));
}

#[tokio::test]
async fn test_fetch_uses_pool_identity() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .and(header("user-agent", "pool-agent/2.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(test_config(&server, dir.path()).with_pages(0, 1))
        .unwrap()
        .with_user_agents(UserAgentPool::new(vec!["pool-agent/2.0".to_string()]).unwrap());
    let report = fetcher.run().await.unwrap();

    assert_eq!(report.pages_written.len(), 1);
}

#[tokio::test]
async fn test_fetch_stops_on_empty_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_page(&server, 0, json!([{"trip_id": "a"}])).await;
    mount_page(&server, 10, json!([])).await;
    Mock::given(method("GET"))
        .and(path(RESOURCE))
        .and(query_param("$offset", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(
        test_config(&server, dir.path())
            .with_pages(0, 5)
            .with_stop_on_empty_page(true),
    )
    .unwrap();
    let report = fetcher.run().await.unwrap();

    assert!(report.stopped_on_empty_page);
    assert!(report.is_complete());
    assert_eq!(report.pages_written.len(), 2);
}
