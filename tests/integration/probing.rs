//! HTTP probes against a mock server

use std::time::Duration;

use netdash::monitors::probe::{NetworkProbe, Probe, ProbeStatus};
use netdash::storage::schema::ProbeKind;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn probe() -> NetworkProbe {
    NetworkProbe::new(Duration::from_secs(1), Duration::from_secs(1)).unwrap()
}

#[tokio::test]
async fn test_http_200_is_up() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = probe()
        .probe(ProbeKind::Http, &format!("{}/health", mock_server.uri()))
        .await;

    assert_eq!(result.status, ProbeStatus::Up);
    assert!(result.latency_ms >= 0.0);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_http_500_is_down() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let result = probe().probe(ProbeKind::Http, &mock_server.uri()).await;

    assert_eq!(result.status, ProbeStatus::Down);
    assert_eq!(result.latency_ms, 0.0);
    assert!(result.error.unwrap().contains("500"));
}

#[tokio::test]
async fn test_non_200_success_is_down() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let result = probe().probe(ProbeKind::Http, &mock_server.uri()).await;

    assert_eq!(result.status, ProbeStatus::Down);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let started = std::time::Instant::now();
    let result = probe().probe(ProbeKind::Http, &mock_server.uri()).await;

    assert_eq!(result.status, ProbeStatus::Down);
    assert_eq!(result.latency_ms, 0.0);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_redirect_to_healthy_page_is_up() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let result = probe()
        .probe(ProbeKind::Http, &format!("{}/old", mock_server.uri()))
        .await;

    assert_eq!(result.status, ProbeStatus::Up);
}

#[tokio::test]
async fn test_address_without_scheme() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    // "http://127.0.0.1:port" -> "127.0.0.1:port"
    let bare = mock_server.uri().trim_start_matches("http://").to_string();
    let result = probe().probe(ProbeKind::Http, &bare).await;

    assert_eq!(result.status, ProbeStatus::Up);
}

#[tokio::test]
async fn test_connection_refused_is_down() {
    // Nothing listens on port 1
    let result = probe().probe(ProbeKind::Http, "http://127.0.0.1:1").await;

    assert_eq!(result.status, ProbeStatus::Down);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_ping_rejects_flag_like_host() {
    let result = probe().probe(ProbeKind::Ping, "-c 100 example.com").await;

    assert_eq!(result.status, ProbeStatus::Down);
    assert_eq!(result.latency_ms, 0.0);
}
