//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - Service CRUD validates input and maps errors to status codes
//! - Listing services runs a poll cycle
//! - Metric thresholds raise deduplicated notifications
//! - Authentication middleware functions properly

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use netdash::api::{ApiState, build_router, spawn_api_server};
use netdash::config::{ApiSettings, Thresholds};
use netdash::monitors::probe::{Probe, ProbeResult};
use netdash::monitors::system::StaticSource;
use netdash::storage::memory::MemoryBackend;
use netdash::{MemoryInformation, SystemMetrics};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::helpers::{FailingStorage, ScriptedProbe, TestStack, test_stack};

const PING_TARGET: &str = "8.8.8.8";

fn metrics(cpu: f32, memory: f32) -> SystemMetrics {
    SystemMetrics {
        cpu,
        memory: MemoryInformation {
            total: 16_000_000_000,
            used: (16_000_000_000.0 * f64::from(memory) / 100.0) as u64,
            percent: memory,
        },
        ..Default::default()
    }
}

fn state_for(stack: &TestStack, probe: Arc<dyn Probe>, sample: SystemMetrics) -> ApiState {
    ApiState {
        registry: stack.registry.clone(),
        poller: stack.spawn_poller(),
        notifications: stack.notifications.clone(),
        storage: stack.storage.clone(),
        metrics: Arc::new(StaticSource { metrics: sample }),
        thresholds: Thresholds::default(),
        probe,
        ping_target: PING_TARGET.to_string(),
        user_id: 1,
        recent_limit: 10,
    }
}

fn settings(auth_token: Option<&str>) -> ApiSettings {
    ApiSettings {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        auth_token: auth_token.map(str::to_string),
        enable_cors: true,
    }
}

// Helper to create test API server
async fn spawn_test_api(probe: ScriptedProbe, sample: SystemMetrics) -> (SocketAddr, TestStack) {
    let probe: Arc<dyn Probe> = Arc::new(probe);
    let stack = test_stack(Arc::new(MemoryBackend::new()), probe.clone(), &Default::default());
    let state = state_for(&stack, probe, sample);

    let addr = spawn_api_server(settings(None), state).await.unwrap();
    (addr, stack)
}

async fn default_api() -> (SocketAddr, TestStack) {
    spawn_test_api(ScriptedProbe::default(), metrics(10.0, 20.0)).await
}

#[tokio::test]
async fn test_health_endpoint() {
    let (addr, _stack) = default_api().await;

    let response = reqwest::get(format!("http://{addr}/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"]["healthy"], true);
}

#[tokio::test]
async fn test_create_and_list_services() {
    let (addr, _stack) = default_api().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/services"))
        .json(&json!({"name": "API", "url": "api.example.com", "type": "http"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Service added");
    assert_eq!(body["service"]["status"], "Unknown");
    let id = body["service"]["id"].as_i64().unwrap();

    let list: Value = client
        .get(format!("http://{addr}/api/services"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let services = list.as_array().unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0]["id"], id);
    assert_eq!(services[0]["name"], "API");
    assert_eq!(services[0]["url"], "api.example.com");
    assert_eq!(services[0]["type"], "http");
    assert_eq!(services[0]["status"], "Up");
    assert_eq!(services[0]["response_time"], 5.0);
    assert!(services[0]["last_checked"].is_string());
}

#[tokio::test]
async fn test_create_service_validation() {
    let (addr, stack) = default_api().await;
    let client = reqwest::Client::new();

    for payload in [
        json!({"name": "API"}),
        json!({"name": "  ", "url": "api.example.com"}),
        json!({"name": "API", "url": "api.example.com", "type": "tcp"}),
    ] {
        let response = client
            .post(format!("http://{addr}/api/services"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "payload: {payload}");

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "error");
    }

    // Malformed JSON
    let response = client
        .post(format!("http://{addr}/api/services"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(stack.registry.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_service() {
    let (addr, stack) = default_api().await;
    let client = reqwest::Client::new();
    let target = stack.register("web", "web.example.com", "http").await;

    let response = client
        .put(format!("http://{addr}/api/services"))
        .json(&json!({"id": target.id, "name": "website", "type": "ping"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Service updated");
    assert_eq!(body["service"]["name"], "website");
    assert_eq!(body["service"]["url"], "web.example.com");
    assert_eq!(body["service"]["type"], "ping");

    let missing_id = client
        .put(format!("http://{addr}/api/services"))
        .json(&json!({"name": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_id.status(), StatusCode::BAD_REQUEST);

    let unknown = client
        .put(format!("http://{addr}/api/services"))
        .json(&json!({"id": 9999, "name": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_service() {
    let (addr, stack) = default_api().await;
    let client = reqwest::Client::new();
    let target = stack.register("web", "web.example.com", "http").await;

    let unknown = client
        .delete(format!("http://{addr}/api/services/9999"))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert_eq!(stack.registry.list().await.unwrap().len(), 1);

    let response = client
        .delete(format!("http://{addr}/api/services/{}", target.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "success");

    assert!(stack.registry.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_metrics_raise_deduplicated_notifications() {
    let (addr, _stack) = spawn_test_api(ScriptedProbe::default(), metrics(95.0, 92.5)).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let body: Value = client
            .get(format!("http://{addr}/api/metrics"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["cpu"], 95.0);
        assert_eq!(body["memory"]["percent"], 92.5);
    }

    let notifications: Value = client
        .get(format!("http://{addr}/api/notifications"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(notifications["unread_count"], 2);
    let list = notifications["list"].as_array().unwrap();
    let mut titles: Vec<&str> = list.iter().map(|n| n["title"].as_str().unwrap()).collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["Critical Memory Usage", "High CPU Load"]);

    let cpu = list.iter().find(|n| n["title"] == "High CPU Load").unwrap();
    assert_eq!(cpu["message"], "CPU is at 95.0%");
    assert_eq!(cpu["type"], "danger");
    assert_eq!(cpu["read"], false);
    assert_eq!(cpu["time"].as_str().unwrap().len(), 8);
}

#[tokio::test]
async fn test_metrics_at_threshold_raise_nothing() {
    let (addr, stack) = spawn_test_api(ScriptedProbe::default(), metrics(90.0, 90.0)).await;

    let response = reqwest::get(format!("http://{addr}/api/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(stack.notifications.unread_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_mark_read() {
    let (addr, stack) = spawn_test_api(ScriptedProbe::default(), metrics(99.0, 10.0)).await;
    let client = reqwest::Client::new();

    client.get(format!("http://{addr}/api/metrics")).send().await.unwrap();
    assert_eq!(stack.notifications.unread_count().await.unwrap(), 1);

    let response: Value = client
        .post(format!("http://{addr}/api/notifications/mark_read"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["status"], "success");
    assert_eq!(response["updated"], 1);

    let notifications: Value = client
        .get(format!("http://{addr}/api/notifications"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(notifications["unread_count"], 0);
    assert_eq!(notifications["list"][0]["read"], true);
}

#[tokio::test]
async fn test_ping_ok() {
    let probe = ScriptedProbe::default().with(PING_TARGET, ProbeResult::up(14.2));
    let (addr, _stack) = spawn_test_api(probe, metrics(10.0, 10.0)).await;

    let body: Value = reqwest::get(format!("http://{addr}/api/ping"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["latency"], 14.2);
    assert_eq!(body["target"], PING_TARGET);
}

#[tokio::test]
async fn test_ping_error() {
    let probe = ScriptedProbe::default().with(PING_TARGET, ProbeResult::down("ping timed out"));
    let (addr, _stack) = spawn_test_api(probe, metrics(10.0, 10.0)).await;

    let response = reqwest::get(format!("http://{addr}/api/ping")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["latency"], -1.0);
}

#[tokio::test]
async fn test_settings_roundtrip() {
    let (addr, _stack) = default_api().await;
    let client = reqwest::Client::new();

    let defaults: Value = client
        .get(format!("http://{addr}/api/settings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(defaults["theme"], "system");
    assert_eq!(defaults["notifications_enabled"], true);
    assert!(defaults["telegram_bot_token"].is_null());

    let response: Value = client
        .post(format!("http://{addr}/api/settings"))
        .json(&json!({
            "theme": "dark",
            "show_public_ip": true,
            "telegram_bot_token": "123:abc",
            "telegram_chat_id": "42",
            "notifications_enabled": false,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["status"], "success");
    assert_eq!(response["message"], "Settings saved");

    let saved: Value = client
        .get(format!("http://{addr}/api/settings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved["theme"], "dark");
    assert_eq!(saved["show_public_ip"], true);
    assert_eq!(saved["telegram_chat_id"], "42");
    assert_eq!(saved["notifications_enabled"], false);
    assert!(saved["whatsapp_phone"].is_null());
}

#[tokio::test]
async fn test_auth_required_when_token_configured() {
    let probe: Arc<dyn Probe> = Arc::new(ScriptedProbe::default());
    let stack = test_stack(Arc::new(MemoryBackend::new()), probe.clone(), &Default::default());
    let state = state_for(&stack, probe, metrics(10.0, 10.0));
    let addr = spawn_api_server(settings(Some("test-token")), state).await.unwrap();
    let client = reqwest::Client::new();

    let missing = client
        .get(format!("http://{addr}/api/settings"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = client
        .get(format!("http://{addr}/api/settings"))
        .bearer_auth("wrong-token")
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);

    let ok = client
        .get(format!("http://{addr}/api/settings"))
        .bearer_auth("test-token")
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let health = client
        .get(format!("http://{addr}/api/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unreadable_settings_do_not_fail_requests() {
    let probe: Arc<dyn Probe> = Arc::new(
        ScriptedProbe::default().with("db.internal", ProbeResult::down("connection refused")),
    );
    let storage = Arc::new(FailingStorage {
        fail_settings: true,
        ..Default::default()
    });
    let stack = test_stack(storage, probe.clone(), &Default::default());
    stack.register("db", "db.internal", "ping").await;
    let app = build_router(state_for(&stack, probe, metrics(95.0, 10.0)), &settings(None));

    let metrics_response = app
        .clone()
        .oneshot(Request::get("/api/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(metrics_response.status(), StatusCode::OK);

    let services_response = app
        .oneshot(Request::get("/api/services").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(services_response.status(), StatusCode::OK);

    let services = stack.registry.list().await.unwrap();
    assert_eq!(services[0].status, netdash::storage::TargetStatus::Down);

    let mut titles: Vec<String> = stack
        .notifications
        .list_recent(10)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.title)
        .collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["High CPU Load", "Service Down: db"]);
}

#[tokio::test]
async fn test_router_without_server() {
    let probe: Arc<dyn Probe> = Arc::new(ScriptedProbe::default());
    let stack = test_stack(Arc::new(MemoryBackend::new()), probe.clone(), &Default::default());
    let app = build_router(state_for(&stack, probe, metrics(10.0, 10.0)), &settings(None));

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/services/not-a-number")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
