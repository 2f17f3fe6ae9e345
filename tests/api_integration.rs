//! End-to-end tests for the count-query API over a real TCP listener.

use std::net::SocketAddr;

use serde_json::Value;
use tempfile::TempDir;

use octowatch::server::{create_router, AppState};
use octowatch::storage::{EventKind, EventRecord, StorageBuilder, StorageHandles};

struct TestApp {
    addr: SocketAddr,
    handles: StorageHandles,
    _dir: TempDir,
}

async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("api_test.db");

    let handles = StorageBuilder::new(&db_path)
        .pool_size(2)
        .channel_capacity(100)
        .build()
        .expect("Failed to build storage");

    let state = AppState {
        counts: handles.counts.clone(),
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        addr,
        handles,
        _dir: dir,
    }
}

async fn get_json(addr: SocketAddr, path_and_query: &str) -> (u16, Value) {
    let url = format!("http://{addr}{path_and_query}");
    let response = reqwest::get(&url).await.expect("request failed");
    let status = response.status().as_u16();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn count_query_returns_per_kind_counts() {
    let app = spawn_app().await;

    app.handles
        .writer
        .append_events(vec![
            EventRecord::new("octocat/Hello-World", EventKind::Watch, 100),
            EventRecord::new("octocat/Hello-World", EventKind::Watch, 200),
            EventRecord::new("octocat/Hello-World", EventKind::Issue, 150),
        ])
        .await
        .unwrap();

    let (status, body) = get_json(
        app.addr,
        "/events/count?repository=octocat/Hello-World&start_time=100&end_time=150",
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["repository"], "octocat/Hello-World");
    assert_eq!(body["event_counts"]["WatchEvent"], 1);
    assert_eq!(body["event_counts"]["PullRequestEvent"], 0);
    assert_eq!(body["event_counts"]["IssuesEvent"], 1);
}

#[tokio::test]
async fn count_query_scopes_to_repository() {
    let app = spawn_app().await;

    app.handles
        .writer
        .append_events(vec![
            EventRecord::new("rust-lang/rust", EventKind::PullRequest, 500),
            EventRecord::new("tokio-rs/tokio", EventKind::PullRequest, 500),
        ])
        .await
        .unwrap();

    let (status, body) = get_json(
        app.addr,
        "/events/count?repository=rust-lang/rust&start_time=0&end_time=1000",
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["event_counts"]["PullRequestEvent"], 1);

    let (_, body) = get_json(
        app.addr,
        "/events/count?repository=unknown/repo&start_time=0&end_time=1000",
    )
    .await;
    assert_eq!(body["event_counts"]["PullRequestEvent"], 0);
    assert_eq!(body["event_counts"]["WatchEvent"], 0);
    assert_eq!(body["event_counts"]["IssuesEvent"], 0);
}

#[tokio::test]
async fn count_query_range_is_inclusive() {
    let app = spawn_app().await;

    app.handles
        .writer
        .append_events(vec![
            EventRecord::new("a/b", EventKind::Watch, 99),
            EventRecord::new("a/b", EventKind::Watch, 100),
            EventRecord::new("a/b", EventKind::Watch, 200),
            EventRecord::new("a/b", EventKind::Watch, 201),
        ])
        .await
        .unwrap();

    let (status, body) = get_json(
        app.addr,
        "/events/count?repository=a/b&start_time=100&end_time=200",
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["event_counts"]["WatchEvent"], 2);
}

#[tokio::test]
async fn count_query_disordered_range_yields_zeros() {
    let app = spawn_app().await;

    app.handles
        .writer
        .append_events(vec![EventRecord::new("a/b", EventKind::Watch, 150)])
        .await
        .unwrap();

    let (status, body) = get_json(
        app.addr,
        "/events/count?repository=a/b&start_time=200&end_time=100",
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["event_counts"]["WatchEvent"], 0);
    assert_eq!(body["event_counts"]["PullRequestEvent"], 0);
    assert_eq!(body["event_counts"]["IssuesEvent"], 0);
}

#[tokio::test]
async fn count_query_rejects_missing_parameters() {
    let app = spawn_app().await;

    let (status, body) = get_json(app.addr, "/events/count?start_time=0&end_time=10").await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("repository"));

    let (status, body) = get_json(app.addr, "/events/count?repository=a/b&end_time=10").await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("start_time"));

    let (status, body) = get_json(app.addr, "/events/count?repository=a/b&start_time=0").await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("end_time"));
}

#[tokio::test]
async fn count_query_rejects_non_integer_timestamps() {
    let app = spawn_app().await;

    let (status, body) = get_json(
        app.addr,
        "/events/count?repository=a/b&start_time=noon&end_time=10",
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("start_time"));

    let (status, body) = get_json(
        app.addr,
        "/events/count?repository=a/b&start_time=0&end_time=3.5",
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("end_time"));
}

#[tokio::test]
async fn health_probes_respond() {
    let app = spawn_app().await;

    let (status, body) = get_json(app.addr, "/healthz").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");

    let (status, body) = get_json(app.addr, "/readyz").await;
    assert_eq!(status, 200);
    assert_eq!(body["db"], "ready");
}
