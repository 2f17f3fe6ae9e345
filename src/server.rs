//! HTTP query API.
//!
//! One read endpoint: per-kind event counts for a repository within a time
//! range, plus liveness/readiness probes. Input validation happens before
//! any storage access; validation failures answer 400 with an `error` body,
//! storage failures answer 500.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::storage::{EventCountReader, EventKind, StorageError};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub counts: EventCountReader,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    db: Option<String>,
}

/// Query parameters for the count endpoint.
///
/// All fields arrive as optional strings so that validation failures map to
/// this API's own error body instead of axum's default rejection.
#[derive(Debug, Deserialize)]
pub struct CountQueryParams {
    pub repository: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Successful count response.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub repository: String,
    pub event_counts: BTreeMap<EventKind, i64>,
}

/// Errors surfaced by the count endpoint.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A required parameter is absent or empty. Client error, never retried.
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// A parameter is present but does not parse. Client error.
    #[error("{0} must be an integer UNIX timestamp")]
    InvalidParameter(&'static str),

    /// The store could not serve the query.
    #[error("storage backend error: {0}")]
    Backend(#[from] StorageError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingParameter(_) | Self::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            Self::Backend(e) => {
                tracing::error!(error = %e, "Count query failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let app_state = Arc::new(state);

    Router::new()
        .route("/events/count", get(event_counts_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

fn require<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, QueryError> {
    match value.as_deref() {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(QueryError::MissingParameter(name)),
    }
}

fn parse_timestamp(value: &Option<String>, name: &'static str) -> Result<i64, QueryError> {
    let raw = require(value, name)?;
    raw.parse().map_err(|_| QueryError::InvalidParameter(name))
}

/// Count endpoint: per-kind event counts for one repository and time range.
///
/// `start_time > end_time` is an empty range and yields all-zero counts, not
/// an error.
async fn event_counts_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountQueryParams>,
) -> Result<Json<CountResponse>, QueryError> {
    let repository = require(&params.repository, "repository")?.to_string();
    let start = parse_timestamp(&params.start_time, "start_time")?;
    let end = parse_timestamp(&params.end_time, "end_time")?;

    let event_counts = state.counts.count_by_kind(&repository, start, end)?;

    Ok(Json(CountResponse {
        repository,
        event_counts,
    }))
}

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        db: None,
    })
}

/// Readiness probe that issues a cheap count query against the store.
async fn readyz_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.counts.count_by_kind("octowatch/readyz", 0, 0) {
        Ok(_) => Json(HealthResponse {
            status: "ok".to_string(),
            db: Some("ready".to_string()),
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "not_ready".to_string(),
                    db: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EventRecord, StorageBuilder, StorageHandles};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    fn create_test_state() -> (AppState, StorageHandles, TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test_server.db");

        let handles = StorageBuilder::new(&db_path)
            .pool_size(2)
            .channel_capacity(100)
            .build()
            .expect("Failed to build storage");

        let state = AppState {
            counts: handles.counts.clone(),
        };

        // Return handles AND dir to keep tempdir alive
        (state, handles, dir)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_healthz() {
        let (state, _handles, _dir) = create_test_state();
        let app = create_router(state);

        let (status, body) = get(app, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_readyz() {
        let (state, _handles, _dir) = create_test_state();
        let app = create_router(state);

        let (status, body) = get(app, "/readyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["db"], "ready");
    }

    #[tokio::test]
    async fn test_count_endpoint_empty_store() {
        let (state, _handles, _dir) = create_test_state();
        let app = create_router(state);

        let (status, body) = get(
            app,
            "/events/count?repository=octocat/Hello-World&start_time=0&end_time=1000",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["repository"], "octocat/Hello-World");
        assert_eq!(body["event_counts"]["WatchEvent"], 0);
        assert_eq!(body["event_counts"]["PullRequestEvent"], 0);
        assert_eq!(body["event_counts"]["IssuesEvent"], 0);
    }

    #[tokio::test]
    async fn test_count_endpoint_with_data() {
        let (state, handles, _dir) = create_test_state();

        handles
            .writer
            .append_events(vec![
                EventRecord::new("octocat/Hello-World", EventKind::Watch, 100),
                EventRecord::new("octocat/Hello-World", EventKind::Watch, 200),
                EventRecord::new("octocat/Hello-World", EventKind::Issue, 150),
            ])
            .await
            .unwrap();

        let app = create_router(state);
        let (status, body) = get(
            app,
            "/events/count?repository=octocat/Hello-World&start_time=100&end_time=150",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event_counts"]["WatchEvent"], 1);
        assert_eq!(body["event_counts"]["PullRequestEvent"], 0);
        assert_eq!(body["event_counts"]["IssuesEvent"], 1);
    }

    #[tokio::test]
    async fn test_count_endpoint_missing_repository() {
        let (state, _handles, _dir) = create_test_state();
        let app = create_router(state);

        let (status, body) = get(app, "/events/count?start_time=0&end_time=1000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("repository"));
    }

    #[tokio::test]
    async fn test_count_endpoint_empty_repository() {
        let (state, _handles, _dir) = create_test_state();
        let app = create_router(state);

        let (status, body) = get(app, "/events/count?repository=&start_time=0&end_time=1000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("repository"));
    }

    #[tokio::test]
    async fn test_count_endpoint_non_integer_timestamp() {
        let (state, _handles, _dir) = create_test_state();
        let app = create_router(state);

        let (status, body) = get(
            app,
            "/events/count?repository=a/b&start_time=yesterday&end_time=1000",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("start_time"));
    }

    #[tokio::test]
    async fn test_count_endpoint_missing_timestamps() {
        let (state, _handles, _dir) = create_test_state();
        let app = create_router(state);

        let (status, body) = get(app, "/events/count?repository=a/b").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("start_time"));
    }

    #[tokio::test]
    async fn test_count_endpoint_disordered_range() {
        let (state, handles, _dir) = create_test_state();

        handles
            .writer
            .append_events(vec![EventRecord::new("a/b", EventKind::Watch, 150)])
            .await
            .unwrap();

        let app = create_router(state);
        let (status, body) = get(
            app,
            "/events/count?repository=a/b&start_time=200&end_time=100",
        )
        .await;

        // Empty range: all-zero counts, not an error.
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event_counts"]["WatchEvent"], 0);
    }
}
