//! Shared helpers for API integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use reelflow_api::{build_app_router, AppState, ServerConfig};
use reelflow_core::job::{Job, JobUpdate, NewJob, QueueType};
use reelflow_store::{JobStore, MemoryJobStore, StoreError};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Build the production router over an in-memory store.
pub fn build_test_app() -> (Router, Arc<MemoryJobStore>) {
    let store = Arc::new(MemoryJobStore::new());
    let app = build_app_with(store.clone());
    (app, store)
}

/// Build the production router over any store implementation.
pub fn build_app_with(store: Arc<dyn JobStore>) -> Router {
    let config = test_config();
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Store whose every operation fails as if the database were down.
pub struct FailingStore;

#[async_trait]
impl JobStore for FailingStore {
    async fn enqueue(&self, _new: NewJob) -> Result<Job, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn update(
        &self,
        _project_id: &str,
        _job_id: &str,
        _update: JobUpdate,
    ) -> Result<Job, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn get(&self, _project_id: &str, _job_id: &str) -> Result<Option<Job>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn list_by_project(&self, _project_id: &str) -> Result<Vec<Job>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn claim_pending(&self, _queue: QueueType) -> Result<Option<Job>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn try_claim_completion(&self, _project_id: &str) -> Result<bool, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }
}

/// Send a JSON request through the router and return (status, body).
pub async fn request_json(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (u16, serde_json::Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}
