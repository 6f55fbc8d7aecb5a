//! Provider client tests against a local stand-in service.

use std::net::SocketAddr;

use assert_matches::assert_matches;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use reelflow_core::config::ProviderEndpoint;
use reelflow_core::params::{AvatarParams, JobInput};
use reelflow_providers::avatar::AvatarClient;
use reelflow_providers::{ProviderAdapter, ProviderError};

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn endpoint(addr: SocketAddr) -> ProviderEndpoint {
    ProviderEndpoint {
        base_url: format!("http://{addr}"),
        api_key: "test-key".into(),
    }
}

fn narration_input() -> JobInput {
    JobInput::AvatarSynthesis(AvatarParams {
        script: "hello there".into(),
        avatar_id: "ava-1".into(),
        voice_id: "voice-1".into(),
    })
}

#[tokio::test]
async fn avatar_start_then_probe_reaches_complete() {
    let app = Router::new()
        .route(
            "/v1/videos",
            post(|| async { Json(json!({"video_id": "vid-1"})) }),
        )
        .route(
            "/v1/videos/{video_id}",
            get(|Path(video_id): Path<String>| async move {
                Json(json!({
                    "status": "ready",
                    "video_url": format!("https://cdn.example/{video_id}.mp4"),
                    "duration": 12.5,
                }))
            }),
        );
    let addr = serve(app).await;
    let client = AvatarClient::new(reqwest::Client::new(), &endpoint(addr));

    let external = client.start(&narration_input()).await.unwrap();
    assert_eq!(external.id, "vid-1");

    let probe = client.check_status(&external).await.unwrap();
    assert!(probe.is_complete());
    assert_eq!(probe.url.as_deref(), Some("https://cdn.example/vid-1.mp4"));
    assert_eq!(probe.duration_secs, Some(12.5));
}

#[tokio::test]
async fn payment_required_maps_to_insufficient_credit() {
    let app = Router::new().route(
        "/v1/videos",
        post(|| async { (StatusCode::PAYMENT_REQUIRED, "credit exhausted") }),
    );
    let addr = serve(app).await;
    let client = AvatarClient::new(reqwest::Client::new(), &endpoint(addr));

    let err = client.start(&narration_input()).await.unwrap_err();
    assert_matches!(err, ProviderError::InsufficientCredit(ref body) if body == "credit exhausted");
    assert!(err.is_permanent());
}

#[tokio::test]
async fn server_error_surfaces_status_and_body() {
    let app = Router::new().route(
        "/v1/videos",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = serve(app).await;
    let client = AvatarClient::new(reqwest::Client::new(), &endpoint(addr));

    let err = client.start(&narration_input()).await.unwrap_err();
    assert_matches!(err, ProviderError::Api { status: 500, ref body } if body == "boom");
    assert!(!err.is_permanent());
}
