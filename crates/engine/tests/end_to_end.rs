//! Full loop: enqueue, pool claim, execution, aggregation, callback.

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use common::{FakeAdapter, NoopScheduler};
use tokio_util::sync::CancellationToken;

use reelflow_core::config::OrchestratorConfig;
use reelflow_core::job::{JobStatus, NewJob, QueueType};
use reelflow_core::params::{AvatarParams, ImageParams, JobInput};
use reelflow_engine::{JobRunner, Orchestrator};
use reelflow_providers::{Provider, ProviderRegistry};
use reelflow_store::{CompletionAggregator, JobStore, MemoryJobStore};

#[derive(Clone, Default)]
struct Received {
    count: Arc<AtomicUsize>,
    payloads: Arc<std::sync::Mutex<Vec<serde_json::Value>>>,
}

async fn capture(State(state): State<Received>, Json(body): Json<serde_json::Value>) {
    state.count.fetch_add(1, Ordering::SeqCst);
    state.payloads.lock().unwrap().push(body);
}

async fn spawn_callback_server() -> (String, Received) {
    let received = Received::default();
    let app = Router::new()
        .route("/hook", post(capture))
        .with_state(received.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/hook"), received)
}

#[tokio::test]
async fn two_sibling_jobs_complete_and_fire_one_callback() {
    let (callback_url, received) = spawn_callback_server().await;

    let store: Arc<MemoryJobStore> = Arc::new(MemoryJobStore::new());
    store
        .enqueue(NewJob {
            project_id: "proj-1".into(),
            callback_url: callback_url.clone(),
            input: JobInput::AvatarSynthesis(AvatarParams {
                script: "hi".into(),
                avatar_id: "a".into(),
                voice_id: "v".into(),
            }),
            slug: Some("narration".into()),
        })
        .await
        .unwrap();
    store
        .enqueue(NewJob {
            project_id: "proj-1".into(),
            callback_url,
            input: JobInput::ImageSynthesis(ImageParams {
                prompt: "a sunset".into(),
                width: None,
                height: None,
                style: None,
            }),
            slug: Some("cover".into()),
        })
        .await
        .unwrap();

    let registry = Arc::new(ProviderRegistry::new(HashMap::from([
        (
            QueueType::AvatarSynthesis,
            Provider::Polled(Arc::new(FakeAdapter::immediate_success(
                "https://cdn.example/n.mp4",
            )) as _),
        ),
        (
            QueueType::ImageSynthesis,
            Provider::Polled(Arc::new(FakeAdapter::immediate_success(
                "https://cdn.example/cover.png",
            )) as _),
        ),
    ])));

    let mut config = OrchestratorConfig::default();
    config.timing.idle_backoff = Duration::from_millis(10);

    let aggregator = Arc::new(CompletionAggregator::new(store.clone()));
    let runner = Arc::new(JobRunner::new(
        store.clone(),
        registry,
        aggregator,
        Arc::new(NoopScheduler),
        config.clone(),
    ));

    let orchestrator = Arc::new(Orchestrator::new(store.clone(), runner, config));
    let cancel = CancellationToken::new();
    let orchestrator_task = {
        let orchestrator = orchestrator.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { orchestrator.run(cancel).await })
    };

    // Wait for both jobs to reach a terminal state.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let jobs = store.list_by_project("proj-1").await.unwrap();
        if jobs.iter().all(|j| j.status.is_terminal()) {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "jobs did not finish in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    cancel.cancel();
    orchestrator_task.await.unwrap();

    let jobs = store.list_by_project("proj-1").await.unwrap();
    assert!(jobs.iter().all(|j| j.status == JobStatus::Ready));

    // Give the losing sibling's aggregation a moment, then assert the
    // callback fired exactly once with both jobs.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(received.count.load(Ordering::SeqCst), 1);
    let payloads = received.payloads.lock().unwrap();
    assert_eq!(payloads[0]["projectId"], "proj-1");
    assert_eq!(payloads[0]["jobs"].as_array().unwrap().len(), 2);
}
