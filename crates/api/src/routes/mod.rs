pub mod health;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /jobs                               enqueue one job or a batch (POST)
/// /projects/{project_id}/jobs         list a project's jobs (GET)
/// /projects/{project_id}/jobs/{id}    fetch one job (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(jobs::router())
}
