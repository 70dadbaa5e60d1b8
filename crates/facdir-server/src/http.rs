//! HTTP surface: `GET /api/faculty-list` and `GET /healthz`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use facdir_core::FacultyEntry;
use facdir_local::FacultyDirectory;

pub const FACULTY_LIST_PATH: &str = "/api/faculty-list";

pub fn router(directory: Arc<FacultyDirectory>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(FACULTY_LIST_PATH, get(faculty_list))
        .with_state(directory)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Always 200 with a JSON array; failures degrade to cached or fallback data.
async fn faculty_list(State(directory): State<Arc<FacultyDirectory>>) -> Json<Vec<FacultyEntry>> {
    let entries = directory.get_faculty_list().await;
    tracing::debug!(entries = entries.len(), "served faculty list");
    Json(entries)
}
