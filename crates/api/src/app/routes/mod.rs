use axum::{
    routing::{get, post},
    Router,
};

pub mod artifacts;
pub mod jobs;
pub mod system;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .route("/generate", post(jobs::generate))
        .route("/status/:id", get(jobs::status))
        .route("/jobs", get(jobs::list))
        .route("/files", get(artifacts::list))
        .route("/files/:name", get(artifacts::fetch))
}
