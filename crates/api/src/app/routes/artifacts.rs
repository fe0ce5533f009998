use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::app::{dto, errors, services::AppServices};

/// `GET /api/files`
pub async fn list(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.artifacts.list().await {
        Ok(files) => Json(dto::artifacts_to_json(files)).into_response(),
        Err(e) => errors::artifact_error_to_response(e),
    }
}

/// `GET /api/files/:name`
pub async fn fetch(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    match services.artifacts.read(&name).await {
        Ok(markdown) => (
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            markdown,
        )
            .into_response(),
        Err(e) => errors::artifact_error_to_response(e),
    }
}
