use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use docforge_infra::artifacts::ArtifactError;
use docforge_infra::jobs::{JobStoreError, SubmitError};

pub fn submit_error_to_response(err: SubmitError) -> axum::response::Response {
    match err {
        SubmitError::Validation(e) => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "validation_error",
                "message": e.to_string(),
                "missing": e.missing(),
            })),
        )
            .into_response(),
        SubmitError::Store(e) => store_error_to_response(e),
    }
}

pub fn store_error_to_response(err: JobStoreError) -> axum::response::Response {
    match err {
        JobStoreError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", "job not found"),
        other => {
            // Duplicate ids, invalid transitions and storage faults are invariant breaks
            error!(error = %other, "job store invariant violated");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", other.to_string())
        }
    }
}

pub fn artifact_error_to_response(err: ArtifactError) -> axum::response::Response {
    match err {
        ArtifactError::InvalidName(name) => json_error(
            StatusCode::BAD_REQUEST,
            "invalid_name",
            format!("invalid artifact name: {name}"),
        ),
        ArtifactError::NotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "artifact not found")
        }
        ArtifactError::Io(e) => {
            error!(error = %e, "artifact storage failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "artifact_error", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
