//! Submit / poll endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{debug, info};

use docforge_core::{JobId, SubmissionInput};
use docforge_infra::jobs::JobStoreError;

use crate::app::{dto, errors, services::AppServices};

/// `POST /api/generate`
///
/// A body that is not a JSON object is treated like an empty submission, so
/// the client still gets the list of missing fields.
pub async fn generate(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<SubmissionInput>, JsonRejection>,
) -> axum::response::Response {
    let input = match body {
        Ok(Json(input)) => input,
        Err(rejection) => {
            debug!(error = %rejection, "unreadable submission body");
            SubmissionInput::default()
        }
    };

    match services.coordinator.submit(input) {
        Ok(id) => {
            info!(job_id = %id, "generation job accepted");
            (StatusCode::ACCEPTED, Json(dto::submitted_to_json(id))).into_response()
        }
        Err(e) => errors::submit_error_to_response(e),
    }
}

/// `GET /api/status/:id`
pub async fn status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(raw_id): Path<String>,
) -> axum::response::Response {
    // Anything that is not one of our ids is simply an unknown job.
    let Ok(id) = raw_id.parse::<JobId>() else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "job not found");
    };

    match services.coordinator.status(id) {
        Ok(job) => Json(dto::job_to_json(&job)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// `GET /api/jobs?limit=`
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListJobsQuery>,
) -> axum::response::Response {
    let listed: Result<_, JobStoreError> = services
        .coordinator
        .list(query.limit())
        .and_then(|jobs| Ok((jobs, services.coordinator.stats()?)));

    match listed {
        Ok((jobs, stats)) => Json(dto::job_list_to_json(&jobs, stats)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
