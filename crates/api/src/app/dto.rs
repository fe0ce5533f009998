use serde::Deserialize;

use docforge_core::JobId;
use docforge_infra::artifacts::ArtifactInfo;
use docforge_infra::jobs::{Job, JobStats, JobStatus};

// -------------------------
// Request DTOs
// -------------------------

/// `GET /api/jobs` query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    pub limit: Option<usize>,
}

impl ListJobsQuery {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 500;

    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn submitted_to_json(id: JobId) -> serde_json::Value {
    serde_json::json!({
        "id": id.to_string(),
        "status": JobStatus::Processing.as_str(),
    })
}

/// `result` and `error` appear only for the matching terminal status.
pub fn job_to_json(job: &Job) -> serde_json::Value {
    let mut body = serde_json::json!({
        "id": job.id.to_string(),
        "status": job.status().as_str(),
        "created_at": job.created_at,
        "updated_at": job.updated_at,
    });
    if let Some(result) = job.result() {
        body["result"] = result.clone();
    }
    if let Some(error) = job.error() {
        body["error"] = serde_json::Value::String(error.to_string());
    }
    body
}

pub fn job_list_to_json(jobs: &[Job], stats: JobStats) -> serde_json::Value {
    serde_json::json!({
        "jobs": jobs.iter().map(job_to_json).collect::<Vec<_>>(),
        "stats": stats,
    })
}

pub fn artifacts_to_json(artifacts: Vec<ArtifactInfo>) -> serde_json::Value {
    serde_json::json!({ "files": artifacts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_job_has_no_payload() {
        let job = Job::new(JobId::new());
        let body = job_to_json(&job);

        assert_eq!(body["status"], "processing");
        assert!(body.get("result").is_none());
        assert!(body.get("error").is_none());
    }

    #[test]
    fn completed_job_carries_result_verbatim() {
        let mut job = Job::new(JobId::new());
        job.mark_completed(serde_json::json!({"doc": "# Title"})).unwrap();
        let body = job_to_json(&job);

        assert_eq!(body["status"], "completed");
        assert_eq!(body["result"], serde_json::json!({"doc": "# Title"}));
        assert!(body.get("error").is_none());
    }

    #[test]
    fn failed_job_carries_error() {
        let mut job = Job::new(JobId::new());
        job.mark_failed("agent down").unwrap();
        let body = job_to_json(&job);

        assert_eq!(body["status"], "failed");
        assert_eq!(body["error"], "agent down");
        assert!(body.get("result").is_none());
    }

    #[test]
    fn list_limit_is_clamped() {
        assert_eq!(ListJobsQuery::default().limit(), 50);
        assert_eq!(ListJobsQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(ListJobsQuery { limit: Some(10_000) }.limit(), 500);
    }
}
