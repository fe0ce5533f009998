//! Job storage implementations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use docforge_core::JobId;

use super::types::{Job, JobStats, JobStatus};

/// Job store abstraction.
///
/// Each operation is individually atomic. Callers never hold a reference into
/// the store; reads return owned snapshots.
pub trait JobStore: Send + Sync {
    /// Insert a new record in `processing`.
    fn create(&self, id: JobId) -> Result<(), JobStoreError>;

    /// Get a point-in-time snapshot of a job.
    fn get(&self, id: JobId) -> Result<Job, JobStoreError>;

    /// Transition `processing → completed`.
    fn mark_completed(&self, id: JobId, result: serde_json::Value) -> Result<(), JobStoreError>;

    /// Transition `processing → failed`.
    fn mark_failed(&self, id: JobId, error: String) -> Result<(), JobStoreError>;

    /// Most recently created jobs first.
    fn list(&self, limit: usize) -> Result<Vec<Job>, JobStoreError>;

    /// Get job statistics.
    fn stats(&self) -> Result<JobStats, JobStoreError>;

    /// Remove terminal jobs last updated before `older_than`.
    /// Processing jobs are never removed.
    fn purge_terminal(&self, older_than: DateTime<Utc>) -> Result<usize, JobStoreError>;
}

/// Job store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job already exists: {0}")]
    DuplicateId(JobId),
    #[error("invalid transition for job {id}: {from} -> {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
    #[error("storage error: {0}")]
    Storage(String),
}

impl JobStoreError {
    /// Whether this error signals a broken internal invariant rather than a
    /// bad client request.
    pub fn is_internal(&self) -> bool {
        !matches!(self, JobStoreError::NotFound(_))
    }
}

/// In-memory job store.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<JobId, Job>>, JobStoreError> {
        self.jobs
            .read()
            .map_err(|_| JobStoreError::Storage("job map lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<JobId, Job>>, JobStoreError> {
        self.jobs
            .write()
            .map_err(|_| JobStoreError::Storage("job map lock poisoned".to_string()))
    }

    fn transition(
        &self,
        id: JobId,
        to: JobStatus,
        apply: impl FnOnce(&mut Job) -> Result<(), JobStatus>,
    ) -> Result<(), JobStoreError> {
        let mut jobs = self.write()?;
        let job = jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;
        apply(job).map_err(|from| JobStoreError::InvalidTransition { id, from, to })
    }
}

impl JobStore for InMemoryJobStore {
    fn create(&self, id: JobId) -> Result<(), JobStoreError> {
        let mut jobs = self.write()?;
        if jobs.contains_key(&id) {
            return Err(JobStoreError::DuplicateId(id));
        }
        jobs.insert(id, Job::new(id));
        Ok(())
    }

    fn get(&self, id: JobId) -> Result<Job, JobStoreError> {
        let jobs = self.read()?;
        jobs.get(&id).cloned().ok_or(JobStoreError::NotFound(id))
    }

    fn mark_completed(&self, id: JobId, result: serde_json::Value) -> Result<(), JobStoreError> {
        self.transition(id, JobStatus::Completed, |job| job.mark_completed(result))
    }

    fn mark_failed(&self, id: JobId, error: String) -> Result<(), JobStoreError> {
        self.transition(id, JobStatus::Failed, |job| job.mark_failed(error))
    }

    fn list(&self, limit: usize) -> Result<Vec<Job>, JobStoreError> {
        let jobs = self.read()?;
        let mut result: Vec<_> = jobs.values().cloned().collect();

        // UUIDv7 ids break ties between jobs created in the same instant
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        result.truncate(limit);
        Ok(result)
    }

    fn stats(&self) -> Result<JobStats, JobStoreError> {
        let jobs = self.read()?;
        let mut stats = JobStats::default();
        for job in jobs.values() {
            stats.record(job.status());
        }
        Ok(stats)
    }

    fn purge_terminal(&self, older_than: DateTime<Utc>) -> Result<usize, JobStoreError> {
        let mut jobs = self.write()?;
        let before = jobs.len();
        jobs.retain(|_, job| !(job.is_terminal() && job.updated_at < older_than));
        Ok(before - jobs.len())
    }
}

impl<T: JobStore + ?Sized> JobStore for Arc<T> {
    fn create(&self, id: JobId) -> Result<(), JobStoreError> {
        (**self).create(id)
    }

    fn get(&self, id: JobId) -> Result<Job, JobStoreError> {
        (**self).get(id)
    }

    fn mark_completed(&self, id: JobId, result: serde_json::Value) -> Result<(), JobStoreError> {
        (**self).mark_completed(id, result)
    }

    fn mark_failed(&self, id: JobId, error: String) -> Result<(), JobStoreError> {
        (**self).mark_failed(id, error)
    }

    fn list(&self, limit: usize) -> Result<Vec<Job>, JobStoreError> {
        (**self).list(limit)
    }

    fn stats(&self) -> Result<JobStats, JobStoreError> {
        (**self).stats()
    }

    fn purge_terminal(&self, older_than: DateTime<Utc>) -> Result<usize, JobStoreError> {
        (**self).purge_terminal(older_than)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn create_and_get() {
        let store = InMemoryJobStore::new();
        let id = JobId::new();

        store.create(id).unwrap();

        let job = store.get(id).unwrap();
        assert_eq!(job.id, id);
        assert_eq!(job.status(), JobStatus::Processing);
        assert!(job.result().is_none());
        assert!(job.error().is_none());
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let store = InMemoryJobStore::new();
        let id = JobId::new();

        store.create(id).unwrap();
        assert_eq!(store.create(id), Err(JobStoreError::DuplicateId(id)));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = InMemoryJobStore::new();
        let id = JobId::new();

        assert_eq!(store.get(id), Err(JobStoreError::NotFound(id)));
        assert_eq!(
            store.mark_completed(id, serde_json::json!(null)),
            Err(JobStoreError::NotFound(id))
        );
        assert_eq!(
            store.mark_failed(id, "x".to_string()),
            Err(JobStoreError::NotFound(id))
        );
    }

    #[test]
    fn double_completion_is_an_invalid_transition() {
        let store = InMemoryJobStore::new();
        let id = JobId::new();
        store.create(id).unwrap();

        store.mark_completed(id, serde_json::json!("# Title")).unwrap();

        let err = store.mark_failed(id, "late failure".to_string()).unwrap_err();
        assert_eq!(
            err,
            JobStoreError::InvalidTransition {
                id,
                from: JobStatus::Completed,
                to: JobStatus::Failed,
            }
        );
        assert!(err.is_internal());

        // Stored payload is untouched
        let job = store.get(id).unwrap();
        assert_eq!(job.result(), Some(&serde_json::json!("# Title")));
    }

    #[test]
    fn snapshots_are_detached_from_the_store() {
        let store = InMemoryJobStore::new();
        let id = JobId::new();
        store.create(id).unwrap();

        let before = store.get(id).unwrap();
        store.mark_failed(id, "boom".to_string()).unwrap();

        assert_eq!(before.status(), JobStatus::Processing);
        assert_eq!(store.get(id).unwrap().error(), Some("boom"));
    }

    #[test]
    fn stats_tracking() {
        let store = InMemoryJobStore::new();
        let ids: Vec<_> = (0..5).map(|_| JobId::new()).collect();
        for id in &ids {
            store.create(*id).unwrap();
        }

        store.mark_completed(ids[0], serde_json::json!(1)).unwrap();
        store.mark_failed(ids[1], "nope".to_string()).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.processing, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 1);
    }

    #[test]
    fn list_is_newest_first_and_limited() {
        let store = InMemoryJobStore::new();
        let ids: Vec<_> = (1..=4u128)
            .map(|n| JobId::from_uuid(uuid::Uuid::from_u128(n)))
            .collect();
        for id in &ids {
            store.create(*id).unwrap();
        }

        let listed = store.list(2).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, ids[3]);
        assert_eq!(listed[1].id, ids[2]);
    }

    #[test]
    fn purge_only_removes_old_terminal_jobs() {
        let store = InMemoryJobStore::new();
        let done = JobId::new();
        let failed = JobId::new();
        let running = JobId::new();
        for id in [done, failed, running] {
            store.create(id).unwrap();
        }
        store.mark_completed(done, serde_json::json!("ok")).unwrap();
        store.mark_failed(failed, "bad".to_string()).unwrap();

        // Cutoff in the past: nothing is old enough
        let past = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(store.purge_terminal(past).unwrap(), 0);

        let future = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(store.purge_terminal(future).unwrap(), 2);

        assert!(matches!(store.get(done), Err(JobStoreError::NotFound(_))));
        assert!(matches!(store.get(failed), Err(JobStoreError::NotFound(_))));
        assert_eq!(store.get(running).unwrap().status(), JobStatus::Processing);
    }

    #[test]
    fn arc_store_forwards() {
        let store: Arc<dyn JobStore> = InMemoryJobStore::arc();
        let id = JobId::new();
        store.create(id).unwrap();
        assert_eq!(store.get(id).unwrap().id, id);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Complete(u8),
        Fail(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<u8>().prop_map(Op::Complete),
            any::<u8>().prop_map(Op::Fail),
        ]
    }

    proptest! {
        // Whatever sequence of transitions is attempted, only the first one
        // lands and every later read returns that same terminal state.
        #[test]
        fn first_transition_wins(ops in prop::collection::vec(op(), 1..12)) {
            let store = InMemoryJobStore::new();
            let id = JobId::new();
            store.create(id).unwrap();

            let mut accepted = 0;
            for op in &ops {
                let res = match op {
                    Op::Complete(n) => store.mark_completed(id, serde_json::json!(n)),
                    Op::Fail(n) => store.mark_failed(id, n.to_string()),
                };
                if res.is_ok() {
                    accepted += 1;
                }
            }
            prop_assert_eq!(accepted, 1);

            let job = store.get(id).unwrap();
            match &ops[0] {
                Op::Complete(n) => {
                    prop_assert_eq!(job.status(), JobStatus::Completed);
                    prop_assert_eq!(job.result(), Some(&serde_json::json!(n)));
                    prop_assert!(job.error().is_none());
                }
                Op::Fail(n) => {
                    prop_assert_eq!(job.status(), JobStatus::Failed);
                    let expected = n.to_string();
                    prop_assert_eq!(job.error(), Some(expected.as_str()));
                    prop_assert!(job.result().is_none());
                }
            }
            prop_assert_eq!(store.get(id).unwrap(), job);
        }
    }
}
