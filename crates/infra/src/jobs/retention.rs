//! Optional retention of terminal jobs.
//!
//! Without a policy every job record is kept for the life of the process.
//! With one, a background task periodically drops terminal records older than
//! the TTL. Processing jobs are never touched.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::store::JobStore;

/// Retention policy for terminal jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// How long a completed/failed job stays visible after its last update
    pub ttl: Duration,
    /// How often the sweeper runs
    pub sweep_interval: Duration,
}

impl RetentionPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sweep_interval: Duration::from_secs(60),
        }
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Oldest `updated_at` that survives a sweep at `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let ttl = chrono::Duration::from_std(self.ttl).ok()?;
        now.checked_sub_signed(ttl)
    }
}

/// Handle to a running sweeper.
#[derive(Debug)]
pub struct RetentionHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl RetentionHandle {
    /// Stop the sweeper and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.join).await;
    }
}

/// Run one sweep. Returns the number of purged jobs.
pub fn sweep<S: JobStore + ?Sized>(store: &S, policy: &RetentionPolicy, now: DateTime<Utc>) -> usize {
    let Some(cutoff) = policy.cutoff(now) else {
        return 0;
    };
    match store.purge_terminal(cutoff) {
        Ok(purged) => {
            if purged > 0 {
                info!(purged, %cutoff, "purged expired jobs");
            }
            purged
        }
        Err(e) => {
            error!(error = %e, "job retention sweep failed");
            0
        }
    }
}

/// Spawn the periodic sweeper on the current tokio runtime.
pub fn spawn_sweeper<S>(store: Arc<S>, policy: RetentionPolicy) -> RetentionHandle
where
    S: JobStore + ?Sized + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let join = tokio::spawn(async move {
        info!(ttl_secs = policy.ttl.as_secs(), "job retention sweeper started");
        let mut ticker = tokio::time::interval(policy.sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {
                    let purged = sweep(&*store, &policy, Utc::now());
                    debug!(purged, "retention sweep finished");
                }
            }
        }

        info!("job retention sweeper stopped");
    });

    RetentionHandle {
        shutdown: Some(shutdown_tx),
        join,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::store::{InMemoryJobStore, JobStoreError};
    use docforge_core::JobId;

    #[test]
    fn sweep_respects_ttl() {
        let store = InMemoryJobStore::new();
        let done = JobId::new();
        let running = JobId::new();
        store.create(done).unwrap();
        store.create(running).unwrap();
        store.mark_completed(done, serde_json::json!("ok")).unwrap();

        let policy = RetentionPolicy::new(Duration::from_secs(3600));

        // Too fresh to purge
        assert_eq!(sweep(&store, &policy, Utc::now()), 0);

        // Two hours later the completed job is gone, the running one stays
        let later = Utc::now() + chrono::Duration::hours(2);
        assert_eq!(sweep(&store, &policy, later), 1);
        assert_eq!(store.get(done), Err(JobStoreError::NotFound(done)));
        assert!(store.get(running).is_ok());
    }

    #[test]
    fn huge_ttl_never_purges() {
        let store = InMemoryJobStore::new();
        let id = JobId::new();
        store.create(id).unwrap();
        store.mark_failed(id, "x".to_string()).unwrap();

        let policy = RetentionPolicy::new(Duration::from_secs(u64::MAX));
        assert_eq!(sweep(&store, &policy, Utc::now()), 0);
        assert!(store.get(id).is_ok());
    }

    #[tokio::test]
    async fn sweeper_purges_in_background_and_stops() {
        let store = InMemoryJobStore::arc();
        let id = JobId::new();
        store.create(id).unwrap();
        store.mark_completed(id, serde_json::json!("ok")).unwrap();

        let policy =
            RetentionPolicy::new(Duration::ZERO).with_sweep_interval(Duration::from_millis(5));
        let handle = spawn_sweeper(store.clone(), policy);

        let mut gone = false;
        for _ in 0..200 {
            if store.get(id).is_err() {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        handle.shutdown().await;
        assert!(gone, "completed job was not purged");
    }
}
