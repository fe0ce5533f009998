//! Background job tracking.
//!
//! ## Design
//!
//! - A submission creates a job in `processing` and returns its id at once
//! - The external operation runs in a spawned task the caller never awaits
//! - That task is the only writer of the job's single terminal transition
//! - Clients poll; there is no push notification
//!
//! ## Components
//!
//! - `Job`: record with its state machine (`processing → completed | failed`)
//! - `JobStore`: storage abstraction (in-memory implementation provided)
//! - `JobCoordinator`: submit / status, launches and supervises operations
//! - `retention`: opt-in purge of old terminal jobs

pub mod coordinator;
pub mod retention;
pub mod store;
pub mod types;

pub use coordinator::{CoordinatorConfig, JobCoordinator, SubmitError};
pub use retention::{RetentionHandle, RetentionPolicy};
pub use store::{InMemoryJobStore, JobStore, JobStoreError};
pub use types::{Job, JobState, JobStats, JobStatus};
