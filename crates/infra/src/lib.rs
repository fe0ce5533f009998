//! Infrastructure layer: job tracking, the external operation adapter and
//! artifact storage.

pub mod artifacts;
pub mod jobs;
pub mod operation;
