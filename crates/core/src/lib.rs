//! `docforge-core`: shared building blocks.
//!
//! This crate contains **pure** primitives (no runtime or I/O concerns): job
//! identifiers, the error model, and the submission input contract.

pub mod error;
pub mod id;
pub mod request;

pub use error::{DomainError, DomainResult};
pub use id::JobId;
pub use request::{ExtractionRequest, SubmissionInput};
