//! Inspection domain types for FieldScope
//!
//! This crate defines the entities shared by the workflow engine and the
//! storage layer:
//!
//! - [`Designation`] and [`Stage`]: who reviews, and in what order
//! - [`StageConfig`]: the immutable review-sequence table
//! - [`Submission`]: one site-visit form moving through review
//! - [`WorkflowStatus`]: the state machine's states, including the
//!   preserved legacy two-stage path
//! - [`WorkflowError`]: the engine's error taxonomy

#![deny(unsafe_code)]

pub mod designation;
pub mod errors;
pub mod submission;

pub use designation::{Designation, Stage, StageConfig};
pub use errors::{WorkflowError, WorkflowResult};
pub use submission::{Actor, ActorId, FormData, Submission, SubmissionId, WorkflowStatus};
