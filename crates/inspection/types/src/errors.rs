//! Error types for the workflow layer
//!
//! Every variant is recoverable by the caller; none are fatal to the
//! process. Cross-stage comment contamination is not an error: it is
//! logged as a warning and the suspect value is discarded.

use crate::designation::Designation;
use crate::submission::{ActorId, SubmissionId, WorkflowStatus};

/// Errors that can occur in workflow operations
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{designation} is not authorized to {action} while submission is {status}")]
    Authorization {
        action: &'static str,
        designation: Designation,
        status: WorkflowStatus,
    },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("submission not found: {0}")]
    SubmissionNotFound(SubmissionId),

    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    #[error("actor is inactive: {0}")]
    ActorInactive(ActorId),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;
