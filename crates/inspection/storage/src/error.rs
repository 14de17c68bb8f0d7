use inspection_types::WorkflowError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("stale version: expected {expected}, found {found}")]
    StaleVersion { expected: u64, found: u64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<StorageError> for WorkflowError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => WorkflowError::Storage(format!("not found: {what}")),
            StorageError::Conflict(what) => WorkflowError::Conflict(what),
            StorageError::StaleVersion { expected, found } => WorkflowError::Conflict(format!(
                "submission changed underneath this review: expected version {expected}, found {found}"
            )),
            StorageError::InvalidInput(what) | StorageError::Backend(what) => {
                WorkflowError::Storage(what)
            }
        }
    }
}
