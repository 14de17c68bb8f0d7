use thiserror::Error;

/// Errors from the report pipeline. These never convert into workflow
/// errors; the transition that triggered the report is already
/// committed.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report rendering failed: {0}")]
    Render(String),

    #[error("report upload failed: {0}")]
    Upload(String),

    #[error("report distribution failed: {0}")]
    Distribution(String),

    #[error("report generation gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

pub type ReportResult<T> = Result<T, ReportError>;
