//! FieldScope report pipeline
//!
//! Turns a completed submission into a distributed report document:
//! resolve the display payload, render it, upload the file, email the
//! link. The whole pipeline is best-effort and runs after the workflow
//! transition that triggered it has committed; its failures are logged
//! and retried, never surfaced as workflow errors.

#![deny(unsafe_code)]

pub mod error;
pub mod job;
pub mod memory;
pub mod pipeline;

pub use error::{ReportError, ReportResult};
pub use job::{GeneratedReport, ReportJob, RetryPolicy, SpawningTrigger};
pub use pipeline::{BlobStore, ReportDistributor, ReportRenderer};
