//! Seams to the external report services.
//!
//! Rendering, cloud storage, and delivery are opaque collaborators; the
//! pipeline only sequences them. Each trait maps to one external system
//! and stays narrow enough to fake in tests.

use crate::ReportResult;
use async_trait::async_trait;
use inspection_engine::FlatFieldMap;
use inspection_types::Submission;

/// Renders the resolved field payload into a report document.
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    async fn render(&self, module_type: &str, fields: &FlatFieldMap) -> ReportResult<Vec<u8>>;
}

/// Uploads a rendered document, returning its public URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> ReportResult<String>;
}

/// Delivers the finished report link to the submission's stakeholders.
#[async_trait]
pub trait ReportDistributor: Send + Sync {
    async fn send(&self, submission: &Submission, url: &str) -> ReportResult<()>;
}
