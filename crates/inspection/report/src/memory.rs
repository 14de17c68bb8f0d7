//! In-memory implementations of the report seams, used in tests and
//! local development.

use crate::pipeline::{BlobStore, ReportDistributor, ReportRenderer};
use crate::{ReportError, ReportResult};
use async_trait::async_trait;
use inspection_engine::FlatFieldMap;
use inspection_types::{Submission, SubmissionId};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

/// Renderer producing a placeholder document; can be primed to fail a
/// number of times to exercise the job's retry handling.
#[derive(Default)]
pub struct StubRenderer {
    fail_remaining: AtomicU32,
    rendered: AtomicU32,
}

impl StubRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_times(times: u32) -> Self {
        Self {
            fail_remaining: AtomicU32::new(times),
            rendered: AtomicU32::new(0),
        }
    }

    pub fn rendered(&self) -> u32 {
        self.rendered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportRenderer for StubRenderer {
    async fn render(&self, module_type: &str, fields: &FlatFieldMap) -> ReportResult<Vec<u8>> {
        if self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ReportError::Render(
                "rendering service unavailable".to_string(),
            ));
        }
        self.rendered.fetch_add(1, Ordering::SeqCst);
        let payload = serde_json::json!({
            "module_type": module_type,
            "fields": fields,
        });
        Ok(payload.to_string().into_bytes())
    }
}

/// Blob store that records uploads and serves deterministic URLs.
#[derive(Default)]
pub struct InMemoryBlobStore {
    uploads: RwLock<Vec<(String, usize)>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploaded `(name, byte length)` pairs, oldest first.
    pub fn uploads(&self) -> Vec<(String, usize)> {
        self.uploads.read().map(|u| u.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> ReportResult<String> {
        let mut uploads = self
            .uploads
            .write()
            .map_err(|_| ReportError::Upload("blob lock poisoned".to_string()))?;
        uploads.push((name.to_string(), bytes.len()));
        Ok(format!("https://blobs.local/reports/{name}"))
    }
}

/// Distributor that records deliveries.
#[derive(Default)]
pub struct RecordingDistributor {
    sent: RwLock<Vec<(SubmissionId, String)>>,
}

impl RecordingDistributor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(SubmissionId, String)> {
        self.sent.read().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReportDistributor for RecordingDistributor {
    async fn send(&self, submission: &Submission, url: &str) -> ReportResult<()> {
        let mut sent = self
            .sent
            .write()
            .map_err(|_| ReportError::Distribution("distributor lock poisoned".to_string()))?;
        sent.push((submission.id.clone(), url.to_string()));
        Ok(())
    }
}
