//! The best-effort report job
//!
//! Triggered after a transition reaches `Completed`, outside the
//! workflow's transactional boundary. The job resolves the display
//! payload, renders it, uploads the document, and delivers the link,
//! retrying the whole sequence up to a bounded attempt cap. Exhaustion
//! is logged; the workflow state that enqueued the job stays committed
//! no matter what happens here, and `run` can be invoked again for
//! on-demand regeneration.

use crate::pipeline::{BlobStore, ReportDistributor, ReportRenderer};
use crate::{ReportError, ReportResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inspection_engine::{FieldResolver, ReportTrigger};
use inspection_types::{Submission, SubmissionId};
use std::sync::Arc;
use std::time::Duration;

/// Retry bounds for one job run.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// A successfully generated and delivered report.
#[derive(Clone, Debug)]
pub struct GeneratedReport {
    pub submission_id: SubmissionId,
    pub url: String,
    pub attempts: u32,
    pub generated_at: DateTime<Utc>,
}

/// Sequences render, upload, and delivery with bounded retries.
pub struct ReportJob {
    renderer: Arc<dyn ReportRenderer>,
    blobs: Arc<dyn BlobStore>,
    distributor: Arc<dyn ReportDistributor>,
    resolver: FieldResolver,
    policy: RetryPolicy,
}

impl ReportJob {
    pub fn new(
        renderer: Arc<dyn ReportRenderer>,
        blobs: Arc<dyn BlobStore>,
        distributor: Arc<dyn ReportDistributor>,
    ) -> Self {
        Self {
            renderer,
            blobs,
            distributor,
            resolver: FieldResolver::default(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run the pipeline for one submission, retrying on failure until
    /// the attempt cap. The submission is only read, never written.
    pub async fn run(&self, submission: &Submission) -> ReportResult<GeneratedReport> {
        let mut last_error = String::new();
        for attempt in 1..=self.policy.max_attempts {
            match self.attempt(submission).await {
                Ok(url) => {
                    tracing::info!(
                        submission_id = %submission.id,
                        url,
                        attempt,
                        "report generated and distributed"
                    );
                    return Ok(GeneratedReport {
                        submission_id: submission.id.clone(),
                        url,
                        attempts: attempt,
                        generated_at: Utc::now(),
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        submission_id = %submission.id,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %err,
                        "report attempt failed"
                    );
                    last_error = err.to_string();
                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
            }
        }
        Err(ReportError::Exhausted {
            attempts: self.policy.max_attempts,
            last_error,
        })
    }

    /// Spawn `run` detached. The task logs its own outcome; nothing is
    /// reported back to the workflow that triggered it.
    pub fn spawn(self: Arc<Self>, submission: Submission) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(err) = self.run(&submission).await {
                tracing::error!(
                    submission_id = %submission.id,
                    error = %err,
                    "report generation exhausted retries; submission state unaffected"
                );
            }
        })
    }

    async fn attempt(&self, submission: &Submission) -> ReportResult<String> {
        let fields = self.resolver.resolve_display_fields(submission);
        let bytes = self
            .renderer
            .render(&submission.module_type, &fields)
            .await?;
        let name = format!("{}-{}.pdf", submission.module_type, submission.id.short());
        let url = self.blobs.upload(&name, bytes).await?;
        self.distributor.send(submission, &url).await?;
        Ok(url)
    }
}

/// Lets a shared job be attached to the workflow engine as its
/// completion hook: the enqueue detaches immediately and the engine's
/// transition never waits on rendering.
pub struct SpawningTrigger(pub Arc<ReportJob>);

#[async_trait]
impl ReportTrigger for SpawningTrigger {
    async fn report_completed(&self, submission: &Submission) {
        Arc::clone(&self.0).spawn(submission.clone());
    }
}
