//! The workflow facade
//!
//! [`WorkflowEngine`] wires the pure state machine to the storage,
//! identity, notification, and audit seams. Each mutation is one
//! read-modify-write cycle: load, transition in memory, save with the
//! store's version check, append an audit record. Stage notifications
//! and report generation happen after the save commits and never fail
//! or roll back a transition.

use crate::authorization;
use crate::resolve::{FieldResolver, FlatFieldMap};
use crate::transition::{transition, Action};
use async_trait::async_trait;
use inspection_storage::{
    AuditLog, IdentityResolver, ReviewerNotifier, StorageError, SubmissionStore,
};
use inspection_types::{
    Actor, ActorId, FormData, StageConfig, Submission, SubmissionId, WorkflowError, WorkflowResult,
};
use std::sync::Arc;

/// Hook fired after a transition reaches `Completed`. Implementations
/// enqueue the report pipeline and return promptly; the transition is
/// already committed, so nothing here can fail or roll it back.
#[async_trait]
pub trait ReportTrigger: Send + Sync {
    async fn report_completed(&self, submission: &Submission);
}

/// The workflow engine: owns `workflow_status` and everything that
/// changes it.
pub struct WorkflowEngine {
    store: Arc<dyn SubmissionStore>,
    identity: Arc<dyn IdentityResolver>,
    notifier: Arc<dyn ReviewerNotifier>,
    audit: Arc<dyn AuditLog>,
    report_trigger: Option<Arc<dyn ReportTrigger>>,
    config: StageConfig,
    resolver: FieldResolver,
}

impl WorkflowEngine {
    /// Create an engine over the given seams with the standard review
    /// sequence.
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        identity: Arc<dyn IdentityResolver>,
        notifier: Arc<dyn ReviewerNotifier>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self::with_config(store, identity, notifier, audit, StageConfig::standard())
    }

    pub fn with_config(
        store: Arc<dyn SubmissionStore>,
        identity: Arc<dyn IdentityResolver>,
        notifier: Arc<dyn ReviewerNotifier>,
        audit: Arc<dyn AuditLog>,
        config: StageConfig,
    ) -> Self {
        Self {
            store,
            identity,
            notifier,
            audit,
            report_trigger: None,
            resolver: FieldResolver::new(config.clone()),
            config,
        }
    }

    /// Attach the hook that enqueues report generation on completion.
    pub fn with_report_trigger(mut self, trigger: Arc<dyn ReportTrigger>) -> Self {
        self.report_trigger = Some(trigger);
        self
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Create a submission. The initial state depends on the creator's
    /// designation; the first pending stage is notified.
    pub async fn create_submission(
        &self,
        module_type: &str,
        form_data: FormData,
        creator_id: &ActorId,
    ) -> WorkflowResult<Submission> {
        let creator = self.resolve_actor(creator_id).await?;
        let submission = Submission::new(module_type, form_data, &creator);
        self.store.create(&submission).await?;
        self.record_audit(creator_id, "create", &submission).await?;

        for stage in submission.workflow_status.pending_stages() {
            self.notify(&submission, *stage).await;
        }

        tracing::info!(
            submission_id = %submission.id,
            module_type,
            status = %submission.workflow_status,
            "submission created"
        );
        Ok(submission)
    }

    /// Mark the actor's stage as engaged.
    pub async fn start_review(
        &self,
        id: &SubmissionId,
        actor_id: &ActorId,
    ) -> WorkflowResult<Submission> {
        self.apply(id, actor_id, Action::StartReview).await
    }

    /// Approve the current stage with comments and signature.
    pub async fn approve(
        &self,
        id: &SubmissionId,
        actor_id: &ActorId,
        comments: Option<String>,
        signature: Option<String>,
    ) -> WorkflowResult<Submission> {
        self.apply(
            id,
            actor_id,
            Action::Approve {
                comments,
                signature,
            },
        )
        .await
    }

    /// Reject the submission at its current stage.
    pub async fn reject(
        &self,
        id: &SubmissionId,
        actor_id: &ActorId,
        reason: String,
    ) -> WorkflowResult<Submission> {
        self.apply(id, actor_id, Action::Reject { reason }).await
    }

    /// Freeze the submission. Admin only.
    pub async fn admin_close(
        &self,
        id: &SubmissionId,
        actor_id: &ActorId,
    ) -> WorkflowResult<Submission> {
        self.apply(id, actor_id, Action::AdminClose).await
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn get_submission(&self, id: &SubmissionId) -> WorkflowResult<Submission> {
        self.load(id).await
    }

    pub async fn can_edit(
        &self,
        submission: &Submission,
        actor_id: &ActorId,
    ) -> WorkflowResult<bool> {
        let actor = self.resolve_actor_allow_inactive(actor_id).await?;
        Ok(authorization::can_edit(submission, &actor))
    }

    pub async fn can_view(
        &self,
        submission: &Submission,
        actor_id: &ActorId,
    ) -> WorkflowResult<bool> {
        let actor = self.resolve_actor_allow_inactive(actor_id).await?;
        Ok(authorization::can_view(submission, &actor))
    }

    /// The merged display payload for report rendering or the review UI.
    pub fn resolve_display_fields(&self, submission: &Submission) -> FlatFieldMap {
        self.resolver.resolve_display_fields(submission)
    }

    pub fn stage_config(&self) -> &StageConfig {
        &self.config
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn apply(
        &self,
        id: &SubmissionId,
        actor_id: &ActorId,
        action: Action,
    ) -> WorkflowResult<Submission> {
        let actor = self.resolve_actor(actor_id).await?;
        let mut submission = self.load(id).await?;
        let outcome = transition(&mut submission, &action, &actor, &self.config)?;
        let saved = self.store.save(&submission).await?;
        self.record_audit(actor_id, action.name(), &saved).await?;

        for stage in &outcome.notify_stages {
            self.notify(&saved, *stage).await;
        }
        if outcome.report_due {
            tracing::info!(
                submission_id = %saved.id,
                "submission completed; report generation due"
            );
            if let Some(trigger) = &self.report_trigger {
                trigger.report_completed(&saved).await;
            }
        }
        Ok(saved)
    }

    async fn load(&self, id: &SubmissionId) -> WorkflowResult<Submission> {
        match self.store.load(id).await {
            Ok(submission) => Ok(submission),
            Err(StorageError::NotFound(_)) => Err(WorkflowError::SubmissionNotFound(id.clone())),
            Err(err) => Err(err.into()),
        }
    }

    async fn resolve_actor(&self, actor_id: &ActorId) -> WorkflowResult<Actor> {
        let actor = self.resolve_actor_allow_inactive(actor_id).await?;
        if !actor.is_active {
            return Err(WorkflowError::ActorInactive(actor_id.clone()));
        }
        Ok(actor)
    }

    async fn resolve_actor_allow_inactive(&self, actor_id: &ActorId) -> WorkflowResult<Actor> {
        match self.identity.resolve(actor_id).await {
            Ok(actor) => Ok(actor),
            Err(StorageError::NotFound(_)) => Err(WorkflowError::ActorNotFound(actor_id.clone())),
            Err(err) => Err(err.into()),
        }
    }

    async fn record_audit(
        &self,
        actor_id: &ActorId,
        action: &str,
        submission: &Submission,
    ) -> WorkflowResult<()> {
        let details = serde_json::json!({
            "status": submission.workflow_status,
            "module_type": submission.module_type,
        })
        .to_string();
        self.audit
            .append(actor_id, action, "submission", &submission.id.0, &details)
            .await?;
        Ok(())
    }

    /// Fire-and-forget: a failed notification is logged, never surfaced.
    async fn notify(&self, submission: &Submission, stage: inspection_types::Stage) {
        if let Err(err) = self.notifier.notify_stage_reviewers(submission, stage).await {
            tracing::warn!(
                submission_id = %submission.id,
                stage = %stage,
                error = %err,
                "stage notification failed; review continues without it"
            );
        }
    }
}
