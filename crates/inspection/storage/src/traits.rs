use crate::model::AuditRecord;
use crate::StorageResult;
use async_trait::async_trait;
use inspection_types::{Actor, ActorId, Stage, Submission, SubmissionId};

/// Storage interface for submission rows.
///
/// `save` is the transactional boundary of every workflow transition: it
/// compares the version the caller loaded against the stored one and
/// fails with [`crate::StorageError::StaleVersion`] when another writer
/// got there first.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Insert a newly created submission.
    async fn create(&self, submission: &Submission) -> StorageResult<()>;

    /// Load one submission by id.
    async fn load(&self, id: &SubmissionId) -> StorageResult<Submission>;

    /// Atomically persist a mutated submission, returning the stored
    /// copy with its version advanced.
    async fn save(&self, submission: &Submission) -> StorageResult<Submission>;
}

/// Identity interface: resolve an actor id to designation and status.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, actor_id: &ActorId) -> StorageResult<Actor>;
}

/// Notification sink for stage handoffs. Fire-and-forget: the engine
/// logs failures and never lets them fail a transition.
#[async_trait]
pub trait ReviewerNotifier: Send + Sync {
    async fn notify_stage_reviewers(&self, submission: &Submission, stage: Stage)
        -> StorageResult<()>;
}

/// Append-only audit trail of engine mutations.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(
        &self,
        actor_id: &ActorId,
        action: &str,
        resource_type: &str,
        resource_id: &str,
        details: &str,
    ) -> StorageResult<AuditRecord>;

    /// Read entries for one resource, oldest first.
    async fn entries_for(&self, resource_id: &str) -> StorageResult<Vec<AuditRecord>>;
}
