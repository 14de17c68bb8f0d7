//! In-memory reference implementations of the storage seams.
//!
//! Deterministic and test-friendly. Production deployments back the
//! traits with a transactional store; the version check in `save`
//! mirrors what a relational backend does with a guarded UPDATE.

use crate::model::AuditRecord;
use crate::traits::{AuditLog, IdentityResolver, ReviewerNotifier, SubmissionStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::Utc;
use inspection_types::{Actor, ActorId, Stage, Submission, SubmissionId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

// ── Submission store ─────────────────────────────────────────────────

/// In-memory submission store with optimistic-concurrency saves.
#[derive(Default)]
pub struct InMemorySubmissionStore {
    rows: RwLock<HashMap<SubmissionId, Submission>>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn create(&self, submission: &Submission) -> StorageResult<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StorageError::Backend("submission lock poisoned".to_string()))?;
        if rows.contains_key(&submission.id) {
            return Err(StorageError::Conflict(format!(
                "submission {} already exists",
                submission.id
            )));
        }
        rows.insert(submission.id.clone(), submission.clone());
        Ok(())
    }

    async fn load(&self, id: &SubmissionId) -> StorageResult<Submission> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StorageError::Backend("submission lock poisoned".to_string()))?;
        rows.get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("submission {id}")))
    }

    async fn save(&self, submission: &Submission) -> StorageResult<Submission> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StorageError::Backend("submission lock poisoned".to_string()))?;
        let stored = rows
            .get(&submission.id)
            .ok_or_else(|| StorageError::NotFound(format!("submission {}", submission.id)))?;

        if stored.version != submission.version {
            return Err(StorageError::StaleVersion {
                expected: submission.version,
                found: stored.version,
            });
        }

        let mut updated = submission.clone();
        updated.version += 1;
        rows.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }
}

// ── Identity resolver ────────────────────────────────────────────────

/// In-memory actor directory.
#[derive(Default)]
pub struct InMemoryIdentityResolver {
    actors: RwLock<HashMap<ActorId, Actor>>,
}

impl InMemoryIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, actor: Actor) {
        if let Ok(mut actors) = self.actors.write() {
            actors.insert(actor.id.clone(), actor);
        }
    }
}

#[async_trait]
impl IdentityResolver for InMemoryIdentityResolver {
    async fn resolve(&self, actor_id: &ActorId) -> StorageResult<Actor> {
        let actors = self
            .actors
            .read()
            .map_err(|_| StorageError::Backend("actor lock poisoned".to_string()))?;
        actors
            .get(actor_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("actor {actor_id}")))
    }
}

// ── Notifier ─────────────────────────────────────────────────────────

/// Notifier that records handoffs; can be switched into a failing mode
/// to exercise the engine's fire-and-forget handling.
#[derive(Default)]
pub struct InMemoryNotifier {
    sent: RwLock<Vec<(SubmissionId, Stage)>>,
    failing: AtomicBool,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(SubmissionId, Stage)> {
        self.sent.read().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReviewerNotifier for InMemoryNotifier {
    async fn notify_stage_reviewers(
        &self,
        submission: &Submission,
        stage: Stage,
    ) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("mail gateway unavailable".to_string()));
        }
        let mut sent = self
            .sent
            .write()
            .map_err(|_| StorageError::Backend("notifier lock poisoned".to_string()))?;
        sent.push((submission.id.clone(), stage));
        Ok(())
    }
}

// ── Audit log ────────────────────────────────────────────────────────

/// Append-only in-memory audit log.
#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(
        &self,
        actor_id: &ActorId,
        action: &str,
        resource_type: &str,
        resource_id: &str,
        details: &str,
    ) -> StorageResult<AuditRecord> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::Backend("audit lock poisoned".to_string()))?;
        let record = AuditRecord {
            sequence: entries.len() as u64,
            actor_id: actor_id.clone(),
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            details: details.to_string(),
            recorded_at: Utc::now(),
        };
        entries.push(record.clone());
        Ok(record)
    }

    async fn entries_for(&self, resource_id: &str) -> StorageResult<Vec<AuditRecord>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::Backend("audit lock poisoned".to_string()))?;
        Ok(entries
            .iter()
            .filter(|e| e.resource_id == resource_id)
            .cloned()
            .collect())
    }
}
