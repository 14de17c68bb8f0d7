//! Submissions: site-visit forms moving through the approval sequence
//!
//! A [`Submission`] carries the open-ended form payload plus the
//! per-stage bookkeeping the workflow engine maintains: participant
//! links, set-once timestamps, comment columns, and the rejection block.
//! Timestamps are an append-only audit trail; once set they are never
//! cleared.

use crate::designation::{Designation, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The open-ended form document: domain fields, photo URL lists, and
/// per-stage comment/signature keys.
pub type FormData = Map<String, Value>;

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for a submission
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

impl SubmissionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a workflow participant
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Actor ────────────────────────────────────────────────────────────

/// A resolved workflow participant: identity plus designation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub designation: Designation,
    pub is_active: bool,
}

impl Actor {
    pub fn new(id: impl Into<String>, designation: Designation) -> Self {
        Self {
            id: ActorId::new(id),
            designation,
            is_active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

// ── Workflow Status ──────────────────────────────────────────────────

/// The state machine's current state.
///
/// The five-stage path runs `Submitted` through `Completed`. The legacy
/// two-stage path (`SupervisorNotified` … `Approved`) exists in parallel
/// for older data and is preserved as a distinct sequence, never merged
/// into the five-stage path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    // Five-stage path
    Submitted,
    OperationsManagerReview,
    BdProcurementReview,
    GeneralManagerReview,
    Completed,
    Rejected,
    ClosedByAdmin,
    // Legacy two-stage path
    SupervisorNotified,
    SupervisorReviewing,
    ManagerNotified,
    ManagerReviewing,
    Approved,
}

impl WorkflowStatus {
    /// Check if this is a terminal state. Terminal states are one-way.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Rejected | Self::ClosedByAdmin | Self::Approved
        )
    }

    /// Check if this state belongs to the legacy two-stage path.
    pub fn is_legacy(&self) -> bool {
        matches!(
            self,
            Self::SupervisorNotified
                | Self::SupervisorReviewing
                | Self::ManagerNotified
                | Self::ManagerReviewing
                | Self::Approved
        )
    }

    /// The stages whose owners may act while the submission is in this
    /// state. Empty for terminal states.
    pub fn pending_stages(&self) -> &'static [Stage] {
        match self {
            Self::Submitted => &[Stage::Supervisor],
            Self::OperationsManagerReview => &[Stage::OperationsManager],
            Self::BdProcurementReview => &[Stage::BusinessDevelopment, Stage::Procurement],
            Self::GeneralManagerReview => &[Stage::GeneralManager],
            Self::SupervisorNotified | Self::SupervisorReviewing => &[Stage::Supervisor],
            Self::ManagerNotified | Self::ManagerReviewing => &[Stage::OperationsManager],
            Self::Completed | Self::Rejected | Self::ClosedByAdmin | Self::Approved => &[],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::OperationsManagerReview => "operations_manager_review",
            Self::BdProcurementReview => "bd_procurement_review",
            Self::GeneralManagerReview => "general_manager_review",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::ClosedByAdmin => "closed_by_admin",
            Self::SupervisorNotified => "supervisor_notified",
            Self::SupervisorReviewing => "supervisor_reviewing",
            Self::ManagerNotified => "manager_notified",
            Self::ManagerReviewing => "manager_reviewing",
            Self::Approved => "approved",
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Submission ───────────────────────────────────────────────────────

/// One site-visit form moving through review.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    /// Unique identifier, immutable after creation
    pub id: SubmissionId,
    /// Form category (HVAC/MEP, civil, cleaning, …); opaque to the engine
    pub module_type: String,
    /// The open-ended form document. Each stage appends its own keys and
    /// must never overwrite another stage's keys.
    pub form_data: FormData,
    /// Current state machine state
    pub workflow_status: WorkflowStatus,
    /// Optimistic-concurrency token, incremented by the store on save
    pub version: u64,

    // Participant links, populated the first time a designation acts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<ActorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operations_manager_id: Option<ActorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_dev_id: Option<ActorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procurement_id: Option<ActorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_manager_id: Option<ActorId>,

    // Per-stage timestamps: set once, never cleared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_notified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operations_manager_notified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operations_manager_approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_dev_notified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_dev_approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procurement_notified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procurement_approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_manager_notified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_manager_approved_at: Option<DateTime<Utc>>,

    // Per-stage comment columns; each mirrors the same-named form_data key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operations_manager_comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_dev_comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procurement_comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_manager_comments: Option<String>,

    // Rejection block, populated only on rejection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_by_id: Option<ActorId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Create a new submission.
    ///
    /// The initial state depends on who submits: a supervisor submitting
    /// their own form skips the supervisor-review sub-step and lands
    /// directly at `OperationsManagerReview`; everyone else starts at
    /// `Submitted`.
    pub fn new(module_type: impl Into<String>, form_data: FormData, creator: &Actor) -> Self {
        let now = Utc::now();
        let mut submission = Self {
            id: SubmissionId::generate(),
            module_type: module_type.into(),
            form_data,
            workflow_status: WorkflowStatus::Submitted,
            version: 0,
            supervisor_id: None,
            operations_manager_id: None,
            business_dev_id: None,
            procurement_id: None,
            general_manager_id: None,
            supervisor_notified_at: None,
            supervisor_approved_at: None,
            operations_manager_notified_at: None,
            operations_manager_approved_at: None,
            business_dev_notified_at: None,
            business_dev_approved_at: None,
            procurement_notified_at: None,
            procurement_approved_at: None,
            general_manager_notified_at: None,
            general_manager_approved_at: None,
            supervisor_comments: None,
            operations_manager_comments: None,
            business_dev_comments: None,
            procurement_comments: None,
            general_manager_comments: None,
            rejection_stage: None,
            rejection_reason: None,
            rejected_at: None,
            rejected_by_id: None,
            created_at: now,
            updated_at: now,
        };
        if creator.designation == Designation::Supervisor {
            submission.supervisor_id = Some(creator.id.clone());
            submission.workflow_status = WorkflowStatus::OperationsManagerReview;
        }
        submission
    }

    // ── Per-stage accessors ──────────────────────────────────────────

    /// The participant linked to a stage, if anyone of that designation
    /// has acted on this submission.
    pub fn participant_id(&self, stage: Stage) -> Option<&ActorId> {
        match stage {
            Stage::Supervisor => self.supervisor_id.as_ref(),
            Stage::OperationsManager => self.operations_manager_id.as_ref(),
            Stage::BusinessDevelopment => self.business_dev_id.as_ref(),
            Stage::Procurement => self.procurement_id.as_ref(),
            Stage::GeneralManager => self.general_manager_id.as_ref(),
        }
    }

    /// Link a participant to a stage, keeping the first link if one
    /// already exists.
    pub fn link_participant(&mut self, stage: Stage, actor_id: ActorId) {
        let slot = match stage {
            Stage::Supervisor => &mut self.supervisor_id,
            Stage::OperationsManager => &mut self.operations_manager_id,
            Stage::BusinessDevelopment => &mut self.business_dev_id,
            Stage::Procurement => &mut self.procurement_id,
            Stage::GeneralManager => &mut self.general_manager_id,
        };
        slot.get_or_insert(actor_id);
    }

    pub fn notified_at(&self, stage: Stage) -> Option<DateTime<Utc>> {
        match stage {
            Stage::Supervisor => self.supervisor_notified_at,
            Stage::OperationsManager => self.operations_manager_notified_at,
            Stage::BusinessDevelopment => self.business_dev_notified_at,
            Stage::Procurement => self.procurement_notified_at,
            Stage::GeneralManager => self.general_manager_notified_at,
        }
    }

    pub fn approved_at(&self, stage: Stage) -> Option<DateTime<Utc>> {
        match stage {
            Stage::Supervisor => self.supervisor_approved_at,
            Stage::OperationsManager => self.operations_manager_approved_at,
            Stage::BusinessDevelopment => self.business_dev_approved_at,
            Stage::Procurement => self.procurement_approved_at,
            Stage::GeneralManager => self.general_manager_approved_at,
        }
    }

    /// Record the first notification of a stage. Later calls keep the
    /// original timestamp; these double as "has this stage engaged" flags.
    pub fn mark_notified(&mut self, stage: Stage, at: DateTime<Utc>) {
        let slot = match stage {
            Stage::Supervisor => &mut self.supervisor_notified_at,
            Stage::OperationsManager => &mut self.operations_manager_notified_at,
            Stage::BusinessDevelopment => &mut self.business_dev_notified_at,
            Stage::Procurement => &mut self.procurement_notified_at,
            Stage::GeneralManager => &mut self.general_manager_notified_at,
        };
        slot.get_or_insert(at);
    }

    /// Record the first approval of a stage. Later re-signs keep the
    /// original timestamp.
    pub fn mark_approved(&mut self, stage: Stage, at: DateTime<Utc>) {
        let slot = match stage {
            Stage::Supervisor => &mut self.supervisor_approved_at,
            Stage::OperationsManager => &mut self.operations_manager_approved_at,
            Stage::BusinessDevelopment => &mut self.business_dev_approved_at,
            Stage::Procurement => &mut self.procurement_approved_at,
            Stage::GeneralManager => &mut self.general_manager_approved_at,
        };
        slot.get_or_insert(at);
    }

    pub fn comments(&self, stage: Stage) -> Option<&str> {
        let column = match stage {
            Stage::Supervisor => &self.supervisor_comments,
            Stage::OperationsManager => &self.operations_manager_comments,
            Stage::BusinessDevelopment => &self.business_dev_comments,
            Stage::Procurement => &self.procurement_comments,
            Stage::GeneralManager => &self.general_manager_comments,
        };
        column.as_deref()
    }

    /// Write a stage's comment into both canonical locations: the
    /// dedicated column and the top-level `form_data` key. The nested
    /// legacy location is never written.
    pub fn set_comments(&mut self, stage: Stage, comments: impl Into<String>) {
        let comments = comments.into();
        self.form_data.insert(
            stage.comment_key().to_string(),
            Value::String(comments.clone()),
        );
        let column = match stage {
            Stage::Supervisor => &mut self.supervisor_comments,
            Stage::OperationsManager => &mut self.operations_manager_comments,
            Stage::BusinessDevelopment => &mut self.business_dev_comments,
            Stage::Procurement => &mut self.procurement_comments,
            Stage::GeneralManager => &mut self.general_manager_comments,
        };
        *column = Some(comments);
    }

    /// Write a stage's signature under its canonical `form_data` key.
    pub fn set_signature(&mut self, stage: Stage, signature: impl Into<String>) {
        let [canonical, _] = stage.signature_keys();
        self.form_data
            .insert(canonical.to_string(), Value::String(signature.into()));
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Check if an actor is linked via any participant column; linked
    /// actors keep historical read access regardless of current stage.
    pub fn is_participant(&self, actor_id: &ActorId) -> bool {
        Stage::ALL
            .iter()
            .any(|stage| self.participant_id(*stage) == Some(actor_id))
    }

    pub fn is_terminal(&self) -> bool {
        self.workflow_status.is_terminal()
    }

    /// Stage pairs whose non-empty comment columns hold identical text.
    /// Any hit signals cross-stage bleed; callers log it and discard the
    /// suspect value rather than propagating it.
    pub fn comment_collisions(&self) -> Vec<(Stage, Stage)> {
        let mut collisions = Vec::new();
        for (i, a) in Stage::ALL.iter().enumerate() {
            for b in &Stage::ALL[i + 1..] {
                match (self.comments(*a), self.comments(*b)) {
                    (Some(left), Some(right)) if !left.is_empty() && left == right => {
                        collisions.push((*a, *b));
                    }
                    _ => {}
                }
            }
        }
        collisions
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn technician() -> Actor {
        Actor::new("tech-1", Designation::PlainUser)
    }

    fn supervisor() -> Actor {
        Actor::new("sup-1", Designation::Supervisor)
    }

    #[test]
    fn test_initial_status_by_creator() {
        let sub = Submission::new("hvac", FormData::new(), &technician());
        assert_eq!(sub.workflow_status, WorkflowStatus::Submitted);
        assert!(sub.supervisor_id.is_none());

        let sub = Submission::new("hvac", FormData::new(), &supervisor());
        assert_eq!(sub.workflow_status, WorkflowStatus::OperationsManagerReview);
        assert_eq!(sub.supervisor_id, Some(ActorId::new("sup-1")));
    }

    #[test]
    fn test_timestamps_set_once() {
        let mut sub = Submission::new("civil", FormData::new(), &technician());
        let first = Utc::now();
        sub.mark_approved(Stage::OperationsManager, first);
        let later = first + chrono::Duration::hours(1);
        sub.mark_approved(Stage::OperationsManager, later);
        assert_eq!(sub.approved_at(Stage::OperationsManager), Some(first));

        sub.mark_notified(Stage::Procurement, first);
        sub.mark_notified(Stage::Procurement, later);
        assert_eq!(sub.notified_at(Stage::Procurement), Some(first));
    }

    #[test]
    fn test_participant_link_keeps_first() {
        let mut sub = Submission::new("cleaning", FormData::new(), &technician());
        sub.link_participant(Stage::Procurement, ActorId::new("proc-1"));
        sub.link_participant(Stage::Procurement, ActorId::new("proc-2"));
        assert_eq!(
            sub.participant_id(Stage::Procurement),
            Some(&ActorId::new("proc-1"))
        );
        assert!(sub.is_participant(&ActorId::new("proc-1")));
        assert!(!sub.is_participant(&ActorId::new("proc-2")));
    }

    #[test]
    fn test_set_comments_writes_both_locations() {
        let mut sub = Submission::new("hvac", FormData::new(), &technician());
        sub.set_comments(Stage::BusinessDevelopment, "Budget approved");
        assert_eq!(
            sub.comments(Stage::BusinessDevelopment),
            Some("Budget approved")
        );
        assert_eq!(
            sub.form_data.get("business_dev_comments"),
            Some(&Value::String("Budget approved".to_string()))
        );
    }

    #[test]
    fn test_signature_written_under_canonical_key() {
        let mut sub = Submission::new("hvac", FormData::new(), &technician());
        sub.set_signature(Stage::GeneralManager, "https://blob/sig.png");
        assert!(sub.form_data.contains_key("general_manager_signature"));
        assert!(!sub.form_data.contains_key("genMan_signature"));
    }

    #[test]
    fn test_comment_collisions_detected() {
        let mut sub = Submission::new("hvac", FormData::new(), &technician());
        sub.set_comments(Stage::Supervisor, "All good");
        sub.set_comments(Stage::Procurement, "All good");
        sub.set_comments(Stage::GeneralManager, "Signed off");
        let collisions = sub.comment_collisions();
        assert_eq!(collisions, vec![(Stage::Supervisor, Stage::Procurement)]);
    }

    #[test]
    fn test_status_terminal_and_legacy() {
        assert!(WorkflowStatus::Completed.is_terminal());
        assert!(WorkflowStatus::Rejected.is_terminal());
        assert!(WorkflowStatus::ClosedByAdmin.is_terminal());
        assert!(WorkflowStatus::Approved.is_terminal());
        assert!(!WorkflowStatus::BdProcurementReview.is_terminal());

        assert!(WorkflowStatus::ManagerReviewing.is_legacy());
        assert!(WorkflowStatus::Approved.is_legacy());
        assert!(!WorkflowStatus::Completed.is_legacy());
    }

    #[test]
    fn test_pending_stages() {
        assert_eq!(
            WorkflowStatus::BdProcurementReview.pending_stages(),
            &[Stage::BusinessDevelopment, Stage::Procurement]
        );
        assert_eq!(
            WorkflowStatus::ManagerNotified.pending_stages(),
            &[Stage::OperationsManager]
        );
        assert!(WorkflowStatus::Completed.pending_stages().is_empty());
    }

    #[test]
    fn test_submission_id() {
        let id = SubmissionId::generate();
        assert!(!id.0.is_empty());
        assert!(id.short().len() <= 8);
        assert_eq!(format!("{}", SubmissionId::new("sub-1")), "sub-1");
    }
}
