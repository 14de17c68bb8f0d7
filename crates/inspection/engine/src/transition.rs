//! The approval state machine
//!
//! One entry point, [`transition`], validates and applies every action.
//! A rejected action returns an error without mutating any field.
//!
//! The five-stage path: `Submitted` → `OperationsManagerReview` →
//! `BdProcurementReview` (BD and procurement approve in parallel) →
//! `GeneralManagerReview` → `Completed`. The legacy two-stage path
//! (`SupervisorNotified` → `SupervisorReviewing` → `ManagerNotified` →
//! `ManagerReviewing` → `Approved`) is preserved as a distinct sequence
//! for older data.

use crate::authorization::can_edit;
use chrono::Utc;
use inspection_types::{
    Actor, Designation, Stage, StageConfig, Submission, WorkflowError, WorkflowResult,
    WorkflowStatus,
};

// ── Actions ──────────────────────────────────────────────────────────

/// A workflow action, dispatched through [`transition`].
#[derive(Clone, Debug)]
pub enum Action {
    /// Mark the actor's stage as engaged; on the legacy path this also
    /// moves a notified state into its reviewing state.
    StartReview,
    /// Approve the current stage, recording comments and signature.
    Approve {
        comments: Option<String>,
        signature: Option<String>,
    },
    /// Reject the submission at its current stage. Terminal.
    Reject { reason: String },
    /// Freeze the submission. Admin only, terminal.
    AdminClose,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartReview => "start_review",
            Self::Approve { .. } => "approve",
            Self::Reject { .. } => "reject",
            Self::AdminClose => "admin_close",
        }
    }
}

/// What a committed transition asks the caller to do next. Both the
/// notification and the report run outside the transactional boundary.
#[derive(Clone, Debug, Default)]
pub struct TransitionOutcome {
    /// Stages whose reviewers should be notified of the handoff.
    pub notify_stages: Vec<Stage>,
    /// The submission reached `Completed`; report generation is due.
    pub report_due: bool,
}

// ── Transition entry point ───────────────────────────────────────────

/// Validate and apply one action against a submission.
///
/// Fails with [`WorkflowError::Authorization`] when the actor's
/// designation does not own the current stage, and with
/// [`WorkflowError::InvalidState`] when the submission's state does not
/// support the action at all. Neither failure mutates the submission.
pub fn transition(
    submission: &mut Submission,
    action: &Action,
    actor: &Actor,
    config: &StageConfig,
) -> WorkflowResult<TransitionOutcome> {
    if !actor.is_active {
        return Err(WorkflowError::ActorInactive(actor.id.clone()));
    }

    match action {
        Action::AdminClose => admin_close(submission, actor),
        Action::Reject { reason } => reject(submission, actor, reason),
        Action::StartReview => start_review(submission, actor),
        Action::Approve {
            comments,
            signature,
        } => approve(
            submission,
            actor,
            comments.as_deref(),
            signature.as_deref(),
            config,
        ),
    }
    .inspect(|outcome| {
        tracing::info!(
            submission_id = %submission.id,
            action = action.name(),
            actor = %actor.id,
            status = %submission.workflow_status,
            report_due = outcome.report_due,
            "workflow transition applied"
        );
    })
}

// ── Admin closure ────────────────────────────────────────────────────

fn admin_close(submission: &mut Submission, actor: &Actor) -> WorkflowResult<TransitionOutcome> {
    if actor.designation != Designation::Admin {
        return Err(authorization_error("admin_close", actor, submission));
    }
    if submission.workflow_status == WorkflowStatus::ClosedByAdmin {
        return Err(WorkflowError::InvalidState(
            "submission is already closed by admin".to_string(),
        ));
    }
    submission.workflow_status = WorkflowStatus::ClosedByAdmin;
    submission.touch();
    Ok(TransitionOutcome::default())
}

// ── Rejection ────────────────────────────────────────────────────────

fn reject(
    submission: &mut Submission,
    actor: &Actor,
    reason: &str,
) -> WorkflowResult<TransitionOutcome> {
    if submission.is_terminal() {
        return Err(WorkflowError::InvalidState(format!(
            "cannot reject a submission that is already {}",
            submission.workflow_status
        )));
    }
    let stage = actor
        .designation
        .stage()
        .filter(|s| submission.workflow_status.pending_stages().contains(s))
        .ok_or_else(|| authorization_error("reject", actor, submission))?;

    let now = Utc::now();
    submission.link_participant(stage, actor.id.clone());
    submission.rejection_stage = Some(stage);
    submission.rejection_reason = Some(reason.to_string());
    submission.rejected_at = Some(now);
    submission.rejected_by_id = Some(actor.id.clone());
    submission.workflow_status = WorkflowStatus::Rejected;
    submission.touch();
    Ok(TransitionOutcome::default())
}

// ── Review start ─────────────────────────────────────────────────────

fn start_review(submission: &mut Submission, actor: &Actor) -> WorkflowResult<TransitionOutcome> {
    if submission.is_terminal() {
        return Err(WorkflowError::InvalidState(format!(
            "cannot start review on a submission that is {}",
            submission.workflow_status
        )));
    }
    let stage = actor
        .designation
        .stage()
        .filter(|s| submission.workflow_status.pending_stages().contains(s))
        .ok_or_else(|| authorization_error("start_review", actor, submission))?;

    submission.link_participant(stage, actor.id.clone());
    submission.mark_notified(stage, Utc::now());

    // Legacy path tracks an explicit notified -> reviewing step.
    submission.workflow_status = match submission.workflow_status {
        WorkflowStatus::SupervisorNotified => WorkflowStatus::SupervisorReviewing,
        WorkflowStatus::ManagerNotified => WorkflowStatus::ManagerReviewing,
        other => other,
    };
    submission.touch();
    Ok(TransitionOutcome::default())
}

// ── Approval ─────────────────────────────────────────────────────────

fn approve(
    submission: &mut Submission,
    actor: &Actor,
    comments: Option<&str>,
    signature: Option<&str>,
    config: &StageConfig,
) -> WorkflowResult<TransitionOutcome> {
    let stage = match actor.designation.stage() {
        Some(stage) => stage,
        None => return Err(authorization_error("approve", actor, submission)),
    };

    if submission.workflow_status.pending_stages().contains(&stage) {
        return approve_pending_stage(submission, actor, stage, comments, signature, config);
    }

    // The stage already advanced (or completed) but this actor's edit
    // window is still open: re-sign in place. Timestamps and status are
    // untouched; this is the documented sticky-edit rule, not a second
    // approval.
    if submission.approved_at(stage).is_some() && can_edit(submission, actor) {
        apply_review_fields(submission, stage, comments, signature);
        submission.touch();
        return Ok(TransitionOutcome::default());
    }

    if submission.is_terminal() {
        return Err(WorkflowError::InvalidState(format!(
            "cannot approve a submission that is already {}",
            submission.workflow_status
        )));
    }
    Err(authorization_error("approve", actor, submission))
}

fn approve_pending_stage(
    submission: &mut Submission,
    actor: &Actor,
    stage: Stage,
    comments: Option<&str>,
    signature: Option<&str>,
    config: &StageConfig,
) -> WorkflowResult<TransitionOutcome> {
    let now = Utc::now();
    submission.link_participant(stage, actor.id.clone());
    apply_review_fields(submission, stage, comments, signature);
    submission.mark_approved(stage, now);

    let mut outcome = TransitionOutcome::default();
    submission.workflow_status = match (submission.workflow_status, stage) {
        (WorkflowStatus::Submitted, Stage::Supervisor) => {
            outcome.notify_stages = vec![Stage::OperationsManager];
            WorkflowStatus::OperationsManagerReview
        }
        (WorkflowStatus::OperationsManagerReview, Stage::OperationsManager) => {
            outcome.notify_stages = vec![Stage::BusinessDevelopment, Stage::Procurement];
            WorkflowStatus::BdProcurementReview
        }
        (WorkflowStatus::BdProcurementReview, _) => {
            // Parallel track: advance only once every stage in the
            // group has approved.
            let group_done = config
                .parallel_peers(stage)
                .iter()
                .all(|peer| submission.approved_at(*peer).is_some());
            if group_done {
                outcome.notify_stages = vec![Stage::GeneralManager];
                WorkflowStatus::GeneralManagerReview
            } else {
                WorkflowStatus::BdProcurementReview
            }
        }
        (WorkflowStatus::GeneralManagerReview, Stage::GeneralManager) => {
            outcome.report_due = true;
            WorkflowStatus::Completed
        }
        // Legacy path
        (
            WorkflowStatus::SupervisorNotified | WorkflowStatus::SupervisorReviewing,
            Stage::Supervisor,
        ) => {
            outcome.notify_stages = vec![Stage::OperationsManager];
            WorkflowStatus::ManagerNotified
        }
        (
            WorkflowStatus::ManagerNotified | WorkflowStatus::ManagerReviewing,
            Stage::OperationsManager,
        ) => WorkflowStatus::Approved,
        (status, _) => status,
    };
    submission.touch();
    Ok(outcome)
}

/// Write comments and signature for a stage, guarding the comment
/// against cross-stage bleed: a comment identical to another stage's
/// stored text is discarded with a warning instead of persisted.
fn apply_review_fields(
    submission: &mut Submission,
    stage: Stage,
    comments: Option<&str>,
    signature: Option<&str>,
) {
    if let Some(comments) = comments.filter(|c| !c.is_empty()) {
        let contaminated = Stage::ALL.iter().any(|other| {
            *other != stage && submission.comments(*other).is_some_and(|c| c == comments)
        });
        if contaminated {
            tracing::warn!(
                submission_id = %submission.id,
                stage = %stage,
                "data integrity warning: incoming comment matches another \
                 stage's comment verbatim; discarding"
            );
        } else {
            submission.set_comments(stage, comments);
        }
    }
    if let Some(signature) = signature.filter(|s| !s.is_empty()) {
        submission.set_signature(stage, signature);
    }
}

fn authorization_error(
    action: &'static str,
    actor: &Actor,
    submission: &Submission,
) -> WorkflowError {
    WorkflowError::Authorization {
        action,
        designation: actor.designation,
        status: submission.workflow_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspection_types::{FormData, StageConfig};

    fn actor(id: &str, designation: Designation) -> Actor {
        Actor::new(id, designation)
    }

    fn submitted() -> Submission {
        Submission::new(
            "hvac",
            FormData::new(),
            &actor("tech-1", Designation::PlainUser),
        )
    }

    fn approve_action(comments: &str) -> Action {
        Action::Approve {
            comments: Some(comments.to_string()),
            signature: Some(format!("https://blob/{comments}.png")),
        }
    }

    fn run(sub: &mut Submission, action: &Action, by: &Actor) -> WorkflowResult<TransitionOutcome> {
        transition(sub, action, by, &StageConfig::standard())
    }

    #[test]
    fn test_full_five_stage_cycle() {
        let mut sub = submitted();
        assert_eq!(sub.workflow_status, WorkflowStatus::Submitted);

        run(
            &mut sub,
            &approve_action("Verified on site"),
            &actor("sup-1", Designation::Supervisor),
        )
        .unwrap();
        assert_eq!(sub.workflow_status, WorkflowStatus::OperationsManagerReview);

        let outcome = run(
            &mut sub,
            &approve_action("Looks fine"),
            &actor("om-1", Designation::OperationsManager),
        )
        .unwrap();
        assert_eq!(sub.workflow_status, WorkflowStatus::BdProcurementReview);
        assert_eq!(sub.comments(Stage::OperationsManager), Some("Looks fine"));
        assert!(sub.approved_at(Stage::OperationsManager).is_some());
        assert_eq!(
            outcome.notify_stages,
            vec![Stage::BusinessDevelopment, Stage::Procurement]
        );

        // BD alone does not advance the parallel group.
        run(
            &mut sub,
            &approve_action("Commercially sound"),
            &actor("bd-1", Designation::BusinessDevelopment),
        )
        .unwrap();
        assert_eq!(sub.workflow_status, WorkflowStatus::BdProcurementReview);

        run(
            &mut sub,
            &approve_action("Materials priced"),
            &actor("proc-1", Designation::Procurement),
        )
        .unwrap();
        assert_eq!(sub.workflow_status, WorkflowStatus::GeneralManagerReview);

        let outcome = run(
            &mut sub,
            &approve_action("Final sign-off"),
            &actor("gm-1", Designation::GeneralManager),
        )
        .unwrap();
        assert_eq!(sub.workflow_status, WorkflowStatus::Completed);
        assert!(outcome.report_due);
    }

    #[test]
    fn test_wrong_stage_fails_without_mutation() {
        let mut sub = submitted();
        let before = sub.clone();

        let result = run(
            &mut sub,
            &approve_action("Too eager"),
            &actor("gm-1", Designation::GeneralManager),
        );
        assert!(matches!(
            result,
            Err(WorkflowError::Authorization {
                designation: Designation::GeneralManager,
                status: WorkflowStatus::Submitted,
                ..
            })
        ));
        assert_eq!(sub.workflow_status, before.workflow_status);
        assert!(sub.comments(Stage::GeneralManager).is_none());
        assert_eq!(sub.updated_at, before.updated_at);
    }

    #[test]
    fn test_reject_records_stage_and_reason() {
        let mut sub = submitted();
        run(
            &mut sub,
            &approve_action("ok"),
            &actor("sup-1", Designation::Supervisor),
        )
        .unwrap();

        run(
            &mut sub,
            &Action::Reject {
                reason: "Measurements missing".to_string(),
            },
            &actor("om-1", Designation::OperationsManager),
        )
        .unwrap();

        assert_eq!(sub.workflow_status, WorkflowStatus::Rejected);
        assert_eq!(sub.rejection_stage, Some(Stage::OperationsManager));
        assert_eq!(
            sub.rejection_reason.as_deref(),
            Some("Measurements missing")
        );
        assert!(sub.rejected_at.is_some());
        assert_eq!(sub.rejected_by_id, Some(actor("om-1", Designation::OperationsManager).id));
    }

    #[test]
    fn test_reject_completed_is_invalid_state() {
        let mut sub = submitted();
        for (who, designation) in [
            ("sup-1", Designation::Supervisor),
            ("om-1", Designation::OperationsManager),
            ("bd-1", Designation::BusinessDevelopment),
            ("proc-1", Designation::Procurement),
            ("gm-1", Designation::GeneralManager),
        ] {
            run(&mut sub, &approve_action(who), &actor(who, designation)).unwrap();
        }
        assert_eq!(sub.workflow_status, WorkflowStatus::Completed);

        let result = run(
            &mut sub,
            &Action::Reject {
                reason: "Changed my mind".to_string(),
            },
            &actor("gm-1", Designation::GeneralManager),
        );
        assert!(matches!(result, Err(WorkflowError::InvalidState(_))));
    }

    #[test]
    fn test_reject_wrong_role_is_authorization_error() {
        let mut sub = submitted();
        let result = run(
            &mut sub,
            &Action::Reject {
                reason: "no".to_string(),
            },
            &actor("proc-1", Designation::Procurement),
        );
        assert!(matches!(result, Err(WorkflowError::Authorization { .. })));
    }

    #[test]
    fn test_admin_close_freezes_from_any_state() {
        let mut sub = submitted();
        run(
            &mut sub,
            &Action::AdminClose,
            &actor("admin-1", Designation::Admin),
        )
        .unwrap();
        assert_eq!(sub.workflow_status, WorkflowStatus::ClosedByAdmin);

        // Closing twice is invalid, and non-admins may never close.
        let result = run(
            &mut sub,
            &Action::AdminClose,
            &actor("admin-1", Designation::Admin),
        );
        assert!(matches!(result, Err(WorkflowError::InvalidState(_))));

        let mut sub = submitted();
        let result = run(
            &mut sub,
            &Action::AdminClose,
            &actor("om-1", Designation::OperationsManager),
        );
        assert!(matches!(result, Err(WorkflowError::Authorization { .. })));
    }

    #[test]
    fn test_sticky_resign_at_own_stage() {
        let mut sub = submitted();
        run(
            &mut sub,
            &approve_action("ok"),
            &actor("sup-1", Designation::Supervisor),
        )
        .unwrap();
        run(
            &mut sub,
            &approve_action("first pass"),
            &actor("om-1", Designation::OperationsManager),
        )
        .unwrap();
        let first_approved = sub.approved_at(Stage::OperationsManager);

        // BD and procurement have not acted: the OM window is open.
        run(
            &mut sub,
            &approve_action("corrected pass"),
            &actor("om-1", Designation::OperationsManager),
        )
        .unwrap();
        assert_eq!(sub.workflow_status, WorkflowStatus::BdProcurementReview);
        assert_eq!(
            sub.comments(Stage::OperationsManager),
            Some("corrected pass")
        );
        // The first approval timestamp is kept.
        assert_eq!(sub.approved_at(Stage::OperationsManager), first_approved);
    }

    #[test]
    fn test_resign_window_closes_once_next_stage_acts() {
        let mut sub = submitted();
        run(
            &mut sub,
            &approve_action("ok"),
            &actor("sup-1", Designation::Supervisor),
        )
        .unwrap();
        run(
            &mut sub,
            &approve_action("first pass"),
            &actor("om-1", Designation::OperationsManager),
        )
        .unwrap();
        run(
            &mut sub,
            &approve_action("priced"),
            &actor("proc-1", Designation::Procurement),
        )
        .unwrap();

        let result = run(
            &mut sub,
            &approve_action("too late"),
            &actor("om-1", Designation::OperationsManager),
        );
        assert!(matches!(result, Err(WorkflowError::Authorization { .. })));
        assert_eq!(sub.comments(Stage::OperationsManager), Some("first pass"));
    }

    #[test]
    fn test_general_manager_amends_after_completion() {
        let mut sub = submitted();
        for (who, designation) in [
            ("sup-1", Designation::Supervisor),
            ("om-1", Designation::OperationsManager),
            ("bd-1", Designation::BusinessDevelopment),
            ("proc-1", Designation::Procurement),
            ("gm-1", Designation::GeneralManager),
        ] {
            run(&mut sub, &approve_action(who), &actor(who, designation)).unwrap();
        }

        run(
            &mut sub,
            &approve_action("amended decision"),
            &actor("gm-1", Designation::GeneralManager),
        )
        .unwrap();
        assert_eq!(sub.workflow_status, WorkflowStatus::Completed);
        assert_eq!(
            sub.comments(Stage::GeneralManager),
            Some("amended decision")
        );
    }

    #[test]
    fn test_legacy_path_progression() {
        let mut sub = submitted();
        sub.workflow_status = WorkflowStatus::SupervisorNotified;

        let supervisor = actor("sup-1", Designation::Supervisor);
        run(&mut sub, &Action::StartReview, &supervisor).unwrap();
        assert_eq!(sub.workflow_status, WorkflowStatus::SupervisorReviewing);
        assert!(sub.notified_at(Stage::Supervisor).is_some());

        run(&mut sub, &approve_action("site checked"), &supervisor).unwrap();
        assert_eq!(sub.workflow_status, WorkflowStatus::ManagerNotified);

        let manager = actor("om-1", Designation::OperationsManager);
        run(&mut sub, &Action::StartReview, &manager).unwrap();
        assert_eq!(sub.workflow_status, WorkflowStatus::ManagerReviewing);

        run(&mut sub, &approve_action("approved legacy"), &manager).unwrap();
        assert_eq!(sub.workflow_status, WorkflowStatus::Approved);
        assert!(sub.is_terminal());
    }

    #[test]
    fn test_start_review_marks_notified_once() {
        let mut sub = submitted();
        let supervisor = actor("sup-1", Designation::Supervisor);
        run(&mut sub, &Action::StartReview, &supervisor).unwrap();
        let first = sub.notified_at(Stage::Supervisor);
        run(&mut sub, &Action::StartReview, &supervisor).unwrap();
        assert_eq!(sub.notified_at(Stage::Supervisor), first);
    }

    #[test]
    fn test_cross_stage_bleed_discarded_on_write() {
        let mut sub = submitted();
        run(
            &mut sub,
            &approve_action("ok"),
            &actor("sup-1", Designation::Supervisor),
        )
        .unwrap();
        sub.set_comments(Stage::OperationsManager, "All in order");
        sub.mark_approved(Stage::OperationsManager, Utc::now());
        sub.workflow_status = WorkflowStatus::BdProcurementReview;

        // BD submits the OM comment verbatim; the value is discarded.
        run(
            &mut sub,
            &Action::Approve {
                comments: Some("All in order".to_string()),
                signature: None,
            },
            &actor("bd-1", Designation::BusinessDevelopment),
        )
        .unwrap();
        assert!(sub.comments(Stage::BusinessDevelopment).is_none());
        assert!(sub.approved_at(Stage::BusinessDevelopment).is_some());
        assert!(sub.comment_collisions().is_empty());
    }

    #[test]
    fn test_inactive_actor_cannot_act() {
        let mut sub = submitted();
        let ghost = actor("sup-1", Designation::Supervisor).inactive();
        let result = run(&mut sub, &approve_action("ok"), &ghost);
        assert!(matches!(result, Err(WorkflowError::ActorInactive(_))));
    }

    #[test]
    fn test_plain_user_cannot_approve() {
        let mut sub = submitted();
        let result = run(
            &mut sub,
            &approve_action("ok"),
            &actor("tech-1", Designation::PlainUser),
        );
        assert!(matches!(result, Err(WorkflowError::Authorization { .. })));
    }
}
