//! Per-request edit/view authorization
//!
//! A reviewer may edit a submission while it sits at their own pending
//! stage, and for a little longer: the edit window only closes once the
//! *next* stage has started acting, so a reviewer can correct a comment
//! or re-sign after approving but before the next reviewer engages.
//!
//! Nothing here is stored; both checks are computed from the submission
//! on every request.

use inspection_types::{Actor, Designation, Stage, Submission, WorkflowStatus};

/// Check whether an actor may edit the submission right now.
///
/// Rules, in order:
/// - inactive actors never edit; `ClosedByAdmin` locks out everyone but
///   the admin
/// - admin bypasses all stage gates
/// - a reviewer edits while the submission is at their own pending
///   stage, including re-signing after their own approval as long as
///   the stage has not advanced
/// - operations manager keeps editing into `BdProcurementReview` until
///   BD or procurement records an approval timestamp
/// - BD and procurement keep editing into `GeneralManagerReview` until
///   the general manager's approval timestamp is set
/// - the general manager, as final approver, may always amend after
///   `Completed`
pub fn can_edit(submission: &Submission, actor: &Actor) -> bool {
    if !actor.is_active {
        return false;
    }
    if submission.workflow_status == WorkflowStatus::ClosedByAdmin {
        return actor.designation == Designation::Admin;
    }
    if actor.designation == Designation::Admin {
        return true;
    }
    let Some(stage) = actor.designation.stage() else {
        return false;
    };

    if submission.workflow_status.pending_stages().contains(&stage) {
        return true;
    }

    match (submission.workflow_status, stage) {
        (WorkflowStatus::BdProcurementReview, Stage::OperationsManager) => {
            submission.approved_at(Stage::BusinessDevelopment).is_none()
                && submission.approved_at(Stage::Procurement).is_none()
        }
        (
            WorkflowStatus::GeneralManagerReview,
            Stage::BusinessDevelopment | Stage::Procurement,
        ) => submission.approved_at(Stage::GeneralManager).is_none(),
        (WorkflowStatus::Completed, Stage::GeneralManager) => true,
        _ => false,
    }
}

/// Check whether an actor may view the submission.
///
/// Admin always; anyone linked via a participant column keeps
/// historical read access regardless of current stage; anyone who can
/// edit can obviously view. `ClosedByAdmin` narrows this to admin and
/// prior participants only.
pub fn can_view(submission: &Submission, actor: &Actor) -> bool {
    if actor.designation == Designation::Admin {
        return true;
    }
    if submission.is_participant(&actor.id) {
        return true;
    }
    can_edit(submission, actor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use inspection_types::FormData;

    fn submission_at(status: WorkflowStatus) -> Submission {
        let mut sub = Submission::new(
            "hvac",
            FormData::new(),
            &Actor::new("tech-1", Designation::PlainUser),
        );
        sub.workflow_status = status;
        sub
    }

    #[test]
    fn test_pending_stage_owner_edits() {
        let sub = submission_at(WorkflowStatus::OperationsManagerReview);
        assert!(can_edit(
            &sub,
            &Actor::new("om-1", Designation::OperationsManager)
        ));
        assert!(!can_edit(
            &sub,
            &Actor::new("gm-1", Designation::GeneralManager)
        ));
        assert!(!can_edit(&sub, &Actor::new("tech-1", Designation::PlainUser)));
    }

    #[test]
    fn test_admin_edits_in_every_state() {
        let admin = Actor::new("admin-1", Designation::Admin);
        for status in [
            WorkflowStatus::Submitted,
            WorkflowStatus::BdProcurementReview,
            WorkflowStatus::Completed,
            WorkflowStatus::Rejected,
            WorkflowStatus::ClosedByAdmin,
        ] {
            assert!(can_edit(&submission_at(status), &admin));
        }
    }

    #[test]
    fn test_om_window_survives_one_stage_advance() {
        let mut sub = submission_at(WorkflowStatus::BdProcurementReview);
        sub.mark_approved(Stage::OperationsManager, Utc::now());
        let om = Actor::new("om-1", Designation::OperationsManager);

        assert!(can_edit(&sub, &om));

        sub.mark_approved(Stage::Procurement, Utc::now());
        assert!(!can_edit(&sub, &om));
    }

    #[test]
    fn test_bd_procurement_window_into_gm_review() {
        let sub = submission_at(WorkflowStatus::GeneralManagerReview);
        assert!(can_edit(
            &sub,
            &Actor::new("bd-1", Designation::BusinessDevelopment)
        ));
        assert!(can_edit(&sub, &Actor::new("proc-1", Designation::Procurement)));

        let mut sub = sub;
        sub.mark_approved(Stage::GeneralManager, Utc::now());
        assert!(!can_edit(
            &sub,
            &Actor::new("bd-1", Designation::BusinessDevelopment)
        ));
    }

    #[test]
    fn test_gm_amends_after_completed() {
        let mut sub = submission_at(WorkflowStatus::Completed);
        sub.mark_approved(Stage::GeneralManager, Utc::now());
        assert!(can_edit(
            &sub,
            &Actor::new("gm-1", Designation::GeneralManager)
        ));
        assert!(!can_edit(
            &sub,
            &Actor::new("om-1", Designation::OperationsManager)
        ));
    }

    #[test]
    fn test_closed_by_admin_locks_everyone_out() {
        let mut sub = submission_at(WorkflowStatus::ClosedByAdmin);
        sub.link_participant(Stage::GeneralManager, inspection_types::ActorId::new("gm-1"));
        for designation in [
            Designation::Supervisor,
            Designation::OperationsManager,
            Designation::BusinessDevelopment,
            Designation::Procurement,
            Designation::GeneralManager,
            Designation::PlainUser,
        ] {
            assert!(!can_edit(&sub, &Actor::new("gm-1", designation)));
        }
        assert!(can_edit(&sub, &Actor::new("admin-1", Designation::Admin)));
    }

    #[test]
    fn test_closed_by_admin_view_narrows_to_participants() {
        let mut sub = submission_at(WorkflowStatus::ClosedByAdmin);
        sub.link_participant(Stage::Procurement, inspection_types::ActorId::new("proc-1"));

        assert!(can_view(&sub, &Actor::new("admin-1", Designation::Admin)));
        assert!(can_view(&sub, &Actor::new("proc-1", Designation::Procurement)));
        assert!(!can_view(
            &sub,
            &Actor::new("proc-2", Designation::Procurement)
        ));
    }

    #[test]
    fn test_participants_keep_historical_view() {
        let mut sub = submission_at(WorkflowStatus::GeneralManagerReview);
        sub.link_participant(
            Stage::OperationsManager,
            inspection_types::ActorId::new("om-1"),
        );
        sub.mark_approved(Stage::BusinessDevelopment, Utc::now());
        sub.mark_approved(Stage::Procurement, Utc::now());

        let om = Actor::new("om-1", Designation::OperationsManager);
        assert!(!can_edit(&sub, &om));
        assert!(can_view(&sub, &om));
    }

    #[test]
    fn test_inactive_actor_never_edits() {
        let sub = submission_at(WorkflowStatus::OperationsManagerReview);
        let om = Actor::new("om-1", Designation::OperationsManager).inactive();
        assert!(!can_edit(&sub, &om));
    }
}
