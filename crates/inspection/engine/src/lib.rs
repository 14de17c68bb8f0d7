//! FieldScope approval workflow engine
//!
//! The engine owns `Submission.workflow_status` and everything that
//! touches it: transition validation, stage-gated authorization,
//! rejection and admin closure, and the read-side merge of comment and
//! signature fields scattered across storage locations.
//!
//! # Key principle
//!
//! **All transitions dispatch through one entry point.** Callers build
//! an [`Action`] and hand it to [`transition`]; there is no per-role
//! branching anywhere else. Authorization is computed per request from
//! the submission's state, never stored.
//!
//! # Architecture
//!
//! - [`transition`]: the state machine proper; pure, synchronous,
//!   mutates a submission in memory or fails without touching it
//! - [`authorization`]: per-request edit/view checks, including the
//!   sticky-edit windows that stay open until the next stage acts
//! - [`FieldResolver`]: idempotent read-side projection of comment and
//!   signature fields from their three possible storage locations
//! - [`WorkflowEngine`]: async facade wiring the state machine to the
//!   storage, identity, notification, and audit seams, plus the
//!   [`ReportTrigger`] hook fired when a submission completes
//!
//! # Example
//!
//! ```rust
//! use inspection_engine::{transition, Action};
//! use inspection_types::{Actor, Designation, FormData, StageConfig, Submission, WorkflowStatus};
//!
//! let technician = Actor::new("tech-1", Designation::PlainUser);
//! let mut submission = Submission::new("hvac", FormData::new(), &technician);
//! assert_eq!(submission.workflow_status, WorkflowStatus::Submitted);
//!
//! let supervisor = Actor::new("sup-1", Designation::Supervisor);
//! let config = StageConfig::standard();
//! transition(
//!     &mut submission,
//!     &Action::Approve {
//!         comments: Some("Checked on site".to_string()),
//!         signature: None,
//!     },
//!     &supervisor,
//!     &config,
//! )
//! .unwrap();
//! assert_eq!(
//!     submission.workflow_status,
//!     WorkflowStatus::OperationsManagerReview
//! );
//! ```

#![deny(unsafe_code)]

pub mod authorization;
pub mod engine;
pub mod resolve;
pub mod transition;

pub use authorization::{can_edit, can_view};
pub use engine::{ReportTrigger, WorkflowEngine};
pub use resolve::{FieldResolver, FlatFieldMap};
pub use transition::{transition, Action, TransitionOutcome};
