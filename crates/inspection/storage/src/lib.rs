//! Storage seams for the FieldScope workflow engine
//!
//! The engine's collaborators are expressed as traits so the core stays
//! independent of any web framework, ORM, or mail system:
//!
//! - [`SubmissionStore`]: atomic load/save of submission rows, with
//!   optimistic-concurrency version checking on save
//! - [`IdentityResolver`]: actor id to designation/active flag
//! - [`ReviewerNotifier`]: fire-and-forget stage notifications
//! - [`AuditLog`]: append-only record of every engine mutation
//!
//! In-memory adapters for all four live in [`memory`]; they are
//! deterministic and test-friendly. Production deployments back these
//! traits with a transactional store.

#![deny(unsafe_code)]

pub mod error;
pub mod memory;
pub mod model;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::{
    InMemoryAuditLog, InMemoryIdentityResolver, InMemoryNotifier, InMemorySubmissionStore,
};
pub use model::AuditRecord;
pub use traits::{AuditLog, IdentityResolver, ReviewerNotifier, SubmissionStore};
