//! Storage-side records

use chrono::{DateTime, Utc};
use inspection_types::ActorId;
use serde::{Deserialize, Serialize};

/// One append-only audit entry recording an engine mutation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Monotonically increasing sequence number within the log
    pub sequence: u64,
    /// Who performed the action
    pub actor_id: ActorId,
    /// What was done (e.g. `approve`, `reject`, `admin_close`)
    pub action: String,
    /// Kind of resource acted on (e.g. `submission`)
    pub resource_type: String,
    /// Identifier of the resource acted on
    pub resource_id: String,
    /// Free-form detail, serialized by the caller
    pub details: String,
    /// When the action happened
    pub recorded_at: DateTime<Utc>,
}
