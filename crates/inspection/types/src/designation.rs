//! Reviewer designations and the canonical review sequence
//!
//! A designation is a user's workflow role, distinct from their
//! authentication role. The review sequence is fixed: supervisor →
//! operations manager → {business development, procurement} in parallel →
//! general manager. The sequence lives in an immutable [`StageConfig`]
//! built once at startup and injected into the engine, never in ambient
//! mutable state.

use serde::{Deserialize, Serialize};

// ── Designation ──────────────────────────────────────────────────────

/// A workflow participant's designation.
///
/// `Admin` bypasses all stage gates; `PlainUser` (e.g. a technician) can
/// create submissions but owns no review stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Designation {
    Supervisor,
    OperationsManager,
    BusinessDevelopment,
    Procurement,
    GeneralManager,
    Admin,
    PlainUser,
}

impl Designation {
    /// The review stage owned by this designation, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Supervisor => Some(Stage::Supervisor),
            Self::OperationsManager => Some(Stage::OperationsManager),
            Self::BusinessDevelopment => Some(Stage::BusinessDevelopment),
            Self::Procurement => Some(Stage::Procurement),
            Self::GeneralManager => Some(Stage::GeneralManager),
            Self::Admin | Self::PlainUser => None,
        }
    }

    /// Check if this designation owns a review stage.
    pub fn is_reviewer(&self) -> bool {
        self.stage().is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supervisor => "supervisor",
            Self::OperationsManager => "operations_manager",
            Self::BusinessDevelopment => "business_development",
            Self::Procurement => "procurement",
            Self::GeneralManager => "general_manager",
            Self::Admin => "admin",
            Self::PlainUser => "plain_user",
        }
    }
}

impl std::fmt::Display for Designation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Designation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supervisor" => Ok(Self::Supervisor),
            "operations_manager" => Ok(Self::OperationsManager),
            "business_development" => Ok(Self::BusinessDevelopment),
            "procurement" => Ok(Self::Procurement),
            "general_manager" => Ok(Self::GeneralManager),
            "admin" => Ok(Self::Admin),
            "plain_user" => Ok(Self::PlainUser),
            other => Err(format!("unknown designation: {other}")),
        }
    }
}

// ── Stage ────────────────────────────────────────────────────────────

/// One step in the approval sequence, owned by exactly one designation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Supervisor,
    OperationsManager,
    BusinessDevelopment,
    Procurement,
    GeneralManager,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Supervisor,
        Stage::OperationsManager,
        Stage::BusinessDevelopment,
        Stage::Procurement,
        Stage::GeneralManager,
    ];

    /// The designation that owns this stage.
    pub fn designation(&self) -> Designation {
        match self {
            Self::Supervisor => Designation::Supervisor,
            Self::OperationsManager => Designation::OperationsManager,
            Self::BusinessDevelopment => Designation::BusinessDevelopment,
            Self::Procurement => Designation::Procurement,
            Self::GeneralManager => Designation::GeneralManager,
        }
    }

    /// Key of this stage's comment field, used both as the dedicated
    /// model column name and as the top-level `form_data` key.
    pub fn comment_key(&self) -> &'static str {
        match self {
            Self::Supervisor => "supervisor_comments",
            Self::OperationsManager => "operations_manager_comments",
            Self::BusinessDevelopment => "business_dev_comments",
            Self::Procurement => "procurement_comments",
            Self::GeneralManager => "general_manager_comments",
        }
    }

    /// Signature keys in precedence order: the canonical name first,
    /// then the historical variant written by older clients. Both must
    /// be checked on read; writes always use the canonical name.
    pub fn signature_keys(&self) -> [&'static str; 2] {
        match self {
            Self::Supervisor => ["supervisor_signature", "super_signature"],
            Self::OperationsManager => ["operations_manager_signature", "opMan_signature"],
            Self::BusinessDevelopment => ["business_dev_signature", "busDev_signature"],
            Self::Procurement => ["procurement_signature", "procure_signature"],
            Self::GeneralManager => ["general_manager_signature", "genMan_signature"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supervisor => "supervisor",
            Self::OperationsManager => "operations_manager",
            Self::BusinessDevelopment => "business_development",
            Self::Procurement => "procurement",
            Self::GeneralManager => "general_manager",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Stage Configuration ──────────────────────────────────────────────

/// The immutable review-sequence table.
///
/// Built once at process start and injected into the engine. Parallel
/// stages share a group; a group is complete only when every stage in it
/// has approved.
#[derive(Clone, Debug)]
pub struct StageConfig {
    sequence: Vec<Vec<Stage>>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl StageConfig {
    /// The production sequence: supervisor, operations manager, the
    /// BD/procurement parallel pair, general manager.
    pub fn standard() -> Self {
        Self {
            sequence: vec![
                vec![Stage::Supervisor],
                vec![Stage::OperationsManager],
                vec![Stage::BusinessDevelopment, Stage::Procurement],
                vec![Stage::GeneralManager],
            ],
        }
    }

    /// The ordered stage groups.
    pub fn groups(&self) -> &[Vec<Stage>] {
        &self.sequence
    }

    /// All stages, flattened in sequence order.
    pub fn stages(&self) -> Vec<Stage> {
        self.sequence.iter().flatten().copied().collect()
    }

    /// Stages in groups strictly earlier than the group containing
    /// `stage`. A parallel sibling is not "before" its peer.
    pub fn stages_before(&self, stage: Stage) -> Vec<Stage> {
        let mut before = Vec::new();
        for group in &self.sequence {
            if group.contains(&stage) {
                break;
            }
            before.extend(group.iter().copied());
        }
        before
    }

    /// Stages in the same group as `stage`, excluding `stage` itself.
    pub fn parallel_peers(&self, stage: Stage) -> Vec<Stage> {
        self.sequence
            .iter()
            .find(|group| group.contains(&stage))
            .map(|group| group.iter().copied().filter(|s| *s != stage).collect())
            .unwrap_or_default()
    }
}
