//! Read-side field merging
//!
//! Up to five reviewers post into overlapping storage: dedicated model
//! columns, top-level `form_data` keys, and a legacy nested
//! `form_data["data"]` document written by older clients. The resolver
//! produces one authoritative value per (stage, field) pair through an
//! explicit, ordered rule list; the precedence lives in data rather
//! than branchy code and can be tested in isolation.
//!
//! The resolver is idempotent and never writes back; writes always go
//! through the submission's canonical setters.

use inspection_types::{Stage, StageConfig, Submission};
use serde_json::{Map, Value};

/// The resolver's output: one authoritative value per field, ready for
/// report rendering or the review UI.
pub type FlatFieldMap = Map<String, Value>;

/// Where a field value may live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// The dedicated model column.
    Column,
    /// A top-level `form_data` key.
    TopLevel,
    /// Inside `form_data["data"]`, one level down. Read-only legacy
    /// support; nothing ever writes here.
    Nested,
}

/// One lookup step: a location plus the key names to try there,
/// canonical name first.
#[derive(Clone, Debug)]
pub struct LookupRule {
    pub location: Location,
    pub keys: Vec<&'static str>,
}

/// Merges per-stage comment and signature fields into authoritative
/// values. Pure read-side projection over an injected [`StageConfig`].
#[derive(Clone, Debug)]
pub struct FieldResolver {
    config: StageConfig,
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self::new(StageConfig::standard())
    }
}

impl FieldResolver {
    pub fn new(config: StageConfig) -> Self {
        Self { config }
    }

    /// Ordered lookup rules for a stage's comment field: column, then
    /// top-level `form_data`, then the nested legacy document.
    pub fn comment_rules(stage: Stage) -> Vec<LookupRule> {
        let keys = vec![stage.comment_key()];
        vec![
            LookupRule {
                location: Location::Column,
                keys: keys.clone(),
            },
            LookupRule {
                location: Location::TopLevel,
                keys: keys.clone(),
            },
            LookupRule {
                location: Location::Nested,
                keys,
            },
        ]
    }

    /// Ordered lookup rules for a stage's signature. Signatures have no
    /// model column; both the canonical key and the historical variant
    /// are tried at each location, canonical first.
    pub fn signature_rules(stage: Stage) -> Vec<LookupRule> {
        let keys = stage.signature_keys().to_vec();
        vec![
            LookupRule {
                location: Location::TopLevel,
                keys: keys.clone(),
            },
            LookupRule {
                location: Location::Nested,
                keys,
            },
        ]
    }

    /// The authoritative comment for a stage, or `None` ("no comments").
    ///
    /// Every candidate value, the dedicated column included, is checked
    /// against earlier stages' resolved comments; a verbatim match is
    /// cross-stage bleed, logged and discarded rather than
    /// misattributed. Historical rows exist where a later stage's
    /// column was populated with the supervisor's text, so the column
    /// is not exempt.
    pub fn resolved_comment(&self, submission: &Submission, stage: Stage) -> Option<String> {
        for rule in Self::comment_rules(stage) {
            let Some(value) = lookup(submission, stage, &rule) else {
                continue;
            };
            if self.is_bleed(submission, stage, &value) {
                tracing::warn!(
                    submission_id = %submission.id,
                    stage = %stage,
                    location = ?rule.location,
                    "data integrity warning: comment matches an earlier \
                     stage's comment verbatim; treating as absent"
                );
                continue;
            }
            return Some(value);
        }
        None
    }

    /// The authoritative signature for a stage, or `None` ("not signed").
    pub fn resolved_signature(&self, submission: &Submission, stage: Stage) -> Option<String> {
        Self::signature_rules(stage)
            .iter()
            .find_map(|rule| lookup(submission, stage, rule))
    }

    /// Assemble the full display payload: pass-through domain fields
    /// first, then one resolved comment and signature per stage under
    /// its canonical key.
    pub fn resolve_display_fields(&self, submission: &Submission) -> FlatFieldMap {
        let mut fields = FlatFieldMap::new();
        for (key, value) in &submission.form_data {
            if !is_reserved_key(key) {
                fields.insert(key.clone(), value.clone());
            }
        }
        for stage in self.config.stages() {
            if let Some(comment) = self.resolved_comment(submission, stage) {
                fields.insert(stage.comment_key().to_string(), Value::String(comment));
            }
            if let Some(signature) = self.resolved_signature(submission, stage) {
                let [canonical, _] = stage.signature_keys();
                fields.insert(canonical.to_string(), Value::String(signature));
            }
        }
        fields
    }

    fn is_bleed(&self, submission: &Submission, stage: Stage, value: &str) -> bool {
        self.config
            .stages_before(stage)
            .into_iter()
            .any(|earlier| {
                self.resolved_comment(submission, earlier)
                    .is_some_and(|c| c == value)
            })
    }
}

fn lookup(submission: &Submission, stage: Stage, rule: &LookupRule) -> Option<String> {
    match rule.location {
        Location::Column => submission
            .comments(stage)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        Location::TopLevel => rule
            .keys
            .iter()
            .find_map(|key| non_empty_string(submission.form_data.get(*key))),
        Location::Nested => {
            let nested = submission.form_data.get("data")?.as_object()?;
            rule.keys
                .iter()
                .find_map(|key| non_empty_string(nested.get(*key)))
        }
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn is_reserved_key(key: &str) -> bool {
    if key == "data" {
        return true;
    }
    Stage::ALL.iter().any(|stage| {
        stage.comment_key() == key || stage.signature_keys().contains(&key)
    })
}
