#![forbid(unsafe_code)]

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tj_core::ids::{RowId, StepId};
use tj_core::model::MutationKind;

/// Column name to value. Always carries the primary key column.
pub type RowImage = BTreeMap<String, JsonValue>;

#[derive(Clone, Debug, PartialEq)]
pub struct AffectedRow {
    pub key: RowId,
    pub pre_image: Option<RowImage>,
    pub post_image: Option<RowImage>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewMutationRecord {
    pub table: String,
    pub primary_key: String,
    pub kind: MutationKind,
    pub affected: Vec<AffectedRow>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MutationRecord {
    pub seq: i64,
    pub table: String,
    pub primary_key: String,
    pub kind: MutationKind,
    pub affected: Vec<AffectedRow>,
    pub step_id: Option<StepId>,
    pub ts_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepRow {
    pub step_id: StepId,
    pub state_id: i64,
    pub notif_uid: Option<String>,
    pub seq_at_step: i64,
    pub ts_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckpointRow {
    pub checkpoint_id: i64,
    pub state_id: i64,
    pub seq_at_checkpoint: i64,
    pub ts_ms: i64,
}

/// What a revert undid, and where the state machine should resume.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RevertOutcome {
    pub reverted_steps: Vec<StepId>,
    pub reverted_records: usize,
    pub canceled_notif_ids: Vec<String>,
    pub resume_state: Option<i64>,
}

impl RevertOutcome {
    pub fn is_noop(&self) -> bool {
        self.reverted_steps.is_empty() && self.reverted_records == 0
    }
}
