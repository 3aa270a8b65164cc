#![forbid(unsafe_code)]

mod inverse;
mod revert;
mod steps;

pub(in crate::store) use steps::latest_checkpoint_tx;

use super::support::{
    meta_delete_tx, meta_get_tx, meta_set_tx, now_ms, row_id_from_json, row_id_to_json,
    validate_identifier,
};
use super::turn_state::set_choices_tx;
use super::{
    AffectedRow, GameTx, MutationRecord, NewMutationRecord, RowImage, StoreError, TableSpec,
};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tj_core::ids::StepId;
use tj_core::model::MutationKind;

const META_OPEN_STEP: &str = "open_step";
const META_LOGGING: &str = "logging";

/// Journal handle for one table, attached to builders writing that table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableJournal {
    table: TableSpec,
}

impl TableJournal {
    pub fn new(table: TableSpec) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &TableSpec {
        &self.table
    }

    /// Appends one record. Writes that touched no rows leave no record.
    pub(in crate::store) fn record(
        &self,
        conn: &Connection,
        kind: MutationKind,
        affected: Vec<AffectedRow>,
    ) -> Result<Option<i64>, StoreError> {
        if affected.is_empty() {
            return Ok(None);
        }
        let record = NewMutationRecord {
            table: self.table.name().to_string(),
            primary_key: self.table.primary().to_string(),
            kind,
            affected,
        };
        add_entry_tx(conn, &record).map(Some)
    }
}

#[derive(Serialize, Deserialize)]
struct StoredAffectedRow {
    key: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pre: Option<RowImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    post: Option<RowImage>,
}

impl GameTx<'_> {
    /// Appends `record` tagged with the open step (if any). Returns its sequence id.
    pub fn add_entry(&self, record: NewMutationRecord) -> Result<i64, StoreError> {
        add_entry_tx(self.conn(), &record)
    }

    pub fn logging_enabled(&self) -> Result<bool, StoreError> {
        logging_enabled_tx(self.conn())
    }

    pub fn set_logging(&self, enabled: bool) -> Result<(), StoreError> {
        meta_set_tx(self.conn(), META_LOGGING, if enabled { "1" } else { "0" })
    }

    /// Turns logging off and drops the whole journal.
    pub fn stop_log(&self) -> Result<(), StoreError> {
        let conn = self.conn();
        self.set_logging(false)?;
        conn.execute("DELETE FROM mutation_log", [])?;
        conn.execute("DELETE FROM journal_steps", [])?;
        conn.execute("DELETE FROM journal_checkpoints", [])?;
        set_open_step_tx(conn, None)?;
        set_choices_tx(conn, 0)?;
        tracing::info!("journal stopped and cleared");
        Ok(())
    }

    pub fn current_step(&self) -> Result<Option<StepId>, StoreError> {
        open_step_tx(self.conn())
    }

    pub fn entries_since_checkpoint(&self) -> Result<Vec<MutationRecord>, StoreError> {
        let conn = self.conn();
        let cursor = latest_checkpoint_tx(conn)?
            .map(|checkpoint| checkpoint.seq_at_checkpoint)
            .unwrap_or(0);
        select_records_tx(conn, cursor, RecordFilter::All)
    }
}

pub(in crate::store) fn logging_enabled_tx(conn: &Connection) -> Result<bool, StoreError> {
    Ok(meta_get_tx(conn, META_LOGGING)?.as_deref() != Some("0"))
}

pub(in crate::store) fn open_step_tx(conn: &Connection) -> Result<Option<StepId>, StoreError> {
    let Some(raw) = meta_get_tx(conn, META_OPEN_STEP)? else {
        return Ok(None);
    };
    raw.parse::<i64>()
        .map(|value| Some(StepId::new(value)))
        .map_err(|_| StoreError::InvalidInput("corrupt open step cursor"))
}

fn set_open_step_tx(conn: &Connection, step: Option<StepId>) -> Result<(), StoreError> {
    match step {
        Some(step) => meta_set_tx(conn, META_OPEN_STEP, &step.get().to_string()),
        None => meta_delete_tx(conn, META_OPEN_STEP),
    }
}

pub(in crate::store) fn add_entry_tx(
    conn: &Connection,
    record: &NewMutationRecord,
) -> Result<i64, StoreError> {
    validate_identifier(&record.table)?;
    validate_identifier(&record.primary_key)?;
    let step = open_step_tx(conn)?;

    let stored: Vec<StoredAffectedRow> = record
        .affected
        .iter()
        .map(|row| StoredAffectedRow {
            key: row_id_to_json(&row.key),
            pre: row.pre_image.clone(),
            post: row.post_image.clone(),
        })
        .collect();
    let affected_json = serde_json::to_string(&stored)?;

    conn.execute(
        "INSERT INTO mutation_log(tbl, primary_key, kind, affected_json, step_id, ts_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.table,
            record.primary_key,
            record.kind.as_str(),
            affected_json,
            step.map(StepId::get),
            now_ms()
        ],
    )?;
    let seq = conn.last_insert_rowid();

    tracing::debug!(
        seq,
        table = %record.table,
        kind = record.kind.as_str(),
        rows = record.affected.len(),
        step_id = step.map(StepId::get),
        "journal entry"
    );
    Ok(seq)
}

#[derive(Clone, Copy, Debug)]
pub(in crate::store) enum RecordFilter {
    /// Every record after the cursor, including ones written outside a step.
    All,
    /// Records tagged with a step id at or above the bound.
    StepsFrom(Option<StepId>),
}

/// Records with `seq > after_seq`, oldest first.
pub(in crate::store) fn select_records_tx(
    conn: &Connection,
    after_seq: i64,
    filter: RecordFilter,
) -> Result<Vec<MutationRecord>, StoreError> {
    let (step_clause, min_step) = match filter {
        RecordFilter::All => ("", None),
        RecordFilter::StepsFrom(bound) => (
            " AND step_id IS NOT NULL AND step_id >= ?2",
            Some(bound.map(StepId::get).unwrap_or(i64::MIN)),
        ),
    };
    let sql = format!(
        "SELECT seq, tbl, primary_key, kind, affected_json, step_id, ts_ms \
         FROM mutation_log WHERE seq > ?1{step_clause} ORDER BY seq ASC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match min_step {
        Some(min_step) => stmt.query(params![after_seq, min_step])?,
        None => stmt.query(params![after_seq])?,
    };

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let kind_raw: String = row.get(3)?;
        let affected_json: String = row.get(4)?;
        out.push(MutationRecord {
            seq: row.get(0)?,
            table: row.get(1)?,
            primary_key: row.get(2)?,
            kind: MutationKind::parse(&kind_raw)
                .ok_or(StoreError::InvalidInput("unknown mutation kind in journal"))?,
            affected: decode_affected(&affected_json)?,
            step_id: row.get::<_, Option<i64>>(5)?.map(StepId::new),
            ts_ms: row.get(6)?,
        });
    }
    Ok(out)
}

fn decode_affected(raw: &str) -> Result<Vec<AffectedRow>, StoreError> {
    let stored: Vec<StoredAffectedRow> = serde_json::from_str(raw)?;
    stored
        .into_iter()
        .map(|row| {
            Ok(AffectedRow {
                key: row_id_from_json(&row.key)?,
                pre_image: row.pre,
                post_image: row.post,
            })
        })
        .collect()
}
