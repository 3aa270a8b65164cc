#![forbid(unsafe_code)]

use super::super::support::now_ms;
use super::super::turn_state::{inc_choices_tx, set_choices_tx};
use super::super::{CheckpointRow, GameTx, StepRow, StoreError};
use super::set_open_step_tx;
use rusqlite::{Connection, OptionalExtension, params};
use tj_core::ids::StepId;

impl GameTx<'_> {
    /// Starts a new turn at the current sequence cursor.
    ///
    /// Everything before the checkpoint becomes permanent: earlier records, steps and
    /// checkpoints are pruned, the open step is closed and the choice count resets to 0.
    pub fn checkpoint(&self, state_id: i64) -> Result<CheckpointRow, StoreError> {
        let conn = self.conn();
        let cursor = sequence_cursor_tx(conn)?;
        let ts_ms = now_ms();

        conn.execute(
            "INSERT INTO journal_checkpoints(state_id, seq_at_checkpoint, ts_ms) VALUES (?1, ?2, ?3)",
            params![state_id, cursor, ts_ms],
        )?;
        let checkpoint_id = conn.last_insert_rowid();

        let pruned_records =
            conn.execute("DELETE FROM mutation_log WHERE seq <= ?1", params![cursor])?;
        let pruned_steps = conn.execute("DELETE FROM journal_steps", [])?;
        conn.execute(
            "DELETE FROM journal_checkpoints WHERE checkpoint_id < ?1",
            params![checkpoint_id],
        )?;
        set_open_step_tx(conn, None)?;
        set_choices_tx(conn, 0)?;

        tracing::info!(
            checkpoint_id,
            state_id,
            seq = cursor,
            pruned_records,
            pruned_steps,
            "checkpoint"
        );
        Ok(CheckpointRow {
            checkpoint_id,
            state_id,
            seq_at_checkpoint: cursor,
            ts_ms,
        })
    }

    /// Opens a new step; later journal entries are tagged with it.
    pub fn step(&self, state_id: i64) -> Result<StepId, StoreError> {
        let conn = self.conn();
        let cursor = sequence_cursor_tx(conn)?;
        conn.execute(
            "INSERT INTO journal_steps(state_id, notif_uid, seq_at_step, ts_ms) VALUES (?1, NULL, ?2, ?3)",
            params![state_id, cursor, now_ms()],
        )?;
        let step_id = StepId::new(conn.last_insert_rowid());
        set_open_step_tx(conn, Some(step_id))?;
        let choices = inc_choices_tx(conn)?;

        tracing::debug!(step_id = step_id.get(), state_id, choices, "step opened");
        Ok(step_id)
    }

    /// Live steps of the current turn, oldest first.
    pub fn undoable_steps(&self) -> Result<Vec<StepId>, StoreError> {
        Ok(select_steps_tx(self.conn(), None)?
            .into_iter()
            .map(|step| step.step_id)
            .collect())
    }

    pub fn steps(&self) -> Result<Vec<StepRow>, StoreError> {
        select_steps_tx(self.conn(), None)
    }

    pub fn step_row(&self, step_id: StepId) -> Result<Option<StepRow>, StoreError> {
        step_row_tx(self.conn(), step_id)
    }

    pub fn latest_checkpoint(&self) -> Result<Option<CheckpointRow>, StoreError> {
        latest_checkpoint_tx(self.conn())
    }

    /// Remembers the notification announcing `step_id`.
    pub fn attach_notification(&self, step_id: StepId, uid: &str) -> Result<(), StoreError> {
        let updated = self.conn().execute(
            "UPDATE journal_steps SET notif_uid=?2 WHERE step_id=?1",
            params![step_id.get(), uid],
        )?;
        if updated == 0 {
            return Err(StoreError::UnknownStep(step_id.get()));
        }
        Ok(())
    }
}

/// Highest mutation sequence ever allocated (0 before the first record).
fn sequence_cursor_tx(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn
        .query_row(
            "SELECT seq FROM sqlite_sequence WHERE name='mutation_log'",
            [],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .unwrap_or(0))
}

pub(in crate::store) fn latest_checkpoint_tx(
    conn: &Connection,
) -> Result<Option<CheckpointRow>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT checkpoint_id, state_id, seq_at_checkpoint, ts_ms FROM journal_checkpoints \
             ORDER BY checkpoint_id DESC LIMIT 1",
            [],
            |row| {
                Ok(CheckpointRow {
                    checkpoint_id: row.get(0)?,
                    state_id: row.get(1)?,
                    seq_at_checkpoint: row.get(2)?,
                    ts_ms: row.get(3)?,
                })
            },
        )
        .optional()?)
}

pub(super) fn step_row_tx(
    conn: &Connection,
    step_id: StepId,
) -> Result<Option<StepRow>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT step_id, state_id, notif_uid, seq_at_step, ts_ms FROM journal_steps WHERE step_id=?1",
            params![step_id.get()],
            map_step_row,
        )
        .optional()?)
}

/// Steps with `step_id >= from` (all when `None`), oldest first.
pub(super) fn select_steps_tx(
    conn: &Connection,
    from: Option<StepId>,
) -> Result<Vec<StepRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT step_id, state_id, notif_uid, seq_at_step, ts_ms FROM journal_steps \
         WHERE step_id >= ?1 ORDER BY step_id ASC",
    )?;
    let rows = stmt.query_map(
        params![from.map(StepId::get).unwrap_or(i64::MIN)],
        map_step_row,
    )?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn map_step_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StepRow> {
    Ok(StepRow {
        step_id: StepId::new(row.get(0)?),
        state_id: row.get(1)?,
        notif_uid: row.get(2)?,
        seq_at_step: row.get(3)?,
        ts_ms: row.get(4)?,
    })
}
