#![forbid(unsafe_code)]

use super::super::notifications::cancel_for_steps_tx;
use super::super::turn_state::set_choices_tx;
use super::super::{GameTx, RevertOutcome, StoreError};
use super::inverse::invert_record_tx;
use super::steps::{select_steps_tx, step_row_tx};
use super::{
    RecordFilter, latest_checkpoint_tx, logging_enabled_tx, select_records_tx, set_open_step_tx,
};
use rusqlite::{Connection, params};
use tj_core::ids::StepId;

#[derive(Clone, Copy, Debug)]
enum RevertScope {
    All,
    FromStep(StepId),
}

impl GameTx<'_> {
    /// Reverts every step of the current turn, newest write first.
    ///
    /// A second call with nothing left to revert is a no-op. Either every inversion lands or
    /// none does, even if the caller keeps the transaction after an error.
    pub fn revert_all(&self) -> Result<RevertOutcome, StoreError> {
        revert_tx(self.conn(), RevertScope::All)
    }

    /// Reverts `target` and every later step; earlier steps stay applied.
    pub fn undo_to_step(&self, target: StepId) -> Result<RevertOutcome, StoreError> {
        revert_tx(self.conn(), RevertScope::FromStep(target))
    }
}

const REVERT_SAVEPOINT: &str = "journal_revert";

fn revert_tx(conn: &Connection, scope: RevertScope) -> Result<RevertOutcome, StoreError> {
    if !logging_enabled_tx(conn)? {
        return Err(StoreError::Configuration(
            "journal logging is disabled".to_string(),
        ));
    }

    conn.execute_batch(&format!("SAVEPOINT {REVERT_SAVEPOINT}"))?;
    match revert_scope_tx(conn, scope) {
        Ok(outcome) => {
            conn.execute_batch(&format!("RELEASE {REVERT_SAVEPOINT}"))?;
            Ok(outcome)
        }
        Err(err) => {
            conn.execute_batch(&format!(
                "ROLLBACK TO {REVERT_SAVEPOINT}; RELEASE {REVERT_SAVEPOINT}"
            ))?;
            Err(err)
        }
    }
}

fn revert_scope_tx(conn: &Connection, scope: RevertScope) -> Result<RevertOutcome, StoreError> {
    let checkpoint = latest_checkpoint_tx(conn)?;
    let cursor = checkpoint
        .as_ref()
        .map(|checkpoint| checkpoint.seq_at_checkpoint)
        .unwrap_or(0);

    let (first_step, resume_state) = match scope {
        RevertScope::All => (None, checkpoint.as_ref().map(|checkpoint| checkpoint.state_id)),
        RevertScope::FromStep(target) => {
            let step = step_row_tx(conn, target)?.ok_or(StoreError::UnknownStep(target.get()))?;
            (Some(target), Some(step.state_id))
        }
    };

    let steps = select_steps_tx(conn, first_step)?;
    let records = select_records_tx(conn, cursor, RecordFilter::StepsFrom(first_step))?;
    if steps.is_empty() && records.is_empty() {
        return Ok(RevertOutcome::default());
    }

    for record in records.iter().rev() {
        invert_record_tx(conn, record)?;
    }

    let reverted_steps: Vec<StepId> = steps.iter().map(|step| step.step_id).collect();
    let canceled_notif_ids = cancel_for_steps_tx(conn, &reverted_steps)?;

    for record in &records {
        conn.execute("DELETE FROM mutation_log WHERE seq=?1", params![record.seq])?;
    }
    conn.execute(
        "DELETE FROM journal_steps WHERE step_id >= ?1",
        params![first_step.map(StepId::get).unwrap_or(i64::MIN)],
    )?;

    let remaining = select_steps_tx(conn, None)?;
    let choices = i64::try_from(remaining.len())
        .map_err(|_| StoreError::InvalidInput("numeric overflow"))?;
    set_choices_tx(conn, choices)?;
    set_open_step_tx(conn, remaining.last().map(|step| step.step_id))?;

    tracing::info!(
        scope = ?scope,
        steps = reverted_steps.len(),
        records = records.len(),
        canceled = canceled_notif_ids.len(),
        choices,
        "journal reverted"
    );

    Ok(RevertOutcome {
        reverted_steps,
        reverted_records: records.len(),
        canceled_notif_ids,
        resume_state,
    })
}
