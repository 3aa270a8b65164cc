#![forbid(unsafe_code)]

use super::journal::open_step_tx;
use super::support::now_ms;
use super::{NewNotification, NotificationRow, StoreError, notification_uid};
use rusqlite::{Connection, params};
use tj_core::ids::{PlayerId, StepId};
use tj_core::model::NotifyScope;

/// Notification outbox. Rows are written inside the action transaction and tagged with the
/// open step so a revert can cancel them.
pub struct Outbox<'c> {
    conn: &'c Connection,
}

impl<'c> Outbox<'c> {
    pub(in crate::store) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn push(&self, notification: NewNotification<'_>) -> Result<NotificationRow, StoreError> {
        let step_id = if notification.cancelable {
            open_step_tx(self.conn)?
        } else {
            None
        };
        let ts_ms = now_ms();
        let args_json = serde_json::to_string(&notification.args)?;

        self.conn.execute(
            "INSERT INTO notifications(uid, scope, player_id, name, message, args_json, step_id, canceled, ts_ms) \
             VALUES (NULL, ?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
            params![
                notification.scope.as_str(),
                notification.scope.player().map(PlayerId::get),
                notification.name,
                notification.message,
                args_json,
                step_id.map(StepId::get),
                ts_ms
            ],
        )?;
        let seq = self.conn.last_insert_rowid();
        let uid = notification_uid(seq);
        self.conn.execute(
            "UPDATE notifications SET uid=?2 WHERE seq=?1",
            params![seq, uid],
        )?;

        Ok(NotificationRow {
            seq,
            uid,
            scope: notification.scope,
            name: notification.name.to_string(),
            message: notification.message.to_string(),
            args: notification.args,
            step_id,
            canceled: false,
            ts_ms,
        })
    }

    /// Uids of every envelope struck by a revert, oldest first.
    pub fn canceled_uids(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT uid FROM notifications WHERE canceled=1 ORDER BY seq ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_after(&self, after_seq: i64) -> Result<Vec<NotificationRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, uid, scope, player_id, name, message, args_json, step_id, canceled, ts_ms \
             FROM notifications WHERE seq > ?1 ORDER BY seq ASC",
        )?;
        let mut rows = stmt.query(params![after_seq])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let scope_raw: String = row.get(2)?;
            let player_id: Option<i64> = row.get(3)?;
            let args_json: String = row.get(6)?;
            out.push(NotificationRow {
                seq: row.get(0)?,
                uid: row.get(1)?,
                scope: parse_scope(&scope_raw, player_id)?,
                name: row.get(4)?,
                message: row.get(5)?,
                args: serde_json::from_str(&args_json)?,
                step_id: row.get::<_, Option<i64>>(7)?.map(StepId::new),
                canceled: row.get::<_, i64>(8)? != 0,
                ts_ms: row.get(9)?,
            });
        }
        Ok(out)
    }
}

fn parse_scope(raw: &str, player_id: Option<i64>) -> Result<NotifyScope, StoreError> {
    match (raw, player_id) {
        ("all", _) => Ok(NotifyScope::All),
        ("player", Some(player_id)) => PlayerId::try_new(player_id)
            .map(NotifyScope::Player)
            .map_err(|_| StoreError::InvalidInput("invalid notification player_id")),
        _ => Err(StoreError::InvalidInput("invalid notification scope")),
    }
}

/// Marks live envelopes of `steps` canceled and returns their uids, oldest first.
pub(in crate::store) fn cancel_for_steps_tx(
    conn: &Connection,
    steps: &[StepId],
) -> Result<Vec<String>, StoreError> {
    let mut uids = Vec::new();
    let mut select = conn.prepare(
        "SELECT uid FROM notifications WHERE step_id=?1 AND canceled=0 ORDER BY seq ASC",
    )?;
    for step in steps {
        let rows = select.query_map(params![step.get()], |row| row.get::<_, String>(0))?;
        uids.extend(rows.collect::<Result<Vec<_>, _>>()?);
        conn.execute(
            "UPDATE notifications SET canceled=1 WHERE step_id=?1",
            params![step.get()],
        )?;
    }
    Ok(uids)
}
