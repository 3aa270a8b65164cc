#![forbid(unsafe_code)]

use super::{BoardSide, Card, Player};
use crate::{json_rpc_notification, rfc3339};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tj_core::ids::StepId;
use tj_core::model::NotifyScope;
use tj_storage::{GameTx, NewNotification, NotificationRow, StoreError};

pub(crate) const NOTIFY_METHOD: &str = "game/notify";

/// Reacts to every delivered envelope, after the commit that produced it.
pub(crate) trait BroadcastObserver {
    fn on_broadcast(&self, notification: &NotificationRow);
}

/// Envelopes queued by one action. They are persisted with the action and only reach the
/// transport through [`BroadcastHub::flush`] once the transaction has committed.
#[derive(Debug, Default)]
pub(crate) struct Bridge {
    pending: Vec<NotificationRow>,
}

impl Bridge {
    fn push(
        &mut self,
        tx: &GameTx<'_>,
        scope: NotifyScope,
        name: &str,
        message: &str,
        args: Value,
        cancelable: bool,
    ) -> Result<NotificationRow, StoreError> {
        let row = tx.outbox().push(NewNotification {
            scope,
            name,
            message,
            args,
            cancelable,
        })?;
        tracing::debug!(uid = %row.uid, name, step_id = ?row.step_id, "notification queued");
        self.pending.push(row.clone());
        Ok(row)
    }

    pub(crate) fn notify_all(
        &mut self,
        tx: &GameTx<'_>,
        name: &str,
        message: &str,
        player: Option<&Player>,
        args: Value,
    ) -> Result<NotificationRow, StoreError> {
        let args = expand_player_args(args, player);
        self.push(tx, NotifyScope::All, name, message, args, true)
    }

    pub(crate) fn notify_player(
        &mut self,
        tx: &GameTx<'_>,
        to: &Player,
        name: &str,
        message: &str,
        args: Value,
    ) -> Result<NotificationRow, StoreError> {
        let args = expand_player_args(args, Some(to));
        self.push(tx, NotifyScope::Player(to.id), name, message, args, true)
    }

    pub(crate) fn message(
        &mut self,
        tx: &GameTx<'_>,
        text: &str,
        player: Option<&Player>,
    ) -> Result<NotificationRow, StoreError> {
        self.notify_all(tx, "message", text, player, json!({}))
    }

    pub(crate) fn message_to(
        &mut self,
        tx: &GameTx<'_>,
        to: &Player,
        text: &str,
    ) -> Result<NotificationRow, StoreError> {
        self.notify_player(tx, to, "message", text, json!({}))
    }

    /// Tells the acting player that `step` can be undone and links the envelope to the step.
    pub(crate) fn new_undoable_step(
        &mut self,
        tx: &GameTx<'_>,
        player: &Player,
        step: StepId,
    ) -> Result<NotificationRow, StoreError> {
        let row = self.notify_player(
            tx,
            player,
            "newUndoableStep",
            "",
            json!({ "stepId": step.get() }),
        )?;
        tx.attach_notification(step, &row.uid)?;
        Ok(row)
    }

    pub(crate) fn card_placed(
        &mut self,
        tx: &GameTx<'_>,
        player: &Player,
        card: &Card,
        side: BoardSide,
    ) -> Result<NotificationRow, StoreError> {
        self.notify_all(
            tx,
            "cardPlaced",
            "${player_name} plays a ${card_color} ${card_value} on the ${side}",
            Some(player),
            json!({
                "card": card.to_json(),
                "card_color": card.color,
                "card_value": card.value,
                "side": side.as_str(),
            }),
        )
    }

    /// Cancellation of reverted envelopes. Never tagged with a step, so no later revert
    /// strikes it.
    pub(crate) fn clear_turn(
        &mut self,
        tx: &GameTx<'_>,
        player: &Player,
        message: &str,
        notif_ids: &[String],
    ) -> Result<NotificationRow, StoreError> {
        let args = expand_player_args(json!({ "notifIds": notif_ids }), Some(player));
        self.push(tx, NotifyScope::All, "clearTurn", message, args, false)
    }

    pub(crate) fn refresh_ui(
        &mut self,
        tx: &GameTx<'_>,
        datas: Value,
    ) -> Result<NotificationRow, StoreError> {
        self.push(
            tx,
            NotifyScope::All,
            "refreshUI",
            "",
            json!({ "datas": datas }),
            false,
        )
    }

    pub(crate) fn into_pending(self) -> Vec<NotificationRow> {
        self.pending
    }
}

/// Adds `player_name`/`player_id` for message templates.
fn expand_player_args(args: Value, player: Option<&Player>) -> Value {
    let Some(player) = player else {
        return args;
    };
    match args {
        Value::Object(mut obj) => {
            obj.insert("player_id".to_string(), json!(player.id.get()));
            obj.insert("player_name".to_string(), json!(player.name));
            Value::Object(obj)
        }
        other => other,
    }
}

/// Owns the broadcast observers of one game server.
#[derive(Default)]
pub(crate) struct BroadcastHub {
    observers: Vec<Box<dyn BroadcastObserver>>,
}

impl BroadcastHub {
    pub(crate) fn register(&mut self, observer: Box<dyn BroadcastObserver>) {
        self.observers.push(observer);
    }

    /// Turns committed envelopes into wire notifications, oldest first.
    pub(crate) fn flush(&self, notifications: Vec<NotificationRow>) -> Vec<Value> {
        notifications
            .into_iter()
            .map(|notification| {
                for observer in &self.observers {
                    observer.on_broadcast(&notification);
                }
                envelope_value(&notification)
            })
            .collect()
    }
}

fn envelope_value(notification: &NotificationRow) -> Value {
    let mut params = serde_json::Map::new();
    params.insert("uid".to_string(), json!(notification.uid));
    params.insert("name".to_string(), json!(notification.name));
    params.insert("scope".to_string(), json!(notification.scope.as_str()));
    if let Some(player) = notification.scope.player() {
        params.insert("playerId".to_string(), json!(player.get()));
    }
    params.insert("message".to_string(), json!(notification.message));
    params.insert("args".to_string(), notification.args.clone());
    let at = OffsetDateTime::from_unix_timestamp_nanos(i128::from(notification.ts_ms) * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    params.insert("time".to_string(), json!(rfc3339(at)));
    json_rpc_notification(NOTIFY_METHOD, Value::Object(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use tj_core::ids::PlayerId;
    use tj_storage::SqliteStore;

    fn ada() -> Player {
        Player {
            id: PlayerId::try_new(5).expect("player id"),
            name: "Ada".to_string(),
            color: "ff0000".to_string(),
            no: 1,
            score: 0,
        }
    }

    struct Counter(Rc<Cell<usize>>);

    impl BroadcastObserver for Counter {
        fn on_broadcast(&self, _notification: &NotificationRow) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn step_envelopes_are_linked_and_cancelable() {
        let mut store = SqliteStore::open_in_memory().expect("open store");
        let tx = store.transaction().expect("tx");
        tx.checkpoint(4).expect("checkpoint");
        let step = tx.step(4).expect("step");

        let mut bridge = Bridge::default();
        let note = bridge.new_undoable_step(&tx, &ada(), step).expect("notify");
        assert_eq!(note.step_id, Some(step));
        assert_eq!(note.args["player_name"], json!("Ada"));
        let row = tx.step_row(step).expect("step row").expect("present");
        assert_eq!(row.notif_uid.as_deref(), Some(note.uid.as_str()));

        let clear = bridge
            .clear_turn(&tx, &ada(), "${player_name} restarts", &[note.uid.clone()])
            .expect("clear");
        assert_eq!(clear.step_id, None);
        assert_eq!(clear.args["notifIds"], json!([note.uid]));
        assert_eq!(bridge.into_pending().len(), 2);
    }

    #[test]
    fn flush_runs_observers_per_envelope() {
        let mut store = SqliteStore::open_in_memory().expect("open store");
        let tx = store.transaction().expect("tx");
        let mut bridge = Bridge::default();
        bridge.message(&tx, "hello", None).expect("message");
        bridge.message_to(&tx, &ada(), "psst").expect("private");

        let seen = Rc::new(Cell::new(0));
        let mut hub = BroadcastHub::default();
        hub.register(Box::new(Counter(seen.clone())));
        let wire = hub.flush(bridge.into_pending());

        assert_eq!(seen.get(), 2);
        assert_eq!(wire[0]["method"], json!(NOTIFY_METHOD));
        assert!(wire[0]["params"].get("playerId").is_none());
        assert_eq!(wire[1]["params"]["playerId"], json!(5));
        assert_eq!(wire[1]["params"]["scope"], json!("player"));
        assert!(wire.iter().all(|note| note.get("id").is_none()));
    }
}
