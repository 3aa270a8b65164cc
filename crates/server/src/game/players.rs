#![forbid(unsafe_code)]

use super::BroadcastObserver;
use serde::Deserialize;
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use tj_core::ids::{PlayerId, RowId};
use tj_core::{Collection, SortOrder};
use tj_storage::{DbManager, GameTx, NotificationRow, RowImage, StoreError, fields};

const PALETTE: [&str; 8] = [
    "ff0000", "008000", "0000ff", "ffa500", "000000", "e94190", "982fff", "72c3b1",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Player {
    pub(crate) id: PlayerId,
    pub(crate) name: String,
    pub(crate) color: String,
    pub(crate) no: i64,
    pub(crate) score: i64,
}

impl Player {
    fn from_row(row: RowImage) -> Result<Self, StoreError> {
        let id = row
            .get("player_id")
            .and_then(Value::as_i64)
            .and_then(|id| PlayerId::try_new(id).ok())
            .ok_or(StoreError::InvalidInput("player row without a valid id"))?;
        let text = |column: &str| {
            row.get(column)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(StoreError::InvalidInput("player row without name or color"))
        };
        Ok(Self {
            id,
            name: text("player_name")?,
            color: text("player_color")?,
            no: row.get("player_no").and_then(Value::as_i64).unwrap_or(0),
            score: row.get("player_score").and_then(Value::as_i64).unwrap_or(0),
        })
    }

    pub(crate) fn to_json(&self) -> Value {
        json!({
            "id": self.id.get(),
            "name": self.name,
            "color": self.color,
            "no": self.no,
            "score": self.score,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct NewPlayer {
    pub(crate) id: i64,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) color: Option<String>,
}

pub(crate) struct Players;

impl DbManager for Players {
    const TABLE: Option<&'static str> = Some("player");
    const PRIMARY: &'static str = "player_id";
}

impl Players {
    /// Inserts the seating in request order. `player_no` starts at 1.
    pub(crate) fn create(
        tx: &GameTx<'_>,
        players: &[NewPlayer],
    ) -> Result<Vec<PlayerId>, StoreError> {
        if players.is_empty() {
            return Err(StoreError::InvalidInput("at least one player is required"));
        }
        if players.len() > PALETTE.len() {
            return Err(StoreError::InvalidInput("too many players"));
        }

        let mut seen = BTreeSet::new();
        let mut ids = Vec::with_capacity(players.len());
        let mut rows = Vec::with_capacity(players.len());
        for (index, player) in players.iter().enumerate() {
            let id = PlayerId::try_new(player.id)
                .map_err(|_| StoreError::InvalidInput("player id must be positive"))?;
            if !seen.insert(id) {
                return Err(StoreError::InvalidInput("duplicate player id"));
            }
            let name = player.name.trim();
            if name.is_empty() {
                return Err(StoreError::InvalidInput("player name must not be empty"));
            }
            let color = player
                .color
                .as_deref()
                .map(str::trim)
                .filter(|color| !color.is_empty())
                .unwrap_or(PALETTE[index]);
            rows.push(vec![
                json!(id.get()),
                json!(name),
                json!(color),
                json!(index + 1),
            ]);
            ids.push(id);
        }

        tx.db::<Players>()?
            .multiple_insert(&["player_id", "player_name", "player_color", "player_no"])
            .values(rows)?;
        Ok(ids)
    }

    /// Every player in seating order.
    pub(crate) fn all(tx: &GameTx<'_>) -> Result<Collection<Player>, StoreError> {
        tx.db::<Players>()?
            .order_by("player_no", SortOrder::Asc)
            .get_as(Player::from_row)
    }

    pub(crate) fn get(tx: &GameTx<'_>, id: PlayerId) -> Result<Option<Player>, StoreError> {
        tx.db::<Players>()?
            .where_id(id)
            .get_single_as(Player::from_row)
    }

    pub(crate) fn require(tx: &GameTx<'_>, id: PlayerId) -> Result<Player, StoreError> {
        Self::get(tx, id)?.ok_or_else(|| StoreError::InvalidAction(format!("unknown player {id}")))
    }

    pub(crate) fn inc_score(tx: &GameTx<'_>, id: PlayerId, by: i64) -> Result<(), StoreError> {
        let updated = tx
            .db::<Players>()?
            .inc_by_id(id, fields([("player_score", json!(by))]))?;
        if updated != 1 {
            return Err(StoreError::InvalidAction(format!("unknown player {id}")));
        }
        Ok(())
    }

    /// First player after `current` in seating order, wrapping around, that `eligible` accepts.
    pub(crate) fn next_after(
        players: &Collection<Player>,
        current: PlayerId,
        eligible: impl Fn(&Player) -> bool,
    ) -> Option<Player> {
        let seating = players.values().collect::<Vec<_>>();
        let start = seating
            .iter()
            .position(|player| player.id == current)
            .map(|index| index + 1)
            .unwrap_or(0);
        (0..seating.len())
            .map(|offset| seating[(start + offset) % seating.len()])
            .find(|player| eligible(player))
            .cloned()
    }
}

/// Committed player rows, shared between readers and the broadcast observer that drops them.
#[derive(Clone, Default)]
pub(crate) struct PlayersCache {
    slot: Rc<RefCell<Option<Collection<Player>>>>,
}

impl PlayersCache {
    pub(crate) fn get_or_load(&self, tx: &GameTx<'_>) -> Result<Collection<Player>, StoreError> {
        if let Some(cached) = self.slot.borrow().as_ref() {
            return Ok(cached.clone());
        }
        let loaded = Players::all(tx)?;
        *self.slot.borrow_mut() = Some(loaded.clone());
        Ok(loaded)
    }

    pub(crate) fn invalidate(&self) {
        self.slot.borrow_mut().take();
    }

    #[cfg(test)]
    pub(crate) fn is_loaded(&self) -> bool {
        self.slot.borrow().is_some()
    }

    pub(crate) fn contains(players: &Collection<Player>, id: PlayerId) -> bool {
        players.contains(&RowId::from(id))
    }
}

impl BroadcastObserver for PlayersCache {
    fn on_broadcast(&self, _notification: &NotificationRow) {
        self.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tj_storage::SqliteStore;

    fn seat(tx: &GameTx<'_>) -> Vec<PlayerId> {
        Players::create(
            tx,
            &[
                NewPlayer { id: 11, name: "Ada".to_string(), color: None },
                NewPlayer { id: 7, name: " Bo ".to_string(), color: Some("123456".to_string()) },
                NewPlayer { id: 30, name: "Cy".to_string(), color: None },
            ],
        )
        .expect("create players")
    }

    #[test]
    fn seating_follows_request_order() {
        let mut store = SqliteStore::open_in_memory().expect("open store");
        let tx = store.transaction().expect("tx");
        let ids = seat(&tx);
        assert_eq!(ids.iter().map(|id| id.get()).collect::<Vec<_>>(), vec![11, 7, 30]);

        let players = Players::all(&tx).expect("players");
        let names = players.values().map(|p| p.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Ada", "Bo", "Cy"]);
        let bo = players.get(&RowId::from(7)).expect("bo");
        assert_eq!((bo.no, bo.color.as_str()), (2, "123456"));
    }

    #[test]
    fn next_after_wraps_and_skips_ineligible() {
        let mut store = SqliteStore::open_in_memory().expect("open store");
        let tx = store.transaction().expect("tx");
        let ids = seat(&tx);
        let players = Players::all(&tx).expect("players");

        let next = Players::next_after(&players, ids[2], |_| true).expect("next");
        assert_eq!(next.id, ids[0]);
        let next = Players::next_after(&players, ids[0], |p| p.id != ids[1]).expect("next");
        assert_eq!(next.id, ids[2]);
        assert!(Players::next_after(&players, ids[0], |_| false).is_none());
    }

    #[test]
    fn invalid_seating_is_rejected() {
        let mut store = SqliteStore::open_in_memory().expect("open store");
        let tx = store.transaction().expect("tx");
        let duplicate = [
            NewPlayer { id: 1, name: "A".to_string(), color: None },
            NewPlayer { id: 1, name: "B".to_string(), color: None },
        ];
        assert!(matches!(
            Players::create(&tx, &duplicate),
            Err(StoreError::InvalidInput("duplicate player id"))
        ));
        assert!(matches!(
            Players::create(&tx, &[]),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn cache_reloads_after_a_broadcast() {
        let mut store = SqliteStore::open_in_memory().expect("open store");
        let tx = store.transaction().expect("tx");
        let ids = seat(&tx);
        let cache = PlayersCache::default();

        let before = cache.get_or_load(&tx).expect("load");
        Players::inc_score(&tx, ids[0], 4).expect("score");
        let stale = cache.get_or_load(&tx).expect("cached");
        assert_eq!(stale, before);

        let observer: Box<dyn BroadcastObserver> = Box::new(cache.clone());
        let note = tx
            .outbox()
            .push(tj_storage::NewNotification {
                scope: tj_core::model::NotifyScope::All,
                name: "message",
                message: "",
                args: json!({}),
                cancelable: true,
            })
            .expect("push");
        observer.on_broadcast(&note);
        assert!(!cache.is_loaded());
        let fresh = cache.get_or_load(&tx).expect("reload");
        assert_eq!(fresh.get(&RowId::from(ids[0])).map(|p| p.score), Some(4));
    }
}
