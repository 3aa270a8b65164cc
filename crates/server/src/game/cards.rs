#![forbid(unsafe_code)]

use serde_json::{Value, json};
use tj_core::ids::{PlayerId, RowId};
use tj_core::{Collection, SortOrder};
use tj_storage::{CmpOp, DbManager, GameTx, RowImage, StoreError, fields};

const COLORS: [&str; 4] = ["red", "blue", "green", "yellow"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BoardSide {
    Left,
    Right,
}

impl BoardSide {
    pub(crate) const ALL: [BoardSide; 2] = [BoardSide::Left, BoardSide::Right];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            BoardSide::Left => "left",
            BoardSide::Right => "right",
        }
    }

    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub(crate) fn location(self) -> &'static str {
        match self {
            BoardSide::Left => "board_left",
            BoardSide::Right => "board_right",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Card {
    pub(crate) id: i64,
    pub(crate) location: String,
    pub(crate) state: i64,
    pub(crate) color: String,
    pub(crate) value: i64,
}

impl Card {
    fn from_row(row: RowImage) -> Result<Self, StoreError> {
        let int = |column: &str| {
            row.get(column)
                .and_then(Value::as_i64)
                .ok_or(StoreError::InvalidInput("malformed card row"))
        };
        let text = |column: &str| {
            row.get(column)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(StoreError::InvalidInput("malformed card row"))
        };
        Ok(Self {
            id: int("card_id")?,
            location: text("card_location")?,
            state: int("card_state")?,
            color: text("card_color")?,
            value: int("card_value")?,
        })
    }

    pub(crate) fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "location": self.location,
            "state": self.state,
            "color": self.color,
            "value": self.value,
        })
    }
}

pub(crate) struct Cards;

impl DbManager for Cards {
    const TABLE: Option<&'static str> = Some("cards");
    const PRIMARY: &'static str = "card_id";
}

impl Cards {
    pub(crate) fn hand_location(player: PlayerId) -> String {
        format!("hand_{player}")
    }

    /// Deals `hand_size` cards to every player. Colors and values are a fixed cycle so a
    /// replayed setup deals the same hands.
    pub(crate) fn deal(
        tx: &GameTx<'_>,
        players: &[PlayerId],
        hand_size: usize,
    ) -> Result<Vec<RowId>, StoreError> {
        let mut rows = Vec::with_capacity(players.len() * hand_size);
        for (seat, player) in players.iter().enumerate() {
            for slot in 0..hand_size {
                let n = seat * hand_size + slot;
                rows.push(vec![
                    json!(Self::hand_location(*player)),
                    json!(slot),
                    json!(COLORS[n % COLORS.len()]),
                    json!((n * 7) % 9 + 1),
                ]);
            }
        }
        tx.db::<Cards>()?
            .multiple_insert(&["card_location", "card_state", "card_color", "card_value"])
            .values(rows)
    }

    pub(crate) fn get(tx: &GameTx<'_>, id: i64) -> Result<Option<Card>, StoreError> {
        tx.db::<Cards>()?.where_id(id).get_single_as(Card::from_row)
    }

    pub(crate) fn in_location(
        tx: &GameTx<'_>,
        location: &str,
    ) -> Result<Collection<Card>, StoreError> {
        tx.db::<Cards>()?
            .where_eq("card_location", location)
            .order_by("card_state", SortOrder::Asc)
            .order_by("card_id", SortOrder::Asc)
            .get_as(Card::from_row)
    }

    pub(crate) fn board(tx: &GameTx<'_>) -> Result<Collection<Card>, StoreError> {
        tx.db::<Cards>()?
            .where_in(
                "card_location",
                BoardSide::ALL.map(BoardSide::location),
            )
            .order_by("card_location", SortOrder::Asc)
            .order_by("card_state", SortOrder::Asc)
            .get_as(Card::from_row)
    }

    pub(crate) fn cards_in_hands(tx: &GameTx<'_>) -> Result<i64, StoreError> {
        tx.db::<Cards>()?
            .where_op("card_location", CmpOp::Like, "hand_%")
            .count()
    }

    /// Moves `card` to the end of `side` and returns the updated card.
    pub(crate) fn place_on_board(
        tx: &GameTx<'_>,
        card: &Card,
        side: BoardSide,
    ) -> Result<Card, StoreError> {
        let position = tx
            .db::<Cards>()?
            .where_eq("card_location", side.location())
            .count()?;
        let updated = tx.db::<Cards>()?.update_by_id(
            card.id,
            fields([
                ("card_location", json!(side.location())),
                ("card_state", json!(position)),
            ]),
        )?;
        if updated != 1 {
            return Err(StoreError::InvalidAction(format!("unknown card {}", card.id)));
        }
        Ok(Card {
            location: side.location().to_string(),
            state: position,
            ..card.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tj_storage::SqliteStore;

    fn player(id: i64) -> PlayerId {
        PlayerId::try_new(id).expect("player id")
    }

    #[test]
    fn deal_fills_every_hand() {
        let mut store = SqliteStore::open_in_memory().expect("open store");
        let tx = store.transaction().expect("tx");
        let ids = Cards::deal(&tx, &[player(1), player(2)], 3).expect("deal");
        assert_eq!(ids.len(), 6);
        assert_eq!(Cards::cards_in_hands(&tx).expect("count"), 6);

        let hand = Cards::in_location(&tx, &Cards::hand_location(player(2))).expect("hand");
        assert_eq!(hand.len(), 3);
        assert!(hand.values().all(|card| (1..=9).contains(&card.value)));
        assert_eq!(
            hand.values().map(|card| card.state).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn board_positions_grow_per_side() {
        let mut store = SqliteStore::open_in_memory().expect("open store");
        let tx = store.transaction().expect("tx");
        Cards::deal(&tx, &[player(1)], 3).expect("deal");
        let hand = Cards::in_location(&tx, &Cards::hand_location(player(1)))
            .expect("hand")
            .into_values();

        let first = Cards::place_on_board(&tx, &hand[0], BoardSide::Left).expect("place");
        let second = Cards::place_on_board(&tx, &hand[1], BoardSide::Left).expect("place");
        let third = Cards::place_on_board(&tx, &hand[2], BoardSide::Right).expect("place");
        assert_eq!((first.state, second.state, third.state), (0, 1, 0));
        assert_eq!(Cards::get(&tx, hand[1].id).expect("get"), Some(second));

        let board = Cards::board(&tx).expect("board");
        assert_eq!(board.len(), 3);
        assert_eq!(Cards::cards_in_hands(&tx).expect("count"), 0);
    }

    #[test]
    fn side_names_parse() {
        assert_eq!(BoardSide::parse(" left"), Some(BoardSide::Left));
        assert_eq!(BoardSide::parse("middle"), None);
        assert_eq!(BoardSide::Right.location(), "board_right");
    }
}
