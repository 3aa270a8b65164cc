#![forbid(unsafe_code)]

mod bridge;
mod cards;
mod confirm_undo;
mod data;
mod flow;
mod player_turn;
mod players;
mod setup;
mod states;

pub(crate) use bridge::{BroadcastHub, BroadcastObserver, Bridge};
pub(crate) use cards::{BoardSide, Card, Cards};
pub(crate) use confirm_undo::{act_confirm_turn, act_restart, act_undo_to_step};
pub(crate) use data::{game_data, refresh_snapshot};
pub(crate) use player_turn::act_play_card;
pub(crate) use players::{NewPlayer, Player, Players, PlayersCache};
pub(crate) use setup::setup_game;
pub(crate) use states::{StateTable, jump};

use crate::GameConfig;
use tj_storage::GameTx;

/// Turn State key set once a card has been placed in the current turn.
pub(crate) const CARD_PLACED_KEY: &str = "cardPlaced";

/// Everything one action may touch. Lives exactly as long as the action's transaction.
pub(crate) struct ActionCtx<'a, 's> {
    pub(crate) tx: &'a GameTx<'s>,
    pub(crate) config: &'a GameConfig,
    pub(crate) states: &'a StateTable,
    pub(crate) bridge: Bridge,
}
