#![forbid(unsafe_code)]

use super::confirm_undo::undo_targets;
use super::{Card, Cards, Player, Players, PlayersCache, StateTable};
use crate::GameConfig;
use crate::support::state_json;
use serde_json::{Value, json};
use tj_core::Collection;
use tj_core::ids::PlayerId;
use tj_storage::{GameTx, StoreError};

/// Public part of the game: scores, board and hand sizes. Hands themselves never appear here.
pub(crate) fn refresh_snapshot(tx: &GameTx<'_>) -> Result<Value, StoreError> {
    let players = Players::all(tx)?;
    public_snapshot(tx, &players)
}

fn public_snapshot(tx: &GameTx<'_>, players: &Collection<Player>) -> Result<Value, StoreError> {
    let mut hand_counts = serde_json::Map::new();
    for player in players.values() {
        let held = Cards::in_location(tx, &Cards::hand_location(player.id))?.len();
        hand_counts.insert(player.id.to_string(), json!(held));
    }
    let board = Cards::board(tx)?
        .into_values()
        .iter()
        .map(Card::to_json)
        .collect::<Vec<_>>();
    Ok(json!({
        "players": players.values().map(Player::to_json).collect::<Vec<_>>(),
        "board": board,
        "handCounts": hand_counts,
    }))
}

/// Everything `viewer` may see, including what a reloading client needs to strike
/// canceled lines and draw undo controls.
pub(crate) fn game_data(
    tx: &GameTx<'_>,
    states: &StateTable,
    config: &GameConfig,
    cache: &PlayersCache,
    viewer: PlayerId,
) -> Result<Value, StoreError> {
    let players = cache.get_or_load(tx)?;
    if !PlayersCache::contains(&players, viewer) {
        return Err(StoreError::InvalidAction(format!("unknown player {viewer}")));
    }

    let mut data = public_snapshot(tx, &players)?;
    let state = states.current(tx)?;
    let mut state_value = state_json(state);
    state_value["args"] = states.args(tx, config, state)?;
    let hand = Cards::in_location(tx, &Cards::hand_location(viewer))?
        .into_values()
        .iter()
        .map(Card::to_json)
        .collect::<Vec<_>>();
    let steps = undo_targets(tx, config)?;

    if let Value::Object(obj) = &mut data {
        obj.insert("hand".to_string(), Value::Array(hand));
        obj.insert("state".to_string(), state_value);
        obj.insert(
            "activePlayer".to_string(),
            json!(tx.gamestate().get()?.active_player.map(PlayerId::get)),
        );
        obj.insert(
            "canceledNotifIds".to_string(),
            json!(tx.outbox().canceled_uids()?),
        );
        obj.insert("previousSteps".to_string(), json!(steps));
        obj.insert(
            "previousChoices".to_string(),
            json!(tx.turn_state().choices()?),
        );
    }
    Ok(data)
}
