#![forbid(unsafe_code)]

use super::{ActionCtx, CARD_PLACED_KEY, Cards, Players};
use crate::GameConfig;
use serde_json::{Value, json};
use tj_core::GameState;
use tj_core::ids::RowId;
use tj_storage::{GameTx, StoreError};

/// Closes the confirmed turn: activates the next player holding cards and opens a new turn,
/// or ends the game once every hand is empty.
pub(crate) fn st_confirm_choices(
    ctx: &mut ActionCtx<'_, '_>,
) -> Result<Option<GameState>, StoreError> {
    let active = ctx
        .tx
        .gamestate()
        .get()?
        .active_player
        .ok_or_else(|| StoreError::Configuration("no active player".to_string()))?;
    let players = Players::all(ctx.tx)?;
    let current = players.get(&RowId::from(active)).cloned();
    ctx.bridge
        .message(ctx.tx, "${player_name} confirms their turn", current.as_ref())?;

    if Cards::cards_in_hands(ctx.tx)? == 0 {
        return Ok(Some(GameState::EndGame));
    }

    let mut holding = Vec::new();
    for player in players.values() {
        if !Cards::in_location(ctx.tx, &Cards::hand_location(player.id))?.is_empty() {
            holding.push(player.id);
        }
    }
    let next = Players::next_after(&players, active, |player| holding.contains(&player.id))
        .ok_or_else(|| StoreError::Configuration("no player holds cards".to_string()))?;

    ctx.tx.gamestate().set_active_player(next.id)?;
    ctx.tx.checkpoint(GameState::PlayerTurn.id())?;
    ctx.tx.turn_state().set_bool(CARD_PLACED_KEY, false)?;
    ctx.bridge
        .message(ctx.tx, "${player_name} takes the turn", Some(&next))?;
    ctx.bridge.message_to(ctx.tx, &next, "Your turn")?;
    tracing::info!(player_id = next.id.get(), "turn started");
    Ok(Some(GameState::PlayerTurn))
}

pub(crate) fn st_end_game(ctx: &mut ActionCtx<'_, '_>) -> Result<Option<GameState>, StoreError> {
    ctx.tx.checkpoint(GameState::EndGame.id())?;
    ctx.bridge.message(ctx.tx, "The game is over", None)?;
    tracing::info!("game ended");
    Ok(None)
}

pub(crate) fn args_end_game(tx: &GameTx<'_>, _config: &GameConfig) -> Result<Value, StoreError> {
    let players = Players::all(tx)?;
    let best = players.reduce(None, |best: Option<i64>, player| {
        Some(best.map_or(player.score, |best| best.max(player.score)))
    });
    let winners = players
        .filter(|player| Some(player.score) == best)
        .into_values()
        .into_iter()
        .map(|player| player.id.get())
        .collect::<Vec<_>>();
    Ok(json!({ "winners": winners, "bestScore": best }))
}
