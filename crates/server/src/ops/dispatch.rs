#![forbid(unsafe_code)]

use super::ActionName;
use crate::game::{ActionCtx, Players};
use serde_json::Value;
use tj_core::GameState;
use tj_core::ids::PlayerId;
use tj_storage::StoreError;

/// Checks that `action` is allowed for `player_id` right now, runs it and returns the state
/// the game settled in.
pub(crate) fn dispatch_action(
    ctx: &mut ActionCtx<'_, '_>,
    player_id: PlayerId,
    action: ActionName,
    args: &Value,
) -> Result<GameState, StoreError> {
    let state = ctx.states.current(ctx.tx)?;
    let hooks = *ctx.states.hooks(state)?;
    if !hooks.actions.contains(&action) {
        return Err(StoreError::InvalidAction(format!(
            "{action} is not allowed in state {state}"
        )));
    }
    let active = ctx.tx.gamestate().get()?.active_player;
    if active != Some(player_id) {
        return Err(StoreError::InvalidAction(format!(
            "player {player_id} is not the active player"
        )));
    }

    let player = Players::require(ctx.tx, player_id)?;
    (action.handler())(ctx, &player, args)?;
    ctx.states.current(ctx.tx)
}
