#![forbid(unsafe_code)]

use super::{ActionCtx, Cards, NewPlayer, Players, jump};
use tj_core::GameState;
use tj_core::ids::PlayerId;
use tj_storage::StoreError;

/// Seats the players and deals their hands outside the journal, then opens the first turn.
pub(crate) fn setup_game(
    ctx: &mut ActionCtx<'_, '_>,
    players: &[NewPlayer],
) -> Result<PlayerId, StoreError> {
    let current = ctx.states.current(ctx.tx)?;
    if current != GameState::GameSetup {
        return Err(StoreError::InvalidAction(format!(
            "game is already set up (state {current})"
        )));
    }

    ctx.tx.set_logging(false)?;
    let ids = Players::create(ctx.tx, players)?;
    let dealt = Cards::deal(ctx.tx, &ids, ctx.config.hand_size)?;
    ctx.tx.set_logging(ctx.config.logging)?;

    let first = ids
        .first()
        .copied()
        .ok_or(StoreError::InvalidInput("at least one player is required"))?;
    ctx.tx.gamestate().set_active_player(first)?;
    let first_player = Players::require(ctx.tx, first)?;
    ctx.bridge
        .message(ctx.tx, "${player_name} starts the game", Some(&first_player))?;

    ctx.tx.checkpoint(GameState::PlayerTurn.id())?;
    jump(ctx, GameState::PlayerTurn)?;
    tracing::info!(
        players = ids.len(),
        cards = dealt.len(),
        first = first.get(),
        logging = ctx.config.logging,
        "game set up"
    );
    Ok(first)
}
