#![forbid(unsafe_code)]

use super::confirm_undo::{add_step, args_confirm_turn};
use super::{ActionCtx, BoardSide, CARD_PLACED_KEY, Cards, Player, Players, jump};
use crate::GameConfig;
use serde_json::Value;
use tj_core::GameState;
use tj_storage::{GameTx, StoreError};

pub(crate) fn args_player_turn(tx: &GameTx<'_>, config: &GameConfig) -> Result<Value, StoreError> {
    let mut args = args_confirm_turn(tx, config)?;
    if let Value::Object(obj) = &mut args {
        obj.insert(
            "cardsPerTurn".to_string(),
            Value::from(config.cards_per_turn),
        );
        obj.insert(
            "cardPlaced".to_string(),
            Value::Bool(tx.turn_state().get_bool(CARD_PLACED_KEY, false)?),
        );
    }
    Ok(args)
}

/// `actPlayCard {cardId, side}`: one card from the hand to one side of the board, one step.
pub(crate) fn act_play_card(
    ctx: &mut ActionCtx<'_, '_>,
    player: &Player,
    args: &Value,
) -> Result<(), StoreError> {
    let card_id = args
        .get("cardId")
        .and_then(Value::as_i64)
        .ok_or(StoreError::InvalidInput("cardId must be an integer"))?;
    let side = args
        .get("side")
        .and_then(Value::as_str)
        .and_then(BoardSide::parse)
        .ok_or(StoreError::InvalidInput("side must be left or right"))?;

    let hand = Cards::hand_location(player.id);
    let card = Cards::get(ctx.tx, card_id)?
        .ok_or_else(|| StoreError::InvalidAction(format!("unknown card {card_id}")))?;
    if card.location != hand {
        return Err(StoreError::InvalidAction(format!(
            "card {card_id} is not in your hand"
        )));
    }

    add_step(ctx, player)?;
    let placed = Cards::place_on_board(ctx.tx, &card, side)?;
    Players::inc_score(ctx.tx, player.id, card.value)?;
    ctx.tx.turn_state().set_bool(CARD_PLACED_KEY, true)?;
    ctx.bridge.card_placed(ctx.tx, player, &placed, side)?;

    let played = ctx.tx.turn_state().choices()?;
    let quota = i64::try_from(ctx.config.cards_per_turn).unwrap_or(i64::MAX);
    let hand_empty = Cards::in_location(ctx.tx, &hand)?.is_empty();
    tracing::debug!(card_id, side = side.as_str(), played, quota, "card played");
    if played >= quota || hand_empty {
        jump(ctx, GameState::ConfirmTurn)?;
    }
    Ok(())
}
