#![forbid(unsafe_code)]

use super::{ActionCtx, Player, jump, refresh_snapshot};
use crate::GameConfig;
use serde_json::{Value, json};
use tj_core::GameState;
use tj_core::ids::StepId;
use tj_core::model::ConfirmMode;
use tj_storage::{GameTx, RevertOutcome, StoreError};

/// Opens an undoable step in the current state and announces it to `player`.
pub(crate) fn add_step(ctx: &mut ActionCtx<'_, '_>, player: &Player) -> Result<StepId, StoreError> {
    let state = ctx.states.current(ctx.tx)?;
    let step = ctx.tx.step(state.id())?;
    ctx.bridge.new_undoable_step(ctx.tx, player, step)?;
    Ok(step)
}

/// Step ids the client may undo to. Empty while the journal is off.
pub(crate) fn undo_targets(tx: &GameTx<'_>, config: &GameConfig) -> Result<Vec<i64>, StoreError> {
    if !config.logging {
        return Ok(Vec::new());
    }
    Ok(tx
        .undoable_steps()?
        .into_iter()
        .map(StepId::get)
        .collect())
}

fn require_journal(config: &GameConfig) -> Result<(), StoreError> {
    if config.logging {
        return Ok(());
    }
    Err(StoreError::InvalidAction(
        "undo is unavailable while journal logging is off".to_string(),
    ))
}

pub(crate) fn args_confirm_turn(tx: &GameTx<'_>, config: &GameConfig) -> Result<Value, StoreError> {
    Ok(json!({
        "previousSteps": undo_targets(tx, config)?,
        "previousChoices": tx.turn_state().choices()?,
    }))
}

pub(crate) fn st_confirm_turn(ctx: &mut ActionCtx<'_, '_>) -> Result<Option<GameState>, StoreError> {
    let choices = ctx.tx.turn_state().choices()?;
    if choices == 0 || ctx.config.confirm == ConfirmMode::Disabled {
        tracing::info!(choices, confirm = ctx.config.confirm.as_str(), "turn confirmed automatically");
        return Ok(Some(GameState::ConfirmChoices));
    }
    Ok(None)
}

pub(crate) fn act_confirm_turn(
    ctx: &mut ActionCtx<'_, '_>,
    _player: &Player,
    _args: &Value,
) -> Result<(), StoreError> {
    jump(ctx, GameState::ConfirmChoices)?;
    Ok(())
}

pub(crate) fn act_restart(
    ctx: &mut ActionCtx<'_, '_>,
    player: &Player,
    _args: &Value,
) -> Result<(), StoreError> {
    require_journal(ctx.config)?;
    if ctx.tx.turn_state().choices()? == 0 {
        return Err(StoreError::InvalidAction("nothing to restart".to_string()));
    }
    let outcome = ctx.tx.revert_all()?;
    after_revert(ctx, player, outcome, "${player_name} restarts their turn")
}

pub(crate) fn act_undo_to_step(
    ctx: &mut ActionCtx<'_, '_>,
    player: &Player,
    args: &Value,
) -> Result<(), StoreError> {
    require_journal(ctx.config)?;
    let step_id = args
        .get("stepId")
        .and_then(Value::as_i64)
        .ok_or(StoreError::InvalidInput("stepId must be an integer"))?;
    let outcome = ctx.tx.undo_to_step(StepId::new(step_id))?;
    after_revert(ctx, player, outcome, "${player_name} undoes part of their turn")
}

fn after_revert(
    ctx: &mut ActionCtx<'_, '_>,
    player: &Player,
    outcome: RevertOutcome,
    message: &str,
) -> Result<(), StoreError> {
    ctx.bridge
        .clear_turn(ctx.tx, player, message, &outcome.canceled_notif_ids)?;
    let datas = refresh_snapshot(ctx.tx)?;
    ctx.bridge.refresh_ui(ctx.tx, datas)?;

    let resume = outcome
        .resume_state
        .and_then(GameState::from_id)
        .unwrap_or(GameState::PlayerTurn);
    jump(ctx, resume)?;
    Ok(())
}
