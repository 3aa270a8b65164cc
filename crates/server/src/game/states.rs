#![forbid(unsafe_code)]

use super::{ActionCtx, confirm_undo, flow, player_turn};
use crate::GameConfig;
use crate::ops::ActionName;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tj_core::GameState;
use tj_storage::{GameTx, StoreError};

/// Runs when a state is entered. `Some(next)` chains straight into another state.
pub(crate) type EnterHook = fn(&mut ActionCtx<'_, '_>) -> Result<Option<GameState>, StoreError>;

/// Client-facing args of a state.
pub(crate) type ArgsHook = fn(&GameTx<'_>, &GameConfig) -> Result<Value, StoreError>;

const MAX_CHAINED_TRANSITIONS: usize = 16;

#[derive(Clone, Copy)]
pub(crate) struct StateHooks {
    pub(crate) state: GameState,
    pub(crate) actions: &'static [ActionName],
    pub(crate) on_enter: Option<EnterHook>,
    pub(crate) args: Option<ArgsHook>,
}

/// Dispatch table keyed by the closed state enumeration.
pub(crate) struct StateTable {
    hooks: BTreeMap<GameState, StateHooks>,
}

impl StateTable {
    pub(crate) fn standard() -> Self {
        Self::from_hooks([
            StateHooks {
                state: GameState::GameSetup,
                actions: &[],
                on_enter: None,
                args: None,
            },
            StateHooks {
                state: GameState::PlayerTurn,
                actions: &[
                    ActionName::PlayCard,
                    ActionName::Restart,
                    ActionName::UndoToStep,
                ],
                on_enter: None,
                args: Some(player_turn::args_player_turn),
            },
            StateHooks {
                state: GameState::ConfirmTurn,
                actions: &[
                    ActionName::ConfirmTurn,
                    ActionName::Restart,
                    ActionName::UndoToStep,
                ],
                on_enter: Some(confirm_undo::st_confirm_turn),
                args: Some(confirm_undo::args_confirm_turn),
            },
            StateHooks {
                state: GameState::ConfirmChoices,
                actions: &[],
                on_enter: Some(flow::st_confirm_choices),
                args: None,
            },
            StateHooks {
                state: GameState::EndGame,
                actions: &[],
                on_enter: Some(flow::st_end_game),
                args: Some(flow::args_end_game),
            },
        ])
    }

    pub(crate) fn from_hooks(hooks: impl IntoIterator<Item = StateHooks>) -> Self {
        Self {
            hooks: hooks.into_iter().map(|hook| (hook.state, hook)).collect(),
        }
    }

    /// Every state needs an entry; only player states may accept actions.
    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        for state in GameState::ALL {
            let hooks = self.hooks.get(&state).ok_or_else(|| {
                StoreError::Configuration(format!("state {state} has no dispatch entry"))
            })?;
            if state.is_player_state() && hooks.actions.is_empty() {
                return Err(StoreError::Configuration(format!(
                    "player state {state} accepts no action"
                )));
            }
            if !state.is_player_state() && !hooks.actions.is_empty() {
                return Err(StoreError::Configuration(format!(
                    "server state {state} must not accept actions"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn hooks(&self, state: GameState) -> Result<&StateHooks, StoreError> {
        self.hooks.get(&state).ok_or_else(|| {
            StoreError::Configuration(format!("state {state} has no dispatch entry"))
        })
    }

    pub(crate) fn current(&self, tx: &GameTx<'_>) -> Result<GameState, StoreError> {
        let state_id = tx.gamestate().get()?.state_id;
        GameState::from_id(state_id)
            .ok_or_else(|| StoreError::Configuration(format!("unknown state id {state_id}")))
    }

    pub(crate) fn args(
        &self,
        tx: &GameTx<'_>,
        config: &GameConfig,
        state: GameState,
    ) -> Result<Value, StoreError> {
        match self.hooks(state)?.args {
            Some(args) => args(tx, config),
            None => Ok(json!({})),
        }
    }
}

/// Enters `state` and follows chained enter hooks until a state settles.
pub(crate) fn jump(ctx: &mut ActionCtx<'_, '_>, state: GameState) -> Result<GameState, StoreError> {
    let mut next = state;
    for _ in 0..MAX_CHAINED_TRANSITIONS {
        ctx.tx.gamestate().set_state(next.id())?;
        tracing::info!(state = %next, "state entered");
        let hooks = *ctx.states.hooks(next)?;
        let Some(on_enter) = hooks.on_enter else {
            return Ok(next);
        };
        match on_enter(ctx)? {
            Some(follow) => next = follow,
            None => return Ok(next),
        }
    }
    Err(StoreError::Configuration(format!(
        "state transitions did not settle after {MAX_CHAINED_TRANSITIONS} hops"
    )))
}
