#![forbid(unsafe_code)]

use crate::game::{ActionCtx, BroadcastHub, Bridge, NewPlayer, PlayersCache, StateTable};
use crate::ops::{ActionName, dispatch_action};
use crate::{
    GameConfig, JsonRpcRequest, ServerError, action_ok, ai_error_with, json_rpc_error,
    json_rpc_response, store_error_value,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tj_core::ids::PlayerId;
use tj_storage::{SqliteStore, StoreError};

/// Lines produced by one request: pushed notifications first, then the response (if any).
#[derive(Debug, Default)]
pub(crate) struct Reply {
    pub(crate) notifications: Vec<Value>,
    pub(crate) response: Option<Value>,
}

impl Reply {
    fn response(response: Value) -> Self {
        Self {
            notifications: Vec::new(),
            response: Some(response),
        }
    }
}

#[derive(Deserialize)]
struct SetupParams {
    players: Vec<NewPlayer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionParams {
    player_id: i64,
    action: String,
    #[serde(default)]
    args: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataParams {
    player_id: i64,
}

/// One game instance served over one connection.
pub(crate) struct GameServer {
    store: SqliteStore,
    config: GameConfig,
    states: StateTable,
    hub: BroadcastHub,
    players: PlayersCache,
}

impl GameServer {
    pub(crate) fn new(mut store: SqliteStore, config: GameConfig) -> Result<Self, ServerError> {
        let states = StateTable::standard();
        states.validate()?;

        let tx = store.transaction()?;
        let state = states.current(&tx)?;
        if state != tj_core::GameState::GameSetup {
            tx.set_logging(config.logging)?;
        }
        tx.commit()?;

        let players = PlayersCache::default();
        let mut hub = BroadcastHub::default();
        hub.register(Box::new(players.clone()));

        Ok(Self {
            store,
            config,
            states,
            hub,
            players,
        })
    }

    pub(crate) fn handle(&mut self, request: JsonRpcRequest) -> Reply {
        let JsonRpcRequest {
            method, id, params, ..
        } = request;

        match method.as_str() {
            "initialize" => Reply::response(json_rpc_response(
                id,
                json!({
                    "serverInfo": { "name": crate::SERVER_NAME, "version": crate::SERVER_VERSION },
                    "methods": ["ping", "game/setup", "game/action", "game/data"],
                    "actions": ActionName::ALL.map(ActionName::as_str),
                }),
            )),
            "ping" => Reply::response(json_rpc_response(id, json!({}))),
            "game/setup" => {
                let (result, notifications) = self.game_setup(params);
                reply_with(id, result, notifications)
            }
            "game/action" => {
                let (result, notifications) = self.game_action(params);
                reply_with(id, result, notifications)
            }
            "game/data" => Reply::response(json_rpc_response(id, self.game_data(params))),
            _ if id.is_none() => Reply::default(),
            _ => Reply::response(json_rpc_error(id, -32601, &format!("Method not found: {method}"))),
        }
    }

    /// Runs `body` in one transaction. Queued envelopes are delivered only after the commit.
    fn run_action<T>(
        &mut self,
        body: impl FnOnce(&mut ActionCtx<'_, '_>) -> Result<T, StoreError>,
    ) -> Result<(T, Vec<Value>), StoreError> {
        let tx = self.store.transaction()?;
        let mut ctx = ActionCtx {
            tx: &tx,
            config: &self.config,
            states: &self.states,
            bridge: Bridge::default(),
        };
        let value = body(&mut ctx)?;
        let ActionCtx { bridge, .. } = ctx;
        let pending = bridge.into_pending();
        tx.commit()?;
        Ok((value, self.hub.flush(pending)))
    }

    fn game_setup(&mut self, params: Option<Value>) -> (Value, Vec<Value>) {
        let params: SetupParams = match parse_params(params) {
            Ok(params) => params,
            Err(error) => return (error, Vec::new()),
        };
        let outcome = self.run_action(|ctx| crate::game::setup_game(ctx, &params.players));
        match outcome {
            Ok((first, notifications)) => match self.read_data(first) {
                Ok(data) => (data, notifications),
                Err(err) => (store_error_value(&err), notifications),
            },
            Err(err) => {
                log_rejected("game/setup", &err);
                (store_error_value(&err), Vec::new())
            }
        }
    }

    fn game_action(&mut self, params: Option<Value>) -> (Value, Vec<Value>) {
        let params: ActionParams = match parse_params(params) {
            Ok(params) => params,
            Err(error) => return (error, Vec::new()),
        };
        let Ok(player) = PlayerId::try_new(params.player_id) else {
            return (
                ai_error_with("INVALID_INPUT", "playerId must be positive", None),
                Vec::new(),
            );
        };
        let Some(action) = ActionName::from_str(&params.action) else {
            return (
                ai_error_with(
                    "INVALID_ACTION",
                    &format!("Unknown action: {}", params.action),
                    Some("use one of the actions listed by initialize"),
                ),
                Vec::new(),
            );
        };

        let args = params.args;
        match self.run_action(|ctx| dispatch_action(ctx, player, action, &args)) {
            Ok((state, notifications)) => {
                tracing::info!(
                    action = action.as_str(),
                    player_id = player.get(),
                    state = %state,
                    notifications = notifications.len(),
                    "action applied"
                );
                (action_ok(state), notifications)
            }
            Err(err) => {
                log_rejected(action.as_str(), &err);
                (store_error_value(&err), Vec::new())
            }
        }
    }

    fn game_data(&mut self, params: Option<Value>) -> Value {
        let params: DataParams = match parse_params(params) {
            Ok(params) => params,
            Err(error) => return error,
        };
        let Ok(viewer) = PlayerId::try_new(params.player_id) else {
            return ai_error_with("INVALID_INPUT", "playerId must be positive", None);
        };
        self.read_data(viewer)
            .unwrap_or_else(|err| store_error_value(&err))
    }

    /// Reads committed state; the transaction is dropped without writes.
    fn read_data(&mut self, viewer: PlayerId) -> Result<Value, StoreError> {
        let tx = self.store.transaction()?;
        crate::game::game_data(&tx, &self.states, &self.config, &self.players, viewer)
    }
}

fn reply_with(id: Option<Value>, result: Value, notifications: Vec<Value>) -> Reply {
    Reply {
        notifications,
        response: Some(json_rpc_response(id, result)),
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, Value> {
    serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|err| {
        ai_error_with(
            "INVALID_INPUT",
            &format!("Invalid params: {err}"),
            Some("check the request params"),
        )
    })
}

fn log_rejected(action: &str, err: &StoreError) {
    match err {
        StoreError::InvariantViolation { .. } | StoreError::Configuration(_) => {
            tracing::error!(action, code = err.code(), error = %err, "action aborted");
        }
        _ => tracing::warn!(action, code = err.code(), error = %err, "action rejected"),
    }
}
