#![forbid(unsafe_code)]

use tj_core::ids::PlayerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameStateRecord {
    pub state_id: i64,
    pub active_player: Option<PlayerId>,
    pub updated_at_ms: i64,
}
