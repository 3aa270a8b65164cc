#![forbid(unsafe_code)]

use super::support::now_ms;
use super::{GameStateRecord, StoreError};
use rusqlite::{Connection, params};
use tj_core::ids::PlayerId;

/// Current state id and active player of the game instance.
pub struct GameStateStore<'c> {
    conn: &'c Connection,
}

impl<'c> GameStateStore<'c> {
    pub(in crate::store) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self) -> Result<GameStateRecord, StoreError> {
        let (state_id, active_player, updated_at_ms) = self.conn.query_row(
            "SELECT state_id, active_player_id, updated_at_ms FROM gamestate WHERE singleton=1",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )?;
        let active_player = active_player
            .map(PlayerId::try_new)
            .transpose()
            .map_err(|_| StoreError::InvalidInput("invalid active player id"))?;
        Ok(GameStateRecord {
            state_id,
            active_player,
            updated_at_ms,
        })
    }

    pub fn set_state(&self, state_id: i64) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE gamestate SET state_id=?1, updated_at_ms=?2 WHERE singleton=1",
            params![state_id, now_ms()],
        )?;
        Ok(())
    }

    pub fn set_active_player(&self, player: PlayerId) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE gamestate SET active_player_id=?1, updated_at_ms=?2 WHERE singleton=1",
            params![player.get(), now_ms()],
        )?;
        Ok(())
    }
}
