#![forbid(unsafe_code)]

mod sql;

use super::super::StoreError;
use super::time::now_ms;
use rusqlite::{Connection, params};

pub(in crate::store) const SCHEMA_VERSION: &str = "tj1";

pub(in crate::store) fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(&sql::full_schema_sql())?;

    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", SCHEMA_VERSION],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["logging", "1"],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO gamestate(singleton, state_id, active_player_id, updated_at_ms) \
         VALUES (1, ?1, NULL, ?2)",
        params![tj_core::GameState::GameSetup.id(), now_ms()],
    )?;

    Ok(())
}
