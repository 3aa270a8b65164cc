#![forbid(unsafe_code)]

use super::{StoreError, TableSpec, fields, table_tx};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Number of live steps since the latest checkpoint. Written only by the journal.
pub const CHOICE_COUNT_KEY: &str = "choiceCount";

const TABLE: &str = "turn_globals";

/// Persisted per-game globals that survive between actions.
///
/// Game keys are written through the journaled builder, so a revert restores them together
/// with the rest of the step. `choiceCount` is recomputed by the journal and never journaled.
pub struct TurnState<'c> {
    conn: &'c Connection,
}

impl<'c> TurnState<'c> {
    pub(in crate::store) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn choices(&self) -> Result<i64, StoreError> {
        Ok(read_tx::<i64>(self.conn, CHOICE_COUNT_KEY)?.unwrap_or(0))
    }

    pub fn get_i64(&self, key: &str, default: i64) -> Result<i64, StoreError> {
        Ok(read_tx::<i64>(self.conn, key)?.unwrap_or(default))
    }

    pub fn set_i64(&self, key: &str, value: i64) -> Result<(), StoreError> {
        guard_key(key)?;
        write_logged_tx(self.conn, key, &value)
    }

    pub fn inc_i64(&self, key: &str, by: i64) -> Result<i64, StoreError> {
        guard_key(key)?;
        let next = self.get_i64(key, 0)? + by;
        write_logged_tx(self.conn, key, &next)?;
        Ok(next)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, StoreError> {
        Ok(read_tx::<bool>(self.conn, key)?.unwrap_or(default))
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        guard_key(key)?;
        write_logged_tx(self.conn, key, &value)
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        read_tx(self.conn, key)
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        guard_key(key)?;
        write_logged_tx(self.conn, key, value)
    }
}

fn guard_key(key: &str) -> Result<(), StoreError> {
    if key.trim().is_empty() {
        return Err(StoreError::InvalidInput("turn state key must not be empty"));
    }
    if key == CHOICE_COUNT_KEY {
        return Err(StoreError::InvalidInput("choiceCount is owned by the journal"));
    }
    Ok(())
}

fn read_tx<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>, StoreError> {
    let raw = conn
        .query_row(
            "SELECT value FROM turn_globals WHERE key=?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

fn write_tx<T: Serialize + ?Sized>(conn: &Connection, key: &str, value: &T) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO turn_globals(key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, raw],
    )?;
    Ok(())
}

fn write_logged_tx<T: Serialize + ?Sized>(
    conn: &Connection,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    let builder = table_tx(conn, &TableSpec::try_new(TABLE, "key")?)?;
    if read_tx::<serde_json::Value>(conn, key)?.is_some() {
        builder.update_by_id(key, fields([("value", raw)]))?;
    } else {
        builder.insert(fields([("key", key.to_string()), ("value", raw)]))?;
    }
    Ok(())
}

pub(in crate::store) fn set_choices_tx(conn: &Connection, value: i64) -> Result<(), StoreError> {
    write_tx(conn, CHOICE_COUNT_KEY, &value)
}

pub(in crate::store) fn inc_choices_tx(conn: &Connection) -> Result<i64, StoreError> {
    let next = read_tx::<i64>(conn, CHOICE_COUNT_KEY)?.unwrap_or(0) + 1;
    write_tx(conn, CHOICE_COUNT_KEY, &next)?;
    Ok(next)
}
