#![forbid(unsafe_code)]

use super::super::StoreError;
use rusqlite::{Connection, OptionalExtension, params};

pub(in crate::store) fn meta_get_tx(
    conn: &Connection,
    key: &str,
) -> Result<Option<String>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT value FROM meta WHERE key=?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()?)
}

pub(in crate::store) fn meta_set_tx(
    conn: &Connection,
    key: &str,
    value: &str,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO meta(key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub(in crate::store) fn meta_delete_tx(conn: &Connection, key: &str) -> Result<(), StoreError> {
    conn.execute("DELETE FROM meta WHERE key=?1", params![key])?;
    Ok(())
}
