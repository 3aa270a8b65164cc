#![forbid(unsafe_code)]

mod error;
mod gamestate;
mod journal;
mod notifications;
mod query;
mod support;
mod turn_state;
mod types;

pub use error::StoreError;
pub use gamestate::GameStateStore;
pub use journal::TableJournal;
pub use notifications::Outbox;
pub use query::{CmpOp, DbManager, Fields, MultipleInsert, MutationBuilder, TableSpec, fields};
pub use turn_state::{CHOICE_COUNT_KEY, TurnState};
pub use types::*;

use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DB_FILE: &str = "turnjournal.db";

/// One game instance backed by one SQLite database.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: Option<PathBuf>,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let conn = Connection::open(storage_dir.join(DB_FILE))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        support::install_schema(&conn)?;

        Ok(Self {
            conn,
            storage_dir: Some(storage_dir),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        support::install_schema(&conn)?;
        Ok(Self {
            conn,
            storage_dir: None,
        })
    }

    pub fn storage_dir(&self) -> Option<&Path> {
        self.storage_dir.as_deref()
    }

    /// Starts the transaction of one action. Dropping it without `commit` rolls back.
    pub fn transaction(&mut self) -> Result<GameTx<'_>, StoreError> {
        Ok(GameTx {
            tx: self.conn.transaction()?,
        })
    }
}

pub struct GameTx<'s> {
    tx: Transaction<'s>,
}

impl GameTx<'_> {
    pub(in crate::store) fn conn(&self) -> &Connection {
        &self.tx
    }

    /// Builder for `table`, journaled while logging is enabled.
    pub fn table(&self, table: &TableSpec) -> Result<MutationBuilder<'_>, StoreError> {
        table_tx(self.conn(), table)
    }

    pub fn db<M: DbManager>(&self) -> Result<MutationBuilder<'_>, StoreError> {
        self.table(&M::table_spec()?)
    }

    pub fn turn_state(&self) -> TurnState<'_> {
        TurnState::new(self.conn())
    }

    pub fn outbox(&self) -> Outbox<'_> {
        Outbox::new(self.conn())
    }

    pub fn gamestate(&self) -> GameStateStore<'_> {
        GameStateStore::new(self.conn())
    }

    pub fn commit(self) -> Result<(), StoreError> {
        self.tx.commit()?;
        Ok(())
    }
}

pub(in crate::store) fn table_tx<'c>(
    conn: &'c Connection,
    table: &TableSpec,
) -> Result<MutationBuilder<'c>, StoreError> {
    let builder = MutationBuilder::new(conn, table.clone());
    if journal::logging_enabled_tx(conn)? {
        return Ok(builder.with_journal(TableJournal::new(table.clone())));
    }
    Ok(builder)
}
