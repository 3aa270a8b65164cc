#![forbid(unsafe_code)]

mod insert;
mod predicate;
mod read;
mod table;
mod write;

pub use insert::MultipleInsert;
pub use predicate::CmpOp;
pub use table::{DbManager, TableSpec};

use super::support::{
    quote_ident, read_row_image, row_id_from_sql, row_id_to_json, row_id_to_sql,
    validate_identifier,
};
use super::{RowImage, StoreError, TableJournal};
use predicate::{Clause, Predicate};
use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tj_core::SortOrder;
use tj_core::ids::{PlayerId, RowId};

/// Upper bound on keys bound into one `IN (...)` list.
const KEY_CHUNK: usize = 256;

/// Column to value, unique by construction.
pub type Fields = BTreeMap<String, JsonValue>;

pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<JsonValue>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Single-table statement builder.
///
/// Predicate calls are folded left: every call ANDs onto the accumulated predicate, except
/// `or_where*`, which ORs the whole accumulated predicate with its clause. Invalid column names
/// are remembered and reported by the executing call.
///
/// When a [`TableJournal`] is attached, every write first reads the rows it is about to touch
/// and appends a mutation record holding the pre/post images needed to invert it.
pub struct MutationBuilder<'c> {
    conn: &'c Connection,
    table: TableSpec,
    journal: Option<TableJournal>,
    columns: Option<Vec<String>>,
    predicate: Predicate,
    order_by: Vec<(String, SortOrder)>,
    limit: Option<(usize, usize)>,
    error: Option<StoreError>,
}

impl<'c> MutationBuilder<'c> {
    pub(in crate::store) fn new(conn: &'c Connection, table: TableSpec) -> Self {
        Self {
            conn,
            table,
            journal: None,
            columns: None,
            predicate: Predicate::default(),
            order_by: Vec::new(),
            limit: None,
            error: None,
        }
    }

    pub(in crate::store) fn with_journal(mut self, journal: TableJournal) -> Self {
        if journal.table() != &self.table {
            self.fail(StoreError::Configuration(format!(
                "journal bound to {} cannot log writes to {}",
                journal.table().name(),
                self.table.name()
            )));
        }
        self.journal = Some(journal);
        self
    }

    /// Detaches the journal; writes made through this builder are never revertible.
    pub fn without_log(mut self) -> Self {
        self.journal = None;
        self
    }

    pub fn is_logged(&self) -> bool {
        self.journal.is_some()
    }

    pub fn table(&self) -> &TableSpec {
        &self.table
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        for column in columns {
            self.check_column(column);
        }
        self.columns = Some(columns.iter().map(|column| column.to_string()).collect());
        self
    }

    pub fn where_eq(self, column: &str, value: impl Into<JsonValue>) -> Self {
        self.where_op(column, CmpOp::Eq, value)
    }

    pub fn where_op(mut self, column: &str, op: CmpOp, value: impl Into<JsonValue>) -> Self {
        if self.check_column(column) {
            self.predicate.and(Clause::Compare {
                column: column.to_string(),
                op,
                value: value.into(),
            });
        }
        self
    }

    pub fn or_where(self, column: &str, value: impl Into<JsonValue>) -> Self {
        self.or_where_op(column, CmpOp::Eq, value)
    }

    pub fn or_where_op(mut self, column: &str, op: CmpOp, value: impl Into<JsonValue>) -> Self {
        if self.check_column(column) {
            self.predicate.or(Clause::Compare {
                column: column.to_string(),
                op,
                value: value.into(),
            });
        }
        self
    }

    pub fn where_id(self, id: impl Into<RowId>) -> Self {
        let primary = self.table.primary().to_string();
        let value = row_id_to_json(&id.into());
        self.where_eq(&primary, value)
    }

    pub fn where_in<V: Into<JsonValue>>(
        self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.push_in(column, values, false)
    }

    pub fn where_not_in<V: Into<JsonValue>>(
        self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.push_in(column, values, true)
    }

    pub fn where_null(self, column: &str) -> Self {
        self.push_null(column, false)
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.push_null(column, true)
    }

    /// Scopes to `player_id` when given; `None` adds nothing.
    pub fn where_player(self, player: Option<PlayerId>) -> Self {
        match player {
            Some(player) => self.where_eq("player_id", player.get()),
            None => self,
        }
    }

    pub fn order_by(mut self, column: &str, order: SortOrder) -> Self {
        if self.check_column(column) {
            self.order_by.push((column.to_string(), order));
        }
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some((count, 0));
        self
    }

    pub fn limit_offset(mut self, count: usize, offset: usize) -> Self {
        self.limit = Some((count, offset));
        self
    }

    fn push_in<V: Into<JsonValue>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
        negated: bool,
    ) -> Self {
        if self.check_column(column) {
            self.predicate.and(Clause::In {
                column: column.to_string(),
                values: values.into_iter().map(Into::into).collect(),
                negated,
            });
        }
        self
    }

    fn push_null(mut self, column: &str, negated: bool) -> Self {
        if self.check_column(column) {
            self.predicate.and(Clause::Null {
                column: column.to_string(),
                negated,
            });
        }
        self
    }

    fn check_column(&mut self, column: &str) -> bool {
        match validate_identifier(column) {
            Ok(()) => true,
            Err(err) => {
                self.fail(err);
                false
            }
        }
    }

    fn fail(&mut self, err: StoreError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn take_error(&mut self) -> Result<(), StoreError> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn quoted_table(&self) -> String {
        quote_ident(self.table.name())
    }

    fn quoted_primary(&self) -> String {
        quote_ident(self.table.primary())
    }

    /// WHERE + ORDER BY + LIMIT.
    fn render_tail(&self, params: &mut Vec<SqlValue>) -> String {
        let mut sql = self.predicate.render(params);
        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .iter()
                .map(|(column, order)| format!("{} {}", quote_ident(column), order.as_sql()))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" ORDER BY {order}"));
        }
        if let Some((count, offset)) = self.limit {
            sql.push_str(&format!(" LIMIT {count} OFFSET {offset}"));
        }
        sql
    }

    /// Primary keys of the rows the current predicate selects, in result order.
    fn target_keys(&self) -> Result<Vec<RowId>, StoreError> {
        let mut params = Vec::new();
        let tail = self.render_tail(&mut params);
        let sql = format!(
            "SELECT {} FROM {}{tail}",
            self.quoted_primary(),
            self.quoted_table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(row_id_from_sql(row.get_ref(0)?)?);
        }
        Ok(keys)
    }

    /// Current images of `keys`, restricted to `columns` plus the primary key when given.
    /// Missing rows are skipped; the result follows the order of `keys`.
    fn load_images(
        &self,
        keys: &[RowId],
        columns: Option<&[String]>,
    ) -> Result<Vec<(RowId, RowImage)>, StoreError> {
        let primary = self.table.primary();
        let select = match columns {
            None => "*".to_string(),
            Some(columns) => std::iter::once(primary)
                .chain(
                    columns
                        .iter()
                        .map(String::as_str)
                        .filter(|column| *column != primary),
                )
                .map(quote_ident)
                .collect::<Vec<_>>()
                .join(", "),
        };

        let mut found = BTreeMap::new();
        for chunk in keys.chunks(KEY_CHUNK) {
            let marks = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT {select} FROM {} WHERE {} IN ({marks})",
                self.quoted_table(),
                self.quoted_primary()
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let names: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect();
            let key_index = primary_index(&names, primary)?;
            let mut rows = stmt.query(rusqlite::params_from_iter(chunk.iter().map(row_id_to_sql)))?;
            while let Some(row) = rows.next()? {
                let key = row_id_from_sql(row.get_ref(key_index)?)?;
                found.insert(key, read_row_image(row, &names)?);
            }
        }

        Ok(keys
            .iter()
            .filter_map(|key| found.remove(key).map(|image| (key.clone(), image)))
            .collect())
    }
}

fn primary_index(names: &[String], primary: &str) -> Result<usize, StoreError> {
    names
        .iter()
        .position(|name| name == primary)
        .ok_or_else(|| StoreError::Configuration(format!("primary key {primary} not in result")))
}
