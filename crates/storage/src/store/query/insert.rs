#![forbid(unsafe_code)]

use super::super::support::{json_to_sql, quote_ident, row_id_from_json, validate_identifier};
use super::super::{AffectedRow, StoreError};
use super::{Fields, MutationBuilder, TableSpec};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use tj_core::ids::RowId;
use tj_core::model::MutationKind;

/// Batch insert sharing one identifier-counter read.
pub struct MultipleInsert<'c> {
    builder: MutationBuilder<'c>,
    columns: Vec<String>,
    replace: bool,
}

impl<'c> MutationBuilder<'c> {
    /// Inserts one row and returns its primary key.
    ///
    /// Without an explicit primary key the id is predicted from the table counter. No other
    /// insert into the same table may run between the prediction and this statement.
    pub fn insert(self, fields: Fields) -> Result<RowId, StoreError> {
        self.insert_one(fields, false)
    }

    /// REPLACE semantics. A replaced row is journaled as a delete before the create.
    pub fn insert_or_replace(self, fields: Fields) -> Result<RowId, StoreError> {
        self.insert_one(fields, true)
    }

    pub fn multiple_insert(self, columns: &[&str]) -> MultipleInsert<'c> {
        MultipleInsert {
            builder: self,
            columns: columns.iter().map(|column| column.to_string()).collect(),
            replace: false,
        }
    }

    fn insert_one(self, fields: Fields, replace: bool) -> Result<RowId, StoreError> {
        let (columns, row): (Vec<String>, Vec<JsonValue>) = fields.into_iter().unzip();
        let ids = MultipleInsert {
            builder: self,
            columns,
            replace,
        }
        .values(vec![row])?;
        ids.into_iter()
            .next()
            .ok_or(StoreError::InvalidInput("insert produced no row"))
    }
}

impl MultipleInsert<'_> {
    pub fn values(self, rows: Vec<Vec<JsonValue>>) -> Result<Vec<RowId>, StoreError> {
        let Self {
            mut builder,
            mut columns,
            replace,
        } = self;
        builder.take_error()?;

        if columns.is_empty() {
            return Err(StoreError::InvalidInput("no columns to insert"));
        }
        let mut seen = BTreeSet::new();
        for column in &columns {
            validate_identifier(column)?;
            if !seen.insert(column.as_str()) {
                return Err(StoreError::InvalidInput("duplicate insert column"));
            }
        }
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        if rows.iter().any(|row| row.len() != columns.len()) {
            return Err(StoreError::InvalidInput("row length does not match columns"));
        }

        let mut rows = rows;
        let primary = builder.table.primary().to_string();
        let ids = match columns.iter().position(|column| *column == primary) {
            Some(index) => rows
                .iter()
                .map(|row| row_id_from_json(&row[index]))
                .collect::<Result<Vec<_>, _>>()?,
            None => {
                let first = next_identifier_tx(builder.conn, &builder.table)?;
                let mut ids = Vec::with_capacity(rows.len());
                for (offset, row) in rows.iter_mut().enumerate() {
                    let offset = i64::try_from(offset)
                        .map_err(|_| StoreError::InvalidInput("numeric overflow"))?;
                    let id = first + offset;
                    row.push(JsonValue::from(id));
                    ids.push(RowId::Int(id));
                }
                columns.push(primary);
                ids
            }
        };

        if replace {
            if let Some(journal) = builder.journal.as_ref() {
                let replaced: Vec<AffectedRow> = builder
                    .load_images(&ids, None)?
                    .into_iter()
                    .map(|(key, image)| AffectedRow {
                        key,
                        pre_image: Some(image),
                        post_image: None,
                    })
                    .collect();
                journal.record(builder.conn, MutationKind::Delete, replaced)?;
            }
        }

        let verb = if replace { "REPLACE" } else { "INSERT" };
        let column_list = columns
            .iter()
            .map(|column| quote_ident(column))
            .collect::<Vec<_>>()
            .join(", ");
        let marks = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "{verb} INTO {} ({column_list}) VALUES ({marks})",
            builder.quoted_table()
        );
        let mut stmt = builder.conn.prepare(&sql)?;
        for row in &rows {
            stmt.execute(rusqlite::params_from_iter(row.iter().map(json_to_sql)))?;
        }

        if let Some(journal) = builder.journal.as_ref() {
            let created = builder
                .load_images(&ids, None)?
                .into_iter()
                .map(|(key, image)| AffectedRow {
                    key,
                    pre_image: None,
                    post_image: Some(image),
                })
                .collect();
            journal.record(builder.conn, MutationKind::Create, created)?;
        }

        tracing::debug!(table = builder.table.name(), rows = ids.len(), replace, "rows inserted");
        Ok(ids)
    }
}

/// Next free integer id: one past the larger of the AUTOINCREMENT counter and the current
/// maximum key.
fn next_identifier_tx(conn: &Connection, table: &TableSpec) -> Result<i64, StoreError> {
    let seq = conn
        .query_row(
            "SELECT seq FROM sqlite_sequence WHERE name=?1",
            params![table.name()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .unwrap_or(0);

    let sql = format!(
        "SELECT MAX({}) FROM {}",
        quote_ident(table.primary()),
        quote_ident(table.name())
    );
    let max = conn.query_row(&sql, [], |row| {
        Ok(match row.get_ref(0)? {
            ValueRef::Null => Some(0),
            ValueRef::Integer(value) => Some(value),
            _ => None,
        })
    })?;
    let Some(max) = max else {
        return Err(StoreError::InvalidInput(
            "primary key must be supplied for non-integer keys",
        ));
    };

    Ok(seq.max(max) + 1)
}
