#![forbid(unsafe_code)]

use super::super::support::{json_to_sql, quote_ident, row_id_to_sql, validate_identifier};
use super::super::{AffectedRow, RowImage, StoreError};
use super::{Fields, KEY_CHUNK, MutationBuilder};
use tj_core::ids::RowId;
use tj_core::model::MutationKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WriteOp {
    Set,
    Inc,
}

impl MutationBuilder<'_> {
    /// Sets `fields` on every selected row. Returns the affected row count.
    pub fn update(self, fields: Fields) -> Result<usize, StoreError> {
        self.write(WriteOp::Set, fields)
    }

    pub fn update_by_id(self, id: impl Into<RowId>, fields: Fields) -> Result<usize, StoreError> {
        self.where_id(id).update(fields)
    }

    /// Adds each numeric offset in `offsets` to its column.
    ///
    /// The journaled inverse restores the snapshot read before the write, not the negated
    /// offset.
    pub fn inc(self, offsets: Fields) -> Result<usize, StoreError> {
        self.write(WriteOp::Inc, offsets)
    }

    pub fn inc_by_id(self, id: impl Into<RowId>, offsets: Fields) -> Result<usize, StoreError> {
        self.where_id(id).inc(offsets)
    }

    pub fn delete(mut self) -> Result<usize, StoreError> {
        self.take_error()?;
        let keys = self.target_keys()?;
        if keys.is_empty() {
            return Ok(0);
        }

        let pre = match self.journal {
            Some(_) => Some(self.load_images(&keys, None)?),
            None => None,
        };

        let mut affected = 0;
        for chunk in keys.chunks(KEY_CHUNK) {
            let marks = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "DELETE FROM {} WHERE {} IN ({marks})",
                self.quoted_table(),
                self.quoted_primary()
            );
            affected += self
                .conn
                .execute(&sql, rusqlite::params_from_iter(chunk.iter().map(row_id_to_sql)))?;
        }

        if let (Some(journal), Some(pre)) = (self.journal.as_ref(), pre) {
            let rows = pre
                .into_iter()
                .map(|(key, image)| AffectedRow {
                    key,
                    pre_image: Some(image),
                    post_image: None,
                })
                .collect();
            journal.record(self.conn, MutationKind::Delete, rows)?;
        }

        Ok(affected)
    }

    pub fn delete_by_id(self, id: impl Into<RowId>) -> Result<usize, StoreError> {
        self.where_id(id).delete()
    }

    fn write(mut self, op: WriteOp, fields: Fields) -> Result<usize, StoreError> {
        self.take_error()?;
        if fields.is_empty() {
            return Err(StoreError::InvalidInput("no fields to write"));
        }
        for column in fields.keys() {
            validate_identifier(column)?;
            if column == self.table.primary() {
                return Err(StoreError::InvalidInput("primary key cannot be rewritten"));
            }
        }
        if op == WriteOp::Inc && fields.values().any(|value| !value.is_number()) {
            return Err(StoreError::InvalidInput("inc offsets must be numeric"));
        }

        let keys = self.target_keys()?;
        if keys.is_empty() {
            return Ok(0);
        }

        let touched: Vec<String> = fields.keys().cloned().collect();
        let pre = match self.journal {
            Some(_) => Some(self.load_images(&keys, Some(&touched))?),
            None => None,
        };

        let mut set_params = Vec::with_capacity(fields.len());
        let assignments = fields
            .iter()
            .map(|(column, value)| {
                set_params.push(json_to_sql(value));
                let column = quote_ident(column);
                match op {
                    WriteOp::Set => format!("{column} = ?"),
                    WriteOp::Inc => format!("{column} = {column} + ?"),
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut affected = 0;
        for chunk in keys.chunks(KEY_CHUNK) {
            let marks = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "UPDATE {} SET {assignments} WHERE {} IN ({marks})",
                self.quoted_table(),
                self.quoted_primary()
            );
            let params = set_params
                .iter()
                .cloned()
                .chain(chunk.iter().map(row_id_to_sql));
            affected += self.conn.execute(&sql, rusqlite::params_from_iter(params))?;
        }

        if let (Some(journal), Some(pre)) = (self.journal.as_ref(), pre) {
            let post = self.load_images(&keys, Some(&touched))?;
            journal.record(self.conn, MutationKind::Update, pair_images(pre, post))?;
        }

        Ok(affected)
    }
}

fn pair_images(pre: Vec<(RowId, RowImage)>, post: Vec<(RowId, RowImage)>) -> Vec<AffectedRow> {
    let mut post: std::collections::BTreeMap<RowId, RowImage> = post.into_iter().collect();
    pre.into_iter()
        .map(|(key, image)| {
            let post_image = post.remove(&key);
            AffectedRow {
                key,
                pre_image: Some(image),
                post_image,
            }
        })
        .collect()
}
