#![forbid(unsafe_code)]

use super::super::support::{quote_ident, read_row_image, row_id_from_sql, validate_identifier};
use super::super::{RowImage, StoreError};
use super::{MutationBuilder, primary_index};
use rusqlite::types::ValueRef;
use tj_core::Collection;

impl MutationBuilder<'_> {
    pub fn get(self) -> Result<Collection<RowImage>, StoreError> {
        self.get_as(Ok)
    }

    /// Runs the read and maps every row through `convert`, keyed by primary key in result order.
    pub fn get_as<T>(
        mut self,
        mut convert: impl FnMut(RowImage) -> Result<T, StoreError>,
    ) -> Result<Collection<T>, StoreError> {
        self.take_error()?;

        let primary = self.table.primary();
        let select = match self.columns.as_ref() {
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

        let mut params = Vec::new();
        let tail = self.render_tail(&mut params);
        let sql = format!("SELECT {select} FROM {}{tail}", self.quoted_table());

        let mut stmt = self.conn.prepare(&sql)?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let key_index = primary_index(&names, primary)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;

        let mut out = Collection::new();
        while let Some(row) = rows.next()? {
            let key = row_id_from_sql(row.get_ref(key_index)?)?;
            let image = read_row_image(row, &names)?;
            out.insert(key, convert(image)?);
        }
        Ok(out)
    }

    pub fn get_single(self) -> Result<Option<RowImage>, StoreError> {
        self.get_single_as(Ok)
    }

    pub fn get_single_as<T>(
        self,
        convert: impl FnMut(RowImage) -> Result<T, StoreError>,
    ) -> Result<Option<T>, StoreError> {
        Ok(self.limit(1).get_as(convert)?.into_values().into_iter().next())
    }

    /// Aggregate over the selected rows, cast to an integer (`NULL` reads as 0).
    ///
    /// `name` is one of `COUNT`, `MAX`, `MIN`; anything else is a configuration error.
    pub fn func(mut self, name: &str, field: Option<&str>) -> Result<i64, StoreError> {
        self.take_error()?;
        let function = name.trim().to_ascii_uppercase();
        if !matches!(function.as_str(), "COUNT" | "MAX" | "MIN") {
            return Err(StoreError::Configuration(format!(
                "unknown aggregate function: {name}"
            )));
        }
        let argument = match field {
            Some(field) => {
                validate_identifier(field)?;
                quote_ident(field)
            }
            None => "*".to_string(),
        };

        let mut params = Vec::new();
        let filter = self.predicate.render(&mut params);
        let sql = format!(
            "SELECT {function}({argument}) FROM {}{filter}",
            self.quoted_table()
        );
        let value = self.conn.query_row(
            &sql,
            rusqlite::params_from_iter(params.iter()),
            |row| {
                Ok(match row.get_ref(0)? {
                    ValueRef::Integer(value) => value,
                    ValueRef::Real(value) => value as i64,
                    ValueRef::Text(bytes) => String::from_utf8_lossy(bytes)
                        .trim()
                        .parse::<i64>()
                        .unwrap_or(0),
                    ValueRef::Null | ValueRef::Blob(_) => 0,
                })
            },
        )?;
        Ok(value)
    }

    pub fn count(self) -> Result<i64, StoreError> {
        self.func("COUNT", None)
    }

    pub fn min(self, field: &str) -> Result<i64, StoreError> {
        self.func("MIN", Some(field))
    }

    pub fn max(self, field: &str) -> Result<i64, StoreError> {
        self.func("MAX", Some(field))
    }
}
