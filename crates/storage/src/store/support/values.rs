#![forbid(unsafe_code)]

use super::super::{RowImage, StoreError};
use rusqlite::Row;
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::{Number, Value as JsonValue};
use tj_core::ids::RowId;

/// Accepts plain SQL identifiers only: ASCII letters, digits and `_`, not starting with a digit.
pub(in crate::store) fn validate_identifier(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    };
    if !valid {
        return Err(StoreError::Configuration(format!(
            "invalid identifier: {name:?}"
        )));
    }
    Ok(())
}

pub(in crate::store) fn quote_ident(name: &str) -> String {
    format!("\"{name}\"")
}

pub(in crate::store) fn json_to_sql(value: &JsonValue) -> SqlValue {
    match value {
        JsonValue::Null => SqlValue::Null,
        JsonValue::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        JsonValue::Number(number) => match number.as_i64() {
            Some(int) => SqlValue::Integer(int),
            None => SqlValue::Real(number.as_f64().unwrap_or_default()),
        },
        JsonValue::String(text) => SqlValue::Text(text.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

pub(in crate::store) fn sql_to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(int) => JsonValue::from(int),
        ValueRef::Real(real) => Number::from_f64(real)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        ValueRef::Text(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => {
            JsonValue::Array(bytes.iter().map(|byte| JsonValue::from(*byte)).collect())
        }
    }
}

pub(in crate::store) fn row_id_to_sql(id: &RowId) -> SqlValue {
    match id {
        RowId::Int(value) => SqlValue::Integer(*value),
        RowId::Text(value) => SqlValue::Text(value.clone()),
    }
}

pub(in crate::store) fn row_id_from_sql(value: ValueRef<'_>) -> Result<RowId, StoreError> {
    match value {
        ValueRef::Integer(int) => Ok(RowId::Int(int)),
        ValueRef::Text(bytes) => Ok(RowId::Text(String::from_utf8_lossy(bytes).into_owned())),
        _ => Err(StoreError::InvalidInput("unsupported primary key type")),
    }
}

pub(in crate::store) fn row_id_to_json(id: &RowId) -> JsonValue {
    match id {
        RowId::Int(value) => JsonValue::from(*value),
        RowId::Text(value) => JsonValue::String(value.clone()),
    }
}

pub(in crate::store) fn row_id_from_json(value: &JsonValue) -> Result<RowId, StoreError> {
    match value {
        JsonValue::Number(number) => number
            .as_i64()
            .map(RowId::Int)
            .ok_or(StoreError::InvalidInput("primary key must be an integer or text")),
        JsonValue::String(text) => Ok(RowId::Text(text.clone())),
        _ => Err(StoreError::InvalidInput(
            "primary key must be an integer or text",
        )),
    }
}

/// Reads every column of `row` into an image keyed by column name.
pub(in crate::store) fn read_row_image(
    row: &Row<'_>,
    columns: &[String],
) -> Result<RowImage, StoreError> {
    let mut image = RowImage::new();
    for (index, name) in columns.iter().enumerate() {
        image.insert(name.clone(), sql_to_json(row.get_ref(index)?));
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::{json_to_sql, validate_identifier};
    use rusqlite::types::Value as SqlValue;
    use serde_json::json;

    #[test]
    fn identifiers_reject_sql_fragments() {
        assert!(validate_identifier("card_location").is_ok());
        assert!(validate_identifier("_x1").is_ok());
        assert!(validate_identifier("1card").is_err());
        assert!(validate_identifier("cards; DROP TABLE player").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn json_scalars_bind_as_sqlite_values() {
        assert_eq!(json_to_sql(&json!(5)), SqlValue::Integer(5));
        assert_eq!(json_to_sql(&json!(true)), SqlValue::Integer(1));
        assert_eq!(json_to_sql(&json!(null)), SqlValue::Null);
        assert_eq!(json_to_sql(&json!("hand")), SqlValue::Text("hand".to_string()));
        assert_eq!(json_to_sql(&json!(1.5)), SqlValue::Real(1.5));
    }
}
