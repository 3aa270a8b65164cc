#![forbid(unsafe_code)]

use super::super::{
    AffectedRow, Fields, MutationBuilder, MutationRecord, StoreError, TableSpec,
};
use rusqlite::{Connection, ErrorCode};
use tj_core::model::MutationKind;

/// Applies the inverse of `record` directly, without journaling it. Affected rows are undone
/// in reverse order.
pub(super) fn invert_record_tx(conn: &Connection, record: &MutationRecord) -> Result<(), StoreError> {
    let table = TableSpec::try_new(record.table.as_str(), record.primary_key.as_str())?;

    for row in record.affected.iter().rev() {
        let builder = MutationBuilder::new(conn, table.clone());
        match record.kind {
            MutationKind::Create => {
                let removed = builder.delete_by_id(row.key.clone())?;
                expect_single(record, row, removed, "created row is gone")?;
            }
            MutationKind::Update => {
                let mut fields: Fields = pre_image(record, row)?.clone();
                fields.remove(table.primary());
                if fields.is_empty() {
                    continue;
                }
                let updated = builder.update_by_id(row.key.clone(), fields)?;
                expect_single(record, row, updated, "updated row is gone")?;
            }
            MutationKind::Delete => {
                let image = pre_image(record, row)?.clone();
                match builder.insert(image) {
                    Ok(_) => {}
                    Err(StoreError::Sql(err)) if is_constraint_violation(&err) => {
                        return Err(violation(record, row, "deleted row key is occupied"));
                    }
                    Err(err) => return Err(err),
                }
            }
        }
    }
    Ok(())
}

fn pre_image<'r>(
    record: &MutationRecord,
    row: &'r AffectedRow,
) -> Result<&'r Fields, StoreError> {
    row.pre_image
        .as_ref()
        .ok_or_else(|| violation(record, row, "record has no pre-image"))
}

fn expect_single(
    record: &MutationRecord,
    row: &AffectedRow,
    affected: usize,
    detail: &str,
) -> Result<(), StoreError> {
    if affected == 1 {
        return Ok(());
    }
    Err(violation(
        record,
        row,
        &format!("{detail} (affected={affected})"),
    ))
}

fn violation(record: &MutationRecord, row: &AffectedRow, detail: &str) -> StoreError {
    tracing::error!(
        seq = record.seq,
        table = %record.table,
        key = %row.key,
        detail,
        "journal inverse failed"
    );
    StoreError::InvariantViolation {
        table: record.table.clone(),
        key: row.key.to_string(),
        detail: detail.to_string(),
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("PRIMARY KEY constraint failed")
                })
        }
        _ => false,
    }
}
