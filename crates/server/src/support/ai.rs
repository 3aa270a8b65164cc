#![forbid(unsafe_code)]

use super::rfc3339;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tj_core::GameState;
use tj_storage::StoreError;

pub(crate) const RELOAD_RECOVERY: &str = "reload game/data";

pub(crate) fn state_json(state: GameState) -> Value {
    json!({ "id": state.id(), "name": state.name() })
}

pub(crate) fn action_ok(state: GameState) -> Value {
    json!({
        "success": true,
        "state": state_json(state),
        "error": null,
        "timestamp": rfc3339(OffsetDateTime::now_utc()),
    })
}

pub(crate) fn ai_error_with(code: &str, message: &str, recovery: Option<&str>) -> Value {
    let mut error_obj = serde_json::Map::new();
    error_obj.insert("code".to_string(), Value::String(code.to_string()));
    error_obj.insert(
        "message".to_string(),
        Value::String(message.trim().to_string()),
    );
    if let Some(recovery) = recovery {
        error_obj.insert(
            "recovery".to_string(),
            Value::String(recovery.trim().to_string()),
        );
    }

    json!({
        "success": false,
        "error": Value::Object(error_obj),
        "timestamp": rfc3339(OffsetDateTime::now_utc()),
    })
}

pub(crate) fn format_store_error(err: &StoreError) -> String {
    match err {
        StoreError::UnknownStep(step_id) => {
            format!("Step {step_id} is not undoable in the current turn")
        }
        StoreError::InvariantViolation { table, key, .. } => {
            format!("Undo failed: {table} row {key} was changed outside the journal")
        }
        other => other.to_string(),
    }
}

pub(crate) fn store_error_value(err: &StoreError) -> Value {
    let recovery = match err {
        StoreError::Configuration(_) => Some("fix the server configuration and restart"),
        StoreError::InvalidInput(_) => Some("check the request params"),
        _ => Some(RELOAD_RECOVERY),
    };
    ai_error_with(err.code(), &format_store_error(err), recovery)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_wire_codes() {
        let value = store_error_value(&StoreError::UnknownStep(7));
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"]["code"], json!("INVALID_ACTION"));
        assert_eq!(value["error"]["recovery"], json!(RELOAD_RECOVERY));

        let value = store_error_value(&StoreError::InvariantViolation {
            table: "cards".to_string(),
            key: "3".to_string(),
            detail: "row missing".to_string(),
        });
        assert_eq!(value["error"]["code"], json!("INVARIANT_VIOLATION"));
        assert_eq!(
            value["error"]["message"],
            json!("Undo failed: cards row 3 was changed outside the journal")
        );

        let value = store_error_value(&StoreError::Configuration("no table bound".to_string()));
        assert_eq!(value["error"]["code"], json!("CONFIGURATION_ERROR"));
    }

    #[test]
    fn error_without_recovery_omits_the_field() {
        let value = ai_error_with("INVALID_INPUT", " bad params ", None);
        assert_eq!(value["error"]["message"], json!("bad params"));
        assert!(value["error"].get("recovery").is_none());
    }
}
