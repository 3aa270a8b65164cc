#![forbid(unsafe_code)]

use serde_json::Value as JsonValue;
use tj_core::ids::StepId;
use tj_core::model::NotifyScope;

#[derive(Clone, Debug)]
pub struct NewNotification<'a> {
    pub scope: NotifyScope,
    pub name: &'a str,
    pub message: &'a str,
    pub args: JsonValue,
    /// Tag the envelope with the open step so reverting that step cancels it.
    pub cancelable: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NotificationRow {
    pub seq: i64,
    pub uid: String,
    pub scope: NotifyScope,
    pub name: String,
    pub message: String,
    pub args: JsonValue,
    pub step_id: Option<StepId>,
    pub canceled: bool,
    pub ts_ms: i64,
}

pub fn notification_uid(seq: i64) -> String {
    format!("n_{seq:016}")
}
