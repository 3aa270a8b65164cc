#![forbid(unsafe_code)]

mod dispatch;
mod registry;

pub(crate) use dispatch::dispatch_action;
pub(crate) use registry::ActionName;
