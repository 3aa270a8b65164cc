#![forbid(unsafe_code)]

mod meta;
mod schema;
mod time;
mod values;

pub(super) use meta::*;
pub(super) use schema::install_schema;
pub(super) use time::now_ms;
pub(super) use values::*;
