#![forbid(unsafe_code)]

mod ai;
mod config;
mod error;
mod jsonrpc;
mod logging;
mod runtime;
mod time;

pub(crate) use ai::*;
pub(crate) use config::*;
pub(crate) use error::*;
pub(crate) use jsonrpc::*;
pub(crate) use logging::*;
pub(crate) use runtime::*;
pub(crate) use time::*;
