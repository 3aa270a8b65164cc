#![forbid(unsafe_code)]

mod gamestate;
mod journal;
mod notifications;

pub use gamestate::*;
pub use journal::*;
pub use notifications::*;
