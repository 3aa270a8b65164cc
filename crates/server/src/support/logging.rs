#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

pub(crate) const LOG_ENV: &str = "TJ_LOG";

/// Installs the stderr subscriber. Stdout carries the protocol and never gets log lines.
pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
