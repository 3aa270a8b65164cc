#![forbid(unsafe_code)]

mod entry;
mod game;
mod ops;
mod server;
mod support;

pub(crate) use server::GameServer;
pub(crate) use support::*;

use std::path::PathBuf;
use tj_storage::SqliteStore;

const SERVER_NAME: &str = "turnjournal";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn usage() -> &'static str {
    "tj_server: turn-based game server with a reversible turn journal (JSON-RPC over stdio)\n\n\
USAGE:\n\
  tj_server --storage-dir DIR [--config FILE]\n\
\n\
FLAGS:\n\
  -h, --help           Print this help and exit\n\
  -V, --version        Print version and exit\n\
  --storage-dir DIR    Directory holding the game database (or TJ_STORAGE_DIR)\n\
  --config FILE        YAML game rules: cards_per_turn, hand_size, confirm, logging\n\
\n\
ENV:\n\
  TJ_LOG               Log filter for stderr (default: info)\n"
}

fn version_line() -> String {
    format!("{SERVER_NAME} {SERVER_VERSION}")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        print!("{}", usage());
        return Ok(());
    }
    if args.iter().any(|arg| arg == "-V" || arg == "--version") {
        println!("{}", version_line());
        return Ok(());
    }

    init_tracing();

    let runtime = match RuntimeArgs::parse(
        args,
        std::env::var_os(STORAGE_DIR_ENV).map(PathBuf::from),
    ) {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("{err}\n\n{}", usage());
            std::process::exit(2);
        }
    };
    let config = GameConfig::load(runtime.config_path.as_deref())?;
    let store = SqliteStore::open(&runtime.storage_dir).map_err(ServerError::from)?;
    tracing::info!(
        storage_dir = %runtime.storage_dir.display(),
        cards_per_turn = config.cards_per_turn,
        hand_size = config.hand_size,
        confirm = config.confirm.as_str(),
        logging = config.logging,
        "server starting"
    );

    let mut server = GameServer::new(store, config)?;
    entry::run_stdio(&mut server)
}
