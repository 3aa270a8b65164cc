#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS gamestate (
          singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
          state_id INTEGER NOT NULL,
          active_player_id INTEGER,
          updated_at_ms INTEGER NOT NULL
        );

        -- Turn State and other per-game globals. Values are JSON text.
        CREATE TABLE IF NOT EXISTS turn_globals (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );
"#;
