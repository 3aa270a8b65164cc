#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS player (
          player_id INTEGER PRIMARY KEY,
          player_name TEXT NOT NULL,
          player_color TEXT NOT NULL,
          player_no INTEGER NOT NULL,
          player_score INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS cards (
          card_id INTEGER PRIMARY KEY AUTOINCREMENT,
          card_location TEXT NOT NULL,
          card_state INTEGER NOT NULL DEFAULT 0,
          card_color TEXT NOT NULL,
          card_value INTEGER NOT NULL
        );
"#;
