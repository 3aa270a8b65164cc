#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS notifications (
          seq INTEGER PRIMARY KEY AUTOINCREMENT,
          uid TEXT UNIQUE,
          scope TEXT NOT NULL,
          player_id INTEGER,
          name TEXT NOT NULL,
          message TEXT NOT NULL,
          args_json TEXT NOT NULL,
          step_id INTEGER,
          canceled INTEGER NOT NULL DEFAULT 0,
          ts_ms INTEGER NOT NULL
        );
"#;
