#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS mutation_log (
          seq INTEGER PRIMARY KEY AUTOINCREMENT,
          tbl TEXT NOT NULL,
          primary_key TEXT NOT NULL,
          kind TEXT NOT NULL,
          affected_json TEXT NOT NULL,
          step_id INTEGER,
          ts_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS journal_steps (
          step_id INTEGER PRIMARY KEY AUTOINCREMENT,
          state_id INTEGER NOT NULL,
          notif_uid TEXT,
          seq_at_step INTEGER NOT NULL,
          ts_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS journal_checkpoints (
          checkpoint_id INTEGER PRIMARY KEY AUTOINCREMENT,
          state_id INTEGER NOT NULL,
          seq_at_checkpoint INTEGER NOT NULL,
          ts_ms INTEGER NOT NULL
        );
"#;
