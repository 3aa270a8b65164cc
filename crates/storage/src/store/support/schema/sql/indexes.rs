#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE INDEX IF NOT EXISTS idx_mutation_log_step ON mutation_log(step_id, seq);
        CREATE INDEX IF NOT EXISTS idx_notifications_step ON notifications(step_id);
        CREATE INDEX IF NOT EXISTS idx_cards_location ON cards(card_location, card_state);
"#;
