#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"
        PRAGMA foreign_keys = ON;
"#;
