#![forbid(unsafe_code)]

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    Json(serde_json::Error),
    InvalidInput(&'static str),
    Configuration(String),
    InvalidAction(String),
    UnknownStep(i64),
    InvariantViolation {
        table: String,
        key: String,
        detail: String,
    },
}

impl StoreError {
    /// Stable wire code for the error family.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) | Self::Sql(_) | Self::Json(_) => "STORE_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::InvalidAction(_) | Self::UnknownStep(_) => "INVALID_ACTION",
            Self::InvariantViolation { .. } => "INVARIANT_VIOLATION",
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::Json(err) => write!(f, "json: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Configuration(message) => write!(f, "configuration error: {message}"),
            Self::InvalidAction(message) => write!(f, "invalid action: {message}"),
            Self::UnknownStep(step_id) => write!(f, "unknown step (step_id={step_id})"),
            Self::InvariantViolation { table, key, detail } => write!(
                f,
                "journal invariant violated (table={table}, key={key}): {detail}"
            ),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
