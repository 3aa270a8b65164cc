#![forbid(unsafe_code)]

use tj_storage::StoreError;

/// Startup failures. Per-request failures stay `StoreError` and go back on the wire.
#[derive(Debug)]
pub(crate) enum ServerError {
    Io(std::io::Error),
    Store(StoreError),
    Yaml(serde_yaml::Error),
    Config(String),
    Usage(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Store(err) => write!(f, "store: {err}"),
            Self::Yaml(err) => write!(f, "config yaml: {err}"),
            Self::Config(message) => write!(f, "config: {message}"),
            Self::Usage(message) => write!(f, "usage: {message}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Yaml(err) => Some(err),
            Self::Config(_) | Self::Usage(_) => None,
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<StoreError> for ServerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_yaml::Error> for ServerError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}
