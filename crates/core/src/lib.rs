#![forbid(unsafe_code)]

pub mod collection;
pub mod state;

pub use collection::{Collection, SortOrder};
pub use state::GameState;

pub mod ids {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct PlayerId(i64);

    impl PlayerId {
        pub fn get(self) -> i64 {
            self.0
        }

        pub fn try_new(value: i64) -> Result<Self, PlayerIdError> {
            if value <= 0 {
                return Err(PlayerIdError::NotPositive);
            }
            Ok(Self(value))
        }
    }

    impl std::fmt::Display for PlayerId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum PlayerIdError {
        NotPositive,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct StepId(i64);

    impl StepId {
        pub fn new(value: i64) -> Self {
            Self(value)
        }

        pub fn get(self) -> i64 {
            self.0
        }
    }

    impl std::fmt::Display for StepId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    /// Primary key value of a game row.
    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum RowId {
        Int(i64),
        Text(String),
    }

    impl RowId {
        pub fn as_i64(&self) -> Option<i64> {
            match self {
                Self::Int(value) => Some(*value),
                Self::Text(_) => None,
            }
        }
    }

    impl From<i64> for RowId {
        fn from(value: i64) -> Self {
            Self::Int(value)
        }
    }

    impl From<i32> for RowId {
        fn from(value: i32) -> Self {
            Self::Int(i64::from(value))
        }
    }

    impl From<&str> for RowId {
        fn from(value: &str) -> Self {
            Self::Text(value.to_string())
        }
    }

    impl From<String> for RowId {
        fn from(value: String) -> Self {
            Self::Text(value)
        }
    }

    impl From<PlayerId> for RowId {
        fn from(value: PlayerId) -> Self {
            Self::Int(value.get())
        }
    }

    impl std::fmt::Display for RowId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Int(value) => write!(f, "{value}"),
                Self::Text(value) => f.write_str(value),
            }
        }
    }
}

pub mod model {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum MutationKind {
        Create,
        Update,
        Delete,
    }

    impl MutationKind {
        pub fn as_str(self) -> &'static str {
            match self {
                MutationKind::Create => "create",
                MutationKind::Update => "update",
                MutationKind::Delete => "delete",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value.trim() {
                "create" => Some(Self::Create),
                "update" => Some(Self::Update),
                "delete" => Some(Self::Delete),
                _ => None,
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum NotifyScope {
        All,
        Player(super::ids::PlayerId),
    }

    impl NotifyScope {
        pub fn as_str(self) -> &'static str {
            match self {
                NotifyScope::All => "all",
                NotifyScope::Player(_) => "player",
            }
        }

        pub fn player(self) -> Option<super::ids::PlayerId> {
            match self {
                NotifyScope::All => None,
                NotifyScope::Player(player) => Some(player),
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum ConfirmMode {
        Disabled,
        Timer,
        Enabled,
    }

    impl ConfirmMode {
        pub fn as_str(self) -> &'static str {
            match self {
                ConfirmMode::Disabled => "disabled",
                ConfirmMode::Timer => "timer",
                ConfirmMode::Enabled => "enabled",
            }
        }

        pub fn from_str(raw: &str) -> Option<Self> {
            match raw.trim().to_ascii_lowercase().as_str() {
                "disabled" => Some(Self::Disabled),
                "timer" => Some(Self::Timer),
                "enabled" => Some(Self::Enabled),
                _ => None,
            }
        }
    }
}
