#![forbid(unsafe_code)]

use super::ServerError;
use serde::Deserialize;
use std::path::Path;
use tj_core::model::ConfirmMode;

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GameConfigFile {
    cards_per_turn: usize,
    hand_size: usize,
    confirm: String,
    logging: bool,
}

impl Default for GameConfigFile {
    fn default() -> Self {
        let defaults = GameConfig::default();
        Self {
            cards_per_turn: defaults.cards_per_turn,
            hand_size: defaults.hand_size,
            confirm: defaults.confirm.as_str().to_string(),
            logging: defaults.logging,
        }
    }
}

/// Rules of one game instance, read once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct GameConfig {
    pub(crate) cards_per_turn: usize,
    pub(crate) hand_size: usize,
    pub(crate) confirm: ConfirmMode,
    pub(crate) logging: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cards_per_turn: 2,
            hand_size: 4,
            confirm: ConfirmMode::Enabled,
            logging: true,
        }
    }
}

impl GameConfig {
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ServerError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub(crate) fn from_yaml(raw: &str) -> Result<Self, ServerError> {
        let file: GameConfigFile = if raw.trim().is_empty() {
            GameConfigFile::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        let confirm = ConfirmMode::from_str(&file.confirm).ok_or_else(|| {
            ServerError::Config(format!(
                "confirm must be enabled, disabled or timer (got {:?})",
                file.confirm
            ))
        })?;
        let config = Self {
            cards_per_turn: file.cards_per_turn,
            hand_size: file.hand_size,
            confirm,
            logging: file.logging,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ServerError> {
        if self.cards_per_turn == 0 {
            return Err(ServerError::Config(
                "cards_per_turn must be at least 1".to_string(),
            ));
        }
        if self.hand_size < self.cards_per_turn {
            return Err(ServerError::Config(format!(
                "hand_size ({}) must be >= cards_per_turn ({})",
                self.hand_size, self.cards_per_turn
            )));
        }
        Ok(())
    }
}
