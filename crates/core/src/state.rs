#![forbid(unsafe_code)]

/// Closed set of game states. Ids are the persisted values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GameState {
    GameSetup,
    ConfirmChoices,
    ConfirmTurn,
    PlayerTurn,
    EndGame,
}

impl GameState {
    pub const ALL: [GameState; 5] = [
        GameState::GameSetup,
        GameState::ConfirmChoices,
        GameState::ConfirmTurn,
        GameState::PlayerTurn,
        GameState::EndGame,
    ];

    pub fn id(self) -> i64 {
        match self {
            GameState::GameSetup => 1,
            GameState::ConfirmChoices => 2,
            GameState::ConfirmTurn => 3,
            GameState::PlayerTurn => 4,
            GameState::EndGame => 99,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            GameState::GameSetup => "gameSetup",
            GameState::ConfirmChoices => "confirmChoices",
            GameState::ConfirmTurn => "confirmTurn",
            GameState::PlayerTurn => "playerTurn",
            GameState::EndGame => "gameEnd",
        }
    }

    /// States where the active player acts; other states are resolved by the server.
    pub fn is_player_state(self) -> bool {
        matches!(self, GameState::PlayerTurn | GameState::ConfirmTurn)
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::GameState;

    #[test]
    fn ids_round_trip_and_are_unique() {
        let mut seen = std::collections::BTreeSet::new();
        for state in GameState::ALL {
            assert_eq!(GameState::from_id(state.id()), Some(state));
            seen.insert(state.id());
        }
        assert_eq!(seen.len(), GameState::ALL.len(), "state ids must be unique");
        assert_eq!(GameState::from_id(7), None);
    }
}
