#![forbid(unsafe_code)]

use crate::game::{
    ActionCtx, Player, act_confirm_turn, act_play_card, act_restart, act_undo_to_step,
};
use serde_json::Value;
use tj_storage::StoreError;

pub(crate) type ActionHandler =
    fn(&mut ActionCtx<'_, '_>, &Player, &Value) -> Result<(), StoreError>;

/// Client actions, by wire name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum ActionName {
    PlayCard,
    ConfirmTurn,
    Restart,
    UndoToStep,
}

impl ActionName {
    pub(crate) const ALL: [ActionName; 4] = [
        ActionName::PlayCard,
        ActionName::ConfirmTurn,
        ActionName::Restart,
        ActionName::UndoToStep,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ActionName::PlayCard => "actPlayCard",
            ActionName::ConfirmTurn => "actConfirmTurn",
            ActionName::Restart => "actRestart",
            ActionName::UndoToStep => "actUndoToStep",
        }
    }

    pub(crate) fn from_str(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|action| action.as_str() == raw)
    }

    pub(crate) fn handler(self) -> ActionHandler {
        match self {
            ActionName::PlayCard => act_play_card,
            ActionName::ConfirmTurn => act_confirm_turn,
            ActionName::Restart => act_restart,
            ActionName::UndoToStep => act_undo_to_step,
        }
    }
}

impl std::fmt::Display for ActionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
