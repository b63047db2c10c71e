//! Key edges to harness commands

use crate::config::TriggerConfig;
use serde::{Deserialize, Serialize};

/// A key press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEdge {
    Down(char),
    Up(char),
}

/// What a key edge asks the controller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputCommand {
    Activate,
    Deactivate,
    Reset,
}

/// Map an edge through the configured keys. Unbound keys and the reset
/// key's release map to nothing.
pub fn map_key(keys: &TriggerConfig, edge: KeyEdge) -> Option<InputCommand> {
    match edge {
        KeyEdge::Down(k) if k == keys.trigger_key => Some(InputCommand::Activate),
        KeyEdge::Up(k) if k == keys.trigger_key => Some(InputCommand::Deactivate),
        KeyEdge::Down(k) if k == keys.reset_key => Some(InputCommand::Reset),
        _ => None,
    }
}
