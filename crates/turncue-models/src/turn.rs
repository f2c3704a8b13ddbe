//! Turn-taking state machine states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// Waiting for the group to address the wearer.
    #[default]
    Idle,
    /// Addressed, but the floor is not free yet.
    AddressedHold,
    /// SPEAK fired; waiting for the address to end.
    Cooldown,
}

impl TurnState {
    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnState::Idle => "idle",
            TurnState::AddressedHold => "addressed_hold",
            TurnState::Cooldown => "cooldown",
        }
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
