//! Harness event types

use crate::outcome::Outcome;
use serde::{Deserialize, Serialize};

/// Notifications published by the escalation controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HarnessEvent {
    /// Trigger pressed while idle
    Activated { at_ms: f64 },

    /// Trigger released
    Deactivated { held_ms: f64, ticks_during_hold: u64 },

    /// One successful tick. `level` and `bias` are the post-tick values.
    Escalated {
        level: u32,
        bias: f64,
        total_ticks: u64,
        outcome: Outcome,
    },

    /// Counters and controller reset
    Reset { bias: f64 },
}

impl HarnessEvent {
    /// Event type name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Activated { .. } => "activated",
            Self::Deactivated { .. } => "deactivated",
            Self::Escalated { .. } => "escalated",
            Self::Reset { .. } => "reset",
        }
    }

    /// `(level, bias)` for escalation events
    pub fn escalation(&self) -> Option<(u32, f64)> {
        match self {
            Self::Escalated { level, bias, .. } => Some((*level, *bias)),
            _ => None,
        }
    }
}
