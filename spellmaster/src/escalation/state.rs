//! Escalation State: trigger activity and the escalation counters

use serde::{Deserialize, Serialize};

/// Idle or holding the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPhase {
    Idle,
    Holding,
}

impl std::fmt::Display for TriggerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Holding => write!(f, "holding"),
        }
    }
}

/// Counters and timestamps owned by the escalation controller.
///
/// Invariants: `1 <= level <= max_level`; `total_ticks` and `streak` only
/// grow, by one per tick, until a reset zeroes them. A synthetic loss does
/// not break the streak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationState {
    pub is_active: bool,
    pub activation_timestamp: Option<f64>,
    pub last_tick_timestamp: f64,
    pub level: u32,
    pub total_ticks: u64,
    pub streak: u64,
    /// `total_ticks` at the moment of activation
    pub ticks_at_activation: u64,
}

impl EscalationState {
    pub fn new() -> Self {
        Self {
            is_active: false,
            activation_timestamp: None,
            last_tick_timestamp: 0.0,
            level: 1,
            total_ticks: 0,
            streak: 0,
            ticks_at_activation: 0,
        }
    }

    pub fn phase(&self) -> TriggerPhase {
        if self.is_active {
            TriggerPhase::Holding
        } else {
            TriggerPhase::Idle
        }
    }

    /// Advance the counters by one tick, capping the level.
    pub(crate) fn advance(&mut self, max_level: u32) {
        self.level = self.level.saturating_add(1).min(max_level);
        self.total_ticks += 1;
        self.streak += 1;
    }

    /// Zero the counters. Trigger activity and tick timing are untouched.
    pub(crate) fn reset_counters(&mut self) {
        self.level = 1;
        self.total_ticks = 0;
        self.streak = 0;
        self.ticks_at_activation = 0;
    }

    /// Ticks since the current hold began
    pub fn ticks_this_hold(&self) -> u64 {
        self.total_ticks.saturating_sub(self.ticks_at_activation)
    }

    /// One-line summary for logging
    pub fn summary(&self) -> String {
        format!(
            "phase={} level={} total={} streak={}",
            self.phase(),
            self.level,
            self.total_ticks,
            self.streak
        )
    }
}

impl Default for EscalationState {
    fn default() -> Self {
        Self::new()
    }
}
