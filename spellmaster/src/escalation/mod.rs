//! Escalation: hold-to-escalate state machine
//!
//! While the trigger is held the timing loop fires ticks no faster than
//! the configured interval. Each tick raises the level (capped), counts the
//! tick, draws one synthetic outcome and feeds it to the pressure
//! controller. The outcome steers the pressure only; the level always
//! advances.

pub mod machine;
pub mod state;

pub use machine::EscalationController;
pub use state::{EscalationState, TriggerPhase};
