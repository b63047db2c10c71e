//! Escalation events and the bus that carries them

pub mod bus;
pub mod types;

pub use bus::{drain, EventBus, EventBusError, EventBusResult};
pub use types::HarnessEvent;
