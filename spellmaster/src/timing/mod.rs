//! Timing loop: clocks, the tick gate, and the scheduling capability

pub mod clock;
pub mod gate;
pub mod scheduler;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use gate::TickGate;
pub use scheduler::{attach, CancelHandle, FrameCallback, FrameScheduler, Opportunity, Scheduler};
