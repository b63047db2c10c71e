//! Spellmaster escalation harness
//!
//! A hold-to-escalate state machine coupled to a closed-loop pressure
//! controller:
//!
//! - While a trigger key is held, a timing loop fires escalation ticks no
//!   faster than a configured interval.
//! - Each tick raises the level (capped at `max_level`), draws one synthetic
//!   Win/Loss outcome biased by the current pressure, and nudges the
//!   pressure by a fixed step: up after a loss, down after a win.
//! - A telemetry sink receives a snapshot after every escalation and reset,
//!   and listeners receive escalation events over a broadcast bus.
//!
//! The core is single-threaded and owns no timer. A host drives it by
//! calling [`EscalationController::poll_tick`] on each scheduling
//! opportunity, directly or through a [`timing::Scheduler`].
//!
//! ```rust,ignore
//! use spellmaster::{EscalationController, HarnessConfig, ManualClock, NullSink};
//!
//! let clock = ManualClock::new(0.0);
//! let mut ctl = EscalationController::new(
//!     &HarnessConfig::default(),
//!     Box::new(clock.clone()),
//!     Box::new(NullSink),
//! )?;
//! ctl.activate();
//! for frame in 1..=30 {
//!     ctl.poll_tick(frame as f64 * 16.0)?;
//! }
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod error;
pub mod escalation;
pub mod events;
pub mod input;
pub mod outcome;
pub mod pressure;
pub mod telemetry;
pub mod timing;

pub use config::{
    ControllerConfig, EscalationConfig, HarnessConfig, PresentationConfig, TriggerConfig,
};
pub use error::{ConfigError, HarnessError, HarnessResult, RandomnessError};
pub use escalation::{EscalationController, EscalationState, TriggerPhase};
pub use events::{EventBus, HarnessEvent};
pub use input::{map_key, InputCommand, KeyEdge};
pub use outcome::{OsRandom, Outcome, OutcomeGenerator, RandomSource, ThreadRandom};
pub use pressure::{BiasStore, ControllerState, PressureController};
pub use telemetry::{FanoutSink, HarnessSnapshot, NullSink, SnapshotCause, TelemetrySink};
pub use timing::{
    CancelHandle, Clock, FrameScheduler, ManualClock, MonotonicClock, Opportunity, Scheduler,
    TickGate,
};
