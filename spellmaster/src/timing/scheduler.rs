//! Scheduling capability for the timing loop
//!
//! The core never owns a timer. A host registers recurring callbacks through
//! [`Scheduler::schedule_repeating`] and decides when scheduling
//! opportunities happen: a display refresh, a runtime interval, or a test
//! stepping synthetic time. Each registration returns a [`CancelHandle`].
//!
//! [`FrameScheduler`] is the host-driven implementation: the host calls
//! [`FrameScheduler::fire`] with the current time on each opportunity.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::error::HarnessResult;
use crate::escalation::EscalationController;

/// Callback invoked with the current time in milliseconds
pub type FrameCallback = Box<dyn FnMut(f64) -> HarnessResult<()>>;

/// How often a registration wants to run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Opportunity {
    /// Every time the host fires
    EveryFrame,
    /// At most once per `n` milliseconds of host time
    EveryMs(f64),
}

/// Stops a registration. Clones refer to the same registration.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Rc<Cell<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Registers recurring callbacks
pub trait Scheduler {
    fn schedule_repeating(&mut self, opportunity: Opportunity, callback: FrameCallback)
        -> CancelHandle;
}

struct Registration {
    opportunity: Opportunity,
    callback: FrameCallback,
    handle: CancelHandle,
    last_run_ms: Option<f64>,
}

impl Registration {
    fn wants(&self, now_ms: f64) -> bool {
        match (self.opportunity, self.last_run_ms) {
            (Opportunity::EveryFrame, _) | (Opportunity::EveryMs(_), None) => true,
            (Opportunity::EveryMs(period), Some(last)) => now_ms - last >= period,
        }
    }
}

/// Scheduler driven by explicit [`fire`](Self::fire) calls
#[derive(Default)]
pub struct FrameScheduler {
    registrations: Vec<Registration>,
    frames: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one scheduling opportunity at `now_ms`.
    ///
    /// Cancelled registrations are dropped first. The first callback error
    /// stops the frame and is returned; later callbacks do not run.
    /// Returns how many callbacks ran.
    pub fn fire(&mut self, now_ms: f64) -> HarnessResult<usize> {
        self.registrations.retain(|r| !r.handle.is_cancelled());
        self.frames += 1;

        let mut ran = 0;
        for reg in &mut self.registrations {
            // A callback may have cancelled a later registration this frame.
            if reg.handle.is_cancelled() || !reg.wants(now_ms) {
                continue;
            }
            reg.last_run_ms = Some(now_ms);
            (reg.callback)(now_ms)?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Live registrations
    pub fn active(&self) -> usize {
        self.registrations
            .iter()
            .filter(|r| !r.handle.is_cancelled())
            .count()
    }

    /// Frames fired so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Scheduler for FrameScheduler {
    fn schedule_repeating(
        &mut self,
        opportunity: Opportunity,
        callback: FrameCallback,
    ) -> CancelHandle {
        let handle = CancelHandle::default();
        self.registrations.push(Registration {
            opportunity,
            callback,
            handle: handle.clone(),
            last_run_ms: None,
        });
        debug!(registrations = self.registrations.len(), "Callback scheduled");
        handle
    }
}

/// Register the controller's timing loop: `poll_tick(now)` on every frame.
pub fn attach(
    controller: &Rc<RefCell<EscalationController>>,
    scheduler: &mut dyn Scheduler,
) -> CancelHandle {
    let controller = Rc::clone(controller);
    scheduler.schedule_repeating(
        Opportunity::EveryFrame,
        Box::new(move |now_ms: f64| -> HarnessResult<()> {
            controller.borrow_mut().poll_tick(now_ms)?;
            Ok(())
        }),
    )
}
