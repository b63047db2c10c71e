//! Telemetry sink interface
//!
//! The core hands a [`HarnessSnapshot`] to its sink after every escalation
//! and every reset. Rendering is the sink's business; the core ignores
//! whatever the sink does with it.

use crate::outcome::Outcome;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Why a snapshot was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotCause {
    /// First render when the host attaches
    Initial,
    Escalation,
    Reset,
}

impl std::fmt::Display for SnapshotCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Escalation => write!(f, "escalation"),
            Self::Reset => write!(f, "reset"),
        }
    }
}

/// Point-in-time view of the harness
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarnessSnapshot {
    pub cause: SnapshotCause,
    pub level: u32,
    pub bias: f64,
    pub total_ticks: u64,
    pub streak: u64,
    pub holding: bool,
    pub last_outcome: Outcome,
}

/// Receives snapshots for rendering. Fire-and-forget.
#[cfg_attr(test, mockall::automock)]
pub trait TelemetrySink {
    fn render(&mut self, snapshot: &HarnessSnapshot);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn render(&mut self, _snapshot: &HarnessSnapshot) {}
}

/// Forwards each snapshot to every inner sink in order
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn TelemetrySink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with(mut self, sink: impl TelemetrySink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn TelemetrySink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl TelemetrySink for FanoutSink {
    fn render(&mut self, snapshot: &HarnessSnapshot) {
        for sink in &mut self.sinks {
            sink.render(snapshot);
        }
    }
}

/// Lets the host keep a handle on a sink it also gave to the controller.
impl<S: TelemetrySink> TelemetrySink for Rc<RefCell<S>> {
    fn render(&mut self, snapshot: &HarnessSnapshot) {
        self.borrow_mut().render(snapshot);
    }
}

impl TelemetrySink for Box<dyn TelemetrySink> {
    fn render(&mut self, snapshot: &HarnessSnapshot) {
        (**self).render(snapshot);
    }
}
