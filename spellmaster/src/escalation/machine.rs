//! Escalation Controller: the hold-to-escalate state machine
//!
//! Owns the escalation counters and the pressure controller by composition.
//! All mutation goes through these methods; nothing else holds a mutable
//! path to either.
//!
//! ```text
//!            activate                      poll_tick (interval elapsed)
//!   Idle ───────────────> Holding ──┐      level+1, ticks+1, streak+1,
//!    ^                       │  ^   │      draw outcome, tune pressure,
//!    └──── deactivate ───────┘  └───┘      publish + render
//!
//!   reset: any phase; counters -> 1/0/0, pressure -> initial
//! ```

use tracing::{debug, info, trace};

use crate::config::{EscalationConfig, HarnessConfig, TriggerConfig};
use crate::error::HarnessResult;
use crate::escalation::state::{EscalationState, TriggerPhase};
use crate::events::{EventBus, HarnessEvent};
use crate::input::{map_key, InputCommand, KeyEdge};
use crate::outcome::OutcomeGenerator;
use crate::pressure::PressureController;
use crate::telemetry::{HarnessSnapshot, SnapshotCause, TelemetrySink};
use crate::timing::{Clock, TickGate};

/// The escalation state machine with its pressure controller
pub struct EscalationController {
    keys: TriggerConfig,
    config: EscalationConfig,
    gate: TickGate,
    state: EscalationState,
    pressure: PressureController,
    generator: OutcomeGenerator,
    clock: Box<dyn Clock>,
    sink: Box<dyn TelemetrySink>,
    bus: EventBus,
}

impl EscalationController {
    /// Build from a validated configuration. Outcomes come from the
    /// thread-local generator unless replaced with [`Self::with_generator`].
    pub fn new(
        config: &HarnessConfig,
        clock: Box<dyn Clock>,
        sink: Box<dyn TelemetrySink>,
    ) -> HarnessResult<Self> {
        config.validate()?;
        Ok(Self {
            keys: config.trigger,
            config: config.escalation,
            gate: TickGate::new(config.escalation.tick_interval()),
            state: EscalationState::new(),
            pressure: PressureController::new(config.controller)?,
            generator: OutcomeGenerator::thread_local(),
            clock,
            sink,
            bus: EventBus::new(),
        })
    }

    pub fn with_generator(mut self, generator: OutcomeGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    /// Trigger pressed. Ignored while already holding (key auto-repeat).
    pub fn activate(&mut self) -> bool {
        if self.state.is_active {
            return false;
        }
        let now = self.clock.now_ms();
        self.state.is_active = true;
        self.state.activation_timestamp = Some(now);
        self.state.ticks_at_activation = self.state.total_ticks;
        info!(at_ms = now, level = self.state.level, "Trigger held");
        self.bus.publish(HarnessEvent::Activated { at_ms: now });
        true
    }

    /// Trigger released. Future polls stop ticking immediately.
    pub fn deactivate(&mut self) -> bool {
        if !self.state.is_active {
            return false;
        }
        let now = self.clock.now_ms();
        let held_ms = self
            .state
            .activation_timestamp
            .map(|at| (now - at).max(0.0))
            .unwrap_or(0.0);
        let ticks_during_hold = self.state.ticks_this_hold();
        self.state.is_active = false;
        self.state.activation_timestamp = None;
        info!(held_ms, ticks = ticks_during_hold, "Trigger released");
        self.bus.publish(HarnessEvent::Deactivated {
            held_ms,
            ticks_during_hold,
        });
        true
    }

    /// Zero the counters and the pressure. Holding through a reset keeps
    /// escalating afterwards.
    pub fn reset(&mut self) -> HarnessSnapshot {
        self.state.reset_counters();
        self.pressure.reset();
        let snapshot = self.snapshot(SnapshotCause::Reset);
        self.sink.render(&snapshot);
        self.bus.publish(HarnessEvent::Reset {
            bias: snapshot.bias,
        });
        info!(bias = snapshot.bias, holding = snapshot.holding, "Simulation reset");
        snapshot
    }

    /// One scheduling opportunity. Ticks when holding and at least one
    /// interval has passed since the previous tick; otherwise a no-op.
    pub fn poll_tick(&mut self, now_ms: f64) -> HarnessResult<Option<HarnessSnapshot>> {
        if !self.state.is_active {
            return Ok(None);
        }
        let last = self.state.last_tick_timestamp;
        if !self.gate.is_due(last, now_ms) {
            return Ok(None);
        }
        let skipped = self.gate.skipped_intervals(last, now_ms);
        if skipped > 0 {
            trace!(skipped, "Late poll; missed intervals dropped");
        }
        self.state.last_tick_timestamp = now_ms;
        self.tick().map(Some)
    }

    /// Only reachable from [`Self::poll_tick`] while holding.
    fn tick(&mut self) -> HarnessResult<HarnessSnapshot> {
        debug_assert!(self.state.is_active, "tick while idle");

        // Draw first: a failed draw must leave the counters untouched.
        let outcome = self.generator.sample(self.pressure.current_bias())?;

        // Progression does not depend on the outcome.
        self.state.advance(self.config.max_level);
        self.pressure.tune(outcome);
        let store = self.pressure.store();
        if store.at_floor() || store.at_ceiling() {
            trace!(bias = store.value(), "Pressure saturated");
        }

        let snapshot = self.snapshot(SnapshotCause::Escalation);
        self.bus.publish(HarnessEvent::Escalated {
            level: snapshot.level,
            bias: snapshot.bias,
            total_ticks: snapshot.total_ticks,
            outcome,
        });
        self.sink.render(&snapshot);
        debug!(
            level = snapshot.level,
            bias = snapshot.bias,
            total = snapshot.total_ticks,
            %outcome,
            "Escalated"
        );
        Ok(snapshot)
    }

    /// Route a key edge through the configured bindings.
    pub fn handle_key(&mut self, edge: KeyEdge) -> Option<InputCommand> {
        let command = map_key(&self.keys, edge)?;
        self.apply(command);
        Some(command)
    }

    pub fn apply(&mut self, command: InputCommand) {
        match command {
            InputCommand::Activate => {
                self.activate();
            }
            InputCommand::Deactivate => {
                self.deactivate();
            }
            InputCommand::Reset => {
                self.reset();
            }
        }
    }

    /// Render the current state without changing it (host start-up).
    pub fn render_current(&mut self) -> HarnessSnapshot {
        let snapshot = self.snapshot(SnapshotCause::Initial);
        self.sink.render(&snapshot);
        snapshot
    }

    pub fn snapshot(&self, cause: SnapshotCause) -> HarnessSnapshot {
        HarnessSnapshot {
            cause,
            level: self.state.level,
            bias: self.pressure.current_bias(),
            total_ticks: self.state.total_ticks,
            streak: self.state.streak,
            holding: self.state.is_active,
            last_outcome: self.pressure.last_outcome(),
        }
    }

    pub fn state(&self) -> &EscalationState {
        &self.state
    }

    pub fn phase(&self) -> TriggerPhase {
        self.state.phase()
    }

    pub fn pressure(&self) -> &PressureController {
        &self.pressure
    }

    pub fn bias(&self) -> f64 {
        self.pressure.current_bias()
    }

    pub fn level(&self) -> u32 {
        self.state.level
    }

    pub fn keys(&self) -> &TriggerConfig {
        &self.keys
    }

    pub fn escalation_config(&self) -> &EscalationConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<HarnessEvent> {
        self.bus.subscribe()
    }
}
