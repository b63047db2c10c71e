//! Host sessions
//!
//! Two ways to drive the harness from a terminal:
//!
//! - [`run_session`]: interactive. Key edges arrive as text lines
//!   (`down 3`, `up 3`, `press 0`, `quit`); a runtime interval fires the
//!   frame scheduler at display cadence and the HUD redraws on every
//!   snapshot.
//! - [`simulate`]: deterministic. A manual clock holds the trigger for a
//!   fixed span, polling at a fixed frame period.

use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use spellmaster::events::{drain, EventBusError};
use spellmaster::timing::attach;
use spellmaster::{
    Clock, EscalationController, FanoutSink, FrameScheduler, HarnessConfig, HarnessError,
    HarnessEvent, HarnessSnapshot, KeyEdge, ManualClock, OsRandom, OutcomeGenerator,
    PresentationConfig, SnapshotCause, TelemetrySink,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cues::{cues_for, Bell, FeedbackCue};
use crate::hud::HudSink;
use crate::telemetry_log::JsonlSink;

/// Default frame period, about 60 Hz
pub const DEFAULT_FRAME_MS: u64 = 16;

/// Manual-clock origin for simulations. Far enough past zero that the
/// first poll after activation is already due.
pub const SIMULATION_EPOCH_MS: f64 = 1_000.0;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error("frame period must be > 0 ms, got {0}")]
    InvalidFrame(f64),

    #[error("hold duration must be finite and >= 0 ms, got {0}")]
    InvalidHold(f64),

    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command `{0}` (expected down, up, press or quit)")]
    Unknown(String),

    #[error("`{0}` needs a single-character key")]
    MissingKey(String),
}

/// One parsed input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCommand {
    Key(KeyEdge),
    /// Down then up
    Press(char),
    Quit,
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<LineCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
    if verb == "quit" || verb == "q" {
        return Ok(Some(LineCommand::Quit));
    }

    let key = match (parts.next(), parts.next()) {
        (Some(arg), None) => {
            let mut chars = arg.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        }
        _ => None,
    };
    let command = match verb.as_str() {
        "down" => key.map(|k| LineCommand::Key(KeyEdge::Down(k))),
        "up" => key.map(|k| LineCommand::Key(KeyEdge::Up(k))),
        "press" => key.map(LineCommand::Press),
        _ => return Err(CommandError::Unknown(verb)),
    };
    command.map(Some).ok_or(CommandError::MissingKey(verb))
}

/// Milliseconds on the runtime clock. Follows paused time under test.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeClock {
    origin: tokio::time::Instant,
}

impl RuntimeClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for RuntimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for RuntimeClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Host options that are not harness configuration
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub color: bool,
    pub telemetry_log: Option<PathBuf>,
    pub frame_ms: u64,
    /// Draw outcomes from OS entropy instead of the thread-local generator
    pub os_entropy: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            color: true,
            telemetry_log: None,
            frame_ms: DEFAULT_FRAME_MS,
            os_entropy: false,
        }
    }
}

/// Outcome generator for a host. OS entropy failures surface as errors on
/// the tick that hit them.
pub fn outcome_generator(os_entropy: bool) -> OutcomeGenerator {
    if os_entropy {
        OutcomeGenerator::new(Box::new(OsRandom))
    } else {
        OutcomeGenerator::thread_local()
    }
}

/// How an interactive session ended
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub snapshot: HarnessSnapshot,
    pub frames: u64,
    pub tones: u64,
    pub flashes: u64,
}

/// Apply one line command to the controller.
fn apply_line(controller: &Rc<RefCell<EscalationController>>, command: LineCommand) {
    let mut ctl = controller.borrow_mut();
    match command {
        LineCommand::Key(edge) => {
            if ctl.handle_key(edge).is_none() {
                debug!(?edge, "Unbound key");
            }
        }
        LineCommand::Press(key) => {
            let down = ctl.handle_key(KeyEdge::Down(key));
            ctl.handle_key(KeyEdge::Up(key));
            if down.is_none() {
                debug!(key = %key, "Unbound key");
            }
        }
        LineCommand::Quit => {}
    }
}

/// Turns escalation events into tones and HUD flashes
struct CuePlayer<W: Write, B: Write> {
    presentation: PresentationConfig,
    hud: Rc<RefCell<HudSink<W>>>,
    bell: Bell<B>,
    flashes: u64,
}

impl<W: Write, B: Write> CuePlayer<W, B> {
    fn play_pending(&mut self, events: &mut broadcast::Receiver<HarnessEvent>) {
        let pending = match drain(events) {
            Ok(pending) => pending,
            Err(EventBusError::Lagged(n)) => {
                warn!(missed = n, "Cue listener lagged");
                return;
            }
            Err(EventBusError::ChannelClosed) => return,
        };
        for event in &pending {
            for cue in cues_for(event, &self.presentation) {
                match cue {
                    FeedbackCue::Tone {
                        hz,
                        duration_ms,
                        volume,
                    } => self.bell.tone(hz, duration_ms, volume),
                    FeedbackCue::Flash { duration_ms } => {
                        debug!(duration_ms, "Flash");
                        self.hud.borrow_mut().flash();
                        self.flashes += 1;
                    }
                }
            }
        }
    }
}

/// Run an interactive session until `quit` or end of input.
///
/// The HUD draws to `out`, tones ring on `bell`. Snapshots are also
/// appended to the telemetry log when one is configured.
pub async fn run_session<R, W, B>(
    config: &HarnessConfig,
    options: &SessionOptions,
    input: R,
    out: W,
    bell: B,
) -> Result<SessionSummary, SessionError>
where
    R: AsyncBufRead + Unpin,
    W: Write + 'static,
    B: Write,
{
    if options.frame_ms == 0 {
        return Err(SessionError::InvalidFrame(0.0));
    }

    let clock = RuntimeClock::new();
    let hud = Rc::new(RefCell::new(HudSink::new(out, config.trigger, options.color)));
    let mut sink = FanoutSink::new().with(Rc::clone(&hud));
    if let Some(path) = &options.telemetry_log {
        info!(path = %path.display(), "Logging telemetry");
        sink = sink.with(JsonlSink::new(path));
    }

    let controller = Rc::new(RefCell::new(
        EscalationController::new(config, Box::new(clock), Box::new(sink))?
            .with_generator(outcome_generator(options.os_entropy)),
    ));
    let mut events = controller.borrow().subscribe();
    let mut scheduler = FrameScheduler::new();
    let frame_loop = attach(&controller, &mut scheduler);
    let mut cues = CuePlayer {
        presentation: config.presentation,
        hud: Rc::clone(&hud),
        bell: Bell::new(bell),
        flashes: 0,
    };

    controller.borrow_mut().render_current();
    info!(
        trigger = %config.trigger.trigger_key,
        reset = %config.trigger.reset_key,
        interval_ms = config.escalation.tick_interval_ms,
        "Simulation harness active"
    );

    let mut lines = input.lines();
    let mut frames = tokio::time::interval(Duration::from_millis(options.frame_ms));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("End of input");
                    break;
                };
                match parse_line(&line) {
                    Ok(Some(LineCommand::Quit)) => break,
                    Ok(Some(command)) => apply_line(&controller, command),
                    Ok(None) => {}
                    Err(e) => warn!("{e}"),
                }
            }
            _ = frames.tick() => {
                scheduler.fire(clock.now_ms())?;
                cues.play_pending(&mut events);
            }
        }
    }

    frame_loop.cancel();
    let ctl = controller.borrow();
    let snapshot = ctl.snapshot(SnapshotCause::Initial);
    let summary = SessionSummary {
        snapshot,
        frames: scheduler.frames(),
        tones: cues.bell.rung(),
        flashes: cues.flashes,
    };
    info!(
        state = %ctl.state().summary(),
        bias = snapshot.bias,
        frames = summary.frames,
        "Session ended"
    );
    Ok(summary)
}

/// A fixed hold for [`simulate`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationPlan {
    pub hold_ms: f64,
    pub frame_ms: f64,
}

impl SimulationPlan {
    fn validate(&self) -> Result<(), SessionError> {
        if !(self.frame_ms.is_finite() && self.frame_ms > 0.0) {
            return Err(SessionError::InvalidFrame(self.frame_ms));
        }
        if !(self.hold_ms.is_finite() && self.hold_ms >= 0.0) {
            return Err(SessionError::InvalidHold(self.hold_ms));
        }
        Ok(())
    }
}

/// Hold the trigger for `plan.hold_ms` on a manual clock and return the
/// state after release.
pub fn simulate(
    config: &HarnessConfig,
    plan: SimulationPlan,
    sink: Box<dyn TelemetrySink>,
) -> Result<HarnessSnapshot, SessionError> {
    simulate_with(config, plan, sink, OutcomeGenerator::thread_local())
}

/// [`simulate`] with an explicit outcome generator.
pub fn simulate_with(
    config: &HarnessConfig,
    plan: SimulationPlan,
    sink: Box<dyn TelemetrySink>,
    generator: OutcomeGenerator,
) -> Result<HarnessSnapshot, SessionError> {
    plan.validate()?;

    let clock = ManualClock::new(SIMULATION_EPOCH_MS);
    let controller = Rc::new(RefCell::new(
        EscalationController::new(config, Box::new(clock.clone()), sink)?
            .with_generator(generator),
    ));
    let mut scheduler = FrameScheduler::new();
    attach(&controller, &mut scheduler);

    controller.borrow_mut().activate();
    let release_at = SIMULATION_EPOCH_MS + plan.hold_ms;
    let mut frame = 0u64;
    loop {
        // Multiply rather than accumulate so long runs do not drift.
        let now = SIMULATION_EPOCH_MS + frame as f64 * plan.frame_ms;
        if now >= release_at {
            break;
        }
        clock.set(now);
        scheduler.fire(now)?;
        frame += 1;
    }
    clock.set(release_at);
    controller.borrow_mut().deactivate();

    let ctl = controller.borrow();
    let cause = if ctl.state().total_ticks > 0 {
        SnapshotCause::Escalation
    } else {
        SnapshotCause::Initial
    };
    let snapshot = ctl.snapshot(cause);
    info!(
        hold_ms = plan.hold_ms,
        frames = frame,
        ticks = snapshot.total_ticks,
        level = snapshot.level,
        bias = snapshot.bias,
        "Simulation finished"
    );
    Ok(snapshot)
}
