//! Behavioural properties of the escalation controller
//!
//! Drives the public API with synthetic timestamps and scripted randomness.

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spellmaster::events::drain;
use spellmaster::{
    ControllerConfig, EscalationController, HarnessConfig, HarnessEvent, HarnessSnapshot,
    ManualClock, Outcome, OutcomeGenerator, PressureController, RandomSource, RandomnessError,
    SnapshotCause, TelemetrySink, TriggerPhase,
};

/// Seeded stand-in for the production source so runs are repeatable
struct Seeded(StdRng);

impl RandomSource for Seeded {
    fn uniform(&mut self) -> Result<f64, RandomnessError> {
        Ok(self.0.random::<f64>())
    }
}

#[derive(Default)]
struct Recorder {
    snapshots: Vec<HarnessSnapshot>,
}

impl TelemetrySink for Recorder {
    fn render(&mut self, snapshot: &HarnessSnapshot) {
        self.snapshots.push(*snapshot);
    }
}

struct Rig {
    clock: ManualClock,
    recorder: Rc<RefCell<Recorder>>,
    ctl: EscalationController,
}

fn rig(config: HarnessConfig, seed: u64) -> Rig {
    let clock = ManualClock::new(0.0);
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let ctl = EscalationController::new(
        &config,
        Box::new(clock.clone()),
        Box::new(Rc::clone(&recorder)),
    )
    .expect("valid config")
    .with_generator(OutcomeGenerator::new(Box::new(Seeded(
        StdRng::seed_from_u64(seed),
    ))));
    Rig {
        clock,
        recorder,
        ctl,
    }
}

/// Poll every `frame_ms` from `from` (inclusive) to `until` (exclusive).
fn hold_frames(rig: &mut Rig, from: f64, until: f64, frame_ms: f64) {
    let mut t = from;
    while t < until {
        rig.clock.set(t);
        rig.ctl.poll_tick(t).expect("tick");
        t += frame_ms;
    }
}

#[test]
fn test_bias_bounds_hold_for_random_tune_sequences() {
    let config = ControllerConfig::default();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let mut ctl = PressureController::new(config).unwrap();
        for _ in 0..2_000 {
            let outcome = if rng.random_bool(0.5) {
                Outcome::Win
            } else {
                Outcome::Loss
            };
            ctl.tune(outcome);
            let bias = ctl.current_bias();
            assert!(
                (config.min_bias..=config.max_bias).contains(&bias),
                "bias {bias} escaped bounds"
            );
        }
    }
}

#[test]
fn test_saturation_values() {
    let mut up = PressureController::new(ControllerConfig::default()).unwrap();
    let mut down = PressureController::new(ControllerConfig::default()).unwrap();
    for _ in 0..1_000 {
        up.tune(Outcome::Loss);
        down.tune(Outcome::Win);
    }
    assert_eq!(up.current_bias(), 99.9);
    assert_eq!(down.current_bias(), 0.0);
}

#[test]
fn test_counters_monotonic_and_level_capped() {
    let mut rig = rig(HarnessConfig::default(), 1);
    rig.ctl.activate();

    let mut prev_level = rig.ctl.level();
    for i in 1..=2_000u64 {
        let snap = rig
            .ctl
            .poll_tick(i as f64 * 100.0)
            .unwrap()
            .expect("interval elapsed");
        assert_eq!(snap.total_ticks, i);
        assert_eq!(snap.streak, i);
        assert!(snap.level >= prev_level);
        assert!(snap.level <= 999);
        prev_level = snap.level;
    }
    assert_eq!(rig.ctl.level(), 999);
    assert_eq!(rig.ctl.state().total_ticks, 2_000);
}

#[test]
fn test_reset_is_idempotent() {
    let mut rig = rig(HarnessConfig::default(), 2);
    rig.ctl.activate();
    hold_frames(&mut rig, 100.0, 1_500.0, 16.0);
    assert!(rig.ctl.state().total_ticks > 0);

    let once = rig.ctl.reset();
    let twice = rig.ctl.reset();
    assert_eq!(once, twice);
    assert_eq!(twice.level, 1);
    assert_eq!(twice.total_ticks, 0);
    assert_eq!(twice.streak, 0);
    assert_eq!(twice.bias, 50.0);
    assert_eq!(rig.ctl.state().streak, 0);
}

#[test]
fn test_hold_for_five_intervals_gives_five_ticks() {
    let mut rig = rig(HarnessConfig::default(), 3);
    rig.clock.set(10_000.0);
    rig.ctl.activate();
    // 1 ms cadence is a perfectly regular scheduler at this resolution
    hold_frames(&mut rig, 10_000.0, 10_500.0, 1.0);
    rig.clock.set(10_500.0);
    rig.ctl.deactivate();

    let ticks = rig.ctl.state().total_ticks;
    assert!((4..=6).contains(&ticks), "got {ticks} ticks");
    assert_eq!(ticks, 5);
}

#[test]
fn test_hold_at_display_cadence() {
    let mut rig = rig(HarnessConfig::default(), 4);
    rig.clock.set(5_000.0);
    rig.ctl.activate();
    // ~60 Hz frames for half a second
    hold_frames(&mut rig, 5_000.0, 5_500.0, 1000.0 / 60.0);
    rig.ctl.deactivate();
    let ticks = rig.ctl.state().total_ticks;
    assert!((4..=6).contains(&ticks), "got {ticks} ticks");
}

#[test]
fn test_no_tick_while_idle() {
    let mut rig = rig(HarnessConfig::default(), 5);
    let before = rig.ctl.snapshot(SnapshotCause::Initial);
    for now in [0.0, 99.0, 100.0, 1e6, -50.0, 123_456.7] {
        assert!(rig.ctl.poll_tick(now).unwrap().is_none());
    }
    let after = rig.ctl.snapshot(SnapshotCause::Initial);
    assert_eq!(before, after);
    assert!(rig.recorder.borrow().snapshots.is_empty());
}

#[test]
fn test_release_stops_ticks_immediately() {
    let mut rig = rig(HarnessConfig::default(), 6);
    rig.ctl.activate();
    rig.ctl.poll_tick(100.0).unwrap();
    rig.ctl.deactivate();
    assert_eq!(rig.ctl.phase(), TriggerPhase::Idle);
    for t in [200.0, 300.0, 400.0] {
        assert!(rig.ctl.poll_tick(t).unwrap().is_none());
    }
    assert_eq!(rig.ctl.state().total_ticks, 1);
}

#[test]
fn test_events_correlate_with_state() {
    let mut rig = rig(HarnessConfig::default(), 8);
    let mut rx = rig.ctl.subscribe();
    rig.ctl.activate();

    for i in 1..=40 {
        let now = i as f64 * 100.0;
        let snap = rig.ctl.poll_tick(now).unwrap().unwrap();
        let events = drain(&mut rx).unwrap();
        let escalations: Vec<_> = events.iter().filter_map(|e| e.escalation()).collect();
        assert_eq!(escalations.len(), 1);
        let (level, bias) = escalations[0];
        assert_eq!(level, rig.ctl.state().level);
        assert_eq!(bias, rig.ctl.pressure().current_bias());
        assert_eq!(level, snap.level);
        assert_eq!(bias, snap.bias);
    }
}

#[test]
fn test_telemetry_matches_events() {
    let mut rig = rig(HarnessConfig::default(), 9);
    let mut rx = rig.ctl.subscribe();
    rig.ctl.activate();
    hold_frames(&mut rig, 100.0, 1_000.0, 10.0);
    rig.ctl.reset();

    let events = drain(&mut rx).unwrap();
    let recorded = rig.recorder.borrow();
    let escalation_snaps: Vec<_> = recorded
        .snapshots
        .iter()
        .filter(|s| s.cause == SnapshotCause::Escalation)
        .collect();
    let escalation_events: Vec<_> = events.iter().filter_map(|e| e.escalation()).collect();

    assert_eq!(escalation_snaps.len(), escalation_events.len());
    for (snap, (level, bias)) in escalation_snaps.iter().zip(&escalation_events) {
        assert_eq!(snap.level, *level);
        assert_eq!(snap.bias, *bias);
    }
    assert_eq!(recorded.snapshots.last().map(|s| s.cause), Some(SnapshotCause::Reset));
    assert!(matches!(events.last(), Some(HarnessEvent::Reset { bias }) if *bias == 50.0));
}

#[test]
fn test_controller_converges_below_ceiling() {
    // Long hold: the pressure settles where wins and losses balance (~50),
    // well inside the bounds.
    let mut rig = rig(HarnessConfig::default(), 10);
    rig.ctl.activate();
    for i in 1..=5_000 {
        rig.ctl.poll_tick(i as f64 * 100.0).unwrap();
    }
    let bias = rig.ctl.bias();
    assert!(bias > 0.0 && bias < 99.9, "bias {bias}");
}
