//! Tick gate: minimum spacing between escalation ticks

/// Decides whether enough time has passed since the last tick.
///
/// Missed intervals are dropped: a late poll yields one tick, never a burst
/// of catch-up ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickGate {
    interval_ms: f64,
}

impl TickGate {
    pub fn new(interval_ms: f64) -> Self {
        Self { interval_ms }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// `now - last_tick_ms >= interval`
    pub fn is_due(&self, last_tick_ms: f64, now_ms: f64) -> bool {
        now_ms - last_tick_ms >= self.interval_ms
    }

    /// Whole intervals that elapsed beyond the one being serviced.
    pub fn skipped_intervals(&self, last_tick_ms: f64, now_ms: f64) -> u64 {
        let elapsed = now_ms - last_tick_ms;
        if elapsed < 2.0 * self.interval_ms {
            return 0;
        }
        (elapsed / self.interval_ms).floor() as u64 - 1
    }
}
