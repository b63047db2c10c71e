//! Bias Store: a single bounded scalar

use serde::{Deserialize, Serialize};

/// `max(lo, min(hi, x))`
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    lo.max(hi.min(x))
}

/// Holds the pressure value and the bounds it may never leave.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasStore {
    value: f64,
    min: f64,
    max: f64,
}

impl BiasStore {
    /// Bounds must already be validated; `value` is clamped into them.
    pub(crate) fn new(value: f64, min: f64, max: f64) -> Self {
        Self {
            value: clamp(value, min, max),
            min,
            max,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Add `delta` and clamp. Returns the new value.
    pub fn nudge(&mut self, delta: f64) -> f64 {
        self.value = clamp(self.value + delta, self.min, self.max);
        self.value
    }

    pub fn set(&mut self, value: f64) {
        self.value = clamp(value, self.min, self.max);
    }

    pub fn at_floor(&self) -> bool {
        self.value <= self.min
    }

    pub fn at_ceiling(&self) -> bool {
        self.value >= self.max
    }
}
