//! Pressure Controller: fixed-step integral bias tuning
//!
//! A loss nudges the bias up by one step, a win nudges it down by one step,
//! and the result is clamped to the configured bounds. Over time the bias
//! hunts for the smallest value that keeps synthetic losses rare. This is a
//! one-sided nudge, not a PID loop.

use crate::config::ControllerConfig;
use crate::error::HarnessResult;
use crate::outcome::Outcome;
use crate::pressure::bias::BiasStore;
use serde::{Deserialize, Serialize};

/// Mutable controller state. Only [`PressureController::tune`] changes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerState {
    pub bias: f64,
    pub last_outcome: Outcome,
}

/// Owns the bias store and the tuning rule.
#[derive(Debug, Clone)]
pub struct PressureController {
    config: ControllerConfig,
    store: BiasStore,
    last_outcome: Outcome,
    tunes: u64,
}

impl PressureController {
    /// Build a controller. Rejects invalid bounds or step instead of clamping.
    pub fn new(config: ControllerConfig) -> HarnessResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: BiasStore::new(config.initial_bias, config.min_bias, config.max_bias),
            last_outcome: Outcome::Win,
            tunes: 0,
        })
    }

    /// Apply one outcome to the bias.
    pub fn tune(&mut self, outcome: Outcome) {
        let delta = match outcome {
            Outcome::Loss => self.config.step,
            Outcome::Win => -self.config.step,
        };
        self.store.nudge(delta);
        self.last_outcome = outcome;
        self.tunes += 1;
    }

    pub fn current_bias(&self) -> f64 {
        self.store.value()
    }

    pub fn last_outcome(&self) -> Outcome {
        self.last_outcome
    }

    /// Number of `tune` calls since construction or the last reset
    pub fn tunes(&self) -> u64 {
        self.tunes
    }

    pub fn state(&self) -> ControllerState {
        ControllerState {
            bias: self.store.value(),
            last_outcome: self.last_outcome,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn store(&self) -> &BiasStore {
        &self.store
    }

    /// Recreate the state: bias back to `initial_bias`, last outcome `Win`.
    pub fn reset(&mut self) {
        self.store.set(self.config.initial_bias);
        self.last_outcome = Outcome::Win;
        self.tunes = 0;
    }
}
