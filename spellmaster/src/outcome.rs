//! Outcome Generator: synthetic Win/Loss draws biased by the current pressure
//!
//! Each draw takes one uniform value `u ∈ [0, 1)`, scales it to
//! `r = 100·u` and reports `Win` when `r < bias`. The sequence has no seed
//! and cannot be replayed; every call advances the underlying source.
//!
//! Outcomes only feed the pressure controller. Escalation never waits on,
//! or is blocked by, a `Loss`.

use crate::error::RandomnessError;
use rand::{Rng, TryRngCore};
use serde::{Deserialize, Serialize};

/// One synthetic coin result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn is_win(self) -> bool {
        matches!(self, Self::Win)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Win => write!(f, "win"),
            Self::Loss => write!(f, "loss"),
        }
    }
}

/// A source of uniform values in `[0, 1)`.
pub trait RandomSource {
    fn uniform(&mut self) -> Result<f64, RandomnessError>;
}

/// Thread-local generator; cannot fail.
pub struct ThreadRandom {
    rng: rand::rngs::ThreadRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn uniform(&mut self) -> Result<f64, RandomnessError> {
        Ok(self.rng.random::<f64>())
    }
}

/// Reads every draw straight from operating-system entropy.
///
/// Surfaces entropy failures instead of falling back to anything weaker.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn uniform(&mut self) -> Result<f64, RandomnessError> {
        let bits = rand::rngs::OsRng
            .try_next_u64()
            .map_err(|e| RandomnessError::Unavailable(e.to_string()))?;
        // 53 high bits -> [0, 1)
        Ok((bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64))
    }
}

/// Lazily draws biased outcomes from a [`RandomSource`].
pub struct OutcomeGenerator {
    source: Box<dyn RandomSource>,
    draws: u64,
}

impl OutcomeGenerator {
    pub fn new(source: Box<dyn RandomSource>) -> Self {
        Self { source, draws: 0 }
    }

    /// Generator backed by [`ThreadRandom`]
    pub fn thread_local() -> Self {
        Self::new(Box::new(ThreadRandom::new()))
    }

    /// Draw one outcome. `bias` is on the 0–100 scale and must be read by
    /// the caller at the moment of the draw.
    pub fn sample(&mut self, bias: f64) -> Result<Outcome, RandomnessError> {
        let u = self.source.uniform()?;
        if !(0.0..1.0).contains(&u) {
            return Err(RandomnessError::OutOfRange(u));
        }
        self.draws += 1;
        let r = u * 100.0;
        Ok(if r < bias { Outcome::Win } else { Outcome::Loss })
    }

    /// Successful draws so far
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl std::fmt::Debug for OutcomeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeGenerator")
            .field("draws", &self.draws)
            .finish_non_exhaustive()
    }
}
