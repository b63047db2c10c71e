//! Harness error types
//!
//! The escalation core is total over well-formed input, so the error surface
//! is small: configuration that fails validation at construction time, and
//! a randomness source that cannot produce a value.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Top-level error for the harness
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The randomness source could not produce a value
    #[error("Randomness source failed: {0}")]
    Randomness(#[from] RandomnessError),

    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for [`crate::config::HarnessConfig`]
    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl HarnessError {
    /// Machine-readable error code for logs and exit reporting
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "INVALID_CONFIG",
            Self::Randomness(_) => "RANDOMNESS_UNAVAILABLE",
            Self::ConfigRead { .. } => "CONFIG_READ_FAILED",
            Self::ConfigParse { .. } => "CONFIG_PARSE_FAILED",
        }
    }
}

/// A configuration value that violates a construction-time invariant.
///
/// Bad configuration is never clamped into range; it is rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("step must be > 0, got {step}")]
    NonPositiveStep { step: f64 },

    #[error("min_bias ({min}) must not exceed max_bias ({max})")]
    InvertedBounds { min: f64, max: f64 },

    #[error("initial_bias ({initial}) must lie within [{min}, {max}]")]
    InitialOutOfBounds { initial: f64, min: f64, max: f64 },

    #[error("tick_interval_ms must be > 0")]
    ZeroTickInterval,

    #[error("max_level must be >= 1")]
    ZeroMaxLevel,

    #[error("trigger key and reset key must differ (both '{key}')")]
    KeyCollision { key: char },

    #[error("{var}: cannot parse {value:?}")]
    BadEnvValue { var: &'static str, value: String },
}

/// Failure of the entropy source behind the outcome generator
#[derive(Error, Debug)]
pub enum RandomnessError {
    /// Operating system entropy could not be read
    #[error("entropy unavailable: {0}")]
    Unavailable(String),

    /// Source produced a value outside `[0, 1)`
    #[error("uniform sample {0} outside [0, 1)")]
    OutOfRange(f64),

    /// A finite source ran dry
    #[error("randomness source exhausted")]
    Exhausted,
}
