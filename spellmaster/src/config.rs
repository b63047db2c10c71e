//! Harness configuration
//!
//! All values are static for the lifetime of a controller. Sources are
//! layered: defaults, then an optional TOML file, then `SPELLMASTER_*`
//! environment variables. The CLI applies its own flags on top.

use crate::error::{ConfigError, HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pressure controller tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Bias at construction and after reset
    pub initial_bias: f64,
    /// Fixed nudge applied per outcome
    pub step: f64,
    /// Lower clamp
    pub min_bias: f64,
    /// Upper clamp
    pub max_bias: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            initial_bias: 50.0,
            step: 0.2,
            min_bias: 0.0,
            max_bias: 99.9,
        }
    }
}

impl ControllerConfig {
    /// Check `step > 0` and `min <= initial <= max`, all finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("initial_bias", self.initial_bias),
            ("step", self.step),
            ("min_bias", self.min_bias),
            ("max_bias", self.max_bias),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }
        if self.step <= 0.0 {
            return Err(ConfigError::NonPositiveStep { step: self.step });
        }
        if self.min_bias > self.max_bias {
            return Err(ConfigError::InvertedBounds {
                min: self.min_bias,
                max: self.max_bias,
            });
        }
        if self.initial_bias < self.min_bias || self.initial_bias > self.max_bias {
            return Err(ConfigError::InitialOutOfBounds {
                initial: self.initial_bias,
                min: self.min_bias,
                max: self.max_bias,
            });
        }
        Ok(())
    }
}

/// Escalation timing and level cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Minimum spacing between ticks while the trigger is held
    pub tick_interval_ms: u64,
    /// Level ceiling
    pub max_level: u32,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            max_level: 999,
        }
    }
}

impl EscalationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.max_level < 1 {
            return Err(ConfigError::ZeroMaxLevel);
        }
        Ok(())
    }

    /// Interval as milliseconds on the clock's scale
    pub fn tick_interval(&self) -> f64 {
        self.tick_interval_ms as f64
    }
}

/// Which keys drive the harness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Held to escalate
    pub trigger_key: char,
    /// Pressed to reset all counters
    pub reset_key: char,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            trigger_key: '3',
            reset_key: '0',
        }
    }
}

impl TriggerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trigger_key == self.reset_key {
            return Err(ConfigError::KeyCollision {
                key: self.trigger_key,
            });
        }
        Ok(())
    }
}

/// Toggles for the feedback collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Emit a tone cue per escalation
    pub sounds: bool,
    /// Emit a flash cue per escalation
    pub visuals: bool,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            sounds: true,
            visuals: true,
        }
    }
}

/// Complete harness configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub trigger: TriggerConfig,
    pub escalation: EscalationConfig,
    pub controller: ControllerConfig,
    pub presentation: PresentationConfig,
}

impl HarnessConfig {
    /// Validate every section; the first violation wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.trigger.validate()?;
        self.escalation.validate()?;
        self.controller.validate()?;
        Ok(())
    }

    /// Parse a TOML document. Missing sections and fields keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Load a TOML file.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| HarnessError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| HarnessError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `SPELLMASTER_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Unparseable values are errors rather than being skipped.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SPELLMASTER_TRIGGER_KEY") {
            self.trigger.trigger_key = parse_key("SPELLMASTER_TRIGGER_KEY", &v)?;
        }
        if let Some(v) = lookup("SPELLMASTER_RESET_KEY") {
            self.trigger.reset_key = parse_key("SPELLMASTER_RESET_KEY", &v)?;
        }
        if let Some(v) = lookup("SPELLMASTER_TICK_INTERVAL_MS") {
            self.escalation.tick_interval_ms = parse_value("SPELLMASTER_TICK_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("SPELLMASTER_MAX_LEVEL") {
            self.escalation.max_level = parse_value("SPELLMASTER_MAX_LEVEL", &v)?;
        }
        if let Some(v) = lookup("SPELLMASTER_INITIAL_BIAS") {
            self.controller.initial_bias = parse_value("SPELLMASTER_INITIAL_BIAS", &v)?;
        }
        if let Some(v) = lookup("SPELLMASTER_STEP") {
            self.controller.step = parse_value("SPELLMASTER_STEP", &v)?;
        }
        if let Some(v) = lookup("SPELLMASTER_MIN_BIAS") {
            self.controller.min_bias = parse_value("SPELLMASTER_MIN_BIAS", &v)?;
        }
        if let Some(v) = lookup("SPELLMASTER_MAX_BIAS") {
            self.controller.max_bias = parse_value("SPELLMASTER_MAX_BIAS", &v)?;
        }
        if let Some(v) = lookup("SPELLMASTER_SOUNDS") {
            self.presentation.sounds = parse_flag("SPELLMASTER_SOUNDS", &v)?;
        }
        if let Some(v) = lookup("SPELLMASTER_VISUALS") {
            self.presentation.visuals = parse_flag("SPELLMASTER_VISUALS", &v)?;
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::BadEnvValue {
        var,
        value: raw.to_string(),
    })
}

fn parse_key(var: &'static str, raw: &str) -> Result<char, ConfigError> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::BadEnvValue {
            var,
            value: raw.to_string(),
        }),
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::BadEnvValue {
            var,
            value: raw.to_string(),
        }),
    }
}
