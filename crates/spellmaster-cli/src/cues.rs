//! Feedback cues for escalation events
//!
//! Every escalation produces a short tone whose pitch rises with the level
//! (wrapping every 100 levels) and a brief screen flash. Either can be
//! switched off in the presentation config. The terminal renders a tone as
//! the bell character.

use std::io::Write;

use serde::Serialize;
use spellmaster::{HarnessEvent, PresentationConfig};
use tracing::{debug, warn};

pub const BASE_TONE_HZ: f64 = 800.0;
pub const TONE_STEP_HZ: f64 = 5.0;
pub const TONE_DURATION_MS: u64 = 60;
pub const TONE_VOLUME: f64 = 0.05;
/// Hold then fade
pub const FLASH_DURATION_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum FeedbackCue {
    Tone {
        hz: f64,
        duration_ms: u64,
        volume: f64,
    },
    Flash {
        duration_ms: u64,
    },
}

pub fn tone_for_level(level: u32) -> f64 {
    BASE_TONE_HZ + f64::from(level % 100) * TONE_STEP_HZ
}

/// Cues for one event. Only escalations make any.
pub fn cues_for(event: &HarnessEvent, presentation: &PresentationConfig) -> Vec<FeedbackCue> {
    let Some((level, _)) = event.escalation() else {
        return Vec::new();
    };
    let mut cues = Vec::with_capacity(2);
    if presentation.sounds {
        cues.push(FeedbackCue::Tone {
            hz: tone_for_level(level),
            duration_ms: TONE_DURATION_MS,
            volume: TONE_VOLUME,
        });
    }
    if presentation.visuals {
        cues.push(FeedbackCue::Flash {
            duration_ms: FLASH_DURATION_MS,
        });
    }
    cues
}

/// Rings the terminal bell for tones. Flashes are drawn by the HUD.
pub struct Bell<W: Write> {
    out: W,
    rung: u64,
}

impl<W: Write> Bell<W> {
    pub fn new(out: W) -> Self {
        Self { out, rung: 0 }
    }

    pub fn tone(&mut self, hz: f64, duration_ms: u64, volume: f64) {
        debug!(hz, duration_ms, volume, "Tone");
        if let Err(e) = self.out.write_all(b"\x07").and_then(|_| self.out.flush()) {
            warn!("Failed to ring bell: {e}");
            return;
        }
        self.rung += 1;
    }

    pub fn rung(&self) -> u64 {
        self.rung
    }
}
