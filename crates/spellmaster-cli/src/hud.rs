//! Terminal HUD
//!
//! Renders the harness panel after every snapshot:
//!
//! ```text
//! ┌ SPELLMASTER HARNESS ─────────────
//! │ Win Rate: 100.0% (Sim)
//! │ Pressure: 50.20%
//! │ Level: 2
//! │ Total: 1
//! └ [3] Hold to Escalate | [0] Reset
//! ```
//!
//! The pressure figure is coloured by band when colour is enabled. A flash
//! redraws the last panel in reverse video.

use std::fmt;
use std::io::Write;

use spellmaster::{HarnessSnapshot, TelemetrySink, TriggerConfig};
use tracing::warn;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const REVERSE: &str = "\x1b[7m";
const DIM: &str = "\x1b[2m";

/// Pressure bands, split at 40 and 75
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureBand {
    Low,
    Elevated,
    High,
}

impl PressureBand {
    pub fn of(bias: f64) -> Self {
        if bias > 75.0 {
            Self::High
        } else if bias > 40.0 {
            Self::Elevated
        } else {
            Self::Low
        }
    }

    /// ANSI foreground for the band
    pub fn ansi(self) -> &'static str {
        match self {
            Self::Low => "\x1b[32m",
            Self::Elevated => "\x1b[33m",
            Self::High => "\x1b[31m",
        }
    }
}

impl fmt::Display for PressureBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Elevated => write!(f, "elevated"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Format the panel for one snapshot. `color` enables ANSI escapes;
/// `flash` draws it in reverse video.
pub fn render_panel(
    snapshot: &HarnessSnapshot,
    keys: &TriggerConfig,
    color: bool,
    flash: bool,
) -> String {
    let band = PressureBand::of(snapshot.bias);
    let (bold, dim, reset, band_color) = if color {
        (BOLD, DIM, RESET, band.ansi())
    } else {
        ("", "", "", "")
    };
    let pressure = format!("{band_color}{:.2}%{reset}", snapshot.bias);

    let mut panel = format!(
        "┌ {bold}SPELLMASTER HARNESS{reset} ─────────────\n\
         │ Win Rate: 100.0% (Sim)\n\
         │ Pressure: {pressure}\n\
         │ Level: {}\n\
         │ Total: {}\n\
         └ {dim}[{}] Hold to Escalate | [{}] Reset{reset}\n",
        snapshot.level, snapshot.total_ticks, keys.trigger_key, keys.reset_key
    );
    if flash && color {
        panel = format!("{REVERSE}{panel}{RESET}");
    }
    panel
}

/// [`TelemetrySink`] drawing the panel to a writer
pub struct HudSink<W: Write> {
    out: W,
    keys: TriggerConfig,
    color: bool,
    last: Option<HarnessSnapshot>,
    frames: u64,
}

impl<W: Write> HudSink<W> {
    pub fn new(out: W, keys: TriggerConfig, color: bool) -> Self {
        Self {
            out,
            keys,
            color,
            last: None,
            frames: 0,
        }
    }

    /// Redraw the last panel highlighted. Does nothing before the first
    /// render.
    pub fn flash(&mut self) {
        if let Some(snapshot) = self.last {
            self.draw(&snapshot, true);
        }
    }

    /// Panels drawn so far, flashes included
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last(&self) -> Option<&HarnessSnapshot> {
        self.last.as_ref()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, snapshot: &HarnessSnapshot, flash: bool) {
        let panel = render_panel(snapshot, &self.keys, self.color, flash);
        let written = if self.color {
            // clear screen, cursor home
            write!(self.out, "\x1b[2J\x1b[H{panel}")
        } else {
            write!(self.out, "{panel}")
        };
        if let Err(e) = written.and_then(|_| self.out.flush()) {
            warn!("Failed to draw HUD: {e}");
            return;
        }
        self.frames += 1;
    }
}

impl<W: Write> TelemetrySink for HudSink<W> {
    fn render(&mut self, snapshot: &HarnessSnapshot) {
        self.last = Some(*snapshot);
        self.draw(snapshot, false);
    }
}
