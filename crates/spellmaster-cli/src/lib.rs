//! Terminal host for the spellmaster escalation harness
//!
//! Supplies the collaborators the core leaves to its host: a HUD, feedback
//! cues, a JSONL telemetry log, layered configuration, and the session
//! loops that feed key edges and scheduling opportunities into the
//! controller.

pub mod cues;
pub mod hud;
pub mod session;
pub mod settings;
pub mod telemetry_log;

pub use session::{
    outcome_generator, parse_line, run_session, simulate, simulate_with, LineCommand,
    SessionError, SessionOptions, SessionSummary, SimulationPlan,
};
pub use settings::{load_config, load_config_with, Overrides};
