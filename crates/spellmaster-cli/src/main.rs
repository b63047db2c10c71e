//! spellmaster-cli
//!
//! Drives the escalation harness from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Interactive: type `down 3`, `up 3`, `press 0`, `quit`
//! spellmaster-cli run
//!
//! # Hold for 500 ms at 60 Hz and print the final state
//! spellmaster-cli simulate --hold-ms 500
//!
//! # Layered configuration
//! SPELLMASTER_TICK_INTERVAL_MS=50 spellmaster-cli --config harness.toml --no-sounds run
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spellmaster::{NullSink, TelemetrySink};
use spellmaster_cli::session::DEFAULT_FRAME_MS;
use spellmaster_cli::telemetry_log::JsonlSink;
use spellmaster_cli::{
    load_config, outcome_generator, run_session, simulate_with, Overrides, SessionOptions,
    SimulationPlan,
};
use tokio::io::BufReader;
use tracing::info;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimum milliseconds between escalation ticks (overrides SPELLMASTER_TICK_INTERVAL_MS)
    #[arg(long, global = true)]
    tick_interval_ms: Option<u64>,

    /// Level cap (overrides SPELLMASTER_MAX_LEVEL)
    #[arg(long, global = true)]
    max_level: Option<u32>,

    /// Disable tone cues
    #[arg(long, global = true, default_value_t = false)]
    no_sounds: bool,

    /// Disable flash cues
    #[arg(long, global = true, default_value_t = false)]
    no_visuals: bool,

    /// Append every snapshot to this JSONL file
    #[arg(long, global = true)]
    telemetry_log: Option<PathBuf>,

    /// Plain HUD without ANSI escapes
    #[arg(long, global = true, default_value_t = false)]
    no_color: bool,

    /// Draw outcomes from operating-system entropy; failures are fatal
    #[arg(long, global = true, default_value_t = false)]
    os_entropy: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive session reading key commands from stdin
    Run {
        /// Frame period in milliseconds
        #[arg(long, default_value_t = DEFAULT_FRAME_MS)]
        frame_ms: u64,
    },
    /// Hold the trigger for a fixed time on a synthetic clock
    Simulate {
        /// How long to hold the trigger
        #[arg(long)]
        hold_ms: f64,

        /// Polling period while held
        #[arg(long, default_value_t = DEFAULT_FRAME_MS as f64)]
        frame_ms: f64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let overrides = Overrides {
        tick_interval_ms: args.tick_interval_ms,
        max_level: args.max_level,
        no_sounds: args.no_sounds,
        no_visuals: args.no_visuals,
    };
    let config = load_config(args.config.as_deref(), &overrides)?;

    match args.command.unwrap_or(Command::Run {
        frame_ms: DEFAULT_FRAME_MS,
    }) {
        Command::Run { frame_ms } => {
            let options = SessionOptions {
                color: !args.no_color,
                telemetry_log: args.telemetry_log,
                frame_ms,
                os_entropy: args.os_entropy,
            };
            let input = BufReader::new(tokio::io::stdin());
            let summary = run_session(
                &config,
                &options,
                input,
                std::io::stdout(),
                std::io::stdout(),
            )
            .await
            .context("interactive session failed")?;
            info!(
                level = summary.snapshot.level,
                total = summary.snapshot.total_ticks,
                tones = summary.tones,
                flashes = summary.flashes,
                "Goodbye"
            );
        }
        Command::Simulate { hold_ms, frame_ms } => {
            let sink: Box<dyn TelemetrySink> = match args.telemetry_log {
                Some(path) => Box::new(JsonlSink::new(path)),
                None => Box::new(NullSink),
            };
            let plan = SimulationPlan { hold_ms, frame_ms };
            let snapshot = simulate_with(&config, plan, sink, outcome_generator(args.os_entropy))
                .context("simulation failed")?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}
