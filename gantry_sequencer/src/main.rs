//! # Gantry Sequencer Binary
//!
//! Brings up the configured axes, binds them into a gantry mechanism,
//! streams one circular move and tears everything down again.
//!
//! # Usage
//!
//! ```bash
//! # Built-in defaults against the simulation stack
//! gantry_sequencer
//!
//! # Explicit configuration, JSON report, verbose logging
//! gantry_sequencer --config config/gantry.toml --report run.json -v
//! ```
//!
//! # Exit Codes
//!
//! | Code | Meaning                                      |
//! |------|----------------------------------------------|
//! | 0    | Sequence and cleanup succeeded               |
//! | 1    | Sequence failed, or startup failed           |
//! | 2    | Sequence succeeded, cleanup failed           |

use clap::Parser;
use gantry_common::config::{ConfigLoader, LogLevel};
use gantry_hal::StackRegistry;
use gantry_sequencer::report::EXIT_FORWARD_FAILURE;
use gantry_sequencer::{MotionSequencer, SequencerConfig};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Gantry Sequencer - axis lifecycle and circular motion cycle
#[derive(Parser, Debug)]
#[command(name = "gantry_sequencer")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Runs one gantry motion cycle with guaranteed tear-down")]
#[command(long_about = None)]
struct Args {
    /// Path to the sequencer configuration (TOML). Built-in defaults when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Motion stack to run against
    #[arg(short, long, default_value = "simulation")]
    driver: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    /// Write the run report as JSON to this path
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Sequencer startup failed: {}", e);
            std::process::exit(EXIT_FORWARD_FAILURE);
        }
    }
}

fn run(args: &Args) -> Result<i32, Box<dyn std::error::Error>> {
    // Config is read before tracing so its log level applies; a load error
    // is reported once tracing is up.
    let loaded = match &args.config {
        Some(path) => SequencerConfig::load(path),
        None => Ok(SequencerConfig::default()),
    };
    let log_level = loaded
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(args, log_level);

    let config = loaded?;
    config.validate()?;
    info!(
        "Gantry Sequencer v{} starting ({})",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    let registry = StackRegistry::with_builtin();
    info!("Available motion stacks: {:?}", registry.list_stacks());
    let mut stack = registry.create_stack(&args.driver)?;

    let report = MotionSequencer::new(config).run(stack.as_mut());

    if let Some(path) = &args.report {
        std::fs::write(path, report.to_json()?)?;
        info!("Report written to {}", path.display());
    }
    Ok(report.exit_code())
}

/// Setup tracing subscriber from CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(configured.as_directive()))
    };

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
