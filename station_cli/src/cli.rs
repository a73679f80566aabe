//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "station", version, about = "Field station CLI")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and print as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the station loop until Ctrl-C
    Run {
        /// Stop after this many milliseconds
        #[arg(long, value_name = "MS")]
        max_ms: Option<u64>,
        /// Arm a calibration cycle at start-up
        #[arg(long, action = ArgAction::SetTrue)]
        calibrate: bool,
    },
    /// Feed a recorded raw trace through the weight pipeline
    Replay {
        /// CSV file with a single `raw` column
        #[arg(long, value_name = "FILE")]
        trace: PathBuf,
        /// Arm a calibration cycle before the first sample
        #[arg(long, action = ArgAction::SetTrue)]
        calibrate: bool,
    },
    /// Scripted end-to-end visit against simulated devices
    Simulate {
        /// Weight placed on the platform (grams)
        #[arg(long, default_value_t = 450.0)]
        grams: f32,
        /// Tag the simulated reader reports
        #[arg(long, default_value = "0415ABCDEF012345")]
        tag: String,
        /// Registration queries the simulated network rejects first
        #[arg(long, value_name = "N", default_value_t = 1)]
        registration_delay: u32,
    },
    /// Validate the config file and exit
    CheckConfig,
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
}
