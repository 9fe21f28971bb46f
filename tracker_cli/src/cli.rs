//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Failures the CLI classifies for exit codes and help text.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("hardware init failed: {0}")]
    HardwareInit(String),
}

#[derive(Parser, Debug)]
#[command(name = "tracker", version, about = "Single-axis solar tracker controller")]
pub struct Cli {
    /// Path to config TOML; built-in defaults are used when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Optional sensor calibration CSV (header: mount_angle_deg,calibrated_max)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop and answer status requests read from stdin
    Run {
        /// Stop when stdin closes instead of waiting for Ctrl-C
        #[arg(long, action = ArgAction::SetTrue)]
        exit_on_eof: bool,
        /// Pin the control thread to this CPU (Linux only); overrides [rt].control_cpu
        #[arg(long, value_name = "CPU")]
        cpu: Option<usize>,
    },
    /// Step the controller against the simulated rig without real-time pacing
    Simulate(SimulateArgs),
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Number of control ticks to run
    #[arg(long, default_value_t = 200)]
    pub ticks: u32,
    /// Starting sun angle in degrees
    #[arg(long, value_name = "DEG", default_value_t = 60.0, allow_negative_numbers = true)]
    pub sun: f32,
    /// Sun motion per tick in millidegrees
    #[arg(long, value_name = "MDEG", default_value_t = 0, allow_negative_numbers = true)]
    pub sweep: i32,
    /// Control query applied before the first tick, e.g. "mode=manual&angle=45" (repeatable)
    #[arg(long = "control", value_name = "QUERY")]
    pub control: Vec<String>,
    /// Print a status line every N ticks (0: final status only)
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub every: u32,
    /// Also print the voltage history after the final status
    #[arg(long, action = ArgAction::SetTrue)]
    pub history: bool,
    /// Also print a text gauge of the final angle
    #[arg(long, action = ArgAction::SetTrue)]
    pub gauge: bool,
}
