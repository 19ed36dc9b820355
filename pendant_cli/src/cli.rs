//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "pendant", version, about = "Jogwheel pendant joystick emulator")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/pendant.toml")]
    pub config: PathBuf,

    /// Log and report as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

/// Speed switch position for a scripted crank.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SimSpeed {
    X1,
    X10,
    X100,
    /// Adaptive enable on, X100 detent closed
    Adaptive,
}

impl SimSpeed {
    /// Index of the detent switch to close.
    pub fn detent_index(self) -> usize {
        match self {
            SimSpeed::X1 => 0,
            SimSpeed::X10 => 1,
            SimSpeed::X100 | SimSpeed::Adaptive => 2,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Emulate the joystick until Ctrl-C, then center every axis
    Run {
        /// Print cycle, tick and bus counters on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
        /// Enable real-time mode (SCHED_FIFO, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux.\n\nAttempts SCHED_FIFO priority for the control loop and locks the process address space into RAM with mlockall. This reduces page faults and wake-up jitter but may require elevated privileges or ulimits (e.g., memlock). Ignored on other OSes."
        )]
        rt: bool,
        /// Real-time priority for SCHED_FIFO (1..=max)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Memory locking mode for --rt: none, current, or all
        #[arg(long, value_enum, value_name = "MODE", default_value = "current")]
        rt_lock: RtLock,
    },
    /// Crank the jogwheel against simulated hardware and print every bus write
    Simulate {
        /// Axis selector position
        #[arg(long, value_name = "AXIS", default_value = "x")]
        axis: pendant_core::Axis,
        /// Speed selector position
        #[arg(long, value_enum, default_value = "x1")]
        speed: SimSpeed,
        /// Number of detent clicks to turn
        #[arg(long, default_value_t = 1)]
        ticks: u32,
        /// Clicks per second
        #[arg(long = "rate-hz", value_name = "HZ", default_value_t = 5.0)]
        rate_hz: f32,
        /// Turn counter-clockwise
        #[arg(long, action = ArgAction::SetTrue)]
        reverse: bool,
    },
    /// Validate config, open the backend and center every axis
    SelfCheck,
}
