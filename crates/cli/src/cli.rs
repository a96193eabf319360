//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Sensors Proxy - multi-HAL event post-processing
#[derive(Parser, Debug)]
#[command(
    name = "sensors-proxy",
    author,
    version,
    about = "Sensors multi-HAL event post-processing",
    long_about = "Loads a sub-HAL layout, filters and re-tags events coming out of each \n\
                  sub-HAL, enforces the wake lock contract and delivers the resulting \n\
                  batches to the configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        global = true,
        env = "SENSORS_PROXY_VERBOSE"
    )]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SENSORS_PROXY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay recorded sub-HAL batches through the event path
    Replay(ReplayArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `replay` command
#[derive(Parser, Debug, Clone)]
pub struct ReplayArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "proxy.toml",
        env = "SENSORS_PROXY_CONFIG"
    )]
    pub config: PathBuf,

    /// JSON file with recorded batches: `[{"sub_hal": "<name>", "events": [...]}]`
    #[arg(short, long, env = "SENSORS_PROXY_EVENTS")]
    pub events: PathBuf,

    /// What to do when a batch breaks the wake lock contract
    #[arg(
        long,
        value_enum,
        default_value = "abort",
        env = "SENSORS_PROXY_INVARIANT_MODE"
    )]
    pub invariant_mode: InvariantModeArg,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SENSORS_PROXY_METRICS_PORT")]
    pub metrics_port: u16,

    /// Disable the AOD light-mode side effect
    #[arg(long)]
    pub no_aod: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "proxy.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "proxy.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed sensor information
    #[arg(long)]
    pub sensors: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Wake lock invariant handling
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InvariantModeArg {
    /// Abort the process
    #[default]
    Abort,
    /// Report the violation and keep replaying
    Report,
}

impl From<InvariantModeArg> for dispatcher::InvariantMode {
    fn from(mode: InvariantModeArg) -> Self {
        match mode {
            InvariantModeArg::Abort => Self::Abort,
            InvariantModeArg::Report => Self::Report,
        }
    }
}
