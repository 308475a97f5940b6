//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{DB_PATH, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_USER_AGENT};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line options.
///
/// The batch itself (targets, pacing, output options, credentials) comes from the
/// JSON input file; these flags only control where results go and how the process
/// behaves.
///
/// # Examples
///
/// ```bash
/// # Basic usage
/// profile_harvest input.json
///
/// # Read the input from stdin and write the report into a directory
/// cat input.json | profile_harvest - --report-dir ./reports
///
/// # Override the input's pacing
/// profile_harvest input.json --delay-ms 5000
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "profile_harvest",
    version,
    about = "Collects structured profile data for a list of URLs, one at a time."
)]
pub struct Cli {
    /// JSON input file (use '-' for stdin)
    #[arg(value_parser)]
    pub input: PathBuf,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Database path (SQLite file) holding the dataset and run history
    #[arg(long, value_parser, default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Store the report in this directory instead of the database
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// Delay between targets in milliseconds (overrides the input file)
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}
