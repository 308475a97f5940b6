//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `profile_harvest` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use profile_harvest::initialization::{init_logger_to_file, init_logger_with};
use profile_harvest::{format_summary_line, run_batch, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Try the current directory first, then next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();

    let log_level = cli.log_level.clone();
    let log_format = cli.log_format.clone();
    match &cli.log_file {
        Some(path) => init_logger_to_file(log_level.into(), log_format, path),
        None => init_logger_with(log_level.into(), log_format),
    }
    .context("Failed to initialize logger")?;

    match run_batch(&cli).await {
        Ok(report) => {
            println!(
                "{}",
                format_summary_line(&report.summary, report.elapsed_seconds)
            );
            match (&report.summary.report_file_name, &report.report_dir) {
                (Some(name), Some(dir)) => {
                    println!("Report '{}' written to {}", name, dir.display())
                }
                (Some(name), None) => println!(
                    "Report stored as '{}' in {}",
                    name,
                    report.db_path.display()
                ),
                _ => {}
            }
            println!(
                "Results saved in {} (run {})",
                report.db_path.display(),
                report.run_id
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("profile_harvest error: {:#}", e);
            process::exit(1);
        }
    }
}
