// ============================================================================
// ffjob-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: terminal or file
//
// Without --log-file the CLI logs through env_logger, honouring RUST_LOG:
// - RUST_LOG=info (default): normal operation logs
// - RUST_LOG=debug: command lines and job state transitions
// - RUST_LOG=trace: raw encoder output as well
//
// With --log-file everything goes to that file through log4rs instead.

use anyhow::Result;
use env_logger::Env;
use log::LevelFilter;
use std::path::Path;

/// Target of the core library's per-decile progress lines.
const PROGRESS_TARGET: &str = "ffjob::progress";

pub fn init_logging(log_file: Option<&Path>, verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    if let Some(path) = log_file {
        ffjob_core::file_logging::setup_file_logging(path, level)?;
        log::debug!("Logging to {}", path.display());
        return Ok(());
    }

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(level.as_str()));
    // The progress bar already shows these on the terminal.
    if !verbose {
        builder.filter_module(PROGRESS_TARGET, LevelFilter::Warn);
    }
    builder.format_timestamp(None).init();
    Ok(())
}

