//! Implementation of the 'encode' subcommand.
//!
//! Builds a job from the command line, renders its events on a separate
//! thread while the encoder runs, and reports the result.

use anyhow::{Context, Result, anyhow};
use ffjob_core::{CancellationToken, Job, format_bytes, format_duration};
use log::{debug, info, warn};
use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use crate::cli::EncodeArgs;
use crate::progress::{ProgressView, consume_events};
use crate::signals::spawn_signal_listener;

pub fn run_encode(args: &EncodeArgs) -> Result<()> {
    let total_start_time = Instant::now();

    let config = args.job_config();
    config.validate()?;

    let token = match args.timeout {
        Some(secs) => CancellationToken::with_timeout(Duration::from_secs(secs)),
        None => CancellationToken::new(),
    };
    spawn_signal_listener(token.clone()).context("installing signal handlers")?;

    let mut job = Job::new(
        &config,
        &args.input_path,
        &args.output_path,
        &args.encoder_args,
        token,
    )
    .with_context(|| format!("preparing job for {}", args.input_path.display()))?;

    info!(
        "Encoding {} -> {} ({} of media)",
        job.input_path().display(),
        job.output_path().display(),
        format_duration(job.total_duration())
    );
    debug!("Encoder arguments: {:?}", job.args());

    let view = if args.json {
        ProgressView::json()
    } else {
        ProgressView::bar()
    };
    let events = job.events();
    let consumer = thread::spawn(move || consume_events(events, view));

    let result = job.start();
    let summary = consumer
        .join()
        .map_err(|_| anyhow!("progress display thread panicked"))?;
    debug!(
        "Job events: {} progress records, {} parse errors, done={:?}",
        summary.records, summary.parse_errors, summary.done
    );

    result.with_context(|| format!("encoding {}", args.input_path.display()))?;

    if summary.parse_errors > 0 {
        warn!(
            "{} encoder status lines could not be read",
            summary.parse_errors
        );
    }
    let output_size = fs::metadata(&args.output_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown size".to_string());
    info!(
        "Finished {} ({}) in {}",
        args.output_path.display(),
        output_size,
        format_duration(total_start_time.elapsed())
    );
    Ok(())
}
