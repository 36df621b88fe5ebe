//! Implementation of the 'probe' subcommand.

use anyhow::{Context, Result};
use ffjob_core::{DurationProbe, FfprobeDurationProbe, format_duration};
use serde_json::json;

use crate::cli::ProbeArgs;

pub fn run_probe(args: &ProbeArgs) -> Result<()> {
    let probe = FfprobeDurationProbe::new(&args.ffprobe);
    let duration = probe
        .probe_duration(&args.input_path)
        .with_context(|| format!("probing {}", args.input_path.display()))?;

    if args.json {
        println!(
            "{}",
            json!({
                "input": args.input_path.display().to_string(),
                "duration_secs": duration.as_secs_f64(),
            })
        );
    } else {
        println!(
            "{}: {} ({:.3}s)",
            args.input_path.display(),
            format_duration(duration),
            duration.as_secs_f64()
        );
    }
    Ok(())
}
