//! FFprobe integration for discovering the total duration of a media file.
//!
//! The job supervisor needs the container duration up front to turn the
//! encoder's elapsed media time into a percentage. This module runs
//! `ffprobe -v quiet -print_format json -show_format <input>` once and reads
//! `format.duration` from the result.
use crate::error::{CoreError, CoreResult};
use crate::utils::render_command;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Something that can report the total duration of a media file.
pub trait DurationProbe {
    /// Returns the container-level duration of `input_path`.
    fn probe_duration(&self, input_path: &Path) -> CoreResult<Duration>;
}

/// [`DurationProbe`] backed by the `ffprobe` executable.
#[derive(Debug, Clone)]
pub struct FfprobeDurationProbe {
    ffprobe_path: PathBuf,
}

impl FfprobeDurationProbe {
    /// Creates a probe that runs the given ffprobe executable.
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

impl Default for FfprobeDurationProbe {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FFPROBE_PATH)
    }
}

impl DurationProbe for FfprobeDurationProbe {
    fn probe_duration(&self, input_path: &Path) -> CoreResult<Duration> {
        let args = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
            input_path.to_string_lossy().into_owned(),
        ];
        let program = self.ffprobe_path.to_string_lossy();
        log::debug!("Running ffprobe: {}", render_command(&program, &args));

        let output = Command::new(&self.ffprobe_path)
            .args(&args)
            .output()
            .map_err(|e| CoreError::ProbeLaunch {
                path: input_path.to_path_buf(),
                message: format!("failed to start {program}: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::error!(
                "ffprobe failed for {} ({}): {}",
                input_path.display(),
                output.status,
                stderr.trim()
            );
            return Err(CoreError::ProbeLaunch {
                path: input_path.to_path_buf(),
                message: format!("{program} exited with {}: {}", output.status, stderr.trim()),
            });
        }

        let duration = parse_probe_output(input_path, &output.stdout)?;
        log::debug!(
            "Probed duration of {}: {:.3}s",
            input_path.display(),
            duration.as_secs_f64()
        );
        Ok(duration)
    }
}

/// A probe that always reports the same duration.
///
/// Useful when the caller already knows the duration, and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedDuration(pub Duration);

impl DurationProbe for FixedDuration {
    fn probe_duration(&self, _input_path: &Path) -> CoreResult<Duration> {
        Ok(self.0)
    }
}

/// Extracts `format.duration` from raw ffprobe JSON output.
///
/// Only output that is not JSON at all is a [`CoreError::ProbeParse`].
/// Well-formed JSON without a usable `format.duration` is a
/// [`CoreError::ProbeField`].
pub fn parse_probe_output(input_path: &Path, stdout: &[u8]) -> CoreResult<Duration> {
    let parsed: Value = serde_json::from_slice(stdout).map_err(|e| CoreError::ProbeParse {
        path: input_path.to_path_buf(),
        source: e,
    })?;

    let field_error = |message: String| CoreError::ProbeField {
        path: input_path.to_path_buf(),
        message,
    };

    let format = match parsed.get("format") {
        Some(Value::Object(format)) => format,
        Some(other) => return Err(field_error(format!("'format' is not an object: {other}"))),
        None => return Err(field_error("missing 'format' object".to_string())),
    };
    let seconds = match format.get("duration") {
        Some(Value::String(raw)) => raw
            .trim()
            .parse::<f64>()
            .map_err(|e| field_error(format!("duration '{raw}' is not a number: {e}")))?,
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| field_error(format!("duration {number} is not representable")))?,
        Some(Value::Null) | None => {
            return Err(field_error("missing 'format.duration'".to_string()));
        }
        Some(other) => {
            return Err(field_error(format!("duration {other} is not a number")));
        }
    };

    Duration::try_from_secs_f64(seconds)
        .map_err(|e| field_error(format!("duration {seconds} is out of range: {e}")))
}
