//! Structured encoder progress.
//!
//! Every telemetry line the encoder writes to stderr becomes at most one
//! [`ProgressRecord`]. Records are plain values: the reader thread builds a
//! fresh one per line and moves it to whoever receives it from the job's
//! progress channel.

pub mod milestones;
pub mod parser;

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::DEFAULT_MIN_ETA_PERCENT;
use crate::utils::format_duration;

pub use milestones::MilestoneLogger;
pub use parser::{parse_progress_line, parse_progress_line_at};

/// Completion estimate derived from wall-clock time and percent complete.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Eta {
    /// Too little of the input has been encoded to extrapolate.
    Unstable,
    /// Linear projection from the time spent so far.
    Projected {
        remaining: Duration,
        finish: DateTime<Local>,
    },
}

impl Eta {
    /// Time remaining, if it can be projected.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Eta::Unstable => None,
            Eta::Projected { remaining, .. } => Some(*remaining),
        }
    }

    /// Estimated finish timestamp, if it can be projected.
    pub fn finish(&self) -> Option<DateTime<Local>> {
        match self {
            Eta::Unstable => None,
            Eta::Projected { finish, .. } => Some(*finish),
        }
    }
}

/// One parsed telemetry line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressRecord {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Frames encoded so far
    pub frame: u64,
    /// Instantaneous encoding rate
    pub fps: f64,
    /// Encoder quality metric (`q=`)
    pub quality: f64,
    /// Output size so far, in KiB
    pub size_kib: f64,
    /// Position in the input media
    pub elapsed: Duration,
    /// Output bitrate in kbit/s
    pub bitrate_kbps: f64,
    pub duplicate_frames: u64,
    pub dropped_frames: u64,
    /// Encoding speed as a multiple of real time
    pub speed: f64,
    /// 0 to 100. Recomputed per line, so it may move backwards.
    pub percent_complete: f64,
    pub eta: Eta,
}

impl ProgressRecord {
    pub fn time_remaining(&self) -> Option<Duration> {
        self.eta.remaining()
    }

    pub fn estimated_finish(&self) -> Option<DateTime<Local>> {
        self.eta.finish()
    }
}

impl fmt::Display for ProgressRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}% complete - ", self.percent_complete)?;
        match self.eta {
            Eta::Unstable => write!(f, "time remaining: estimating..."),
            Eta::Projected { remaining, finish } => write!(
                f,
                "time remaining: {} - estimated finish: {}",
                format_duration(remaining),
                finish.format("%H:%M:%S")
            ),
        }
    }
}

/// Everything the parser needs besides the line itself.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Total media duration reported by the probe
    pub total_duration: Duration,
    /// When the encoder was started
    pub started_at: DateTime<Local>,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Percent complete below which the ETA is [`Eta::Unstable`]
    pub min_eta_percent: f64,
}

impl ParseContext {
    pub fn new(
        total_duration: Duration,
        started_at: DateTime<Local>,
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            total_duration,
            started_at,
            input_path: input_path.into(),
            output_path: output_path.into(),
            min_eta_percent: DEFAULT_MIN_ETA_PERCENT,
        }
    }

    pub fn with_min_eta_percent(mut self, percent: f64) -> Self {
        self.min_eta_percent = percent;
        self
    }
}
