//! Configuration structures and constants for the ffjob-core library.
//!
//! A [`JobConfig`] tells a [`crate::Job`] which executables to run and how the
//! supervisor behaves while the encoder is running.

mod builder;

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CoreError, CoreResult};

pub use builder::JobConfigBuilder;

/// Default encoder executable, resolved through `PATH`.
pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";

/// Default probe executable, resolved through `PATH`.
pub const DEFAULT_FFPROBE_PATH: &str = "ffprobe";

/// How often the supervisor checks the cancellation token while the encoder
/// is running. Cancellation itself wakes the supervisor immediately; this
/// bounds how late a process exit is noticed.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Below this percentage the time-remaining projection is reported as
/// unstable instead of being extrapolated from a near-zero denominator.
pub const DEFAULT_MIN_ETA_PERCENT: f64 = 1.0;

/// Configuration shared by every job.
///
/// All fields have defaults, so `JobConfig::default()` runs `ffmpeg` and
/// `ffprobe` from `PATH`.
///
/// # Examples
///
/// ```rust
/// use ffjob_core::config::JobConfigBuilder;
/// use std::time::Duration;
///
/// let config = JobConfigBuilder::new()
///     .ffmpeg_path("/opt/ffmpeg/bin/ffmpeg")
///     .ffprobe_path("/opt/ffmpeg/bin/ffprobe")
///     .poll_interval(Duration::from_millis(50))
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Encoder executable
    pub ffmpeg_path: PathBuf,

    /// Metadata probe executable
    pub ffprobe_path: PathBuf,

    /// Supervisor polling interval while waiting on the encoder
    pub poll_interval: Duration,

    /// Minimum percent complete before an ETA is projected
    pub min_eta_percent: f64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG_PATH),
            ffprobe_path: PathBuf::from(DEFAULT_FFPROBE_PATH),
            poll_interval: DEFAULT_POLL_INTERVAL,
            min_eta_percent: DEFAULT_MIN_ETA_PERCENT,
        }
    }
}

impl JobConfig {
    /// Checks that the configuration can be used to run a job.
    pub fn validate(&self) -> CoreResult<()> {
        if self.ffmpeg_path.as_os_str().is_empty() {
            return Err(CoreError::Validation(
                "ffmpeg path must not be empty".to_string(),
            ));
        }
        if self.ffprobe_path.as_os_str().is_empty() {
            return Err(CoreError::Validation(
                "ffprobe path must not be empty".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(CoreError::Validation(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if !(0.0..100.0).contains(&self.min_eta_percent) {
            return Err(CoreError::Validation(format!(
                "minimum ETA percent must be in [0, 100), got {}",
                self.min_eta_percent
            )));
        }
        Ok(())
    }
}
