//! Throttled progress logging.
//!
//! The encoder reports several times a second, far too often for a log file.
//! [`MilestoneLogger`] writes one `info` line per 10% step, plus a heartbeat
//! every five minutes so long encodes stay visible.

use std::time::{Duration, Instant};

use super::ProgressRecord;
use crate::utils::format_duration;

/// Log target used for milestone lines.
pub const PROGRESS_LOG_TARGET: &str = "ffjob::progress";

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug)]
pub struct MilestoneLogger {
    total_duration: Duration,
    last_threshold: i32,
    last_log_time: Instant,
}

impl MilestoneLogger {
    pub fn new(total_duration: Duration) -> Self {
        Self {
            total_duration,
            last_threshold: -1,
            last_log_time: Instant::now(),
        }
    }

    /// Logs `record` if it crosses a new 10% step. Returns whether it logged.
    pub fn observe(&mut self, record: &ProgressRecord) -> bool {
        let percent = record.percent_complete;
        let threshold = (percent as i32 / 10) * 10;
        let should_log = threshold > self.last_threshold
            || (percent >= 100.0 && self.last_threshold < 100)
            || self.last_log_time.elapsed() >= HEARTBEAT_INTERVAL;

        if !should_log {
            return false;
        }

        let eta = record
            .time_remaining()
            .map(format_duration)
            .unwrap_or_else(|| "--:--:--".to_string());
        log::info!(
            target: PROGRESS_LOG_TARGET,
            "Encoding progress: {:.1}% complete | Time: {} / {} | Speed: {:.2}x | FPS: {:.1} | ETA: {}",
            percent,
            format_duration(record.elapsed),
            format_duration(self.total_duration),
            record.speed,
            record.fps,
            eta
        );

        self.last_threshold = self.last_threshold.max(threshold);
        self.last_log_time = Instant::now();
        true
    }
}
