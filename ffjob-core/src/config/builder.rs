// ============================================================================
// ffjob-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for JobConfig
//
// Fluent construction of JobConfig. Unset fields keep the defaults from
// JobConfig::default(); validation stays in JobConfig::validate so that a
// config assembled by hand is checked the same way.

// ---- Standard library imports ----
use std::path::PathBuf;
use std::time::Duration;

// ---- Internal crate imports ----
use super::JobConfig;

/// Builder for creating JobConfig instances.
#[derive(Debug, Clone, Default)]
pub struct JobConfigBuilder {
    config: JobConfig,
}

impl JobConfigBuilder {
    /// Creates a builder seeded with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the encoder executable.
    pub fn ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ffmpeg_path = path.into();
        self
    }

    /// Sets the probe executable.
    pub fn ffprobe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ffprobe_path = path.into();
        self
    }

    /// Sets how often the supervisor re-checks the encoder and the
    /// cancellation token.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Sets the percent complete below which ETAs are reported as unstable.
    pub fn min_eta_percent(mut self, percent: f64) -> Self {
        self.config.min_eta_percent = percent;
        self
    }

    /// Builds the JobConfig instance.
    pub fn build(self) -> JobConfig {
        self.config
    }
}
