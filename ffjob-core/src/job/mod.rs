//! Supervision of a single encoder process.
//!
//! A [`Job`] validates its paths and probes the input duration when it is
//! built, but does not spawn anything until [`Job::start`]. While it runs,
//! a background thread turns the encoder's stderr into [`ProgressRecord`]s
//! and [`ParseError`]s on the channels in [`JobEvents`], and the calling
//! thread blocks until the encoder exits.
//!
//! ```no_run
//! use std::thread;
//! use crossbeam_channel::select;
//! use ffjob_core::{CancellationToken, Job, JobConfig};
//!
//! # fn main() -> ffjob_core::CoreResult<()> {
//! let config = JobConfig::default();
//! let mut job = Job::new(
//!     &config,
//!     "input.mkv",
//!     "out/output.mp4",
//!     &["-c:v", "libx264"],
//!     CancellationToken::new(),
//! )?;
//!
//! let events = job.events();
//! let consumer = thread::spawn(move || loop {
//!     select! {
//!         recv(events.progress) -> record => if let Ok(record) = record {
//!             println!("{record}");
//!         },
//!         recv(events.errors) -> err => if let Ok(err) = err {
//!             eprintln!("{err}");
//!         },
//!         recv(events.done) -> _ => break,
//!     }
//! });
//!
//! let result = job.start();
//! let _ = consumer.join();
//! result
//! # }
//! ```
//!
//! [`ProgressRecord`]: crate::progress::ProgressRecord
//! [`ParseError`]: crate::error::ParseError

mod events;
mod reader;
mod state;

pub use events::JobEvents;
pub use state::JobState;

use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::config::JobConfig;
use crate::error::{
    CoreError, CoreResult, command_failed_error, command_start_error, command_wait_error,
    io_error,
};
use crate::external::{DurationProbe, FfprobeDurationProbe, build_encoder_args};
use crate::progress::ParseContext;
use crate::utils::render_command;

use events::EventSenders;
use reader::{Cleanup, DiagnosticTail};
use state::{Lifecycle, TerminalEvent};

/// How long a failed job waits for trailing encoder output.
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// One encoder run, from validated construction to channel shutdown.
#[derive(Debug)]
pub struct Job {
    input_path: PathBuf,
    output_path: PathBuf,
    args: Vec<String>,
    total_duration: Duration,
    started_at: Option<DateTime<Local>>,
    config: JobConfig,
    token: CancellationToken,
    lifecycle: Arc<Lifecycle>,
    events: JobEvents,
    senders: Option<EventSenders>,
}

impl Job {
    /// Builds a job that probes `input_path` with the configured ffprobe.
    pub fn new<S: AsRef<str>>(
        config: &JobConfig,
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        encoder_args: &[S],
        token: CancellationToken,
    ) -> CoreResult<Self> {
        let probe = FfprobeDurationProbe::new(&config.ffprobe_path);
        Self::with_probe(config, input_path, output_path, encoder_args, token, &probe)
    }

    /// Builds a job using `probe` to discover the input duration.
    ///
    /// Fails without touching the filesystem if the input does not exist.
    /// Otherwise the output's parent directories are created before probing.
    pub fn with_probe<S: AsRef<str>>(
        config: &JobConfig,
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        encoder_args: &[S],
        token: CancellationToken,
        probe: &dyn DurationProbe,
    ) -> CoreResult<Self> {
        config.validate()?;
        let input_path = input_path.into();
        let output_path = output_path.into();

        if !input_path.exists() {
            return Err(CoreError::InputNotFound(input_path));
        }

        if output_path.file_name().is_none() {
            return Err(CoreError::Validation(format!(
                "output path {} does not name a file",
                output_path.display()
            )));
        }
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let args = build_encoder_args(&input_path, &output_path, encoder_args);
        let total_duration = probe.probe_duration(&input_path)?;
        let (senders, events) = events::channels();

        log::debug!(
            "Prepared job for {} ({:.3}s) -> {}",
            input_path.display(),
            total_duration.as_secs_f64(),
            output_path.display()
        );

        Ok(Self {
            input_path,
            output_path,
            args,
            total_duration,
            started_at: None,
            config: config.clone(),
            token,
            lifecycle: Arc::new(Lifecycle::new()),
            events,
            senders: Some(senders),
        })
    }

    /// Receivers for this job's progress, error and done channels.
    pub fn events(&self) -> JobEvents {
        self.events.clone()
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Full encoder argument vector, including the injected flags.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    /// When the encoder was started, once [`Job::start`] has been called.
    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn state(&self) -> JobState {
        self.lifecycle.state()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Runs the encoder and blocks until it exits.
    ///
    /// The job's events must be drained concurrently, otherwise the encoder
    /// stalls as soon as it reports progress. May only be called once.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidState`] on a second call
    /// - [`CoreError::Cancelled`] if the token fired; the output is deleted
    /// - [`CoreError::ProcessStart`] if the encoder could not be launched
    /// - [`CoreError::ProcessWait`] if polling the running encoder failed
    /// - [`CoreError::ProcessFailed`] on a non-zero exit; the output is kept
    pub fn start(&mut self) -> CoreResult<()> {
        self.lifecycle.begin()?;
        let senders = self
            .senders
            .take()
            .ok_or_else(|| CoreError::InvalidState("event channels already closed".to_string()))?;

        let started_at = Local::now();
        self.started_at = Some(started_at);
        let cleanup = Cleanup {
            senders,
            output_path: self.output_path.clone(),
            lifecycle: Arc::clone(&self.lifecycle),
        };

        let program = self.config.ffmpeg_path.to_string_lossy().into_owned();
        let cmd = render_command(&program, &self.args);

        if self.token.is_cancelled() {
            log::debug!("Job cancelled before the encoder was started");
            self.lifecycle.discard_output();
            self.close_without_reader(cleanup);
            return Err(CoreError::Cancelled);
        }

        log::debug!("Running encoder: {cmd}");
        let spawned = Command::new(&self.config.ffmpeg_path)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                log::error!("Failed to start encoder {program}: {e}");
                self.close_without_reader(cleanup);
                return Err(command_start_error(program, e));
            }
        };

        let Some(stderr) = child.stderr.take() else {
            let _ = child.kill();
            let _ = child.wait();
            self.close_without_reader(cleanup);
            return Err(command_start_error(
                program,
                io::Error::other("encoder stderr was not captured"),
            ));
        };

        let ctx = ParseContext::new(
            self.total_duration,
            started_at,
            &self.input_path,
            &self.output_path,
        )
        .with_min_eta_percent(self.config.min_eta_percent);
        let diagnostics = DiagnosticTail::default();
        let tail = diagnostics.clone();
        thread::spawn(move || reader::run(stderr, ctx, cleanup, tail));

        let result = self.supervise(&mut child, &program, &diagnostics);
        self.lifecycle.record(TerminalEvent::ProcessExited);
        result
    }

    /// Blocks until the encoder exits, killing it if the token fires.
    fn supervise(
        &self,
        child: &mut Child,
        program: &str,
        diagnostics: &DiagnosticTail,
    ) -> CoreResult<()> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return self.check_status(status, program, diagnostics),
                Ok(None) => {}
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(command_wait_error(program, e));
                }
            }

            if self.token.wait_timeout(self.config.poll_interval) {
                log::debug!("Cancellation requested, stopping encoder (pid {})", child.id());
                self.lifecycle.discard_output();
                if let Err(e) = child.kill() {
                    log::warn!("Failed to kill encoder: {e}");
                }
                child.wait().map_err(|e| command_wait_error(program, e))?;
                return Err(CoreError::Cancelled);
            }
        }
    }

    fn check_status(
        &self,
        status: ExitStatus,
        program: &str,
        diagnostics: &DiagnosticTail,
    ) -> CoreResult<()> {
        if status.success() {
            log::debug!("Encoder finished: {}", self.output_path.display());
            return Ok(());
        }
        log::error!("Encoder exited with {status} for {}", self.input_path.display());
        // Let the reader catch up with the encoder's last words.
        self.lifecycle.wait_stream_ended(STDERR_DRAIN_TIMEOUT);
        Err(command_failed_error(program, status, diagnostics.snapshot()))
    }

    /// Closes the channels when no reader thread was started.
    ///
    /// Cleanup blocks on the done handshake, so it gets its own thread.
    fn close_without_reader(&self, cleanup: Cleanup) {
        self.lifecycle.record(TerminalEvent::StreamEnded);
        self.lifecycle.record(TerminalEvent::ProcessExited);
        thread::spawn(move || cleanup.run());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobConfigBuilder;
    use crate::external::FixedDuration;

    const NO_ARGS: [&str; 0] = [];

    fn probe() -> FixedDuration {
        FixedDuration(Duration::from_secs(40))
    }

    #[derive(Default)]
    struct CountingProbe {
        calls: std::cell::Cell<usize>,
    }

    impl DurationProbe for CountingProbe {
        fn probe_duration(&self, _input_path: &Path) -> CoreResult<Duration> {
            self.calls.set(self.calls.get() + 1);
            Ok(Duration::from_secs(40))
        }
    }

    #[test]
    fn test_missing_input_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested/deeper/out.mp4");
        let counting = CountingProbe::default();
        let result = Job::with_probe(
            &JobConfig::default(),
            dir.path().join("missing.mkv"),
            &output,
            &NO_ARGS,
            CancellationToken::new(),
            &counting,
        );
        assert!(matches!(result, Err(CoreError::InputNotFound(_))));
        assert!(!dir.path().join("nested").exists());
        assert_eq!(counting.calls.get(), 0);
    }

    #[test]
    fn test_construction_prepares_job() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mkv");
        fs::write(&input, b"").unwrap();
        let output = dir.path().join("a/b/out.mp4");

        let job = Job::with_probe(
            &JobConfig::default(),
            &input,
            &output,
            &["-c:v", "libx264"],
            CancellationToken::new(),
            &probe(),
        )
        .unwrap();

        assert!(dir.path().join("a/b").is_dir());
        assert!(!output.exists());
        assert_eq!(job.total_duration(), Duration::from_secs(40));
        assert_eq!(job.state(), JobState::Created);
        assert!(job.started_at().is_none());
        assert_eq!(job.args()[0], "-y");
        assert_eq!(job.args()[3], "-c:v");
        assert_eq!(job.args().last().map(String::as_str), output.to_str());
    }

    #[test]
    fn test_output_must_name_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mkv");
        fs::write(&input, b"").unwrap();

        let result = Job::with_probe(
            &JobConfig::default(),
            &input,
            dir.path().join(".."),
            &NO_ARGS,
            CancellationToken::new(),
            &probe(),
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_probe_failure_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mkv");
        fs::write(&input, b"").unwrap();
        let config = JobConfigBuilder::new()
            .ffprobe_path("/nonexistent/ffprobe_xyz_12345")
            .build();

        let result = Job::new(
            &config,
            &input,
            dir.path().join("out.mp4"),
            &NO_ARGS,
            CancellationToken::new(),
        );
        assert!(matches!(result, Err(CoreError::ProbeLaunch { .. })));
    }

    #[test]
    fn test_spawn_failure_closes_channels() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mkv");
        fs::write(&input, b"").unwrap();
        let config = JobConfigBuilder::new()
            .ffmpeg_path("/nonexistent/ffmpeg_xyz_12345")
            .build();

        let mut job = Job::with_probe(
            &config,
            &input,
            dir.path().join("out.mp4"),
            &NO_ARGS,
            CancellationToken::new(),
            &probe(),
        )
        .unwrap();
        let events = job.events();

        assert!(matches!(job.start(), Err(CoreError::ProcessStart { .. })));
        assert_eq!(job.state(), JobState::Closed);
        assert!(events.progress.recv().is_err());
        assert!(events.errors.recv().is_err());
        assert_eq!(events.done.recv(), Ok(false));
        assert!(events.done.recv().is_err());

        assert!(matches!(job.start(), Err(CoreError::InvalidState(_))));
    }

    #[test]
    fn test_already_cancelled_token_never_spawns() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mkv");
        fs::write(&input, b"").unwrap();
        let output = dir.path().join("out.mp4");
        fs::write(&output, b"stale").unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let config = JobConfigBuilder::new()
            .ffmpeg_path("/nonexistent/ffmpeg_xyz_12345")
            .build();
        let mut job =
            Job::with_probe(&config, &input, &output, &NO_ARGS, token, &probe()).unwrap();
        let events = job.events();

        assert!(matches!(job.start(), Err(CoreError::Cancelled)));
        assert_eq!(events.done.recv(), Ok(false));
        assert!(!output.exists());
    }
}
