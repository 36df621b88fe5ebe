// ============================================================================
// ffjob-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error types for the ffjob core library
//
// Two error families live here:
// - CoreError: failures of a job as a whole (validation, probing, the
//   encoder process, cancellation). Returned from `Job::new` and `Job::start`.
// - ParseError: failures to turn one telemetry line into a ProgressRecord.
//   These never abort a job; they are delivered on the job's error channel.

use std::num::{ParseFloatError, ParseIntError};
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors that can stop a job from being constructed or from completing.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Invalid job configuration: {0}")]
    Validation(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to run ffprobe on {}: {message}", path.display())]
    ProbeLaunch { path: PathBuf, message: String },

    #[error("ffprobe returned malformed JSON for {}: {source}", path.display())]
    ProbeParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("ffprobe output for {} has no usable duration: {message}", path.display())]
    ProbeField { path: PathBuf, message: String },

    #[error("Failed to start {cmd}: {source}")]
    ProcessStart {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for {cmd}: {source}")]
    ProcessWait {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{cmd} exited with {status}: {message}")]
    ProcessFailed {
        cmd: String,
        status: ExitStatus,
        message: String,
    },

    #[error("Job was cancelled")]
    Cancelled,

    #[error("Invalid job state: {0}")]
    InvalidState(String),
}

/// Result type for ffjob-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors produced while parsing a single encoder telemetry line.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The line is ordinary diagnostic output, not a progress record.
    #[error("line does not contain progress information")]
    NotProgressLine,

    #[error("expected {expected} progress fields, found {found}")]
    FieldCountMismatch { expected: usize, found: usize },

    #[error("expected field '{expected}' at position {position}, found '{found}'")]
    SchemaMismatch {
        position: usize,
        expected: &'static str,
        found: String,
    },

    #[error("invalid integer for '{field}': {source}")]
    InvalidInteger {
        field: &'static str,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid number for '{field}': {source}")]
    InvalidFloat {
        field: &'static str,
        #[source]
        source: ParseFloatError,
    },

    #[error("time '{0}' is not in H:MM:SS.ss format")]
    InvalidTime(String),

    #[error("total media duration is zero, percent complete is undefined")]
    ZeroDuration,
}

impl ParseError {
    /// Returns true for failures that are expected during a normal encode and
    /// should not be reported to the caller.
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(self, ParseError::NotProgressLine)
    }
}

/// Builds the error returned when an external command cannot be spawned.
pub fn command_start_error(cmd: impl Into<String>, source: std::io::Error) -> CoreError {
    CoreError::ProcessStart {
        cmd: cmd.into(),
        source,
    }
}

/// Builds the error returned when waiting on an external command fails.
pub fn command_wait_error(cmd: impl Into<String>, source: std::io::Error) -> CoreError {
    CoreError::ProcessWait {
        cmd: cmd.into(),
        source,
    }
}

/// Builds the error returned when an external command exits unsuccessfully.
pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    message: impl Into<String>,
) -> CoreError {
    CoreError::ProcessFailed {
        cmd: cmd.into(),
        status,
        message: message.into(),
    }
}

/// Attaches a path to an I/O error.
pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_not_found_display() {
        let err = CoreError::InputNotFound(PathBuf::from("/media/missing.mkv"));
        assert_eq!(err.to_string(), "Input file not found: /media/missing.mkv");
    }

    #[test]
    fn test_parse_error_benign() {
        assert!(ParseError::NotProgressLine.is_benign());
        assert!(!ParseError::ZeroDuration.is_benign());
        assert!(
            !ParseError::FieldCountMismatch {
                expected: 18,
                found: 20
            }
            .is_benign()
        );
    }

    #[test]
    fn test_conversion_error_keeps_source() {
        use std::error::Error as _;

        let source = "abc".parse::<u64>().unwrap_err();
        let err = ParseError::InvalidInteger {
            field: "frame",
            source,
        };
        assert!(err.to_string().starts_with("invalid integer for 'frame'"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_io_error_helper() {
        let err = io_error(
            "/out/dir",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, CoreError::Io { .. }));
        assert!(err.to_string().contains("/out/dir"));
    }

    #[test]
    fn test_wait_error_helper() {
        let err = command_wait_error(
            "ffmpeg -i in.mkv out.mp4",
            std::io::Error::new(std::io::ErrorKind::Interrupted, "interrupted"),
        );
        assert!(matches!(err, CoreError::ProcessWait { .. }));
        assert!(err.to_string().starts_with("Failed to wait for ffmpeg"));
    }
}
