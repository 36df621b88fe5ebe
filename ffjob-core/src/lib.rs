//! Supervision of a single ffmpeg transcoding job.
//!
//! The crate probes the input's duration with ffprobe, runs ffmpeg with
//! stderr captured, and turns the encoder's carriage-return terminated status
//! lines into structured [`ProgressRecord`]s delivered over channels. A
//! [`CancellationToken`] stops the encoder and removes its partial output.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use ffjob_core::{CancellationToken, Job, JobConfigBuilder};
//! use std::time::Duration;
//!
//! let config = JobConfigBuilder::new()
//!     .ffmpeg_path("/usr/local/bin/ffmpeg")
//!     .build();
//! let token = CancellationToken::with_timeout(Duration::from_secs(3600));
//!
//! let mut job = Job::new(&config, "in.mkv", "out/in.mp4", &["-c:v", "libx265"], token).unwrap();
//! let events = job.events();
//! std::thread::spawn(move || {
//!     for record in events.progress.iter() {
//!         println!("{record}");
//!     }
//! });
//! // The error channel must be drained too
//! let errors = job.events().errors;
//! std::thread::spawn(move || errors.iter().for_each(|e| eprintln!("{e}")));
//!
//! let result = job.start();
//! let _ = job.events().done.recv();
//! result.unwrap();
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod job;
pub mod progress;
pub mod utils;

// Re-exports for public API
pub use cancel::CancellationToken;
pub use config::{JobConfig, JobConfigBuilder};
pub use error::{CoreError, CoreResult, ParseError};
pub use external::{DurationProbe, FfprobeDurationProbe, FixedDuration};
pub use job::{Job, JobEvents, JobState};
pub use progress::{Eta, ParseContext, ProgressRecord, parse_progress_line, parse_progress_line_at};
pub use utils::{format_bytes, format_duration, parse_ffmpeg_time};
