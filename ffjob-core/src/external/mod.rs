//! Interaction with the external ffmpeg tool family.
//!
//! - [`ffprobe_executor`]: total duration discovery via `ffprobe`.
//! - [`ffmpeg_args`]: the argument vector handed to the encoder.

pub mod ffmpeg_args;
pub mod ffprobe_executor;

pub use ffmpeg_args::build_encoder_args;
pub use ffprobe_executor::{DurationProbe, FfprobeDurationProbe, FixedDuration};
