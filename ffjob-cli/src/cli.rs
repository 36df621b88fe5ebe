// ffjob-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use ffjob_core::JobConfigBuilder;
use ffjob_core::config::{DEFAULT_FFMPEG_PATH, DEFAULT_FFPROBE_PATH, JobConfig};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "ffjob: supervised ffmpeg transcoding",
    long_about = "Runs a single ffmpeg job with live progress, a timeout and clean cancellation."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Write logs to this file instead of the terminal
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcodes one input file with ffmpeg
    Encode(EncodeArgs),
    /// Prints the duration ffprobe reports for a media file
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// Media file to transcode
    #[arg(short = 'i', long = "input", required = true, value_name = "INPUT_PATH")]
    pub input_path: PathBuf,

    /// Output file; parent directories are created as needed
    #[arg(short = 'o', long = "output", required = true, value_name = "OUTPUT_PATH")]
    pub output_path: PathBuf,

    /// Cancel the encode after this many seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// ffmpeg executable
    #[arg(long, value_name = "PATH", env = "FFJOB_FFMPEG", default_value = DEFAULT_FFMPEG_PATH)]
    pub ffmpeg: PathBuf,

    /// ffprobe executable
    #[arg(long, value_name = "PATH", env = "FFJOB_FFPROBE", default_value = DEFAULT_FFPROBE_PATH)]
    pub ffprobe: PathBuf,

    /// Print progress as JSON lines on stdout instead of a progress bar
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Encoder flags, passed to ffmpeg between the input and the output
    #[arg(last = true, value_name = "ENCODER_ARGS")]
    pub encoder_args: Vec<String>,
}

impl EncodeArgs {
    pub fn job_config(&self) -> JobConfig {
        JobConfigBuilder::new()
            .ffmpeg_path(&self.ffmpeg)
            .ffprobe_path(&self.ffprobe)
            .build()
    }
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Media file to probe
    #[arg(required = true, value_name = "INPUT_PATH")]
    pub input_path: PathBuf,

    /// ffprobe executable
    #[arg(long, value_name = "PATH", env = "FFJOB_FFPROBE", default_value = DEFAULT_FFPROBE_PATH)]
    pub ffprobe: PathBuf,

    /// Print the result as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
