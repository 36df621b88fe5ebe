//! Logging to a file instead of the terminal.
//!
//! Used by the CLI's `--log-file` option. Everything the library logs goes
//! through the `log` facade, so installing the log4rs logger here captures
//! probe command lines, lifecycle transitions and progress milestones alike.

pub mod setup;

pub use setup::{FILE_LOG_PATTERN, build_file_logging_config, setup_file_logging};
