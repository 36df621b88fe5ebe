//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Runs one supervised encode.
pub mod encode;

/// Reports the duration ffprobe finds for a file.
pub mod probe;

pub use encode::run_encode;
pub use probe::run_probe;
