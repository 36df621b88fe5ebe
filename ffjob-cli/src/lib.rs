// ffjob-cli/src/lib.rs
//
// Library portion of the ffjob CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod progress;
pub mod signals;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, EncodeArgs, ProbeArgs};
pub use commands::{run_encode, run_probe};
