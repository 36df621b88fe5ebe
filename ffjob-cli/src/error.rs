// ============================================================================
// ffjob-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: exit codes for failed commands
//
// Commands return anyhow errors with context attached. The process exit code
// is chosen from the first ffjob-core error found in the chain.

use ffjob_core::CoreError;

/// Exit code for a job stopped by a signal or its timeout.
pub const EXIT_CANCELLED: i32 = 130;

/// Exit code for every other failure.
pub const EXIT_FAILURE: i32 = 1;

pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.chain().find_map(|e| e.downcast_ref::<CoreError>()) {
        Some(CoreError::Cancelled) => EXIT_CANCELLED,
        _ => EXIT_FAILURE,
    }
}
