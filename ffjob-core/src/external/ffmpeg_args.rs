//! Encoder argument construction.
//!
//! The caller supplies only codec and filter flags. Overwrite, input and
//! output are always injected here so every job has the same shape:
//! `-y -i <input> <caller args...> <output>`.

use std::path::Path;

/// Overwrite the output without asking.
pub const OVERWRITE_FLAG: &str = "-y";

/// Introduces the input file.
pub const INPUT_FLAG: &str = "-i";

/// Builds the full encoder argument vector for one job.
#[must_use]
pub fn build_encoder_args<S: AsRef<str>>(
    input_path: &Path,
    output_path: &Path,
    caller_args: &[S],
) -> Vec<String> {
    let mut args = Vec::with_capacity(caller_args.len() + 4);
    args.push(OVERWRITE_FLAG.to_string());
    args.push(INPUT_FLAG.to_string());
    args.push(input_path.to_string_lossy().into_owned());
    args.extend(caller_args.iter().map(|a| a.as_ref().to_string()));
    args.push(output_path.to_string_lossy().into_owned());
    args
}
