//! Utility functions for formatting durations, sizes and ffmpeg timestamps.
//!
//! These helpers are shared by the progress parser, the log output of the
//! job supervisor and the CLI's progress display.

use std::time::Duration;

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration_seconds(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats a `Duration` as HH:MM:SS, truncating sub-second precision.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    format_duration_seconds(duration.as_secs() as f64)
}

/// Formats bytes with appropriate binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Parses FFmpeg time string (HH:MM:SS.MS) to seconds. Returns None if invalid.
///
/// A leading `-` is accepted and yields a negative value. ffmpeg prints
/// slightly negative timestamps for the first frames of some inputs.
#[must_use]
pub fn parse_ffmpeg_time(time: &str) -> Option<f64> {
    let (sign, magnitude) = match time.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, time),
    };
    let parts: Vec<&str> = magnitude.split(':').collect();
    if parts.len() == 3 {
        let hours = parts[0].parse::<u64>().ok()?;
        let minutes = parts[1].parse::<u64>().ok()?;
        let seconds = parts[2].parse::<f64>().ok()?;
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        Some(sign * (hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds))
    } else {
        None
    }
}

/// Renders a command and its arguments the way a shell user would type it.
#[must_use]
pub fn render_command(program: &str, args: &[String]) -> String {
    let mut rendered = String::from(program);
    for arg in args {
        rendered.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            rendered.push('"');
            rendered.push_str(arg);
            rendered.push('"');
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}
