//! Telemetry line parser.
//!
//! ffmpeg rewrites a single status line on stderr while it encodes:
//!
//! ```text
//! frame=  100 fps= 25 q=28.0 size=    2048KiB time=00:00:04.00 bitrate= 500.0kbits/s dup=0 drop=0 speed=1.0x
//! ```
//!
//! The line is split into tokens on every character that is not a letter,
//! digit, `.`, `-`, `:` or `/`. That keeps decimals, timestamps and rates
//! intact and leaves 18 tokens: nine labels, each followed by its value.
//! The labels are checked against [`SCHEMA`] before any value is read, so a
//! differently shaped encoder line is rejected instead of misread.

use chrono::{DateTime, Local, TimeDelta};
use std::time::Duration;

use super::{Eta, ParseContext, ProgressRecord};
use crate::error::ParseError;
use crate::utils::parse_ffmpeg_time;

/// Every progress line starts with this.
pub const PROGRESS_MARKER: &str = "frame=";

/// Nine label/value pairs.
pub const EXPECTED_TOKENS: usize = SCHEMA.len() * 2;

#[derive(Debug, Default)]
struct Fields {
    frame: u64,
    fps: f64,
    quality: f64,
    size_kib: f64,
    elapsed: Duration,
    bitrate_kbps: f64,
    duplicate_frames: u64,
    dropped_frames: u64,
    speed: f64,
}

type FieldParser = fn(&mut Fields, &str) -> Result<(), ParseError>;

/// Field labels in the order the encoder prints them, with their value parsers.
pub const FIELD_NAMES: [&str; 9] = [
    "frame", "fps", "q", "size", "time", "bitrate", "dup", "drop", "speed",
];

const SCHEMA: [(&str, FieldParser); 9] = [
    (FIELD_NAMES[0], parse_frame),
    (FIELD_NAMES[1], parse_fps),
    (FIELD_NAMES[2], parse_quality),
    (FIELD_NAMES[3], parse_size),
    (FIELD_NAMES[4], parse_time),
    (FIELD_NAMES[5], parse_bitrate),
    (FIELD_NAMES[6], parse_dup),
    (FIELD_NAMES[7], parse_drop),
    (FIELD_NAMES[8], parse_speed),
];

/// Parses one telemetry line, using the current time for the ETA.
pub fn parse_progress_line(line: &str, ctx: &ParseContext) -> Result<ProgressRecord, ParseError> {
    parse_progress_line_at(line, ctx, Local::now())
}

/// Parses one telemetry line as if the current time were `now`.
pub fn parse_progress_line_at(
    line: &str,
    ctx: &ParseContext,
    now: DateTime<Local>,
) -> Result<ProgressRecord, ParseError> {
    if !line.starts_with(PROGRESS_MARKER) {
        return Err(ParseError::NotProgressLine);
    }

    let tokens = tokenize(line);
    if tokens.len() != EXPECTED_TOKENS {
        return Err(ParseError::FieldCountMismatch {
            expected: EXPECTED_TOKENS,
            found: tokens.len(),
        });
    }

    let mut fields = Fields::default();
    for (index, (label, parse_value)) in SCHEMA.iter().enumerate() {
        let position = index * 2;
        if tokens[position] != *label {
            return Err(ParseError::SchemaMismatch {
                position,
                expected: *label,
                found: tokens[position].to_string(),
            });
        }
        parse_value(&mut fields, tokens[position + 1])?;
    }

    if ctx.total_duration.is_zero() {
        return Err(ParseError::ZeroDuration);
    }
    let percent_complete = (fields.elapsed.as_secs_f64() / ctx.total_duration.as_secs_f64()
        * 100.0)
        .clamp(0.0, 100.0);
    let eta = estimate(ctx, percent_complete, now);

    Ok(ProgressRecord {
        input_path: ctx.input_path.clone(),
        output_path: ctx.output_path.clone(),
        frame: fields.frame,
        fps: fields.fps,
        quality: fields.quality,
        size_kib: fields.size_kib,
        elapsed: fields.elapsed,
        bitrate_kbps: fields.bitrate_kbps,
        duplicate_frames: fields.duplicate_frames,
        dropped_frames: fields.dropped_frames,
        speed: fields.speed,
        percent_complete,
        eta,
    })
}

fn tokenize(line: &str) -> Vec<&str> {
    line.split(|c: char| !(c.is_alphanumeric() || matches!(c, '.' | '-' | ':' | '/')))
        .filter(|token| !token.is_empty())
        .collect()
}

/// Projects time remaining linearly from the wall-clock time spent so far.
fn estimate(ctx: &ParseContext, percent_complete: f64, now: DateTime<Local>) -> Eta {
    if percent_complete <= 0.0 || percent_complete < ctx.min_eta_percent {
        return Eta::Unstable;
    }

    let wall_elapsed = (now - ctx.started_at).to_std().unwrap_or(Duration::ZERO);
    let remaining_secs =
        wall_elapsed.as_secs_f64() / percent_complete * (100.0 - percent_complete);
    let Ok(remaining) = Duration::try_from_secs_f64(remaining_secs) else {
        return Eta::Unstable;
    };

    let finish = TimeDelta::from_std(wall_elapsed + remaining)
        .ok()
        .and_then(|delta| ctx.started_at.checked_add_signed(delta));
    match finish {
        Some(finish) => Eta::Projected { remaining, finish },
        None => Eta::Unstable,
    }
}

// ---------------------------------------------------------------------------
// Field value parsers
// ---------------------------------------------------------------------------

fn int(field: &'static str, value: &str) -> Result<u64, ParseError> {
    value
        .parse::<u64>()
        .map_err(|source| ParseError::InvalidInteger { field, source })
}

fn float(field: &'static str, value: &str) -> Result<f64, ParseError> {
    value
        .parse::<f64>()
        .map_err(|source| ParseError::InvalidFloat { field, source })
}

/// Strips any trailing characters contained in `unit`, e.g. `2048KiB` -> `2048`.
fn trim_unit<'a>(value: &'a str, unit: &str) -> &'a str {
    value.trim_end_matches(|c| unit.contains(c))
}

fn parse_frame(fields: &mut Fields, value: &str) -> Result<(), ParseError> {
    fields.frame = int("frame", value)?;
    Ok(())
}

fn parse_fps(fields: &mut Fields, value: &str) -> Result<(), ParseError> {
    fields.fps = float("fps", value)?;
    Ok(())
}

fn parse_quality(fields: &mut Fields, value: &str) -> Result<(), ParseError> {
    fields.quality = float("q", value)?;
    Ok(())
}

fn parse_size(fields: &mut Fields, value: &str) -> Result<(), ParseError> {
    fields.size_kib = float("size", trim_unit(value, "KiB"))?;
    Ok(())
}

/// Largest negative timestamp read as "not started yet" instead of garbage.
const MAX_LEADING_OFFSET_SECS: f64 = 60.0;

fn parse_time(fields: &mut Fields, value: &str) -> Result<(), ParseError> {
    let invalid = || ParseError::InvalidTime(value.to_string());
    let secs = parse_ffmpeg_time(value).ok_or_else(invalid)?;
    fields.elapsed = if secs < 0.0 {
        if secs < -MAX_LEADING_OFFSET_SECS {
            return Err(invalid());
        }
        Duration::ZERO
    } else {
        Duration::try_from_secs_f64(secs).map_err(|_| invalid())?
    };
    Ok(())
}

fn parse_bitrate(fields: &mut Fields, value: &str) -> Result<(), ParseError> {
    fields.bitrate_kbps = float("bitrate", trim_unit(value, "kbit/s"))?;
    Ok(())
}

fn parse_dup(fields: &mut Fields, value: &str) -> Result<(), ParseError> {
    fields.duplicate_frames = int("dup", value)?;
    Ok(())
}

fn parse_drop(fields: &mut Fields, value: &str) -> Result<(), ParseError> {
    fields.dropped_frames = int("drop", value)?;
    Ok(())
}

fn parse_speed(fields: &mut Fields, value: &str) -> Result<(), ParseError> {
    fields.speed = float("speed", trim_unit(value, "x"))?;
    Ok(())
}
