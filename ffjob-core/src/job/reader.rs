//! Background stderr reader and end-of-job cleanup.

use std::collections::VecDeque;
use std::fs;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use super::events::EventSenders;
use super::state::{Lifecycle, TerminalEvent};
use crate::progress::{MilestoneLogger, ParseContext, parse_progress_line};

/// Number of diagnostic lines kept for error messages.
const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// Log target for encoder output that is not progress telemetry.
const STDERR_LOG_TARGET: &str = "ffjob::stderr";

/// The last few non-progress lines the encoder printed.
#[derive(Debug, Clone, Default)]
pub(crate) struct DiagnosticTail {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl DiagnosticTail {
    fn push(&self, line: &str) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.len() == DIAGNOSTIC_TAIL_LINES {
            lines.pop_front();
        }
        lines.push_back(line.to_string());
    }

    pub(crate) fn snapshot(&self) -> String {
        let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

/// One-time terminal cleanup.
///
/// Owns every event sender, so consuming it in [`Cleanup::run`] is the only
/// way the channels can close.
#[derive(Debug)]
pub(crate) struct Cleanup {
    pub(crate) senders: EventSenders,
    pub(crate) output_path: PathBuf,
    pub(crate) lifecycle: Arc<Lifecycle>,
}

impl Cleanup {
    pub(crate) fn run(self) {
        let Cleanup {
            senders,
            output_path,
            lifecycle,
        } = self;
        let EventSenders {
            progress,
            errors,
            done,
        } = senders;

        drop(progress);

        if lifecycle.should_discard_output() {
            match fs::remove_file(&output_path) {
                Ok(()) => log::debug!("Removed partial output {}", output_path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => log::warn!(
                    "Failed to remove partial output {}: {e}",
                    output_path.display()
                ),
            }
        }

        drop(errors);

        if done.send(false).is_err() {
            log::debug!("No receiver left for the done signal");
        }
    }
}

/// Reads `stream` until it ends, then waits for the process to exit and
/// runs `cleanup`.
///
/// The stream is consumed in `\r`-terminated chunks. Each chunk is split at
/// line feeds so ordinary log lines printed between two progress updates do
/// not hide the update that follows them.
pub(crate) fn run<R: Read>(
    stream: R,
    ctx: ParseContext,
    cleanup: Cleanup,
    diagnostics: DiagnosticTail,
) {
    let mut reader = BufReader::new(stream);
    let mut chunk = Vec::new();
    let mut milestones = MilestoneLogger::new(ctx.total_duration);

    loop {
        chunk.clear();
        match reader.read_until(b'\r', &mut chunk) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                log::debug!("Stopped reading encoder output: {e}");
                break;
            }
        }

        let text = String::from_utf8_lossy(&chunk);
        for line in text.split(['\r', '\n']).filter(|l| !l.trim().is_empty()) {
            match parse_progress_line(line, &ctx) {
                Ok(record) => {
                    milestones.observe(&record);
                    if cleanup.senders.progress.send(record).is_err() {
                        log::trace!("Progress receiver gone, dropping record");
                    }
                }
                Err(e) if e.is_benign() => {
                    log::trace!(target: STDERR_LOG_TARGET, "{}", line.trim_end());
                    diagnostics.push(line.trim_end());
                }
                Err(e) => {
                    log::debug!("Unparseable progress line {line:?}: {e}");
                    if cleanup.senders.errors.send(e).is_err() {
                        log::trace!("Error receiver gone, dropping parse error");
                    }
                }
            }
        }
    }

    cleanup.lifecycle.record(TerminalEvent::StreamEnded);
    cleanup.lifecycle.wait_closed();
    cleanup.run();
}
