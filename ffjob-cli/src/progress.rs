// ffjob-cli/src/progress.rs
//
// Rendering of job events on the terminal: an indicatif progress bar for
// people, or one JSON object per line for other programs.

use crossbeam_channel::select;
use ffjob_core::{JobEvents, ParseError, ProgressRecord};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::io::{self, Write};
use std::time::Duration;

const BAR_TEMPLATE: &str = "  Encoding: {percent:>3}% [{bar:30}] ({elapsed} / {duration})\n{msg}";

/// What was seen on the event channels during one job.
#[derive(Debug, Default)]
pub struct EventSummary {
    pub records: usize,
    pub parse_errors: usize,
    pub last: Option<ProgressRecord>,
    pub done: Option<bool>,
}

pub enum ProgressView {
    Bar { bar: ProgressBar, max_position: u64 },
    Json,
}

impl ProgressView {
    pub fn bar() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##.");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        ProgressView::Bar {
            bar,
            max_position: 0,
        }
    }

    pub fn json() -> Self {
        ProgressView::Json
    }

    fn update(&mut self, record: &ProgressRecord) {
        match self {
            ProgressView::Bar { bar, max_position } => {
                let pos = record.percent_complete as u64;
                // Percent is recomputed per line and can step backwards.
                if pos >= *max_position {
                    *max_position = pos;
                    bar.set_position(pos);
                } else {
                    log::debug!("Ignoring backward progress: {pos} < {max_position}");
                }
                bar.set_message(format!(
                    "  {record} | {:.1} fps | {:.2}x",
                    record.fps, record.speed
                ));
            }
            ProgressView::Json => match serde_json::to_value(record) {
                Ok(record) => emit_json(&json!({ "event": "progress", "record": record })),
                Err(e) => log::warn!("Failed to serialize progress record: {e}"),
            },
        }
    }

    fn parse_error(&mut self, err: &ParseError) {
        match self {
            ProgressView::Bar { bar, .. } => {
                bar.suspend(|| log::warn!("Unreadable progress line: {err}"));
            }
            ProgressView::Json => {
                emit_json(&json!({ "event": "error", "message": err.to_string() }))
            }
        }
    }

    fn finish(self) {
        if let ProgressView::Bar { bar, .. } = self {
            bar.finish_and_clear();
        }
    }
}

fn emit_json(value: &serde_json::Value) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{value}").and_then(|()| handle.flush()) {
        log::debug!("Failed to write progress line: {e}");
    }
}

/// Renders `events` until the job closes its channels.
///
/// The progress channel closes before the error channel, which closes before
/// `done` fires, so the channels are drained in that order.
pub fn consume_events(events: JobEvents, mut view: ProgressView) -> EventSummary {
    let mut summary = EventSummary::default();

    loop {
        select! {
            recv(events.progress) -> msg => match msg {
                Ok(record) => {
                    view.update(&record);
                    summary.records += 1;
                    summary.last = Some(record);
                }
                Err(_) => break,
            },
            recv(events.errors) -> msg => if let Ok(err) = msg {
                view.parse_error(&err);
                summary.parse_errors += 1;
            },
        }
    }

    for err in events.errors.iter() {
        view.parse_error(&err);
        summary.parse_errors += 1;
    }

    summary.done = events.done.recv().ok();
    view.finish();
    summary
}
