//! Event channels between a running job and its caller.

use crossbeam_channel::{Receiver, Sender};

use crate::error::ParseError;
use crate::progress::ProgressRecord;

/// Receiving ends of a job's three event channels.
///
/// All three are rendezvous channels: the job's reader blocks on every send
/// until the caller receives, so the caller must keep draining them while
/// [`Job::start`](super::Job::start) runs, typically from another thread with
/// [`crossbeam_channel::select!`].
///
/// When the job finishes, the progress channel disconnects first, then the
/// error channel, and finally `done` yields a single `false` and disconnects.
#[derive(Debug, Clone)]
pub struct JobEvents {
    pub progress: Receiver<ProgressRecord>,
    pub errors: Receiver<ParseError>,
    pub done: Receiver<bool>,
}

#[derive(Debug)]
pub(crate) struct EventSenders {
    pub(crate) progress: Sender<ProgressRecord>,
    pub(crate) errors: Sender<ParseError>,
    pub(crate) done: Sender<bool>,
}

pub(crate) fn channels() -> (EventSenders, JobEvents) {
    let (progress_tx, progress_rx) = crossbeam_channel::bounded(0);
    let (errors_tx, errors_rx) = crossbeam_channel::bounded(0);
    let (done_tx, done_rx) = crossbeam_channel::bounded(0);
    (
        EventSenders {
            progress: progress_tx,
            errors: errors_tx,
            done: done_tx,
        },
        JobEvents {
            progress: progress_rx,
            errors: errors_rx,
            done: done_rx,
        },
    )
}
