//! Job lifecycle.
//!
//! A job ends when two independent things have happened: the reader hit
//! end-of-stream on the encoder's stderr, and the supervisor saw the encoder
//! exit. They can arrive in either order. The first moves the job to
//! [`JobState::Draining`], the second to [`JobState::Closed`], and only a
//! closed job may run its cleanup.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Constructed, encoder not yet spawned.
    Created,
    /// Encoder spawned, neither terminal event seen.
    Running,
    /// One terminal event seen.
    Draining,
    /// Both terminal events seen. Cleanup may run.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TerminalEvent {
    StreamEnded,
    ProcessExited,
}

#[derive(Debug)]
struct Inner {
    state: JobState,
    stream_ended: bool,
    process_exited: bool,
    discard_output: bool,
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    inner: Mutex<Inner>,
    changed: Condvar,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: JobState::Created,
                stream_ended: false,
                process_exited: false,
                discard_output: false,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> JobState {
        self.lock().state
    }

    /// `Created -> Running`. Any other starting state is an error.
    pub(crate) fn begin(&self) -> CoreResult<()> {
        let mut inner = self.lock();
        if inner.state != JobState::Created {
            return Err(CoreError::InvalidState(format!(
                "job cannot be started from state {:?}",
                inner.state
            )));
        }
        inner.state = JobState::Running;
        log::debug!("Job state: Created -> Running");
        Ok(())
    }

    /// Records a terminal event and returns the resulting state.
    ///
    /// Recording the same event twice has no further effect.
    pub(crate) fn record(&self, event: TerminalEvent) -> JobState {
        let mut inner = self.lock();
        let seen = match event {
            TerminalEvent::StreamEnded => &mut inner.stream_ended,
            TerminalEvent::ProcessExited => &mut inner.process_exited,
        };
        if *seen {
            return inner.state;
        }
        *seen = true;

        let previous = inner.state;
        inner.state = match previous {
            JobState::Created | JobState::Running => {
                if inner.stream_ended && inner.process_exited {
                    JobState::Closed
                } else {
                    JobState::Draining
                }
            }
            JobState::Draining | JobState::Closed => JobState::Closed,
        };
        log::debug!("Job state: {previous:?} -> {:?} ({event:?})", inner.state);

        self.changed.notify_all();
        inner.state
    }

    /// Blocks until both terminal events have been recorded.
    pub(crate) fn wait_closed(&self) {
        let guard = self.lock();
        let _closed = self
            .changed
            .wait_while(guard, |inner| inner.state != JobState::Closed)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Waits up to `timeout` for the reader to reach end-of-stream.
    pub(crate) fn wait_stream_ended(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (inner, _) = self
            .changed
            .wait_timeout_while(guard, timeout, |inner| !inner.stream_ended)
            .unwrap_or_else(PoisonError::into_inner);
        inner.stream_ended
    }

    /// Marks the output artifact for deletion at cleanup.
    pub(crate) fn discard_output(&self) {
        self.lock().discard_output = true;
    }

    pub(crate) fn should_discard_output(&self) -> bool {
        self.lock().discard_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_begin_only_once() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), JobState::Created);
        lifecycle.begin().unwrap();
        assert_eq!(lifecycle.state(), JobState::Running);
        assert!(matches!(lifecycle.begin(), Err(CoreError::InvalidState(_))));
    }

    #[test]
    fn test_events_in_either_order_close() {
        for (first, second) in [
            (TerminalEvent::StreamEnded, TerminalEvent::ProcessExited),
            (TerminalEvent::ProcessExited, TerminalEvent::StreamEnded),
        ] {
            let lifecycle = Lifecycle::new();
            lifecycle.begin().unwrap();
            assert_eq!(lifecycle.record(first), JobState::Draining);
            assert_eq!(lifecycle.record(first), JobState::Draining);
            assert_eq!(lifecycle.record(second), JobState::Closed);
        }
    }

    #[test]
    fn test_wait_closed_blocks_until_second_event() {
        let lifecycle = Arc::new(Lifecycle::new());
        lifecycle.begin().unwrap();
        lifecycle.record(TerminalEvent::StreamEnded);

        let waiter = {
            let lifecycle = Arc::clone(&lifecycle);
            thread::spawn(move || {
                lifecycle.wait_closed();
                lifecycle.state()
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished());
        lifecycle.record(TerminalEvent::ProcessExited);
        assert_eq!(waiter.join().unwrap(), JobState::Closed);
    }

    #[test]
    fn test_wait_stream_ended_times_out() {
        let lifecycle = Lifecycle::new();
        lifecycle.begin().unwrap();
        assert!(!lifecycle.wait_stream_ended(Duration::from_millis(20)));
        lifecycle.record(TerminalEvent::StreamEnded);
        assert!(lifecycle.wait_stream_ended(Duration::from_millis(20)));
    }

    #[test]
    fn test_discard_flag() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.should_discard_output());
        lifecycle.discard_output();
        assert!(lifecycle.should_discard_output());
    }
}
