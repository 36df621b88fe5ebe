//! Cooperative cancellation for a running job.
//!
//! A [`CancellationToken`] is shared between whoever decides to stop the job
//! (a signal handler, a UI, a timer) and the job supervisor. Clones observe
//! the same state. A token may carry a deadline; once the deadline passes the
//! token reports itself as cancelled without anyone calling [`cancel`].
//!
//! The token never interrupts anything on its own. The supervisor polls it
//! while the encoder runs, kills the encoder when it fires, and marks the
//! partial output for removal at cleanup.
//!
//! Only a cancel observed before the encoder exits discards the output. A
//! token that fires after a clean exit leaves the finished file in place.
//!
//! [`cancel`]: CancellationToken::cancel

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Shared {
    cancelled: Mutex<bool>,
    wakeup: Condvar,
}

/// A cloneable cancel signal with an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    shared: Arc<Shared>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    /// Creates a token without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that cancels itself at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            shared: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// Creates a token that cancels itself once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Triggers the token and wakes every waiter.
    pub fn cancel(&self) {
        let mut cancelled = self
            .shared
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !*cancelled {
            log::debug!("Cancellation requested");
        }
        *cancelled = true;
        self.shared.wakeup.notify_all();
    }

    /// Returns true once the token was triggered or its deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        let cancelled = *self
            .shared
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        cancelled || self.deadline_passed()
    }

    /// Blocks until the token is cancelled, its deadline passes, or `timeout`
    /// elapses. Returns whether the token is cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut wait_for = timeout;
        if let Some(deadline) = self.deadline {
            wait_for = wait_for.min(deadline.saturating_duration_since(Instant::now()));
        }

        let guard = self
            .shared
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .shared
            .wakeup
            .wait_timeout_while(guard, wait_for, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard || self.deadline_passed()
    }

    fn deadline_passed(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}
