//! Per-call deadlines and cancellation.

use crate::error::{CoreError, CoreResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Carries an optional deadline and cancellation signal for one call.
///
/// The deadline bounds how long a driver waits for the store's file lock.
/// Contexts are cheap to clone; clones share the cancellation signal.
///
/// ```rust
/// use revdb_core::Context;
/// use std::time::Duration;
///
/// let (ctx, cancel) = Context::background()
///     .with_timeout(Duration::from_secs(5))
///     .with_cancel();
/// assert!(ctx.deadline().is_some());
/// cancel.cancel();
/// assert!(ctx.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl Context {
    /// A context with no deadline that is never cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a context whose deadline is the earlier of the current one
    /// and `deadline`.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Returns a context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns a cancellable context and the handle that cancels it.
    #[must_use]
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let flag = self
            .cancelled
            .get_or_insert_with(|| Arc::new(AtomicBool::new(false)))
            .clone();
        (self, CancelHandle(flag))
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true once the associated handle has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    /// Fails with [`CoreError::Cancelled`] if the context was cancelled.
    pub fn check(&self) -> CoreResult<()> {
        if self.is_cancelled() {
            Err(CoreError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Cancels the [`Context`] it was created with, and all of its clones.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Signals cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_has_no_deadline() {
        let ctx = Context::background();
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_cancelled());
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn earliest_deadline_wins() {
        let now = Instant::now();
        let ctx = Context::background()
            .with_deadline(now + Duration::from_secs(10))
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(5));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(1)));
    }

    #[test]
    fn cancel_is_shared_by_clones() {
        let (ctx, cancel) = Context::background().with_cancel();
        let clone = ctx.clone();
        cancel.cancel();
        assert!(clone.is_cancelled());
        assert!(matches!(ctx.check(), Err(CoreError::Cancelled)));
    }
}
