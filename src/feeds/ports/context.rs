//! Per-call execution context for store operations.
//!
//! An [`OperationContext`] carries an optional deadline, an optional
//! cancellation signal and an optional correlation identifier. Store
//! implementations check it before touching storage and race in-flight work
//! against it.

use super::{FeedsStoreError, FeedsStoreResult};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use uuid::Uuid;

/// Shareable trigger that cancels every context derived from it.
///
/// # Example
///
/// ```
/// use feeds_store::feeds::ports::{CancellationHandle, OperationContext};
///
/// let handle = CancellationHandle::new();
/// let ctx = OperationContext::background().with_cancellation(&handle);
/// assert!(ctx.ensure_live().is_ok());
///
/// handle.cancel();
/// assert!(ctx.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl CancellationHandle {
    /// Creates a handle in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Cancels all contexts attached to this handle. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns `true` once [`Self::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation, deadline and correlation scope for one store call.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    deadline: Option<Instant>,
    cancellation: Option<watch::Receiver<bool>>,
    correlation_id: Option<Uuid>,
}

impl OperationContext {
    /// Returns a context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Limits the context to `timeout` from now.
    ///
    /// An earlier deadline already on the context is kept.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Limits the context to an absolute deadline.
    ///
    /// An earlier deadline already on the context is kept.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(
            self.deadline
                .map_or(deadline, |current| current.min(deadline)),
        );
        self
    }

    /// Attaches a cancellation handle, replacing any previous one.
    #[must_use]
    pub fn with_cancellation(mut self, handle: &CancellationHandle) -> Self {
        self.cancellation = Some(handle.subscribe());
        self
    }

    /// Sets the correlation identifier recorded on tracing spans.
    #[must_use]
    pub const fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Returns the effective deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the correlation identifier, if any.
    #[must_use]
    pub const fn correlation_id(&self) -> Option<Uuid> {
        self.correlation_id
    }

    /// Returns the time left before the deadline; zero once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns `true` when the attached handle has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|receiver| *receiver.borrow())
    }

    /// Returns `true` when the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fails when the context is cancelled or expired.
    ///
    /// # Errors
    ///
    /// Returns [`FeedsStoreError::Cancelled`] or
    /// [`FeedsStoreError::DeadlineExceeded`]. Cancellation wins when both
    /// apply.
    pub fn ensure_live(&self) -> FeedsStoreResult<()> {
        if self.is_cancelled() {
            return Err(FeedsStoreError::Cancelled);
        }
        if self.is_expired() {
            return Err(FeedsStoreError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Runs `operation` unless the context ends first.
    ///
    /// A result that is already available wins over a simultaneous
    /// cancellation.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error, or [`FeedsStoreError::Cancelled`] /
    /// [`FeedsStoreError::DeadlineExceeded`] when the context ends first.
    pub async fn guard<F, T>(&self, operation: F) -> FeedsStoreResult<T>
    where
        F: Future<Output = FeedsStoreResult<T>>,
    {
        self.ensure_live()?;
        tokio::select! {
            biased;
            result = operation => result,
            err = self.done() => Err(err),
        }
    }

    /// Resolves once the context is cancelled or expires, yielding the
    /// matching error. Never resolves for a background context.
    pub async fn done(&self) -> FeedsStoreError {
        tokio::select! {
            biased;
            () = cancelled(self.cancellation.clone()) => FeedsStoreError::Cancelled,
            () = expired(self.deadline) => FeedsStoreError::DeadlineExceeded,
        }
    }
}

async fn cancelled(receiver: Option<watch::Receiver<bool>>) {
    if let Some(mut receiver) = receiver {
        let signalled = receiver.wait_for(|cancelled| *cancelled).await.is_ok();
        if signalled {
            return;
        }
    }
    std::future::pending::<()>().await;
}

async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        }
        None => std::future::pending::<()>().await,
    }
}
