//! One-shot hand-off between a caller giving up on a call and the blocking
//! task about to commit it.
//!
//! Exactly one side wins. If the task claims the commit first, the caller
//! must wait for the real outcome; if the caller abandons first, the task
//! must roll back.

use std::sync::atomic::{AtomicU8, Ordering};

const PENDING: u8 = 0;
const COMMITTING: u8 = 1;
const ABANDONED: u8 = 2;

#[derive(Debug, Default)]
pub(super) struct CommitGate {
    state: AtomicU8,
}

impl CommitGate {
    /// Claims the commit. Returns `false` once the caller has abandoned.
    pub(super) fn begin_commit(&self) -> bool {
        self.claim(COMMITTING)
    }

    /// Abandons the call. Returns `false` once the commit has been claimed.
    pub(super) fn abandon(&self) -> bool {
        self.claim(ABANDONED)
    }

    fn claim(&self, next: u8) -> bool {
        self.state
            .compare_exchange(PENDING, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
