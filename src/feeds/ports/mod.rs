//! Port contracts for feeds persistence.
//!
//! Ports define the infrastructure-agnostic store interface and the per-call
//! execution context every store operation is scoped by.

pub mod context;
pub mod repository;

pub use context::{CancellationHandle, OperationContext};
pub use repository::{FeedsStore, FeedsStoreError, FeedsStoreErrorKind, FeedsStoreResult};
