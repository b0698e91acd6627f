//! Store port for feeds managers and job proposals.

use super::OperationContext;
use crate::feeds::domain::{
    FeedsManager, FeedsManagerId, JobId, JobProposal, JobProposalId, JobProposalStatus,
    NewFeedsManager, NewJobProposal,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for feeds store operations.
pub type FeedsStoreResult<T> = Result<T, FeedsStoreError>;

/// Feeds persistence contract.
///
/// Every operation is scoped by an [`OperationContext`]. A context that is
/// already cancelled or past its deadline fails before storage is touched.
/// [`FeedsStoreError::Cancelled`] and [`FeedsStoreError::DeadlineExceeded`]
/// always mean nothing was written: a write whose context ends before it
/// commits is rolled back, and one whose context ends while it is committing
/// reports the commit's real outcome.
#[async_trait]
pub trait FeedsStore: Send + Sync {
    /// Persists a new feeds manager and returns its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`FeedsStoreError::ConstraintViolation`] when the schema
    /// rejects the row, or a connectivity/timeout error.
    async fn create_manager(
        &self,
        ctx: &OperationContext,
        manager: &NewFeedsManager,
    ) -> FeedsStoreResult<FeedsManagerId>;

    /// Returns the number of persisted feeds managers.
    async fn count_managers(&self, ctx: &OperationContext) -> FeedsStoreResult<i64>;

    /// Returns all feeds managers in ascending identifier order.
    async fn list_managers(&self, ctx: &OperationContext) -> FeedsStoreResult<Vec<FeedsManager>>;

    /// Returns the feeds manager with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`FeedsStoreError::ManagerNotFound`] when no manager has the
    /// identifier, including zero and negative values.
    async fn get_manager(
        &self,
        ctx: &OperationContext,
        id: FeedsManagerId,
    ) -> FeedsStoreResult<FeedsManager>;

    /// Persists a new pending job proposal and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`FeedsStoreError::UnknownFeedsManager`] when the referenced
    /// manager does not exist.
    async fn create_job_proposal(
        &self,
        ctx: &OperationContext,
        proposal: &NewJobProposal,
    ) -> FeedsStoreResult<JobProposalId>;

    /// Returns the number of persisted job proposals.
    async fn count_job_proposals(&self, ctx: &OperationContext) -> FeedsStoreResult<i64>;

    /// Returns all job proposals in ascending identifier order.
    async fn list_job_proposals(&self, ctx: &OperationContext)
    -> FeedsStoreResult<Vec<JobProposal>>;

    /// Returns the job proposals submitted by one manager, in ascending
    /// identifier order. Unknown managers yield an empty list.
    async fn list_job_proposals_for_manager(
        &self,
        ctx: &OperationContext,
        manager_id: FeedsManagerId,
    ) -> FeedsStoreResult<Vec<JobProposal>>;

    /// Returns the job proposal with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`FeedsStoreError::JobProposalNotFound`] on a miss.
    async fn get_job_proposal(
        &self,
        ctx: &OperationContext,
        id: JobProposalId,
    ) -> FeedsStoreResult<JobProposal>;

    /// Sets the status of a job proposal.
    ///
    /// Any status may follow any other; only the status and update time
    /// change.
    ///
    /// # Errors
    ///
    /// Returns [`FeedsStoreError::JobProposalNotFound`] when the proposal
    /// does not exist.
    async fn update_job_proposal_status(
        &self,
        ctx: &OperationContext,
        id: JobProposalId,
        status: JobProposalStatus,
    ) -> FeedsStoreResult<()>;

    /// Marks a job proposal approved and links the job created for it.
    ///
    /// # Errors
    ///
    /// Returns [`FeedsStoreError::JobProposalNotFound`] when the proposal
    /// does not exist.
    async fn approve_job_proposal(
        &self,
        ctx: &OperationContext,
        id: JobProposalId,
        job_id: JobId,
    ) -> FeedsStoreResult<()>;
}

/// Coarse classification of store failures for callers mapping errors onto
/// their own surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedsStoreErrorKind {
    /// A lookup by identifier matched no row.
    NotFound,
    /// A write violated a uniqueness, check, or foreign-key constraint.
    ConstraintViolation,
    /// The database was unreachable, or the call was cancelled or timed out.
    ConnectivityOrTimeout,
    /// A stored row could not be turned back into domain values.
    InvalidPersistedData,
}

/// Errors returned by feeds store implementations.
#[derive(Debug, Clone, Error)]
pub enum FeedsStoreError {
    /// No feeds manager has the identifier.
    #[error("feeds manager not found: {0}")]
    ManagerNotFound(FeedsManagerId),

    /// No job proposal has the identifier.
    #[error("job proposal not found: {0}")]
    JobProposalNotFound(JobProposalId),

    /// A job proposal referenced a feeds manager that does not exist.
    #[error("job proposal references unknown feeds manager: {0}")]
    UnknownFeedsManager(FeedsManagerId),

    /// Any other constraint violation reported by the store.
    #[error("constraint violation: {0}")]
    ConstraintViolation(Arc<dyn std::error::Error + Send + Sync>),

    /// The operation context was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// The operation context deadline passed.
    #[error("operation deadline exceeded")]
    DeadlineExceeded,

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl FeedsStoreError {
    /// Wraps a constraint violation reported by the database.
    pub fn constraint_violation(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::ConstraintViolation(Arc::new(err))
    }

    /// Wraps a data-quality or decoding error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns the failure classification.
    #[must_use]
    pub const fn kind(&self) -> FeedsStoreErrorKind {
        match self {
            Self::ManagerNotFound(_) | Self::JobProposalNotFound(_) => {
                FeedsStoreErrorKind::NotFound
            }
            Self::UnknownFeedsManager(_) | Self::ConstraintViolation(_) => {
                FeedsStoreErrorKind::ConstraintViolation
            }
            Self::Cancelled | Self::DeadlineExceeded | Self::Persistence(_) => {
                FeedsStoreErrorKind::ConnectivityOrTimeout
            }
            Self::InvalidPersistedData(_) => FeedsStoreErrorKind::InvalidPersistedData,
        }
    }

    /// Returns `true` when a lookup matched no row.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind(), FeedsStoreErrorKind::NotFound)
    }
}
