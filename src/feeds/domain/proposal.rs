//! Job proposal records.

use super::{FeedsManagerId, JobId, JobProposalId, JobProposalStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A job proposal submitted by a feeds manager, not yet persisted.
///
/// New proposals are always stored as [`JobProposalStatus::Pending`] with no
/// linked job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJobProposal {
    /// Identifier assigned by the remote feeds manager.
    pub remote_uuid: Uuid,
    /// Serialized job definition; may be empty.
    pub spec: String,
    /// Manager that submitted the proposal. Must already exist.
    pub feeds_manager_id: FeedsManagerId,
}

/// A persisted job proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProposal {
    id: JobProposalId,
    remote_uuid: Uuid,
    spec: String,
    status: JobProposalStatus,
    job_id: Option<JobId>,
    feeds_manager_id: FeedsManagerId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted job proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProposalData {
    /// Store-assigned identifier.
    pub id: JobProposalId,
    /// Remote correlation identifier.
    pub remote_uuid: Uuid,
    /// Serialized job definition.
    pub spec: String,
    /// Current status.
    pub status: JobProposalStatus,
    /// Linked local job, if any.
    pub job_id: Option<JobId>,
    /// Owning feeds manager.
    pub feeds_manager_id: FeedsManagerId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl JobProposal {
    /// Reconstructs a proposal from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedProposalData) -> Self {
        Self {
            id: data.id,
            remote_uuid: data.remote_uuid,
            spec: data.spec,
            status: data.status,
            job_id: data.job_id,
            feeds_manager_id: data.feeds_manager_id,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the store-assigned identifier.
    #[must_use]
    pub const fn id(&self) -> JobProposalId {
        self.id
    }

    /// Returns the remote correlation identifier.
    #[must_use]
    pub const fn remote_uuid(&self) -> Uuid {
        self.remote_uuid
    }

    /// Returns the serialized job definition.
    #[must_use]
    pub fn spec(&self) -> &str {
        &self.spec
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> JobProposalStatus {
        self.status
    }

    /// Returns the linked local job, or `None` when no job is linked.
    #[must_use]
    pub const fn job_id(&self) -> Option<JobId> {
        self.job_id
    }

    /// Returns the owning feeds manager.
    #[must_use]
    pub const fn feeds_manager_id(&self) -> FeedsManagerId {
        self.feeds_manager_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sets the status and stamps the update time.
    pub(crate) const fn set_status(&mut self, status: JobProposalStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    /// Marks the proposal approved and links the created job.
    pub(crate) const fn approve(&mut self, job_id: JobId, at: DateTime<Utc>) {
        self.status = JobProposalStatus::Approved;
        self.job_id = Some(job_id);
        self.updated_at = at;
    }
}
