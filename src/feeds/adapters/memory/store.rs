//! In-memory feeds store.
//!
//! Identifiers are handed out from per-table counters starting at 1, and
//! records live in ordered maps so listings come back in insertion order.

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::feeds::{
    domain::{
        FeedsManager, FeedsManagerId, JobId, JobProposal, JobProposalId, JobProposalStatus,
        NewFeedsManager, NewJobProposal, PersistedManagerData, PersistedProposalData,
    },
    ports::{FeedsStore, FeedsStoreError, FeedsStoreResult, OperationContext},
};

/// Thread-safe in-memory feeds store.
pub struct InMemoryFeedsStore<C = DefaultClock> {
    state: Arc<RwLock<InMemoryFeedsState>>,
    clock: Arc<C>,
}

#[derive(Debug, Default)]
struct InMemoryFeedsState {
    last_manager_id: i64,
    last_proposal_id: i64,
    managers: BTreeMap<FeedsManagerId, FeedsManager>,
    proposals: BTreeMap<JobProposalId, JobProposal>,
}

impl InMemoryFeedsStore {
    /// Creates an empty store stamping records with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(DefaultClock)
    }
}

impl Default for InMemoryFeedsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> InMemoryFeedsStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty store stamping records with `clock`.
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryFeedsState::default())),
            clock: Arc::new(clock),
        }
    }

    fn read(&self) -> FeedsStoreResult<RwLockReadGuard<'_, InMemoryFeedsState>> {
        self.state.read().map_err(|err| {
            FeedsStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> FeedsStoreResult<RwLockWriteGuard<'_, InMemoryFeedsState>> {
        self.state.write().map_err(|err| {
            FeedsStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

impl<C> Clone for InMemoryFeedsStore<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> std::fmt::Debug for InMemoryFeedsStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryFeedsStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl<C> FeedsStore for InMemoryFeedsStore<C>
where
    C: Clock + Send + Sync,
{
    async fn create_manager(
        &self,
        ctx: &OperationContext,
        manager: &NewFeedsManager,
    ) -> FeedsStoreResult<FeedsManagerId> {
        ctx.ensure_live()?;
        let now = self.clock.utc();
        let mut state = self.write()?;

        state.last_manager_id += 1;
        let id = FeedsManagerId::new(state.last_manager_id);
        let record = FeedsManager::from_persisted(PersistedManagerData {
            id,
            attributes: manager.clone(),
            created_at: now,
            updated_at: now,
        });
        state.managers.insert(id, record);
        Ok(id)
    }

    async fn count_managers(&self, ctx: &OperationContext) -> FeedsStoreResult<i64> {
        ctx.ensure_live()?;
        let state = self.read()?;
        i64::try_from(state.managers.len()).map_err(FeedsStoreError::persistence)
    }

    async fn list_managers(&self, ctx: &OperationContext) -> FeedsStoreResult<Vec<FeedsManager>> {
        ctx.ensure_live()?;
        let state = self.read()?;
        Ok(state.managers.values().cloned().collect())
    }

    async fn get_manager(
        &self,
        ctx: &OperationContext,
        id: FeedsManagerId,
    ) -> FeedsStoreResult<FeedsManager> {
        ctx.ensure_live()?;
        let state = self.read()?;
        state
            .managers
            .get(&id)
            .cloned()
            .ok_or(FeedsStoreError::ManagerNotFound(id))
    }

    async fn create_job_proposal(
        &self,
        ctx: &OperationContext,
        proposal: &NewJobProposal,
    ) -> FeedsStoreResult<JobProposalId> {
        ctx.ensure_live()?;
        let now = self.clock.utc();
        let mut state = self.write()?;

        if !state.managers.contains_key(&proposal.feeds_manager_id) {
            return Err(FeedsStoreError::UnknownFeedsManager(
                proposal.feeds_manager_id,
            ));
        }

        state.last_proposal_id += 1;
        let id = JobProposalId::new(state.last_proposal_id);
        let record = JobProposal::from_persisted(PersistedProposalData {
            id,
            remote_uuid: proposal.remote_uuid,
            spec: proposal.spec.clone(),
            status: JobProposalStatus::Pending,
            job_id: None,
            feeds_manager_id: proposal.feeds_manager_id,
            created_at: now,
            updated_at: now,
        });
        state.proposals.insert(id, record);
        Ok(id)
    }

    async fn count_job_proposals(&self, ctx: &OperationContext) -> FeedsStoreResult<i64> {
        ctx.ensure_live()?;
        let state = self.read()?;
        i64::try_from(state.proposals.len()).map_err(FeedsStoreError::persistence)
    }

    async fn list_job_proposals(
        &self,
        ctx: &OperationContext,
    ) -> FeedsStoreResult<Vec<JobProposal>> {
        ctx.ensure_live()?;
        let state = self.read()?;
        Ok(state.proposals.values().cloned().collect())
    }

    async fn list_job_proposals_for_manager(
        &self,
        ctx: &OperationContext,
        manager_id: FeedsManagerId,
    ) -> FeedsStoreResult<Vec<JobProposal>> {
        ctx.ensure_live()?;
        let state = self.read()?;
        let proposals = state
            .proposals
            .values()
            .filter(|proposal| proposal.feeds_manager_id() == manager_id)
            .cloned()
            .collect();
        Ok(proposals)
    }

    async fn get_job_proposal(
        &self,
        ctx: &OperationContext,
        id: JobProposalId,
    ) -> FeedsStoreResult<JobProposal> {
        ctx.ensure_live()?;
        let state = self.read()?;
        state
            .proposals
            .get(&id)
            .cloned()
            .ok_or(FeedsStoreError::JobProposalNotFound(id))
    }

    async fn update_job_proposal_status(
        &self,
        ctx: &OperationContext,
        id: JobProposalId,
        status: JobProposalStatus,
    ) -> FeedsStoreResult<()> {
        ctx.ensure_live()?;
        let now = self.clock.utc();
        let mut state = self.write()?;
        let proposal = state
            .proposals
            .get_mut(&id)
            .ok_or(FeedsStoreError::JobProposalNotFound(id))?;
        proposal.set_status(status, now);
        Ok(())
    }

    async fn approve_job_proposal(
        &self,
        ctx: &OperationContext,
        id: JobProposalId,
        job_id: JobId,
    ) -> FeedsStoreResult<()> {
        ctx.ensure_live()?;
        let now = self.clock.utc();
        let mut state = self.write()?;
        let proposal = state
            .proposals
            .get_mut(&id)
            .ok_or(FeedsStoreError::JobProposalNotFound(id))?;
        proposal.approve(job_id, now);
        Ok(())
    }
}
