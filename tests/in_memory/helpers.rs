//! Shared fixtures for in-memory feeds store tests.

pub use crate::test_helpers::samples::{
    FixedClock, SAMPLE_PUBLIC_KEY, sample_manager, sample_proposal,
};
use feeds_store::feeds::{
    adapters::memory::InMemoryFeedsStore,
    domain::{FeedsManagerId, JobProposalId},
    ports::{FeedsStore, OperationContext},
};
use rstest::fixture;

/// Provides a fresh store for each test.
#[fixture]
pub fn store() -> InMemoryFeedsStore {
    InMemoryFeedsStore::new()
}

/// Provides a context that never ends.
#[fixture]
pub fn ctx() -> OperationContext {
    OperationContext::background()
}

/// Creates the sample manager and returns its identifier.
pub async fn seed_manager(store: &InMemoryFeedsStore, ctx: &OperationContext) -> FeedsManagerId {
    store
        .create_manager(ctx, &sample_manager())
        .await
        .expect("manager creation should succeed")
}

/// Creates the sample manager plus one pending proposal for it.
pub async fn seed_proposal(
    store: &InMemoryFeedsStore,
    ctx: &OperationContext,
) -> (FeedsManagerId, JobProposalId) {
    let manager_id = seed_manager(store, ctx).await;
    let proposal_id = store
        .create_job_proposal(ctx, &sample_proposal(manager_id))
        .await
        .expect("proposal creation should succeed");
    (manager_id, proposal_id)
}
