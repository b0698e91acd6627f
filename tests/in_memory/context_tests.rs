//! Cancellation and deadline handling in the in-memory store.

use super::helpers::{sample_manager, sample_proposal, seed_manager, seed_proposal, store};
use feeds_store::feeds::{
    adapters::memory::InMemoryFeedsStore,
    domain::JobProposalStatus,
    ports::{CancellationHandle, FeedsStore, FeedsStoreError, OperationContext},
};
use rstest::rstest;
use std::time::Duration;

fn cancelled() -> OperationContext {
    let handle = CancellationHandle::new();
    handle.cancel();
    OperationContext::background().with_cancellation(&handle)
}

fn expired() -> OperationContext {
    OperationContext::background().with_timeout(Duration::ZERO)
}

#[rstest]
#[case::cancelled(cancelled())]
#[case::expired(expired())]
#[tokio::test(flavor = "multi_thread")]
async fn ended_context_writes_nothing(store: InMemoryFeedsStore, #[case] ended: OperationContext) {
    let live = OperationContext::background();

    let result = store.create_manager(&ended, &sample_manager()).await;

    assert!(matches!(
        result,
        Err(FeedsStoreError::Cancelled | FeedsStoreError::DeadlineExceeded)
    ));
    assert_eq!(store.count_managers(&live).await.expect("count"), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_status_update_leaves_record(store: InMemoryFeedsStore) {
    let live = OperationContext::background();
    let (_, id) = seed_proposal(&store, &live).await;

    let err = store
        .update_job_proposal_status(&cancelled(), id, JobProposalStatus::Approved)
        .await
        .expect_err("update should be refused");

    assert!(matches!(err, FeedsStoreError::Cancelled));
    let proposal = store.get_job_proposal(&live, id).await.expect("proposal");
    assert_eq!(proposal.status(), JobProposalStatus::Pending);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expired_context_refuses_reads(store: InMemoryFeedsStore) {
    let live = OperationContext::background();
    let manager_id = seed_manager(&store, &live).await;
    let ctx = expired();

    assert!(matches!(
        store.get_manager(&ctx, manager_id).await,
        Err(FeedsStoreError::DeadlineExceeded)
    ));
    assert!(matches!(
        store.list_job_proposals(&ctx).await,
        Err(FeedsStoreError::DeadlineExceeded)
    ));
    assert!(matches!(
        store
            .create_job_proposal(&ctx, &sample_proposal(manager_id))
            .await,
        Err(FeedsStoreError::DeadlineExceeded)
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_creates_get_distinct_ids(store: InMemoryFeedsStore) {
    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .create_manager(&OperationContext::background(), &sample_manager())
                    .await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(
            task.await
                .expect("task should join")
                .expect("creation should succeed"),
        );
    }
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 16);
    let ctx = OperationContext::background();
    assert_eq!(store.count_managers(&ctx).await.expect("count"), 16);
}
