//! Job proposal operations against `PostgreSQL`.

use crate::postgres::helpers::{StoreTestContext, sample_proposal, store_context};
use feeds_store::feeds::{
    domain::{FeedsManagerId, JobId, JobProposalId, JobProposalStatus, NewJobProposal},
    ports::{FeedsStore, FeedsStoreError, FeedsStoreErrorKind},
};
use rstest::rstest;
use uuid::Uuid;

#[rstest]
fn new_proposal_is_pending_without_job(store_context: StoreTestContext) {
    let manager_id = store_context.seed_manager();
    let input = NewJobProposal {
        remote_uuid: Uuid::new_v4(),
        spec: "type = \"offchainreporting\"".to_owned(),
        feeds_manager_id: manager_id,
    };

    assert_eq!(
        store_context
            .rt
            .block_on(store_context.store.count_job_proposals(&store_context.ctx))
            .expect("count"),
        0
    );
    let id = store_context
        .rt
        .block_on(store_context.store.create_job_proposal(&store_context.ctx, &input))
        .expect("proposal creation should succeed");
    let proposal = store_context
        .rt
        .block_on(store_context.store.get_job_proposal(&store_context.ctx, id))
        .expect("proposal should exist");

    assert_ne!(id.value(), 0);
    assert_eq!(proposal.remote_uuid(), input.remote_uuid);
    assert_eq!(proposal.spec(), input.spec);
    assert_eq!(proposal.status(), JobProposalStatus::Pending);
    assert_eq!(proposal.job_id(), None);
    assert_eq!(proposal.feeds_manager_id(), manager_id);
    assert_eq!(
        store_context
            .rt
            .block_on(store_context.store.count_job_proposals(&store_context.ctx))
            .expect("count"),
        1
    );
}

#[rstest]
fn list_proposals_returns_the_single_record(store_context: StoreTestContext) {
    let (_, id) = store_context.seed_proposal();

    let ids: Vec<_> = store_context
        .rt
        .block_on(store_context.store.list_job_proposals(&store_context.ctx))
        .expect("list should succeed")
        .iter()
        .map(|proposal| proposal.id())
        .collect();

    assert_eq!(ids, vec![id]);
}

#[rstest]
fn proposal_for_unknown_manager_is_rejected(store_context: StoreTestContext) {
    let missing = FeedsManagerId::new(42);

    let err = store_context
        .rt
        .block_on(
            store_context
                .store
                .create_job_proposal(&store_context.ctx, &sample_proposal(missing)),
        )
        .expect_err("creation should fail");

    assert!(matches!(err, FeedsStoreError::UnknownFeedsManager(id) if id == missing));
    assert_eq!(err.kind(), FeedsStoreErrorKind::ConstraintViolation);
    assert_eq!(
        store_context
            .rt
            .block_on(store_context.store.count_job_proposals(&store_context.ctx))
            .expect("count"),
        0
    );
}

#[rstest]
fn duplicate_remote_uuids_are_allowed(store_context: StoreTestContext) {
    let manager_id = store_context.seed_manager();
    let input = sample_proposal(manager_id);

    for _ in 0..2 {
        store_context
            .rt
            .block_on(store_context.store.create_job_proposal(&store_context.ctx, &input))
            .expect("creation should succeed");
    }

    assert_eq!(
        store_context
            .rt
            .block_on(store_context.store.count_job_proposals(&store_context.ctx))
            .expect("count"),
        2
    );
}

#[rstest]
#[case(0)]
#[case(-7)]
fn get_unassigned_proposal_is_not_found(
    store_context: StoreTestContext,
    #[case] raw_id: i64,
) {
    let id = JobProposalId::new(raw_id);

    let err = store_context
        .rt
        .block_on(store_context.store.get_job_proposal(&store_context.ctx, id))
        .expect_err("lookup should miss");

    assert!(matches!(err, FeedsStoreError::JobProposalNotFound(missing) if missing == id));
}

#[rstest]
fn status_update_changes_only_status(store_context: StoreTestContext) {
    let (_, id) = store_context.seed_proposal();
    let before = store_context
        .rt
        .block_on(store_context.store.get_job_proposal(&store_context.ctx, id))
        .expect("before");

    store_context
        .rt
        .block_on(store_context.store.update_job_proposal_status(
            &store_context.ctx,
            id,
            JobProposalStatus::Rejected,
        ))
        .expect("update should succeed");
    let after = store_context
        .rt
        .block_on(store_context.store.get_job_proposal(&store_context.ctx, id))
        .expect("after");

    assert_eq!(after.status(), JobProposalStatus::Rejected);
    assert_eq!(after.remote_uuid(), before.remote_uuid());
    assert_eq!(after.spec(), before.spec());
    assert_eq!(after.job_id(), before.job_id());
    assert_eq!(after.feeds_manager_id(), before.feeds_manager_id());
    assert_eq!(after.created_at(), before.created_at());
}

#[rstest]
fn updating_missing_proposal_is_not_found(store_context: StoreTestContext) {
    let id = JobProposalId::new(5);

    let err = store_context
        .rt
        .block_on(store_context.store.update_job_proposal_status(
            &store_context.ctx,
            id,
            JobProposalStatus::Cancelled,
        ))
        .expect_err("update should fail");

    assert!(matches!(err, FeedsStoreError::JobProposalNotFound(missing) if missing == id));
}

#[rstest]
fn approval_links_job_and_survives_later_updates(store_context: StoreTestContext) {
    let (_, id) = store_context.seed_proposal();

    store_context
        .rt
        .block_on(
            store_context
                .store
                .approve_job_proposal(&store_context.ctx, id, JobId::new(0)),
        )
        .expect("approval should succeed");
    let approved = store_context
        .rt
        .block_on(store_context.store.get_job_proposal(&store_context.ctx, id))
        .expect("proposal");
    assert_eq!(approved.status(), JobProposalStatus::Approved);
    assert_eq!(approved.job_id(), Some(JobId::new(0)));

    store_context
        .rt
        .block_on(store_context.store.update_job_proposal_status(
            &store_context.ctx,
            id,
            JobProposalStatus::Cancelled,
        ))
        .expect("update should succeed");
    let cancelled = store_context
        .rt
        .block_on(store_context.store.get_job_proposal(&store_context.ctx, id))
        .expect("proposal");
    assert_eq!(cancelled.status(), JobProposalStatus::Cancelled);
    assert_eq!(cancelled.job_id(), Some(JobId::new(0)));
}

#[rstest]
fn proposals_filter_by_manager(store_context: StoreTestContext) {
    let (first_manager, first_proposal) = store_context.seed_proposal();
    let (_, second_proposal) = store_context.seed_proposal();

    let ids: Vec<_> = store_context
        .rt
        .block_on(
            store_context
                .store
                .list_job_proposals_for_manager(&store_context.ctx, first_manager),
        )
        .expect("list should succeed")
        .iter()
        .map(|proposal| proposal.id())
        .collect();

    assert_eq!(ids, vec![first_proposal]);
    assert!(!ids.contains(&second_proposal));
}

#[rstest]
fn unknown_stored_status_is_invalid_data(store_context: StoreTestContext) {
    let (_, id) = store_context.seed_proposal();
    store_context.execute_sql(
        "ALTER TABLE job_proposals DROP CONSTRAINT job_proposals_status_check; \
         UPDATE job_proposals SET status = 9",
    );

    let err = store_context
        .rt
        .block_on(store_context.store.get_job_proposal(&store_context.ctx, id))
        .expect_err("read should fail");

    assert_eq!(err.kind(), FeedsStoreErrorKind::InvalidPersistedData);
}
