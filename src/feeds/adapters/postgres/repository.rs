//! `PostgreSQL` store implementation for feeds managers and job proposals.
//!
//! Diesel calls run on the blocking pool inside a transaction. The remaining
//! context deadline bounds both connection checkout and statement execution.
//! Before committing, the task re-checks the context and claims the commit
//! through a `CommitGate`; a caller that gave up first forces a rollback,
//! and a caller whose context ends after the claim waits for the commit's
//! real outcome instead of reporting a failure for a stored row.

use super::{
    commit_gate::CommitGate,
    models::{FeedsManagerRow, JobProposalRow, NewFeedsManagerRow, NewJobProposalRow},
    schema::{feeds_managers, job_proposals},
};
use crate::feeds::{
    domain::{
        FeedsManager, FeedsManagerId, JobId, JobProposal, JobProposalId, JobProposalStatus,
        JobType, NewFeedsManager, NewJobProposal, PersistedManagerData, PersistedProposalData,
        PublicKey,
    },
    ports::{FeedsStore, FeedsStoreError, FeedsStoreResult, OperationContext},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use mockable::{Clock, DefaultClock};
use std::pin::pin;
use std::sync::Arc;
use tracing::debug;

/// `PostgreSQL` connection pool type used by the feeds store.
pub type FeedsPgPool = Pool<ConnectionManager<PgConnection>>;

/// Largest value `PostgreSQL` accepts for `statement_timeout`, in milliseconds.
const MAX_STATEMENT_TIMEOUT_MS: u128 = 2_147_483_647;

/// `PostgreSQL`-backed feeds store.
///
/// Holds a clone of the caller's pool; the pool's lifecycle stays with the
/// caller.
///
/// # Example
///
/// ```ignore
/// use diesel::r2d2::{ConnectionManager, Pool};
/// use diesel::PgConnection;
/// use feeds_store::feeds::adapters::postgres::PostgresFeedsStore;
///
/// let manager = ConnectionManager::<PgConnection>::new("postgres://...");
/// let pool = Pool::builder().build(manager).expect("pool");
/// let store = PostgresFeedsStore::new(pool);
/// ```
pub struct PostgresFeedsStore<C = DefaultClock> {
    pool: FeedsPgPool,
    clock: Arc<C>,
}

impl PostgresFeedsStore {
    /// Creates a store over `pool`, stamping records with the system clock.
    #[must_use]
    pub fn new(pool: FeedsPgPool) -> Self {
        Self::with_clock(pool, DefaultClock)
    }
}

impl<C> PostgresFeedsStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Creates a store over `pool`, stamping records with `clock`.
    #[must_use]
    pub fn with_clock(pool: FeedsPgPool, clock: C) -> Self {
        Self {
            pool,
            clock: Arc::new(clock),
        }
    }

    async fn run_blocking<F, T>(
        &self,
        ctx: &OperationContext,
        operation: &'static str,
        f: F,
    ) -> FeedsStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> FeedsStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        ctx.ensure_live()?;
        let pool = self.pool.clone();
        let scope = ctx.clone();
        let gate = Arc::new(CommitGate::default());
        let worker_gate = Arc::clone(&gate);
        let span = tracing::debug_span!(
            "feeds_store",
            operation,
            correlation_id = ?ctx.correlation_id()
        );
        let caller_span = span.clone();

        let task = tokio::task::spawn_blocking(move || {
            span.in_scope(|| {
                let mut pooled = checkout(&pool, &scope)?;
                let connection: &mut PgConnection = &mut pooled;
                connection
                    .transaction::<T, FeedsStoreError, _>(|tx| {
                        apply_statement_timeout(tx, &scope)?;
                        let output = f(tx)?;
                        if let Err(err) = scope.ensure_live() {
                            debug!(error = %err, "context ended before commit; rolling back");
                            return Err(err);
                        }
                        if !worker_gate.begin_commit() {
                            debug!("caller abandoned the call before commit; rolling back");
                            return Err(FeedsStoreError::Cancelled);
                        }
                        Ok(output)
                    })
                    .map_err(|err| classify_failure(err, &scope))
            })
        });
        let mut outcome = pin!(async move { task.await.map_err(FeedsStoreError::persistence)? });

        let ended = tokio::select! {
            biased;
            result = outcome.as_mut() => return result,
            err = ctx.done() => err,
        };
        if gate.abandon() {
            return Err(ended);
        }
        caller_span.in_scope(|| {
            debug!(error = %ended, "context ended while committing; awaiting outcome");
        });
        outcome.await
    }
}

impl<C> Clone for PostgresFeedsStore<C> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> std::fmt::Debug for PostgresFeedsStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresFeedsStore")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<C> FeedsStore for PostgresFeedsStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn create_manager(
        &self,
        ctx: &OperationContext,
        manager: &NewFeedsManager,
    ) -> FeedsStoreResult<FeedsManagerId> {
        let new_row = to_new_manager_row(manager, self.clock.utc());

        self.run_blocking(ctx, "create_manager", move |connection| {
            let id = diesel::insert_into(feeds_managers::table)
                .values(&new_row)
                .returning(feeds_managers::id)
                .get_result::<i64>(connection)
                .map_err(map_diesel_error)?;
            Ok(FeedsManagerId::new(id))
        })
        .await
    }

    async fn count_managers(&self, ctx: &OperationContext) -> FeedsStoreResult<i64> {
        self.run_blocking(ctx, "count_managers", |connection| {
            feeds_managers::table
                .count()
                .get_result::<i64>(connection)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_managers(&self, ctx: &OperationContext) -> FeedsStoreResult<Vec<FeedsManager>> {
        self.run_blocking(ctx, "list_managers", |connection| {
            let rows = feeds_managers::table
                .order(feeds_managers::id.asc())
                .select(FeedsManagerRow::as_select())
                .load::<FeedsManagerRow>(connection)
                .map_err(map_diesel_error)?;
            rows.into_iter().map(row_to_manager).collect()
        })
        .await
    }

    async fn get_manager(
        &self,
        ctx: &OperationContext,
        id: FeedsManagerId,
    ) -> FeedsStoreResult<FeedsManager> {
        self.run_blocking(ctx, "get_manager", move |connection| {
            let row = feeds_managers::table
                .find(id.value())
                .select(FeedsManagerRow::as_select())
                .first::<FeedsManagerRow>(connection)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or(FeedsStoreError::ManagerNotFound(id))?;
            row_to_manager(row)
        })
        .await
    }

    async fn create_job_proposal(
        &self,
        ctx: &OperationContext,
        proposal: &NewJobProposal,
    ) -> FeedsStoreResult<JobProposalId> {
        let manager_id = proposal.feeds_manager_id;
        let new_row = to_new_proposal_row(proposal, self.clock.utc());

        self.run_blocking(ctx, "create_job_proposal", move |connection| {
            let id = diesel::insert_into(job_proposals::table)
                .values(&new_row)
                .returning(job_proposals::id)
                .get_result::<i64>(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        FeedsStoreError::UnknownFeedsManager(manager_id)
                    }
                    other => map_diesel_error(other),
                })?;
            Ok(JobProposalId::new(id))
        })
        .await
    }

    async fn count_job_proposals(&self, ctx: &OperationContext) -> FeedsStoreResult<i64> {
        self.run_blocking(ctx, "count_job_proposals", |connection| {
            job_proposals::table
                .count()
                .get_result::<i64>(connection)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_job_proposals(
        &self,
        ctx: &OperationContext,
    ) -> FeedsStoreResult<Vec<JobProposal>> {
        self.run_blocking(ctx, "list_job_proposals", |connection| {
            let rows = job_proposals::table
                .order(job_proposals::id.asc())
                .select(JobProposalRow::as_select())
                .load::<JobProposalRow>(connection)
                .map_err(map_diesel_error)?;
            rows.into_iter().map(row_to_proposal).collect()
        })
        .await
    }

    async fn list_job_proposals_for_manager(
        &self,
        ctx: &OperationContext,
        manager_id: FeedsManagerId,
    ) -> FeedsStoreResult<Vec<JobProposal>> {
        self.run_blocking(ctx, "list_job_proposals_for_manager", move |connection| {
            let rows = job_proposals::table
                .filter(job_proposals::feeds_manager_id.eq(manager_id.value()))
                .order(job_proposals::id.asc())
                .select(JobProposalRow::as_select())
                .load::<JobProposalRow>(connection)
                .map_err(map_diesel_error)?;
            rows.into_iter().map(row_to_proposal).collect()
        })
        .await
    }

    async fn get_job_proposal(
        &self,
        ctx: &OperationContext,
        id: JobProposalId,
    ) -> FeedsStoreResult<JobProposal> {
        self.run_blocking(ctx, "get_job_proposal", move |connection| {
            let row = job_proposals::table
                .find(id.value())
                .select(JobProposalRow::as_select())
                .first::<JobProposalRow>(connection)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or(FeedsStoreError::JobProposalNotFound(id))?;
            row_to_proposal(row)
        })
        .await
    }

    async fn update_job_proposal_status(
        &self,
        ctx: &OperationContext,
        id: JobProposalId,
        status: JobProposalStatus,
    ) -> FeedsStoreResult<()> {
        let updated_at = self.clock.utc();

        self.run_blocking(ctx, "update_job_proposal_status", move |connection| {
            let updated_count = diesel::update(job_proposals::table.find(id.value()))
                .set((
                    job_proposals::status.eq(status.code()),
                    job_proposals::updated_at.eq(updated_at),
                ))
                .execute(connection)
                .map_err(map_diesel_error)?;

            if updated_count == 0 {
                return Err(FeedsStoreError::JobProposalNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn approve_job_proposal(
        &self,
        ctx: &OperationContext,
        id: JobProposalId,
        job_id: JobId,
    ) -> FeedsStoreResult<()> {
        let updated_at = self.clock.utc();

        self.run_blocking(ctx, "approve_job_proposal", move |connection| {
            let updated_count = diesel::update(job_proposals::table.find(id.value()))
                .set((
                    job_proposals::status.eq(JobProposalStatus::Approved.code()),
                    job_proposals::job_id.eq(Some(job_id.value())),
                    job_proposals::updated_at.eq(updated_at),
                ))
                .execute(connection)
                .map_err(map_diesel_error)?;

            if updated_count == 0 {
                return Err(FeedsStoreError::JobProposalNotFound(id));
            }
            Ok(())
        })
        .await
    }
}

impl From<DieselError> for FeedsStoreError {
    fn from(err: DieselError) -> Self {
        map_diesel_error(err)
    }
}

type FeedsPgConnection = PooledConnection<ConnectionManager<PgConnection>>;

fn checkout(pool: &FeedsPgPool, scope: &OperationContext) -> FeedsStoreResult<FeedsPgConnection> {
    let connection = match scope.remaining() {
        Some(remaining) => pool.get_timeout(remaining),
        None => pool.get(),
    };
    connection.map_err(|err| {
        if scope.is_expired() {
            FeedsStoreError::DeadlineExceeded
        } else {
            FeedsStoreError::persistence(err)
        }
    })
}

/// Bounds every statement in the current transaction by the context
/// deadline. `SET` does not take bind parameters; the value is an integer.
///
/// The value is rounded up so the server never cancels a statement before
/// the deadline has passed on this side.
fn apply_statement_timeout(
    connection: &mut PgConnection,
    scope: &OperationContext,
) -> FeedsStoreResult<()> {
    let Some(remaining) = scope.remaining() else {
        return Ok(());
    };
    let millis = remaining
        .as_micros()
        .div_ceil(1_000)
        .clamp(1, MAX_STATEMENT_TIMEOUT_MS);
    diesel::sql_query(format!("SET LOCAL statement_timeout = {millis}"))
        .execute(connection)
        .map_err(map_diesel_error)?;
    Ok(())
}

/// Reports driver failures that arrive after the deadline as
/// [`FeedsStoreError::DeadlineExceeded`], whatever the server's message says.
fn classify_failure(err: FeedsStoreError, scope: &OperationContext) -> FeedsStoreError {
    match err {
        FeedsStoreError::Persistence(_) if scope.is_expired() => {
            FeedsStoreError::DeadlineExceeded
        }
        other => other,
    }
}

fn map_diesel_error(err: DieselError) -> FeedsStoreError {
    match err {
        DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation
            | DatabaseErrorKind::ForeignKeyViolation
            | DatabaseErrorKind::NotNullViolation
            | DatabaseErrorKind::CheckViolation,
            _,
        ) => FeedsStoreError::constraint_violation(err),
        DieselError::DatabaseError(_, ref info) if is_statement_timeout(info.as_ref()) => {
            FeedsStoreError::DeadlineExceeded
        }
        _ => FeedsStoreError::persistence(err),
    }
}

/// Diesel does not expose the SQLSTATE (`57014`), so this matches the
/// server text, which is only English under `lc_messages = 'C'` or an
/// English locale. Other locales fall through to `classify_failure`, which
/// keys off the local deadline instead.
fn is_statement_timeout(info: &dyn DatabaseErrorInformation) -> bool {
    info.message().contains("statement timeout")
}

fn to_new_manager_row(manager: &NewFeedsManager, now: DateTime<Utc>) -> NewFeedsManagerRow {
    NewFeedsManagerRow {
        uri: manager.uri.clone(),
        name: manager.name.clone(),
        public_key: manager.public_key.as_bytes().to_vec(),
        job_types: manager
            .job_types
            .iter()
            .map(|job_type| job_type.as_str().to_owned())
            .collect(),
        network: manager.network.clone(),
        is_ocr_bootstrap_peer: manager.is_ocr_bootstrap_peer,
        created_at: now,
        updated_at: now,
    }
}

fn to_new_proposal_row(proposal: &NewJobProposal, now: DateTime<Utc>) -> NewJobProposalRow {
    NewJobProposalRow {
        remote_uuid: proposal.remote_uuid,
        spec: proposal.spec.clone(),
        status: JobProposalStatus::Pending.code(),
        feeds_manager_id: proposal.feeds_manager_id.value(),
        created_at: now,
        updated_at: now,
    }
}

fn row_to_manager(row: FeedsManagerRow) -> FeedsStoreResult<FeedsManager> {
    let FeedsManagerRow {
        id,
        uri,
        name,
        public_key,
        job_types,
        network,
        is_ocr_bootstrap_peer,
        created_at,
        updated_at,
    } = row;

    let parsed_key =
        PublicKey::from_slice(&public_key).map_err(FeedsStoreError::invalid_persisted_data)?;
    let parsed_job_types = job_types
        .iter()
        .map(|value| JobType::try_from(value.as_str()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(FeedsStoreError::invalid_persisted_data)?;

    Ok(FeedsManager::from_persisted(PersistedManagerData {
        id: FeedsManagerId::new(id),
        attributes: NewFeedsManager {
            uri,
            name,
            public_key: parsed_key,
            job_types: parsed_job_types,
            network,
            is_ocr_bootstrap_peer,
        },
        created_at,
        updated_at,
    }))
}

fn row_to_proposal(row: JobProposalRow) -> FeedsStoreResult<JobProposal> {
    let JobProposalRow {
        id,
        remote_uuid,
        spec,
        status,
        job_id,
        feeds_manager_id,
        created_at,
        updated_at,
    } = row;

    let parsed_status =
        JobProposalStatus::try_from(status).map_err(FeedsStoreError::invalid_persisted_data)?;

    Ok(JobProposal::from_persisted(PersistedProposalData {
        id: JobProposalId::new(id),
        remote_uuid,
        spec,
        status: parsed_status,
        job_id: job_id.map(JobId::new),
        feeds_manager_id: FeedsManagerId::new(feeds_manager_id),
        created_at,
        updated_at,
    }))
}
