//! Shared test helpers for `PostgreSQL` integration tests.

pub use super::cluster::{BoxError, PostgresCluster, shared_cluster};
pub use crate::test_helpers::samples::{
    FixedClock, SAMPLE_PUBLIC_KEY, sample_manager, sample_proposal,
};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use feeds_store::feeds::{
    adapters::postgres::PostgresFeedsStore,
    domain::{FeedsManagerId, JobProposalId},
    ports::{FeedsStore, OperationContext},
};
use rstest::fixture;
use std::io;
use tokio::runtime::Runtime;
use uuid::Uuid;

/// SQL creating the feeds tables.
pub const CREATE_FEEDS_TABLES_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_feeds_tables/up.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "feeds_store_test_template";

/// Builds a single-threaded runtime for driving async calls from sync tests.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created.
pub fn test_runtime() -> io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Temporary database dropped when the guard goes out of scope.
pub struct TemporaryDatabase {
    cluster: PostgresCluster,
    name: String,
}

impl TemporaryDatabase {
    /// Returns the connection URL of the database.
    #[must_use]
    pub fn url(&self) -> String {
        self.cluster.database_url(&self.name)
    }
}

impl Drop for TemporaryDatabase {
    fn drop(&mut self) {
        drop(self.cluster.drop_database(&self.name));
    }
}

/// Store wired to a fresh database cloned from the migrated template.
///
/// Fields drop in declaration order, so the pool closes before the database
/// is dropped.
pub struct StoreTestContext<C = mockable::DefaultClock> {
    /// Store under test.
    pub store: PostgresFeedsStore<C>,
    /// Context that never ends.
    pub ctx: OperationContext,
    /// Runtime driving the store futures.
    pub rt: Runtime,
    /// Database backing the store.
    pub database: TemporaryDatabase,
}

impl<C> StoreTestContext<C>
where
    C: mockable::Clock + Send + Sync + 'static,
{
    /// Creates the sample manager and returns its identifier.
    pub fn seed_manager(&self) -> FeedsManagerId {
        self.rt
            .block_on(self.store.create_manager(&self.ctx, &sample_manager()))
            .expect("manager creation should succeed")
    }

    /// Creates the sample manager plus one pending proposal for it.
    pub fn seed_proposal(&self) -> (FeedsManagerId, JobProposalId) {
        let manager_id = self.seed_manager();
        let proposal_id = self
            .rt
            .block_on(
                self.store
                    .create_job_proposal(&self.ctx, &sample_proposal(manager_id)),
            )
            .expect("proposal creation should succeed");
        (manager_id, proposal_id)
    }

    /// Runs raw SQL against the backing database.
    pub fn execute_sql(&self, sql: &str) {
        let mut conn = PgConnection::establish(&self.database.url()).expect("connect");
        conn.batch_execute(sql).expect("raw SQL should succeed");
    }
}

fn apply_migrations(url: &str) -> Result<(), BoxError> {
    let mut conn = PgConnection::establish(url).map_err(|err| Box::new(err) as BoxError)?;
    conn.batch_execute(CREATE_FEEDS_TABLES_SQL)
        .map_err(|err| Box::new(err) as BoxError)?;
    Ok(())
}

/// Creates a migrated database and a store over it using `clock`.
///
/// # Errors
///
/// Returns an error if template setup, database creation or pool
/// construction fails.
pub fn setup_store_with_clock<C>(clock: C) -> Result<StoreTestContext<C>, BoxError>
where
    C: mockable::Clock + Send + Sync + 'static,
{
    let cluster = shared_cluster();
    cluster.ensure_template_exists(TEMPLATE_DB, apply_migrations)?;

    let name = format!("feeds_test_{}", Uuid::new_v4().simple());
    cluster.create_database_from_template(&name, TEMPLATE_DB)?;
    let database = TemporaryDatabase { cluster, name };

    let manager = ConnectionManager::<PgConnection>::new(database.url());
    let pool = Pool::builder()
        .max_size(2)
        .build(manager)
        .map_err(|err| Box::new(err) as BoxError)?;

    Ok(StoreTestContext {
        store: PostgresFeedsStore::with_clock(pool, clock),
        ctx: OperationContext::background(),
        rt: test_runtime()?,
        database,
    })
}

/// Provides a store over a fresh database.
#[fixture]
pub fn store_context() -> StoreTestContext {
    setup_store_with_clock(mockable::DefaultClock).expect("store setup")
}
