//! Diesel row models for feeds persistence.

use super::schema::{feeds_managers, job_proposals};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for feeds manager records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = feeds_managers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FeedsManagerRow {
    /// Store-assigned identifier.
    pub id: i64,
    /// Feeds manager endpoint.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// Raw public key bytes.
    pub public_key: Vec<u8>,
    /// Job type storage names.
    pub job_types: Vec<String>,
    /// Network name.
    pub network: String,
    /// Off-chain reporting bootstrap peer flag.
    pub is_ocr_bootstrap_peer: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for feeds manager records. The identifier comes from the
/// table sequence.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = feeds_managers)]
pub struct NewFeedsManagerRow {
    /// Feeds manager endpoint.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// Raw public key bytes.
    pub public_key: Vec<u8>,
    /// Job type storage names.
    pub job_types: Vec<String>,
    /// Network name.
    pub network: String,
    /// Off-chain reporting bootstrap peer flag.
    pub is_ocr_bootstrap_peer: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for job proposal records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = job_proposals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobProposalRow {
    /// Store-assigned identifier.
    pub id: i64,
    /// Remote correlation identifier.
    pub remote_uuid: uuid::Uuid,
    /// Serialized job definition.
    pub spec: String,
    /// Status code.
    pub status: i16,
    /// Linked local job.
    pub job_id: Option<i64>,
    /// Owning feeds manager.
    pub feeds_manager_id: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for job proposal records. `job_id` is left to its `NULL`
/// default.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = job_proposals)]
pub struct NewJobProposalRow {
    /// Remote correlation identifier.
    pub remote_uuid: uuid::Uuid,
    /// Serialized job definition.
    pub spec: String,
    /// Status code.
    pub status: i16,
    /// Owning feeds manager.
    pub feeds_manager_id: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
