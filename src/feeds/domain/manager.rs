//! Feeds manager records.

use super::{FeedsManagerId, JobType, PublicKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attributes of a feeds manager that has not been persisted yet.
///
/// The store validates nothing here beyond what the schema enforces: empty
/// strings and an empty job type list are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFeedsManager {
    /// Endpoint of the feeds manager service.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// Key used to authenticate messages from the manager.
    pub public_key: PublicKey,
    /// Job types the manager may propose, in the order given.
    pub job_types: Vec<JobType>,
    /// Network the manager operates on, such as `mainnet`.
    pub network: String,
    /// Whether the manager acts as an off-chain reporting bootstrap peer.
    pub is_ocr_bootstrap_peer: bool,
}

/// A persisted feeds manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedsManager {
    id: FeedsManagerId,
    uri: String,
    name: String,
    public_key: PublicKey,
    job_types: Vec<JobType>,
    network: String,
    is_ocr_bootstrap_peer: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted feeds manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedManagerData {
    /// Store-assigned identifier.
    pub id: FeedsManagerId,
    /// Attributes as supplied at creation.
    pub attributes: NewFeedsManager,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl FeedsManager {
    /// Reconstructs a manager from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedManagerData) -> Self {
        let PersistedManagerData {
            id,
            attributes,
            created_at,
            updated_at,
        } = data;
        let NewFeedsManager {
            uri,
            name,
            public_key,
            job_types,
            network,
            is_ocr_bootstrap_peer,
        } = attributes;

        Self {
            id,
            uri,
            name,
            public_key,
            job_types,
            network,
            is_ocr_bootstrap_peer,
            created_at,
            updated_at,
        }
    }

    /// Returns the store-assigned identifier.
    #[must_use]
    pub const fn id(&self) -> FeedsManagerId {
        self.id
    }

    /// Returns the manager URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the public key.
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Returns the permitted job types in stored order.
    #[must_use]
    pub fn job_types(&self) -> &[JobType] {
        &self.job_types
    }

    /// Returns the network name.
    #[must_use]
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Returns whether the manager is an off-chain reporting bootstrap peer.
    #[must_use]
    pub const fn is_ocr_bootstrap_peer(&self) -> bool {
        self.is_ocr_bootstrap_peer
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

    /// Returns the creation-time attributes, without identity or timestamps.
    #[must_use]
    pub fn attributes(&self) -> NewFeedsManager {
        NewFeedsManager {
            uri: self.uri.clone(),
            name: self.name.clone(),
            public_key: self.public_key,
            job_types: self.job_types.clone(),
            network: self.network.clone(),
            is_ocr_bootstrap_peer: self.is_ocr_bootstrap_peer,
        }
    }
}
