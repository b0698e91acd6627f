//! Domain model for feeds managers and job proposals.
//!
//! These are plain value types. Identifiers are assigned by the store, so
//! creation inputs ([`NewFeedsManager`], [`NewJobProposal`]) carry no
//! identifier at all.

mod error;
mod ids;
mod job_type;
mod manager;
mod proposal;
mod public_key;
mod status;

pub use error::{FeedsDomainError, ParseJobProposalStatusError, ParseJobTypeError};
pub use ids::{FeedsManagerId, JobId, JobProposalId};
pub use job_type::JobType;
pub use manager::{FeedsManager, NewFeedsManager, PersistedManagerData};
pub use proposal::{JobProposal, NewJobProposal, PersistedProposalData};
pub use public_key::{PUBLIC_KEY_LENGTH, PublicKey};
pub use status::JobProposalStatus;
