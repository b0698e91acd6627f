//! Job proposal status.

use super::ParseJobProposalStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Approval status of a job proposal.
///
/// New proposals always start as [`JobProposalStatus::Pending`]. The store
/// accepts any transition between these values; transition policy belongs to
/// the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobProposalStatus {
    /// Awaiting a decision.
    #[default]
    Pending,
    /// Accepted; may be linked to a local job.
    Approved,
    /// Declined by the node operator.
    Rejected,
    /// Withdrawn.
    Cancelled,
}

impl JobProposalStatus {
    /// Returns the small-integer storage code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Pending => 0,
            Self::Approved => 1,
            Self::Rejected => 2,
            Self::Cancelled => 3,
        }
    }

    /// Returns the lowercase name used for display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i16> for JobProposalStatus {
    type Error = ParseJobProposalStatusError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Approved),
            2 => Ok(Self::Rejected),
            3 => Ok(Self::Cancelled),
            _ => Err(ParseJobProposalStatusError(code.to_string())),
        }
    }
}

impl TryFrom<&str> for JobProposalStatus {
    type Error = ParseJobProposalStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseJobProposalStatusError(value.to_owned())),
        }
    }
}
