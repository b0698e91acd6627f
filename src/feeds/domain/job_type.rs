//! Job types a feeds manager may propose.

use super::ParseJobTypeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of job a feeds manager is permitted to propose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    /// Flux monitor price feed jobs.
    FluxMonitor,
    /// Off-chain reporting jobs.
    OffchainReporting,
}

impl JobType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FluxMonitor => "fluxmonitor",
            Self::OffchainReporting => "offchainreporting",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for JobType {
    type Error = ParseJobTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "fluxmonitor" => Ok(Self::FluxMonitor),
            "offchainreporting" => Ok(Self::OffchainReporting),
            _ => Err(ParseJobTypeError(value.to_owned())),
        }
    }
}
