//! Identifier types for the feeds domain.
//!
//! All identifiers are 64-bit integers handed out by the store. Lookups accept
//! any value, including zero and negatives, which simply never match.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw identifier value.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw identifier value.
            #[must_use]
            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

store_id!(
    /// Store-assigned identifier of a feeds manager.
    FeedsManagerId
);

store_id!(
    /// Store-assigned identifier of a job proposal.
    JobProposalId
);

store_id!(
    /// Identifier of a locally created job linked from an approved proposal.
    JobId
);
