//! Error types for feeds domain construction and parsing.

use thiserror::Error;

/// Errors returned while constructing feeds domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedsDomainError {
    /// A public key was not exactly 32 bytes long.
    #[error("public key must be {expected} bytes, got {actual}")]
    InvalidPublicKeyLength {
        /// Required key length in bytes.
        expected: usize,
        /// Length of the rejected input.
        actual: usize,
    },
}

/// Error returned while parsing a job type from its storage form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown job type: {0}")]
pub struct ParseJobTypeError(pub String);

/// Error returned while decoding a job proposal status code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown job proposal status: {0}")]
pub struct ParseJobProposalStatusError(pub String);
