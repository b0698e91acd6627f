//! Feeds manager and job proposal persistence.
//!
//! A feeds manager is a registered external counterparty allowed to propose
//! job configurations; a job proposal is one such configuration awaiting
//! approval. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - The store contract and per-call context in [`ports`]
//! - `PostgreSQL` and in-memory implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
