//! Feeds store: persistence for feeds managers and job proposals.
//!
//! A feeds manager is a registered external counterparty that proposes job
//! configurations to a node; a job proposal is one such configuration
//! awaiting approval. This crate provides the narrow repository those records
//! need: identity assignment, lookup, listing, counting, and proposal status
//! changes, each scoped by a caller-supplied
//! [`OperationContext`](feeds::ports::OperationContext).
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure value types with no infrastructure dependencies
//! - **Ports**: The [`FeedsStore`](feeds::ports::FeedsStore) trait and its
//!   error and context types
//! - **Adapters**: `PostgreSQL` (Diesel) and in-memory implementations
//!
//! # Modules
//!
//! - [`feeds`]: Feeds manager and job proposal persistence
//! - [`config`]: Connection settings and pool construction

pub mod config;
pub mod feeds;
