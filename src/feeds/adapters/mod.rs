//! Adapter implementations of the [`FeedsStore`] port.
//!
//! - [`memory::InMemoryFeedsStore`]: thread-safe in-memory storage for tests
//!   and embedding
//! - [`postgres::PostgresFeedsStore`]: `PostgreSQL` persistence using Diesel
//!
//! [`FeedsStore`]: crate::feeds::ports::FeedsStore

pub mod memory;
pub mod postgres;
