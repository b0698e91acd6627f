//! In-memory adapter for feeds persistence.

mod store;

pub use store::InMemoryFeedsStore;
