//! `PostgreSQL` adapter for feeds persistence.

mod commit_gate;
mod models;
mod repository;
mod schema;

pub use repository::{FeedsPgPool, PostgresFeedsStore};
