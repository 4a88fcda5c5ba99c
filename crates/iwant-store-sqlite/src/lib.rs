//! SQLite backend for the iwant request store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every store operation runs inside one
//! SQLite transaction; the merge/demote rules themselves come from
//! [`iwant_core::engine`].

mod encode;
mod repository;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
