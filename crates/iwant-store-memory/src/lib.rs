//! In-memory backend for the iwant request store.
//!
//! All state lives in process-local maps behind one mutex; nothing is
//! persisted. Useful for tests and for single-process deployments that can
//! afford to lose pending requests on restart.

mod state;
mod store;

pub use store::MemoryStore;

#[cfg(test)]
mod tests;
