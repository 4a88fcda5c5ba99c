//! Core types and trait definitions for the iwant request store.
//!
//! Requests are asks to do an activity before a deadline; results group
//! compatible requests. This crate holds the data model, the
//! [`store::RequestStore`] contract every backend implements, and the
//! [`engine`] that owns the merge/demote rules so that backends only supply
//! a [`repository::Repository`].
//!
//! This crate is deliberately free of database dependencies.

pub mod descriptor;
pub mod engine;
pub mod error;
pub mod repository;
pub mod request;
pub mod result;
pub mod store;

#[cfg(feature = "testkit")]
pub mod testkit;

pub use error::{Classify, Error, ErrorKind, Result};
