//! The `RequestStore` trait.
//!
//! The trait is implemented by storage backends (`iwant-store-memory`,
//! `iwant-store-sqlite`). Callers depend on this abstraction, not on any
//! concrete backend, and every backend must behave identically; both
//! guarantee that by delegating all state transitions to [`crate::engine`].

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  error::Classify,
  request::{NewRequest, PersonId, Request, RequestId},
  result::{RequestResult, ResultId},
};

/// Abstraction over a request/result store backend.
///
/// Every mutating method is atomic: it either applies all of its membership
/// and status changes or none of them.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait RequestStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Requests ──────────────────────────────────────────────────────────

  /// Persist a request and link it to a new singleton `Pending` result.
  /// Returns the stored request with its id and `resolved_by` filled in.
  fn store_request(
    &self,
    request: NewRequest,
  ) -> impl Future<Output = Result<Request, Self::Error>> + Send + '_;

  /// All stored requests, optionally only those for `activity`.
  fn get_activity_requests<'a>(
    &'a self,
    activity: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Request>, Self::Error>> + Send + 'a;

  /// Requests whose deadline lies within `threshold_seconds` before
  /// `reference` (inclusive at both ends).
  fn get_requests_by_deadline_proximity(
    &self,
    reference: DateTime<Utc>,
    threshold_seconds: u32,
  ) -> impl Future<Output = Result<Vec<Request>, Self::Error>> + Send + '_;

  /// Delete a request, then demote or invalidate the result it belonged to.
  ///
  /// Fails with an `Unauthorized` error both when the request is missing and
  /// when it belongs to a different person.
  fn remove_activity_request<'a>(
    &'a self,
    request_id: &'a RequestId,
    person_id: &'a PersonId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Results ───────────────────────────────────────────────────────────

  /// Retrieve a result by id, `Invalid` tombstones included.
  fn get_result(
    &self,
    result_id: ResultId,
  ) -> impl Future<Output = Result<RequestResult, Self::Error>> + Send + '_;

  /// The requests currently referencing `result_id`.
  fn get_requests_of_result(
    &self,
    result_id: ResultId,
  ) -> impl Future<Output = Result<Vec<Request>, Self::Error>> + Send + '_;

  /// Merge the given (caller-validated) requests onto one surviving result
  /// and return its id. Re-merging a merged group plus more requests extends
  /// the same result.
  fn resolve_requests<'a>(
    &'a self,
    request_ids: &'a [RequestId],
  ) -> impl Future<Output = Result<ResultId, Self::Error>> + Send + 'a;

  // ── Maintenance ───────────────────────────────────────────────────────

  /// Remove every request and result. Intended for test setup.
  fn wipe_database(&self)
  -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
