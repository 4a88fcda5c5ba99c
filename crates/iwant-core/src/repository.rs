//! The storage capability each backend supplies to the engine.
//!
//! A [`Repository`] is a short-lived view over a backend's state that is only
//! ever used from inside that backend's serialisation boundary: a held mutex
//! guard for the in-memory store, an open transaction for SQLite. The engine
//! (see [`crate::engine`]) owns every rule about how requests and results
//! relate; repositories only read and write rows.

use chrono::{DateTime, Utc};

use crate::{
  request::{Request, RequestId},
  result::{ResultId, ResultState, ResultStatus},
};

pub trait Repository {
  /// Backend error. Must be able to carry the engine's own errors.
  type Error: From<crate::Error>;

  // ── Requests ──────────────────────────────────────────────────────────

  fn request(&self, id: &RequestId) -> Result<Option<Request>, Self::Error>;

  fn insert_request(&mut self, request: &Request) -> Result<(), Self::Error>;

  fn delete_request(&mut self, id: &RequestId) -> Result<(), Self::Error>;

  /// Point an existing request at a different result.
  fn set_resolved_by(
    &mut self,
    id: &RequestId,
    result_id: ResultId,
  ) -> Result<(), Self::Error>;

  /// All stored requests, optionally only those for `activity`.
  fn requests(&self, activity: Option<&str>) -> Result<Vec<Request>, Self::Error>;

  /// Requests whose deadline lies in `[from, to]`, both ends inclusive.
  fn requests_with_deadline_between(
    &self,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
  ) -> Result<Vec<Request>, Self::Error>;

  /// Requests currently referencing `result_id`.
  fn members(&self, result_id: ResultId) -> Result<Vec<Request>, Self::Error>;

  // ── Results ───────────────────────────────────────────────────────────

  /// Persist a new result under the next unused id and return it.
  fn create_result(
    &mut self,
    deadline: DateTime<Utc>,
    status: ResultStatus,
  ) -> Result<ResultState, Self::Error>;

  fn result(&self, id: ResultId) -> Result<Option<ResultState>, Self::Error>;

  fn update_result(&mut self, state: &ResultState) -> Result<(), Self::Error>;

  // ── Maintenance ───────────────────────────────────────────────────────

  /// Drop every request and result. Result ids handed out before the wipe
  /// must still never be handed out again.
  fn wipe(&mut self) -> Result<(), Self::Error>;
}
