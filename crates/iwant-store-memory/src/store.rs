//! [`MemoryStore`] — the in-memory implementation of [`RequestStore`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use iwant_core::{
  Error, Result, engine,
  repository::Repository,
  request::{NewRequest, PersonId, Request, RequestId},
  result::{RequestResult, ResultId},
  store::RequestStore,
};
use parking_lot::Mutex;
use tracing::debug;

use crate::state::MemoryState;

/// A request store held entirely in process memory.
///
/// Every operation takes the same lock for its whole body, so mutations are
/// serialised against each other and against readers. Cloning is cheap and
/// clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
  state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl RequestStore for MemoryStore {
  type Error = Error;

  async fn store_request(&self, request: NewRequest) -> Result<Request> {
    engine::store_request(&mut *self.state.lock(), request)
  }

  async fn get_activity_requests(&self, activity: Option<&str>) -> Result<Vec<Request>> {
    self.state.lock().requests(activity)
  }

  async fn get_requests_by_deadline_proximity(
    &self,
    reference:         DateTime<Utc>,
    threshold_seconds: u32,
  ) -> Result<Vec<Request>> {
    engine::requests_by_deadline_proximity(&*self.state.lock(), reference, threshold_seconds)
  }

  async fn remove_activity_request(
    &self,
    request_id: &RequestId,
    person_id:  &PersonId,
  ) -> Result<()> {
    engine::remove_activity_request(&mut *self.state.lock(), request_id, person_id)
  }

  async fn get_result(&self, result_id: ResultId) -> Result<RequestResult> {
    engine::get_result(&*self.state.lock(), result_id)
  }

  async fn get_requests_of_result(&self, result_id: ResultId) -> Result<Vec<Request>> {
    self.state.lock().members(result_id)
  }

  async fn resolve_requests(&self, request_ids: &[RequestId]) -> Result<ResultId> {
    engine::resolve_requests(&mut *self.state.lock(), request_ids)
  }

  async fn wipe_database(&self) -> Result<()> {
    self.state.lock().wipe()?;
    debug!("wiped in-memory store");
    Ok(())
  }
}
