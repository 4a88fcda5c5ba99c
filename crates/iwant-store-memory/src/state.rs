//! [`MemoryState`] — the maps behind [`crate::MemoryStore`] and their
//! [`Repository`] implementation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use iwant_core::{
  Error, Result,
  repository::Repository,
  request::{Request, RequestId},
  result::{ResultId, ResultState, ResultStatus},
};

#[derive(Debug)]
pub struct MemoryState {
  requests:       BTreeMap<RequestId, Request>,
  results:        BTreeMap<ResultId, ResultState>,
  /// Survives wipes so result ids are never handed out twice.
  next_result_id: i64,
}

impl Default for MemoryState {
  fn default() -> Self {
    Self {
      requests:       BTreeMap::new(),
      results:        BTreeMap::new(),
      next_result_id: 1,
    }
  }
}

impl MemoryState {
  fn filtered(&self, keep: impl Fn(&Request) -> bool) -> Vec<Request> {
    self.requests.values().filter(|r| keep(*r)).cloned().collect()
  }
}

impl Repository for MemoryState {
  type Error = Error;

  fn request(&self, id: &RequestId) -> Result<Option<Request>> {
    Ok(self.requests.get(id).cloned())
  }

  fn insert_request(&mut self, request: &Request) -> Result<()> {
    self.requests.insert(request.id.clone(), request.clone());
    Ok(())
  }

  fn delete_request(&mut self, id: &RequestId) -> Result<()> {
    self
      .requests
      .remove(id)
      .map(drop)
      .ok_or_else(|| Error::RequestNotFound(id.clone()))
  }

  fn set_resolved_by(&mut self, id: &RequestId, result_id: ResultId) -> Result<()> {
    let request = self
      .requests
      .get_mut(id)
      .ok_or_else(|| Error::RequestNotFound(id.clone()))?;
    request.resolved_by = result_id;
    Ok(())
  }

  fn requests(&self, activity: Option<&str>) -> Result<Vec<Request>> {
    Ok(self.filtered(|r| activity.is_none_or(|a| r.activity == a)))
  }

  fn requests_with_deadline_between(
    &self,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
  ) -> Result<Vec<Request>> {
    Ok(self.filtered(|r| from <= r.deadline && r.deadline <= to))
  }

  fn members(&self, result_id: ResultId) -> Result<Vec<Request>> {
    Ok(self.filtered(|r| r.resolved_by == result_id))
  }

  fn create_result(
    &mut self,
    deadline: DateTime<Utc>,
    status: ResultStatus,
  ) -> Result<ResultState> {
    let state = ResultState {
      id: ResultId(self.next_result_id),
      deadline,
      status,
    };
    self.next_result_id += 1;
    self.results.insert(state.id, state.clone());
    Ok(state)
  }

  fn result(&self, id: ResultId) -> Result<Option<ResultState>> {
    Ok(self.results.get(&id).cloned())
  }

  fn update_result(&mut self, state: &ResultState) -> Result<()> {
    let slot = self
      .results
      .get_mut(&state.id)
      .ok_or(Error::ResultNotFound(state.id))?;
    *slot = state.clone();
    Ok(())
  }

  fn wipe(&mut self) -> Result<()> {
    self.requests.clear();
    self.results.clear();
    Ok(())
  }
}
