//! [`SqliteRepository`] — row access for the engine, scoped to one open
//! transaction.

use chrono::{DateTime, Utc};
use iwant_core::{
  repository::Repository,
  request::{Request, RequestId},
  result::{ResultId, ResultState, ResultStatus},
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{
  Error, Result,
  encode::{RawRequest, RawResult, REQUEST_COLUMNS, encode_dt},
  schema::WIPE,
};

/// Borrows the connection through an open `rusqlite::Transaction`; the
/// caller decides whether to commit.
pub struct SqliteRepository<'t> {
  tx: &'t Connection,
}

impl<'t> SqliteRepository<'t> {
  pub fn new(tx: &'t Connection) -> Self { Self { tx } }

  fn query_requests(
    &self,
    filter: &str,
    params: impl rusqlite::Params,
  ) -> Result<Vec<Request>> {
    let sql = format!(
      "SELECT {REQUEST_COLUMNS} FROM requests WHERE {filter} ORDER BY request_id"
    );
    let mut stmt = self.tx.prepare_cached(&sql)?;
    let raws = stmt
      .query_map(params, RawRequest::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawRequest::into_request).collect()
  }
}

impl Repository for SqliteRepository<'_> {
  type Error = Error;

  fn request(&self, id: &RequestId) -> Result<Option<Request>> {
    let raw = self
      .tx
      .query_row(
        &format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE request_id = ?1"),
        params![id.as_str()],
        RawRequest::from_row,
      )
      .optional()?;
    raw.map(RawRequest::into_request).transpose()
  }

  fn insert_request(&mut self, request: &Request) -> Result<()> {
    self.tx.execute(
      "INSERT INTO requests (
         request_id, person_id, activity, deadline, created_at,
         window_seconds, resolved_by
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      params![
        request.id.as_str(),
        request.person_id.as_str(),
        request.activity,
        encode_dt(request.deadline),
        encode_dt(request.created_at),
        request.window_seconds,
        request.resolved_by.0,
      ],
    )?;
    Ok(())
  }

  fn delete_request(&mut self, id: &RequestId) -> Result<()> {
    let deleted = self
      .tx
      .execute("DELETE FROM requests WHERE request_id = ?1", params![id.as_str()])?;
    if deleted == 0 {
      return Err(iwant_core::Error::RequestNotFound(id.clone()).into());
    }
    Ok(())
  }

  fn set_resolved_by(&mut self, id: &RequestId, result_id: ResultId) -> Result<()> {
    let updated = self.tx.execute(
      "UPDATE requests SET resolved_by = ?2 WHERE request_id = ?1",
      params![id.as_str(), result_id.0],
    )?;
    if updated == 0 {
      return Err(iwant_core::Error::RequestNotFound(id.clone()).into());
    }
    Ok(())
  }

  fn requests(&self, activity: Option<&str>) -> Result<Vec<Request>> {
    self.query_requests("(?1 IS NULL OR activity = ?1)", params![activity])
  }

  fn requests_with_deadline_between(
    &self,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
  ) -> Result<Vec<Request>> {
    self.query_requests(
      "deadline >= ?1 AND deadline <= ?2",
      params![encode_dt(from), encode_dt(to)],
    )
  }

  fn members(&self, result_id: ResultId) -> Result<Vec<Request>> {
    self.query_requests("resolved_by = ?1", params![result_id.0])
  }

  fn create_result(
    &mut self,
    deadline: DateTime<Utc>,
    status: ResultStatus,
  ) -> Result<ResultState> {
    self.tx.execute(
      "INSERT INTO results (deadline, status) VALUES (?1, ?2)",
      params![encode_dt(deadline), status.as_ref()],
    )?;
    Ok(ResultState {
      id: ResultId(self.tx.last_insert_rowid()),
      deadline,
      status,
    })
  }

  fn result(&self, id: ResultId) -> Result<Option<ResultState>> {
    let raw = self
      .tx
      .query_row(
        "SELECT result_id, deadline, status FROM results WHERE result_id = ?1",
        params![id.0],
        RawResult::from_row,
      )
      .optional()?;
    raw.map(RawResult::into_state).transpose()
  }

  fn update_result(&mut self, state: &ResultState) -> Result<()> {
    let updated = self.tx.execute(
      "UPDATE results SET deadline = ?2, status = ?3 WHERE result_id = ?1",
      params![state.id.0, encode_dt(state.deadline), state.status.as_ref()],
    )?;
    if updated == 0 {
      return Err(iwant_core::Error::ResultNotFound(state.id).into());
    }
    Ok(())
  }

  fn wipe(&mut self) -> Result<()> {
    self.tx.execute_batch(WIPE)?;
    Ok(())
  }
}
