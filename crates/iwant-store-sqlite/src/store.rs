//! [`SqliteStore`] — the SQLite implementation of [`RequestStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use iwant_core::{
  engine,
  repository::Repository,
  request::{NewRequest, PersonId, Request, RequestId},
  result::{RequestResult, ResultId},
  store::RequestStore,
};
use tracing::{debug, info};

use crate::{Result, repository::SqliteRepository, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A request store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    info!(path = %path.display(), "opened sqlite request store");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `op` inside one transaction on the connection thread.
  ///
  /// The transaction commits only if `op` succeeds; on any error it is
  /// dropped, which rolls back every write `op` made.
  async fn transact<T, F>(&self, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut SqliteRepository<'_>) -> Result<T> + Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = op(&mut SqliteRepository::new(&tx));
        match &outcome {
          Ok(_) => tx.commit()?,
          Err(e) => debug!(error = %e, "rolling back sqlite transaction"),
        }
        Ok(outcome)
      })
      .await?;
    outcome
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Run raw SQL outside the engine, e.g. to install a trigger.
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub(crate) async fn count_rows(&self, table: &'static str) -> Result<i64> {
    let count = self
      .conn
      .call(move |conn| {
        let count =
          conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get::<_, i64>(0)
          })?;
        Ok(count)
      })
      .await?;
    Ok(count)
  }
}

// ─── RequestStore impl ───────────────────────────────────────────────────────

impl RequestStore for SqliteStore {
  type Error = crate::Error;

  // ── Requests ──────────────────────────────────────────────────────────────

  async fn store_request(&self, request: NewRequest) -> Result<Request> {
    self
      .transact(move |repo| engine::store_request(repo, request))
      .await
  }

  async fn get_activity_requests(&self, activity: Option<&str>) -> Result<Vec<Request>> {
    let activity = activity.map(str::to_owned);
    self
      .transact(move |repo| repo.requests(activity.as_deref()))
      .await
  }

  async fn get_requests_by_deadline_proximity(
    &self,
    reference:         DateTime<Utc>,
    threshold_seconds: u32,
  ) -> Result<Vec<Request>> {
    self
      .transact(move |repo| {
        engine::requests_by_deadline_proximity(&*repo, reference, threshold_seconds)
      })
      .await
  }

  async fn remove_activity_request(
    &self,
    request_id: &RequestId,
    person_id:  &PersonId,
  ) -> Result<()> {
    let request_id = request_id.clone();
    let person_id  = person_id.clone();
    self
      .transact(move |repo| {
        engine::remove_activity_request(repo, &request_id, &person_id)
      })
      .await
  }

  // ── Results ───────────────────────────────────────────────────────────────

  async fn get_result(&self, result_id: ResultId) -> Result<RequestResult> {
    self
      .transact(move |repo| engine::get_result(&*repo, result_id))
      .await
  }

  async fn get_requests_of_result(&self, result_id: ResultId) -> Result<Vec<Request>> {
    self.transact(move |repo| repo.members(result_id)).await
  }

  async fn resolve_requests(&self, request_ids: &[RequestId]) -> Result<ResultId> {
    let request_ids = request_ids.to_vec();
    self
      .transact(move |repo| engine::resolve_requests(repo, &request_ids))
      .await
  }

  // ── Maintenance ───────────────────────────────────────────────────────────

  async fn wipe_database(&self) -> Result<()> {
    self.transact(|repo| repo.wipe()).await?;
    debug!("wiped sqlite request store");
    Ok(())
  }
}
