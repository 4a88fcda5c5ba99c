//! The merge/demote state machine, shared by every backend.
//!
//! Each function runs against a [`Repository`] that the caller has already
//! placed inside its serialisation boundary, so a function either completes
//! as a whole or its partial writes are discarded with the boundary.
//!
//! Result lifecycle: `Pending ⇄ Fresh`, and either of them `→ Invalid` once
//! the last member is removed or moved elsewhere. `Invalid` is terminal.
//!
//! Status and deadline are never set directly; they are always recomputed
//! from the current membership by [`recompute`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::{
  Error,
  repository::Repository,
  request::{NewRequest, PersonId, Request, RequestId},
  result::{RequestResult, ResultId, ResultState, ResultStatus},
};

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Persist `input` together with a new singleton `Pending` result.
///
/// Timestamps must fall within years 0 through 9999.
pub fn store_request<R: Repository>(
  repo: &mut R,
  mut input: NewRequest,
) -> Result<Request, R::Error> {
  check_year_range("deadline", input.deadline)?;
  check_year_range("created_at", input.created_at)?;

  let id = input.id.take().unwrap_or_else(RequestId::generate);
  if repo.request(&id)?.is_some() {
    return Err(Error::Validation(format!("request {id} is already stored")).into());
  }

  let result = repo.create_result(input.deadline, ResultStatus::Pending)?;
  let request = input.into_request(id, result.id);
  repo.insert_request(&request)?;

  debug!(request = %request.id, result = %result.id, "stored request");
  Ok(request)
}

/// Merge the given requests onto one surviving result and return its id.
///
/// The survivor is the referenced result holding the most of the given
/// requests, then the one with the most members overall, then the oldest.
/// Results left without members become `Invalid`; results that keep some
/// members not named here are recomputed like after a removal.
pub fn resolve_requests<R: Repository>(
  repo: &mut R,
  ids: &[RequestId],
) -> Result<ResultId, R::Error> {
  let ids: BTreeSet<&RequestId> = ids.iter().collect();
  if ids.is_empty() {
    return Err(Error::Validation("cannot resolve an empty set of requests".into()).into());
  }

  let mut requests = Vec::with_capacity(ids.len());
  for id in ids {
    let request = repo
      .request(id)?
      .ok_or_else(|| Error::RequestNotFound(id.clone()))?;
    requests.push(request);
  }

  let mut held_by_result: BTreeMap<ResultId, usize> = BTreeMap::new();
  for request in &requests {
    if !held_by_result.contains_key(&request.resolved_by) {
      owning_result(repo, request)?;
    }
    *held_by_result.entry(request.resolved_by).or_default() += 1;
  }

  let mut candidates = Vec::with_capacity(held_by_result.len());
  for (&result_id, &held) in &held_by_result {
    let total = repo.members(result_id)?.len();
    candidates.push(Candidate { result_id, held, total });
  }
  let survivor = choose_survivor(&candidates)
    .ok_or_else(|| Error::Validation("no result to resolve onto".into()))?;

  for request in requests.iter().filter(|r| r.resolved_by != survivor) {
    repo.set_resolved_by(&request.id, survivor)?;
  }

  let state = recompute(repo, survivor)?;
  for candidate in candidates.iter().filter(|c| c.result_id != survivor) {
    let absorbed = recompute(repo, candidate.result_id)?;
    debug!(result = %absorbed.id, status = absorbed.status.as_ref(), "absorbed result");
  }

  info!(
    result = %survivor,
    status = state.status.as_ref(),
    requests = requests.len(),
    "resolved requests"
  );
  Ok(survivor)
}

/// Delete a request owned by `person_id`, then recompute the result it
/// belonged to.
///
/// A missing request and a request owned by someone else fail the same way.
pub fn remove_activity_request<R: Repository>(
  repo: &mut R,
  request_id: &RequestId,
  person_id: &PersonId,
) -> Result<(), R::Error> {
  let request = repo
    .request(request_id)?
    .filter(|r| &r.person_id == person_id)
    .ok_or_else(|| Error::Unauthorized {
      request_id: request_id.clone(),
      person_id:  person_id.to_string(),
    })?;
  owning_result(repo, &request)?;

  repo.delete_request(request_id)?;
  let state = recompute(repo, request.resolved_by)?;

  info!(
    request = %request_id,
    result = %state.id,
    status = state.status.as_ref(),
    "removed request"
  );
  Ok(())
}

/// Bring a result's status and deadline in line with its current members.
///
/// A memberless result keeps its last deadline.
pub fn recompute<R: Repository>(
  repo: &mut R,
  result_id: ResultId,
) -> Result<ResultState, R::Error> {
  let mut state = repo
    .result(result_id)?
    .ok_or(Error::ResultNotFound(result_id))?;
  let members = repo.members(result_id)?;

  state.status = ResultStatus::for_member_count(members.len());
  if let Some(deadline) = members.iter().map(|r| r.deadline).min() {
    state.deadline = deadline;
  }

  repo.update_result(&state)?;
  Ok(state)
}

/// The result `request` points at. A missing row is a broken reference in
/// the store, not a caller error.
fn owning_result<R: Repository>(repo: &R, request: &Request) -> Result<ResultState, R::Error> {
  match repo.result(request.resolved_by)? {
    Some(state) => Ok(state),
    None => Err(
      Error::DanglingReference {
        request_id: request.id.clone(),
        result_id:  request.resolved_by,
      }
      .into(),
    ),
  }
}

/// `0000-01-01T00:00:00Z`, the earliest instant a request may carry.
fn first_storable() -> DateTime<Utc> {
  DateTime::from_timestamp(-62_167_219_200, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// `9999-12-31T23:59:59.999999999Z`, the latest instant a request may carry.
fn last_storable() -> DateTime<Utc> {
  DateTime::from_timestamp(253_402_300_799, 999_999_999).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn check_year_range(field: &str, at: DateTime<Utc>) -> Result<(), Error> {
  if (first_storable()..=last_storable()).contains(&at) {
    Ok(())
  } else {
    Err(Error::Validation(format!("{field} {at} is outside years 0 through 9999")))
  }
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// Look up a result, tombstones included.
pub fn get_result<R: Repository>(
  repo: &R,
  result_id: ResultId,
) -> Result<RequestResult, R::Error> {
  let state = repo
    .result(result_id)?
    .ok_or(Error::ResultNotFound(result_id))?;
  let members = repo.members(result_id)?;
  Ok(RequestResult::from_state(state, members.into_iter().map(|r| r.id)))
}

/// Requests whose deadline lies at most `threshold_seconds` before
/// `reference`, both ends inclusive. The window is clamped to the instants
/// a request can hold, so every backend sees the same bounds.
pub fn requests_by_deadline_proximity<R: Repository>(
  repo: &R,
  reference: DateTime<Utc>,
  threshold_seconds: u32,
) -> Result<Vec<Request>, R::Error> {
  let from = reference
    .checked_sub_signed(Duration::seconds(i64::from(threshold_seconds)))
    .unwrap_or(DateTime::<Utc>::MIN_UTC)
    .max(first_storable());
  let to = reference.min(last_storable());
  if from > to {
    return Ok(Vec::new());
  }
  repo.requests_with_deadline_between(from, to)
}

// ─── Survivor selection ──────────────────────────────────────────────────────

/// A result referenced by at least one request in a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
  pub result_id: ResultId,
  /// How many of the merged requests already reference it.
  pub held:      usize,
  /// Its member count before the merge.
  pub total:     usize,
}

/// Pick the result a merge extends: most merged requests held, then most
/// members, then the lowest id.
pub fn choose_survivor(candidates: &[Candidate]) -> Option<ResultId> {
  candidates
    .iter()
    .max_by(|a, b| {
      a.held
        .cmp(&b.held)
        .then(a.total.cmp(&b.total))
        .then(b.result_id.cmp(&a.result_id))
    })
    .map(|c| c.result_id)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn candidate(id: i64, held: usize, total: usize) -> Candidate {
    Candidate { result_id: ResultId(id), held, total }
  }

  #[test]
  fn survivor_prefers_most_held_requests() {
    let picked = choose_survivor(&[candidate(1, 1, 1), candidate(2, 2, 2)]);
    assert_eq!(picked, Some(ResultId(2)));
  }

  #[test]
  fn survivor_breaks_held_ties_on_total_members() {
    let picked = choose_survivor(&[candidate(1, 1, 1), candidate(2, 1, 3)]);
    assert_eq!(picked, Some(ResultId(2)));
  }

  #[test]
  fn survivor_breaks_full_ties_on_lowest_id() {
    let picked =
      choose_survivor(&[candidate(7, 2, 2), candidate(3, 2, 2), candidate(5, 2, 2)]);
    assert_eq!(picked, Some(ResultId(3)));
  }

  #[test]
  fn no_candidates_no_survivor() {
    assert_eq!(choose_survivor(&[]), None);
  }

  #[test]
  fn storable_bounds_are_the_four_digit_years() {
    assert_eq!(first_storable().to_rfc3339(), "0000-01-01T00:00:00+00:00");
    assert_eq!(last_storable().to_rfc3339(), "9999-12-31T23:59:59.999999999+00:00");
    assert!(check_year_range("deadline", first_storable()).is_ok());
    assert!(check_year_range("deadline", last_storable()).is_ok());
    let err = check_year_range("deadline", last_storable() + Duration::nanoseconds(1));
    assert!(matches!(err, Err(Error::Validation(_))));
  }
}
