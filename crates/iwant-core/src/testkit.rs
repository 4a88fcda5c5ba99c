//! Conformance scenarios every [`RequestStore`] backend must pass.
//!
//! Backends call each scenario from their own test module, so the same
//! expectations run unchanged against every implementation. Each scenario
//! wipes the store first.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use crate::{
  error::{Classify, ErrorKind},
  request::{NewRequest, PersonId, Request, RequestId},
  result::{ResultId, ResultStatus},
  store::RequestStore,
};

fn minutes(n: i64) -> Duration { Duration::minutes(n) }

async fn stack<S: RequestStore>(
  store: &S,
  id: &str,
  person: &str,
  activity: &str,
  deadline: DateTime<Utc>,
  created_at: DateTime<Utc>,
  window_seconds: u32,
) -> Request {
  let input = NewRequest::new(person, activity, deadline, window_seconds)
    .with_id(id)
    .with_created_at(created_at);
  store.store_request(input).await.unwrap()
}

/// Store a request with a deadline of `now` and a five-minute window.
async fn stack_default<S: RequestStore>(
  store: &S,
  now: DateTime<Utc>,
  id: &str,
  person: &str,
  activity: &str,
) -> Request {
  stack(store, id, person, activity, now, now + minutes(5), 5 * 60).await
}

fn ids(requests: &[Request]) -> BTreeSet<String> {
  requests.iter().map(|r| r.id.as_str().to_owned()).collect()
}

fn rid(id: &str) -> RequestId { RequestId::from(id) }

/// Check that every listed result's status matches its member count and that
/// its deadline is the earliest member deadline.
pub async fn assert_consistent<S: RequestStore>(store: &S, results: &[ResultId]) {
  for &id in results {
    let result = store.get_result(id).await.unwrap();
    let members = store.get_requests_of_result(id).await.unwrap();
    assert_eq!(
      result.status,
      ResultStatus::for_member_count(members.len()),
      "result {id} has {} members",
      members.len()
    );
    assert_eq!(result.requests_ids.len(), members.len());
    if let Some(min) = members.iter().map(|r| r.deadline).min() {
      assert_eq!(result.deadline, min, "result {id} deadline");
    }
  }
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

pub async fn saves_and_restores<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let now = Utc::now();

  let request = stack_default(store, now, "one", "john", "coffee").await;
  let recovered = store.get_activity_requests(None).await.unwrap();
  assert_eq!(recovered.len(), 1);
  assert_eq!(request, recovered[0]);

  let err = NewRequest::from_value(json!(42)).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert!(err.to_string().contains("int"), "{err}");

  let result = store.get_result(recovered[0].resolved_by).await.unwrap();
  assert_eq!(result.status, ResultStatus::Pending);
  assert_eq!(result.deadline, request.deadline);
  assert!(result.requests_ids.contains(&rid("one")));
}

pub async fn rejects_duplicate_ids<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let now = Utc::now();

  stack_default(store, now, "one", "john", "coffee").await;
  let again = NewRequest::new("jack", "tea", now, 0).with_id("one");
  let err = store.store_request(again).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let stored = store.get_activity_requests(None).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].person_id, PersonId::from("john"));
}

pub async fn assigns_missing_ids<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let now = Utc::now();

  let first = store
    .store_request(NewRequest::new("john", "coffee", now, 60))
    .await
    .unwrap();
  let second = store
    .store_request(NewRequest::new("jane", "coffee", now, 60))
    .await
    .unwrap();

  assert!(!first.id.as_str().is_empty());
  assert_ne!(first.id, second.id);
  assert_ne!(first.resolved_by, second.resolved_by);
  assert_eq!(ids(&store.get_activity_requests(None).await.unwrap()).len(), 2);
}

pub async fn removes<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let now = Utc::now();

  stack_default(store, now, "one", "john", "coffee").await;
  let to_be_removed = stack_default(store, now, "foo", "john", "coffee").await;

  let missing = store
    .remove_activity_request(&rid("bar"), &PersonId::from("jack"))
    .await
    .unwrap_err();
  let not_owner = store
    .remove_activity_request(&rid("foo"), &PersonId::from("jack"))
    .await
    .unwrap_err();
  assert_eq!(missing.kind(), ErrorKind::Unauthorized);
  assert_eq!(not_owner.kind(), ErrorKind::Unauthorized);
  assert_eq!(store.get_activity_requests(None).await.unwrap().len(), 2);

  store
    .remove_activity_request(&rid("foo"), &PersonId::from("john"))
    .await
    .unwrap();
  let remaining = store.get_activity_requests(None).await.unwrap();
  assert_eq!(ids(&remaining), BTreeSet::from(["one".to_owned()]));

  let removed_result = store.get_result(to_be_removed.resolved_by).await.unwrap();
  assert_eq!(removed_result.status, ResultStatus::Invalid);
  assert!(removed_result.requests_ids.is_empty());
  assert!(
    store
      .get_requests_of_result(to_be_removed.resolved_by)
      .await
      .unwrap()
      .is_empty()
  );
}

pub async fn removes_resolved_requests<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let now = Utc::now();

  let first = stack(store, "one", "john", "coffee", now, now + minutes(5), 300).await;
  let second = stack(
    store,
    "foo",
    "john",
    "coffee",
    now + minutes(1),
    now + minutes(10),
    300,
  )
  .await;
  let result_ids = BTreeSet::from([first.resolved_by, second.resolved_by]);
  assert_eq!(result_ids.len(), 2);

  let result_id = store
    .resolve_requests(&[rid("one"), rid("foo")])
    .await
    .unwrap();
  assert!(result_ids.contains(&result_id));
  let purged = result_ids.iter().copied().find(|&id| id != result_id).unwrap();

  assert_eq!(store.get_result(purged).await.unwrap().status, ResultStatus::Invalid);
  let merged = store.get_result(result_id).await.unwrap();
  assert_eq!(merged.status, ResultStatus::Fresh);
  assert_eq!(merged.deadline, now);

  store
    .remove_activity_request(&rid("one"), &PersonId::from("john"))
    .await
    .unwrap();
  let demoted = store.get_result(result_id).await.unwrap();
  assert_eq!(demoted.id, result_id);
  assert_eq!(demoted.status, ResultStatus::Pending);
  assert_eq!(demoted.deadline, now + minutes(1));

  store
    .remove_activity_request(&rid("foo"), &PersonId::from("john"))
    .await
    .unwrap();
  let emptied = store.get_result(result_id).await.unwrap();
  assert_eq!(emptied.status, ResultStatus::Invalid);
}

pub async fn resolves_and_fetches<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let now = Utc::now();

  stack(store, "one", "john", "coffee", now + minutes(3), now, 300).await;
  stack(store, "two", "john", "coffee", now + minutes(2), now, 300).await;
  stack(store, "three", "john", "coffee", now + minutes(1), now, 300).await;

  store.resolve_requests(&[rid("one"), rid("two")]).await.unwrap();
  let coffee = store.get_activity_requests(Some("coffee")).await.unwrap();
  let pair: Vec<&Request> = coffee
    .iter()
    .filter(|r| matches!(r.id.as_str(), "one" | "two"))
    .collect();
  assert_eq!(pair.len(), 2);
  let coffee_result_id = pair[0].resolved_by;
  assert_eq!(coffee_result_id, pair[1].resolved_by);
  assert_eq!(
    store.get_result(coffee_result_id).await.unwrap().deadline,
    now + minutes(2)
  );

  let extended = store
    .resolve_requests(&[rid("three"), rid("one"), rid("two")])
    .await
    .unwrap();
  assert_eq!(extended, coffee_result_id);
  for request in store.get_activity_requests(Some("coffee")).await.unwrap() {
    assert_eq!(request.resolved_by, coffee_result_id);
  }
  let coffee_result = store.get_result(coffee_result_id).await.unwrap();
  assert_eq!(coffee_result.status, ResultStatus::Fresh);
  assert_eq!(coffee_result.deadline, now + minutes(1));
  assert_eq!(coffee_result.requests_ids.len(), 3);

  let mut picnic_one = stack_default(store, now, "four", "jack", "picnic").await;
  let mut picnic_two = stack_default(store, now, "five", "anna", "picnic").await;
  store.resolve_requests(&[rid("four"), rid("five")]).await.unwrap();

  let picnic = store.get_activity_requests(Some("picnic")).await.unwrap();
  let picnic_result_id = picnic[0].resolved_by;
  assert_eq!(picnic_result_id, picnic[1].resolved_by);
  assert_ne!(picnic_result_id, coffee_result_id);

  let result = store.get_result(picnic_result_id).await.unwrap();
  assert!(result.requests_ids.contains(&rid("four")));
  assert!(result.requests_ids.contains(&rid("five")));

  let members = store.get_requests_of_result(picnic_result_id).await.unwrap();
  assert_eq!(members.len(), 2);
  picnic_one.resolved_by = picnic_result_id;
  picnic_two.resolved_by = picnic_result_id;
  assert!(members.contains(&picnic_one));
  assert!(members.contains(&picnic_two));
}

pub async fn merges_equal_groups_onto_the_oldest<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let now = Utc::now();

  for (id, person) in [("a", "ann"), ("b", "bob"), ("c", "cid"), ("d", "dan")] {
    stack_default(store, now, id, person, "chess").await;
  }
  let first = store.resolve_requests(&[rid("a"), rid("b")]).await.unwrap();
  let second = store.resolve_requests(&[rid("c"), rid("d")]).await.unwrap();
  assert_ne!(first, second);

  let survivor = store
    .resolve_requests(&[rid("d"), rid("c"), rid("b"), rid("a")])
    .await
    .unwrap();
  assert_eq!(survivor, first.min(second));
  let abandoned = first.max(second);

  let merged = store.get_result(survivor).await.unwrap();
  assert_eq!(merged.status, ResultStatus::Fresh);
  assert_eq!(merged.requests_ids.len(), 4);
  assert_eq!(
    store.get_result(abandoned).await.unwrap().status,
    ResultStatus::Invalid
  );
  assert_consistent(store, &[survivor, abandoned]).await;
}

pub async fn partial_absorption_keeps_the_rest<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let now = Utc::now();

  stack(store, "a", "ann", "go", now + minutes(4), now, 0).await;
  stack(store, "b", "bob", "go", now + minutes(3), now, 0).await;
  stack(store, "c", "cid", "go", now + minutes(1), now, 0).await;
  stack(store, "d", "dan", "go", now + minutes(2), now, 0).await;
  let lone = stack(store, "e", "eve", "go", now + minutes(5), now, 0).await;

  let left = store.resolve_requests(&[rid("a"), rid("b")]).await.unwrap();
  let right = store.resolve_requests(&[rid("c"), rid("d")]).await.unwrap();

  let survivor = store
    .resolve_requests(&[rid("b"), rid("c"), rid("e")])
    .await
    .unwrap();
  assert_eq!(survivor, left.min(right));
  let other = left.max(right);

  let survivor_members = ids(&store.get_requests_of_result(survivor).await.unwrap());
  let other_members = ids(&store.get_requests_of_result(other).await.unwrap());
  let expected: BTreeSet<String> =
    ["a", "b", "c", "e"].into_iter().map(str::to_owned).collect();
  assert_eq!(survivor_members, expected);
  assert_eq!(other_members, BTreeSet::from(["d".to_owned()]));
  assert_eq!(
    store.get_result(other).await.unwrap().status,
    ResultStatus::Pending
  );
  assert_eq!(
    store.get_result(lone.resolved_by).await.unwrap().status,
    ResultStatus::Invalid
  );
  assert_consistent(store, &[survivor, other, lone.resolved_by]).await;
}

pub async fn failed_merge_changes_nothing<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let now = Utc::now();

  let a = stack_default(store, now, "a", "ann", "tea").await;
  let b = stack_default(store, now, "b", "bob", "tea").await;

  let err = store
    .resolve_requests(&[rid("a"), rid("b"), rid("ghost")])
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let err = store.resolve_requests(&[]).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let stored = store.get_activity_requests(None).await.unwrap();
  assert!(stored.contains(&a));
  assert!(stored.contains(&b));
  for id in [a.resolved_by, b.resolved_by] {
    assert_eq!(store.get_result(id).await.unwrap().status, ResultStatus::Pending);
  }
}

pub async fn single_request_merge_stays_pending<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let now = Utc::now();

  let a = stack_default(store, now, "a", "ann", "tea").await;
  let id = store.resolve_requests(&[rid("a"), rid("a")]).await.unwrap();
  assert_eq!(id, a.resolved_by);
  assert_eq!(store.get_result(id).await.unwrap().status, ResultStatus::Pending);
}

pub async fn unknown_result_is_not_found<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();

  let err = store.get_result(ResultId(987_654)).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert!(
    store
      .get_requests_of_result(ResultId(987_654))
      .await
      .unwrap()
      .is_empty()
  );
}

pub async fn understands_time<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let now = Utc::now();

  let early_deadline = now + Duration::seconds(48);
  let mid_deadline = now + Duration::seconds(60);
  let late_deadline = now + Duration::seconds(72);
  stack(store, "one", "john", "coffee", early_deadline, now, 0).await;
  stack(store, "two", "janine", "tea", mid_deadline, now, 0).await;
  stack(store, "three", "paul", "wine", late_deadline, now, 0).await;

  let reference = now + minutes(2);
  let expiring = store
    .get_requests_by_deadline_proximity(reference, 58)
    .await
    .unwrap();
  assert_eq!(ids(&expiring), BTreeSet::from(["three".to_owned()]));

  let expiring = store
    .get_requests_by_deadline_proximity(reference, 62)
    .await
    .unwrap();
  assert_eq!(
    ids(&expiring),
    BTreeSet::from(["three".to_owned(), "two".to_owned()])
  );

  // Both bounds are inclusive.
  let expiring = store
    .get_requests_by_deadline_proximity(reference, 60)
    .await
    .unwrap();
  assert_eq!(ids(&expiring).len(), 2);
  let expiring = store
    .get_requests_by_deadline_proximity(late_deadline, 0)
    .await
    .unwrap();
  assert_eq!(ids(&expiring), BTreeSet::from(["three".to_owned()]));

  // Deadlines after the reference are not "approaching expiry" yet.
  let expiring = store
    .get_requests_by_deadline_proximity(now, 600)
    .await
    .unwrap();
  assert!(expiring.is_empty());

  let result_id = store
    .resolve_requests(&[rid("three"), rid("two")])
    .await
    .unwrap();
  let result = store.get_result(result_id).await.unwrap();
  assert_eq!(result.deadline, mid_deadline);
}

pub async fn rejects_out_of_range_timestamps<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let now = Utc::now();
  let far = Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap();
  let before_zero = Utc.with_ymd_and_hms(-1, 12, 31, 23, 59, 59).unwrap();

  for input in [
    NewRequest::new("john", "tea", far, 0).with_id("far"),
    NewRequest::new("john", "tea", before_zero, 0).with_id("early"),
    NewRequest::new("john", "tea", now, 0)
      .with_id("late-created")
      .with_created_at(far),
  ] {
    let err = store.store_request(input).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation, "{err}");
  }
  assert!(store.get_activity_requests(None).await.unwrap().is_empty());

  let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
  let edge = stack(store, "edge", "john", "tea", last, now, 0).await;
  assert_eq!(store.get_activity_requests(None).await.unwrap(), vec![edge.clone()]);
  assert_eq!(store.get_result(edge.resolved_by).await.unwrap().deadline, last);
}

pub async fn proximity_at_the_edges_of_time<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let first = Utc.with_ymd_and_hms(0, 1, 1, 0, 0, 0).unwrap();
  let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();

  stack(store, "first", "ann", "tea", first, first, 0).await;
  stack(store, "last", "bob", "tea", last, first, 0).await;

  let expiring = store
    .get_requests_by_deadline_proximity(DateTime::<Utc>::MIN_UTC, 1)
    .await
    .unwrap();
  assert!(expiring.is_empty());

  let expiring = store
    .get_requests_by_deadline_proximity(first, u32::MAX)
    .await
    .unwrap();
  assert_eq!(ids(&expiring), BTreeSet::from(["first".to_owned()]));

  let expiring = store
    .get_requests_by_deadline_proximity(DateTime::<Utc>::MAX_UTC, u32::MAX)
    .await
    .unwrap();
  assert!(expiring.is_empty());

  // A reference past the last storable instant still reaches back into it.
  let after_last = last + Duration::days(1);
  let expiring = store
    .get_requests_by_deadline_proximity(after_last, 2 * 24 * 60 * 60)
    .await
    .unwrap();
  assert_eq!(ids(&expiring), BTreeSet::from(["last".to_owned()]));
}

pub async fn filters_activities<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let now = Utc::now();

  stack_default(store, now, "1", "john", "coffee").await;
  stack_default(store, now, "2", "jack", "coffee").await;
  stack_default(store, now, "3", "jane", "tea").await;

  let tea = store.get_activity_requests(Some("tea")).await.unwrap();
  assert_eq!(tea.len(), 1);
  assert_eq!(tea[0].person_id, PersonId::from("jane"));

  let coffee = store.get_activity_requests(Some("coffee")).await.unwrap();
  assert_eq!(coffee.len(), 2);

  assert_eq!(store.get_activity_requests(None).await.unwrap().len(), 3);
  assert!(store.get_activity_requests(Some("wine")).await.unwrap().is_empty());
}

pub async fn wipe_never_reuses_result_ids<S: RequestStore>(store: &S) {
  store.wipe_database().await.unwrap();
  let now = Utc::now();

  let before = stack_default(store, now, "one", "john", "coffee").await;
  store.wipe_database().await.unwrap();
  assert!(store.get_activity_requests(None).await.unwrap().is_empty());
  assert_eq!(
    store.get_result(before.resolved_by).await.unwrap_err().kind(),
    ErrorKind::NotFound
  );

  let after = stack_default(store, now, "one", "john", "coffee").await;
  assert!(after.resolved_by > before.resolved_by);
}
