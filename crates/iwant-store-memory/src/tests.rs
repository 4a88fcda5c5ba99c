//! Conformance and concurrency tests for `MemoryStore`.

use chrono::{Duration, Utc};
use iwant_core::{
  Classify, Error, ErrorKind, engine,
  repository::Repository,
  request::{NewRequest, PersonId, RequestId},
  result::{ResultId, ResultStatus},
  store::RequestStore,
  testkit,
};

use crate::{MemoryStore, state::MemoryState};

// ─── Conformance ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn saves_and_restores() { testkit::saves_and_restores(&MemoryStore::new()).await; }

#[tokio::test]
async fn rejects_duplicate_ids() { testkit::rejects_duplicate_ids(&MemoryStore::new()).await; }

#[tokio::test]
async fn assigns_missing_ids() { testkit::assigns_missing_ids(&MemoryStore::new()).await; }

#[tokio::test]
async fn removes() { testkit::removes(&MemoryStore::new()).await; }

#[tokio::test]
async fn removes_resolved_requests() {
  testkit::removes_resolved_requests(&MemoryStore::new()).await;
}

#[tokio::test]
async fn resolves_and_fetches() { testkit::resolves_and_fetches(&MemoryStore::new()).await; }

#[tokio::test]
async fn merges_equal_groups_onto_the_oldest() {
  testkit::merges_equal_groups_onto_the_oldest(&MemoryStore::new()).await;
}

#[tokio::test]
async fn partial_absorption_keeps_the_rest() {
  testkit::partial_absorption_keeps_the_rest(&MemoryStore::new()).await;
}

#[tokio::test]
async fn failed_merge_changes_nothing() {
  testkit::failed_merge_changes_nothing(&MemoryStore::new()).await;
}

#[tokio::test]
async fn single_request_merge_stays_pending() {
  testkit::single_request_merge_stays_pending(&MemoryStore::new()).await;
}

#[tokio::test]
async fn unknown_result_is_not_found() {
  testkit::unknown_result_is_not_found(&MemoryStore::new()).await;
}

#[tokio::test]
async fn understands_time() { testkit::understands_time(&MemoryStore::new()).await; }

#[tokio::test]
async fn rejects_out_of_range_timestamps() {
  testkit::rejects_out_of_range_timestamps(&MemoryStore::new()).await;
}

#[tokio::test]
async fn proximity_at_the_edges_of_time() {
  testkit::proximity_at_the_edges_of_time(&MemoryStore::new()).await;
}

#[tokio::test]
async fn filters_activities() { testkit::filters_activities(&MemoryStore::new()).await; }

#[tokio::test]
async fn wipe_never_reuses_result_ids() {
  testkit::wipe_never_reuses_result_ids(&MemoryStore::new()).await;
}

// ─── Backend-specific ────────────────────────────────────────────────────────

#[tokio::test]
async fn clones_share_state() {
  let store = MemoryStore::new();
  let other = store.clone();

  store
    .store_request(NewRequest::new("john", "coffee", Utc::now(), 0).with_id("one"))
    .await
    .unwrap();

  let seen = other.get_activity_requests(None).await.unwrap();
  assert_eq!(seen.len(), 1);
  assert_eq!(seen[0].id, RequestId::from("one"));
}

#[tokio::test]
async fn separate_stores_are_isolated() {
  let a = MemoryStore::new();
  let b = MemoryStore::new();

  a.store_request(NewRequest::new("john", "coffee", Utc::now(), 0))
    .await
    .unwrap();
  assert!(b.get_activity_requests(None).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_merges_keep_results_consistent() {
  let store = MemoryStore::new();
  let now = Utc::now();

  for i in 0..40 {
    let deadline = now + Duration::seconds(i);
    store
      .store_request(
        NewRequest::new(format!("p{i}"), "run", deadline, 0).with_id(format!("r{i}")),
      )
      .await
      .unwrap();
  }

  let mut tasks = Vec::new();
  for i in 0..20 {
    let store = store.clone();
    tasks.push(tokio::spawn(async move {
      let pair = [
        RequestId::from(format!("r{i}")),
        RequestId::from(format!("r{}", (i + 1) % 40)),
      ];
      store.resolve_requests(&pair).await.unwrap()
    }));
  }
  for task in tasks {
    task.await.unwrap();
  }

  let requests = store.get_activity_requests(None).await.unwrap();
  assert_eq!(requests.len(), 40);
  let result_ids: Vec<_> = requests.iter().map(|r| r.resolved_by).collect();
  testkit::assert_consistent(&store, &result_ids).await;
  for id in result_ids {
    assert_ne!(store.get_result(id).await.unwrap().status, ResultStatus::Invalid);
  }
}

#[test]
fn dangling_result_reference_is_a_transport_failure() {
  let mut state = MemoryState::default();
  let stored = engine::store_request(
    &mut state,
    NewRequest::new("john", "tea", Utc::now(), 0).with_id("kept"),
  )
  .unwrap();
  let orphan = NewRequest::new("jane", "tea", Utc::now(), 0)
    .into_request(RequestId::from("orphan"), ResultId(404));
  state.insert_request(&orphan).unwrap();

  let err = engine::remove_activity_request(
    &mut state,
    &RequestId::from("orphan"),
    &PersonId::from("jane"),
  )
  .unwrap_err();
  assert!(matches!(
    err,
    Error::DanglingReference { result_id: ResultId(404), .. }
  ));
  assert_eq!(err.kind(), ErrorKind::Transport);
  assert!(state.request(&RequestId::from("orphan")).unwrap().is_some());

  let err = engine::resolve_requests(
    &mut state,
    &[RequestId::from("kept"), RequestId::from("orphan")],
  )
  .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Transport);
  assert_eq!(
    state.request(&RequestId::from("kept")).unwrap().unwrap().resolved_by,
    stored.resolved_by
  );
  assert_eq!(
    state.result(stored.resolved_by).unwrap().unwrap().status,
    ResultStatus::Pending
  );
}
