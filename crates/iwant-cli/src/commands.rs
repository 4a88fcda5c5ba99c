//! Subcommands and their execution against any [`RequestStore`].

use std::io::Write;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use iwant_core::{
  request::{NewRequest, PersonId, RequestId},
  result::ResultId,
  store::RequestStore,
};
use serde::Serialize;

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Store a new request; it starts out in its own pending result.
  Add {
    #[arg(long)]
    person:   String,
    #[arg(long)]
    activity: String,
    /// RFC 3339 timestamp, e.g. 2024-05-01T12:00:00Z.
    #[arg(long)]
    deadline: DateTime<Utc>,
    #[arg(long, default_value_t = 0)]
    window:   u32,
    /// Choose the request id instead of letting the store assign one.
    #[arg(long)]
    id:       Option<String>,
  },

  /// List stored requests.
  List {
    #[arg(long)]
    activity: Option<String>,
  },

  /// Show a result, including invalidated ones.
  #[command(name = "result")]
  Show { id: i64 },

  /// List the requests currently belonging to a result.
  Members { id: i64 },

  /// Merge requests into one result.
  Resolve {
    #[arg(required = true)]
    ids: Vec<String>,
  },

  /// Remove a request owned by `person`.
  Remove {
    id:     String,
    #[arg(long)]
    person: String,
  },

  /// Requests whose deadline passed at most `threshold` seconds before `at`.
  Expiring {
    /// Reference instant; defaults to now.
    #[arg(long)]
    at:        Option<DateTime<Utc>>,
    #[arg(long)]
    threshold: u32,
  },

  /// Delete every request and result.
  Wipe,
}

fn print<T: Serialize>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
  serde_json::to_writer_pretty(&mut *out, value)?;
  writeln!(out)?;
  Ok(())
}

/// Execute `command` against `store`, writing JSON to `out`.
pub async fn run<S: RequestStore>(
  store: &S,
  command: Command,
  out: &mut impl Write,
) -> anyhow::Result<()> {
  match command {
    Command::Add { person, activity, deadline, window, id } => {
      let mut input = NewRequest::new(person, activity, deadline, window);
      input.id = id.map(RequestId::from);
      let stored = store
        .store_request(input)
        .await
        .context("failed to store request")?;
      print(out, &stored)
    }
    Command::List { activity } => {
      let requests = store.get_activity_requests(activity.as_deref()).await?;
      print(out, &requests)
    }
    Command::Show { id } => {
      let result = store
        .get_result(ResultId(id))
        .await
        .with_context(|| format!("failed to load result {id}"))?;
      print(out, &result)
    }
    Command::Members { id } => {
      let members = store.get_requests_of_result(ResultId(id)).await?;
      print(out, &members)
    }
    Command::Resolve { ids } => {
      let ids: Vec<RequestId> = ids.into_iter().map(RequestId::from).collect();
      let result_id = store
        .resolve_requests(&ids)
        .await
        .context("failed to resolve requests")?;
      print(out, &store.get_result(result_id).await?)
    }
    Command::Remove { id, person } => {
      store
        .remove_activity_request(&RequestId::from(id), &PersonId::from(person))
        .await
        .context("failed to remove request")?;
      print(out, &serde_json::json!({ "removed": true }))
    }
    Command::Expiring { at, threshold } => {
      let at = at.unwrap_or_else(Utc::now);
      let requests = store.get_requests_by_deadline_proximity(at, threshold).await?;
      print(out, &requests)
    }
    Command::Wipe => {
      store.wipe_database().await?;
      print(out, &serde_json::json!({ "wiped": true }))
    }
  }
}

#[cfg(test)]
mod tests {
  use clap::Parser;
  use iwant_store_memory::MemoryStore;
  use serde_json::Value;

  use super::*;
  use crate::Cli;

  fn parse(args: &[&str]) -> Command {
    let mut argv = vec!["iwant"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap().command
  }

  async fn exec(store: &MemoryStore, args: &[&str]) -> Value {
    let mut out = Vec::new();
    run(store, parse(args), &mut out).await.unwrap();
    serde_json::from_slice(&out).unwrap()
  }

  #[test]
  fn resolve_requires_ids() {
    assert!(Cli::try_parse_from(["iwant", "resolve"]).is_err());
  }

  #[test]
  fn add_rejects_malformed_deadlines() {
    let parsed = Cli::try_parse_from([
      "iwant", "add", "--person", "john", "--activity", "coffee", "--deadline", "soon",
    ]);
    assert!(parsed.is_err());
  }

  #[tokio::test]
  async fn add_resolve_remove_round() {
    let store = MemoryStore::new();
    let deadline = "2024-05-01T12:00:00Z";

    for (id, person) in [("one", "john"), ("two", "jane")] {
      let stored = exec(&store, &[
        "add", "--id", id, "--person", person, "--activity", "coffee", "--deadline", deadline,
      ])
      .await;
      assert_eq!(stored["id"], id);
    }

    let merged = exec(&store, &["resolve", "one", "two"]).await;
    assert_eq!(merged["status"], "fresh");
    let result_id = merged["id"].as_i64().unwrap().to_string();

    exec(&store, &["remove", "one", "--person", "john"]).await;
    let result = exec(&store, &["result", &result_id]).await;
    assert_eq!(result["status"], "pending");

    let members = exec(&store, &["members", &result_id]).await;
    assert_eq!(members.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn expiring_uses_the_given_instant() {
    let store = MemoryStore::new();
    exec(&store, &[
      "add", "--person", "john", "--activity", "tea", "--deadline", "2024-05-01T12:00:00Z",
    ])
    .await;

    let hit = exec(&store, &["expiring", "--at", "2024-05-01T12:00:30Z", "--threshold", "30"]).await;
    assert_eq!(hit.as_array().unwrap().len(), 1);
    let miss = exec(&store, &["expiring", "--at", "2024-05-01T12:00:31Z", "--threshold", "30"]).await;
    assert!(miss.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn remove_by_someone_else_fails() {
    let store = MemoryStore::new();
    exec(&store, &[
      "add", "--id", "one", "--person", "john", "--activity", "tea", "--deadline",
      "2024-05-01T12:00:00Z",
    ])
    .await;

    let mut out = Vec::new();
    let err = run(&store, parse(&["remove", "one", "--person", "jack"]), &mut out)
      .await
      .unwrap_err();
    assert!(err.to_string().contains("failed to remove request"));
  }
}
