//! Requests — one person's ask to do an activity before a deadline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, result::ResultId};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Identifier of a request. Either chosen by the caller or assigned by the
/// engine at store time; immutable afterwards.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
  /// A fresh random id for requests stored without one.
  pub fn generate() -> Self { Self(Uuid::new_v4().hyphenated().to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for RequestId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for RequestId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for RequestId {
  fn from(s: String) -> Self { Self(s) }
}

/// Identifier of the person who made a request.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PersonId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for PersonId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for PersonId {
  fn from(s: String) -> Self { Self(s) }
}

// ─── NewRequest ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::RequestStore::store_request`].
///
/// `resolved_by` is never accepted from callers; the store always links a new
/// request to a fresh singleton result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewRequest {
  /// Leave unset to have the store assign a random id.
  #[serde(default)]
  pub id:             Option<RequestId>,
  pub person_id:      PersonId,
  /// Opaque activity name; only ever compared for equality.
  pub activity:       String,
  pub deadline:       DateTime<Utc>,
  #[serde(default = "Utc::now")]
  pub created_at:     DateTime<Utc>,
  /// Matching slack. Opaque to the store, consumed by the matcher.
  #[serde(default)]
  pub window_seconds: u32,
}

impl NewRequest {
  /// Convenience constructor; `created_at` is set to now and no id is chosen.
  pub fn new(
    person_id: impl Into<PersonId>,
    activity: impl Into<String>,
    deadline: DateTime<Utc>,
    window_seconds: u32,
  ) -> Self {
    Self {
      id: None,
      person_id: person_id.into(),
      activity: activity.into(),
      deadline,
      created_at: Utc::now(),
      window_seconds,
    }
  }

  pub fn with_id(mut self, id: impl Into<RequestId>) -> Self {
    self.id = Some(id.into());
    self
  }

  pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
    self.created_at = created_at;
    self
  }

  /// Validate a dynamically-built value crossing into the store.
  ///
  /// Anything that is not a JSON object is rejected with a message naming
  /// the type that was found instead.
  pub fn from_value(value: serde_json::Value) -> Result<Self> {
    if !value.is_object() {
      return Err(Error::Validation(format!(
        "expected a request object, got {}",
        json_type_name(&value)
      )));
    }
    serde_json::from_value(value)
      .map_err(|e| Error::Validation(format!("malformed request: {e}")))
  }

  /// Attach the assigned id and owning result, producing the stored form.
  pub fn into_request(self, id: RequestId, resolved_by: ResultId) -> Request {
    Request {
      id,
      person_id: self.person_id,
      activity: self.activity,
      deadline: self.deadline,
      created_at: self.created_at,
      window_seconds: self.window_seconds,
      resolved_by,
    }
  }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
  use serde_json::Value;
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(n) if n.is_f64() => "float",
    Value::Number(_) => "integer",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// A stored request. Always belongs to exactly one live result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
  pub id:             RequestId,
  pub person_id:      PersonId,
  pub activity:       String,
  pub deadline:       DateTime<Utc>,
  pub created_at:     DateTime<Utc>,
  pub window_seconds: u32,
  pub resolved_by:    ResultId,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn from_value_names_the_offending_type() {
    let err = NewRequest::from_value(json!(42)).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("int"), "{err}");

    let err = NewRequest::from_value(json!(["coffee"])).unwrap_err();
    assert!(err.to_string().contains("array"), "{err}");
  }

  #[test]
  fn from_value_accepts_a_request_object() {
    let parsed = NewRequest::from_value(json!({
      "id":             "one",
      "person_id":      "john",
      "activity":       "coffee",
      "deadline":       "2024-05-01T12:00:00Z",
      "window_seconds": 300,
    }))
    .unwrap();

    assert_eq!(parsed.id, Some(RequestId::from("one")));
    assert_eq!(parsed.person_id.as_str(), "john");
    assert_eq!(parsed.window_seconds, 300);
  }

  #[test]
  fn from_value_rejects_missing_fields() {
    let err = NewRequest::from_value(json!({ "person_id": "john" })).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn generated_ids_are_distinct() {
    assert_ne!(RequestId::generate(), RequestId::generate());
  }
}
