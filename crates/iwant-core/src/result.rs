//! Results — groups of requests that will be acted on together.
//!
//! A result is created as a singleton when a request is stored, grows when
//! requests are merged onto it and shrinks when members are removed. It is
//! never deleted: a memberless result stays behind as an `Invalid` tombstone.

use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::request::RequestId;

/// Identifier of a result. Assigned in increasing order and never reused, so
/// a lower id always means an earlier-created result.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ResultId(pub i64);

impl fmt::Display for ResultId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Lifecycle of a result, a pure function of its member count.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResultStatus {
  /// A single request waiting to be matched.
  Pending,
  /// A formed group of two or more requests.
  Fresh,
  /// No members left. Terminal.
  Invalid,
}

impl ResultStatus {
  pub fn for_member_count(count: usize) -> Self {
    match count {
      0 => Self::Invalid,
      1 => Self::Pending,
      _ => Self::Fresh,
    }
  }
}

/// The persisted part of a result. Membership is derived from the requests
/// that point at it, so it is not stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultState {
  pub id:       ResultId,
  /// Minimum deadline of the members; stale once the result is invalid.
  pub deadline: DateTime<Utc>,
  pub status:   ResultStatus,
}

/// The read model returned by [`crate::store::RequestStore::get_result`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestResult {
  pub id:           ResultId,
  pub deadline:     DateTime<Utc>,
  pub status:       ResultStatus,
  pub requests_ids: BTreeSet<RequestId>,
}

impl RequestResult {
  pub fn from_state(
    state: ResultState,
    requests_ids: impl IntoIterator<Item = RequestId>,
  ) -> Self {
    Self {
      id:           state.id,
      deadline:     state.deadline,
      status:       state.status,
      requests_ids: requests_ids.into_iter().collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn status_follows_member_count() {
    assert_eq!(ResultStatus::for_member_count(0), ResultStatus::Invalid);
    assert_eq!(ResultStatus::for_member_count(1), ResultStatus::Pending);
    assert_eq!(ResultStatus::for_member_count(2), ResultStatus::Fresh);
    assert_eq!(ResultStatus::for_member_count(17), ResultStatus::Fresh);
  }

  #[test]
  fn status_string_encoding() {
    assert_eq!(ResultStatus::Fresh.as_ref(), "fresh");
    assert_eq!(ResultStatus::from_str("invalid").unwrap(), ResultStatus::Invalid);
    assert!(ResultStatus::from_str("stale").is_err());
  }
}
