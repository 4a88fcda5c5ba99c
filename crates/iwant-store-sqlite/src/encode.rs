//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed nanosecond
//! fraction and a `Z` suffix. Fixed width makes lexicographic order equal
//! chronological order, which the deadline range query relies on. The engine
//! only admits years 0 through 9999, the range that keeps the width fixed.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use iwant_core::{
  request::{PersonId, Request, RequestId},
  result::{ResultId, ResultState, ResultStatus},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── ResultStatus ────────────────────────────────────────────────────────────

// Encoded with `ResultStatus::as_ref`.

pub fn decode_status(s: &str) -> Result<ResultStatus> {
  ResultStatus::from_str(s).map_err(|_| Error::UnknownStatus(s.to_owned()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawRequest::from_row`].
pub const REQUEST_COLUMNS: &str =
  "request_id, person_id, activity, deadline, created_at, window_seconds, resolved_by";

/// Raw values read directly from a `requests` row.
pub struct RawRequest {
  pub request_id:     String,
  pub person_id:      String,
  pub activity:       String,
  pub deadline:       String,
  pub created_at:     String,
  pub window_seconds: u32,
  pub resolved_by:    i64,
}

impl RawRequest {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      request_id:     row.get(0)?,
      person_id:      row.get(1)?,
      activity:       row.get(2)?,
      deadline:       row.get(3)?,
      created_at:     row.get(4)?,
      window_seconds: row.get(5)?,
      resolved_by:    row.get(6)?,
    })
  }

  pub fn into_request(self) -> Result<Request> {
    Ok(Request {
      id:             RequestId(self.request_id),
      person_id:      PersonId(self.person_id),
      activity:       self.activity,
      deadline:       decode_dt(&self.deadline)?,
      created_at:     decode_dt(&self.created_at)?,
      window_seconds: self.window_seconds,
      resolved_by:    ResultId(self.resolved_by),
    })
  }
}

/// Raw values read directly from a `results` row.
pub struct RawResult {
  pub result_id: i64,
  pub deadline:  String,
  pub status:    String,
}

impl RawResult {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      result_id: row.get(0)?,
      deadline:  row.get(1)?,
      status:    row.get(2)?,
    })
  }

  pub fn into_state(self) -> Result<ResultState> {
    Ok(ResultState {
      id:       ResultId(self.result_id),
      deadline: decode_dt(&self.deadline)?,
      status:   decode_status(&self.status)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Timelike};

  use super::*;

  #[test]
  fn timestamps_keep_nanoseconds() {
    let dt = Utc
      .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
      .unwrap()
      .with_nanosecond(123_456_789)
      .unwrap();
    assert_eq!(encode_dt(dt), "2024-05-01T12:00:00.123456789Z");
    assert_eq!(decode_dt(&encode_dt(dt)).unwrap(), dt);
  }

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let whole = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let later = whole.with_nanosecond(500_000_000).unwrap();
    assert!(encode_dt(whole) < encode_dt(later));
  }

  #[test]
  fn status_columns_match_the_schema_check() {
    for status in [ResultStatus::Pending, ResultStatus::Fresh, ResultStatus::Invalid] {
      assert_eq!(decode_status(status.as_ref()).unwrap(), status);
    }
    assert_eq!(ResultStatus::Fresh.as_ref(), "fresh");
    assert!(matches!(decode_status("stale"), Err(Error::UnknownStatus(_))));
  }
}
