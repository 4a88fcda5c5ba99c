//! Error types for `iwant-core`.

use thiserror::Error;

use crate::{request::RequestId, result::ResultId};

#[derive(Debug, Error)]
pub enum Error {
  /// The input is not a well-formed request (or other malformed input).
  #[error("invalid input: {0}")]
  Validation(String),

  #[error("result not found: {0}")]
  ResultNotFound(ResultId),

  #[error("request not found: {0}")]
  RequestNotFound(RequestId),

  /// Raised alike for a missing request and a request owned by someone else.
  #[error("request {request_id} cannot be removed by {person_id}")]
  Unauthorized {
    request_id: RequestId,
    person_id:  String,
  },

  /// A request points at a result that is not stored. Only reachable through
  /// a corrupted backend.
  #[error("request {request_id} references missing result {result_id}")]
  DanglingReference {
    request_id: RequestId,
    result_id:  ResultId,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Backend-independent error categories.
///
/// Every backend error type maps onto one of these, so callers can react to
/// "not found" without knowing which store produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  Unauthorized,
  /// The backend itself failed (I/O, connectivity, corrupt rows).
  Transport,
}

/// Implemented by every error type a [`crate::store::RequestStore`] returns.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::ResultNotFound(_) | Self::RequestNotFound(_) => ErrorKind::NotFound,
      Self::Unauthorized { .. } => ErrorKind::Unauthorized,
      Self::DanglingReference { .. } => ErrorKind::Transport,
    }
  }
}
