//! Connection descriptors used to pick a backend at construction time.

use std::{fmt, path::PathBuf, str::FromStr};

use serde::Deserialize;

use crate::Error;

/// Which backend to open, and where.
///
/// | descriptor           | backend                          |
/// |----------------------|----------------------------------|
/// | `memory`             | in-process maps                  |
/// | `sqlite::memory:`    | SQLite, private in-memory file   |
/// | `sqlite://<path>`    | SQLite file at `<path>`          |
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum StoreDescriptor {
  Memory,
  SqliteInMemory,
  SqliteFile(PathBuf),
}

impl FromStr for StoreDescriptor {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s == "memory" {
      return Ok(Self::Memory);
    }
    if s == "sqlite::memory:" {
      return Ok(Self::SqliteInMemory);
    }
    match s.strip_prefix("sqlite://") {
      Some(path) if !path.is_empty() => Ok(Self::SqliteFile(PathBuf::from(path))),
      _ => Err(Error::Validation(format!("unrecognised store descriptor: {s:?}"))),
    }
  }
}

impl TryFrom<String> for StoreDescriptor {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl fmt::Display for StoreDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Memory => f.write_str("memory"),
      Self::SqliteInMemory => f.write_str("sqlite::memory:"),
      Self::SqliteFile(path) => write!(f, "sqlite://{}", path.display()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_known_descriptors() {
    assert_eq!("memory".parse::<StoreDescriptor>().unwrap(), StoreDescriptor::Memory);
    assert_eq!(
      "sqlite::memory:".parse::<StoreDescriptor>().unwrap(),
      StoreDescriptor::SqliteInMemory
    );
    assert_eq!(
      "sqlite:///var/lib/iwant.sqlite".parse::<StoreDescriptor>().unwrap(),
      StoreDescriptor::SqliteFile(PathBuf::from("/var/lib/iwant.sqlite"))
    );
    assert_eq!(
      "sqlite://here.sqlite".parse::<StoreDescriptor>().unwrap(),
      StoreDescriptor::SqliteFile(PathBuf::from("here.sqlite"))
    );
  }

  #[test]
  fn rejects_unknown_descriptors() {
    for bad in ["", "postgres://localhost/db", "sqlite://", "mem"] {
      let err = bad.parse::<StoreDescriptor>().unwrap_err();
      assert!(matches!(err, Error::Validation(_)), "{bad:?} gave {err}");
    }
  }

  #[test]
  fn display_round_trips() {
    let d = StoreDescriptor::SqliteFile(PathBuf::from("data/iwant.sqlite"));
    assert_eq!(d.to_string().parse::<StoreDescriptor>().unwrap(), d);
  }

  #[test]
  fn deserializes_from_a_string() {
    let d: StoreDescriptor = serde_json::from_str("\"memory\"").unwrap();
    assert_eq!(d, StoreDescriptor::Memory);
    assert!(serde_json::from_str::<StoreDescriptor>("\"redis://\"").is_err());
  }
}
