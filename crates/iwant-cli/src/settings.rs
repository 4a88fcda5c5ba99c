//! Runtime configuration for the `iwant` binary.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use iwant_core::descriptor::StoreDescriptor;
use serde::Deserialize;

/// Settings read from `iwant.toml` and `IWANT_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
  /// Backend descriptor, e.g. `sqlite://iwant.sqlite` or `memory`.
  #[serde(default = "default_store")]
  pub store: StoreDescriptor,
}

/// A file in the working directory, so state outlives a single invocation.
fn default_store() -> StoreDescriptor {
  StoreDescriptor::SqliteFile(PathBuf::from("iwant.sqlite"))
}

impl CliConfig {
  /// Layer the optional config file under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("IWANT"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_to_a_sqlite_file_without_a_file() {
    let cfg = CliConfig::load(&PathBuf::from("/nonexistent/iwant.toml")).unwrap();
    assert_eq!(cfg.store.to_string(), "sqlite://iwant.sqlite");
  }

  #[test]
  fn memory_is_still_selectable() {
    let cfg: CliConfig = serde_json::from_str(r#"{ "store": "memory" }"#).unwrap();
    assert_eq!(cfg.store, StoreDescriptor::Memory);
  }

  #[test]
  fn deserialises_a_descriptor() {
    let cfg: CliConfig =
      serde_json::from_str(r#"{ "store": "sqlite://data/iwant.sqlite" }"#).unwrap();
    assert_eq!(
      cfg.store,
      StoreDescriptor::SqliteFile(PathBuf::from("data/iwant.sqlite"))
    );
  }
}
