//! `iwant` — operator CLI for the request store.
//!
//! Reads `iwant.toml` (or the path given with `--config`) and `IWANT_*`
//! environment variables, opens the configured backend and runs one command
//! against it, printing JSON to stdout.
//!
//! ```text
//! iwant --store sqlite://iwant.sqlite add --person john --activity coffee \
//!   --deadline 2024-05-01T12:00:00Z --window 300
//! iwant --store sqlite://iwant.sqlite resolve <id> <id>
//! ```

mod commands;
mod settings;

use std::{io, path::PathBuf};

use anyhow::Context as _;
use clap::Parser;
use iwant_core::descriptor::StoreDescriptor;
use iwant_store_memory::MemoryStore;
use iwant_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{commands::Command, settings::CliConfig};

#[derive(Parser)]
#[command(author, version, about = "Store, merge and expire activity requests")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "iwant.toml")]
  config: PathBuf,

  /// Backend descriptor; overrides the configured `store`.
  #[arg(long)]
  store: Option<StoreDescriptor>,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so stdout stays parseable JSON.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(&cli.config)?;
  let descriptor = cli.store.unwrap_or(cfg.store);
  tracing::debug!(store = %descriptor, "opening backend");

  let mut out = io::stdout().lock();
  match descriptor {
    StoreDescriptor::Memory => {
      commands::run(&MemoryStore::new(), cli.command, &mut out).await
    }
    StoreDescriptor::SqliteInMemory => {
      let store = SqliteStore::open_in_memory()
        .await
        .context("failed to open in-memory sqlite store")?;
      commands::run(&store, cli.command, &mut out).await
    }
    StoreDescriptor::SqliteFile(path) => {
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      commands::run(&store, cli.command, &mut out).await
    }
  }
}
