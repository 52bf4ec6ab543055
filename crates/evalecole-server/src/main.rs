//! evalecole-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus
//! `EVALECOLE_*` environment variables, then serves the JSON API.
//!
//! # Provisioning
//!
//! A new SQLite file has no tables; the API answers `503` with the setup
//! script until an operator runs one of:
//!
//! ```text
//! evalecole-server provision          # create the tables and demo accounts
//! evalecole-server schema | sqlite3 evalecole.db
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use evalecole_server::ServerConfig;
use evalecole_store_sqlite::schema;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Éval'École API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the API (the default).
  Serve,
  /// Print the SQL setup script and exit.
  Schema,
  /// Run the setup script against the configured SQLite file.
  Provision {
    /// Create the tables only, without the starting accounts and classes.
    #[arg(long)]
    no_seed: bool,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  match cli.command.unwrap_or(Command::Serve) {
    Command::Schema => {
      print!("{}", schema::setup_script());
      Ok(())
    }
    Command::Provision { no_seed } => {
      let cfg = ServerConfig::load(&cli.config)?;
      evalecole_server::provision(&cfg, !no_seed).await
    }
    Command::Serve => {
      let cfg = ServerConfig::load(&cli.config)?;
      evalecole_server::run(&cfg).await
    }
  }
}
