//! parley server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) merged with
//! `PARLEY_*` environment variables, opens the SQLite ledger, starts the
//! expiry sweeper, and serves the JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash` in config.toml:
//!
//! ```
//! cargo run -p parley-server --bin parley -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use parley_core::clock::SystemClock;
use parley_relay::Services;
use parley_server::{
  ServerConfig,
  auth::hash_password,
  gateway::{Gateway, LogGateway},
  telegram::TelegramGateway,
};
use parley_store_sqlite::SqliteLedger;
use tokio::{net::TcpListener, sync::watch};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Parley relay server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    let hash = hash_password(&password)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("PARLEY").try_parsing(true))
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  let relay_cfg = server_cfg
    .relay_config()
    .context("invalid subscription_days")?;

  // Open the ledger.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let ledger = SqliteLedger::open(&store_path)
    .await
    .with_context(|| format!("failed to open ledger at {store_path:?}"))?;

  // Pick the notification transport.
  let gateway = match &server_cfg.telegram_token {
    Some(token) => Gateway::Telegram(
      TelegramGateway::new(token.clone()).context("failed to build Telegram client")?,
    ),
    None => {
      tracing::warn!("no telegram_token configured; notifications will only be logged");
      Gateway::Log(LogGateway)
    }
  };

  let services = Arc::new(Services::new(
    Arc::new(ledger),
    Arc::new(gateway),
    Arc::new(SystemClock),
    relay_cfg,
  ));

  // Background sweeper, stopped on shutdown.
  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let sweeper = services
    .sweeper(server_cfg.sweep_interval())
    .spawn(shutdown_rx);

  let app = parley_server::router(services, Arc::new(server_cfg.auth()));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  let _ = shutdown_tx.send(true);
  sweeper.await.context("sweeper task panicked")?;
  tracing::info!("shutdown complete");

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
  }
  tracing::info!("shutting down");
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
