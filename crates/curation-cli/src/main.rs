//! `curate`: command-line host for the curation annotation store.
//!
//! # Usage
//!
//! ```text
//! curate inspect annotations.json --active A1
//! curate fetch --gdm 9f3c... --active A1
//! curate show --annotation A1
//! curate serve --config curate.toml
//! ```

mod client;
mod report;

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
};

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use client::BackendClient;
use curation_api::{ApiState, api_router};
use curation_core::{AnnotationAction, AnnotationStore, AnnotationsState, Snapshot, SnapshotStore};
use curation_store_sqlite::SqliteSnapshotStore;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "curate", version, about = "Curation annotation evidence store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "curate.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Load annotations from a JSON file and print the normalized view.
  Inspect {
    /// A file holding a JSON array of annotations.
    file:       PathBuf,
    /// PK of the annotation to mark active.
    #[arg(long)]
    active:     Option<String>,
    /// Print one annotation's evidence in detail.
    #[arg(long)]
    annotation: Option<String>,
    /// Print the whole store state as JSON.
    #[arg(long)]
    json:       bool,
  },
  /// Fetch a GDM's annotations from the backend and save a snapshot.
  Fetch {
    /// PK of the GDM whose annotations to load.
    #[arg(long)]
    gdm:     String,
    #[arg(long)]
    active:  Option<String>,
    /// Base URL of the curation backend; overrides the config file.
    #[arg(long, env = "CURATE_BACKEND_URL")]
    backend: Option<String>,
    /// Do not persist the result.
    #[arg(long)]
    no_save: bool,
  },
  /// Print the most recently saved snapshot.
  Show {
    #[arg(long)]
    annotation: Option<String>,
    #[arg(long)]
    json:       bool,
  },
  /// Serve the JSON API over the most recently saved snapshot.
  Serve,
}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from the config file and `CURATE_*`
/// environment variables.
#[derive(Deserialize, Debug, Clone)]
struct CliConfig {
  #[serde(default = "default_host")]
  host:           String,
  #[serde(default = "default_port")]
  port:           u16,
  #[serde(default = "default_snapshot_path")]
  snapshot_path:  PathBuf,
  #[serde(default = "default_backend_url")]
  backend_url:    String,
  /// How many snapshots to keep after each save.
  #[serde(default = "default_keep_snapshots")]
  keep_snapshots: usize,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 5240 }
fn default_snapshot_path() -> PathBuf { PathBuf::from("curation.sqlite") }
fn default_backend_url() -> String { "http://localhost:3000".to_string() }
fn default_keep_snapshots() -> usize { 10 }

fn load_config(path: &Path) -> Result<CliConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("CURATE"))
    .build()
    .context("failed to read config file")?;
  settings
    .try_deserialize()
    .context("failed to deserialise CliConfig")
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  // `inspect` works offline on a file and never reads the config.
  match cli.command {
    Command::Inspect {
      file,
      active,
      annotation,
      json,
    } => inspect(&file, active, annotation.as_deref(), json),
    Command::Fetch {
      gdm,
      active,
      backend,
      no_save,
    } => fetch(&load_config(&cli.config)?, &gdm, active, backend, no_save).await,
    Command::Show { annotation, json } => {
      show(&load_config(&cli.config)?, annotation.as_deref(), json).await
    }
    Command::Serve => serve(&load_config(&cli.config)?).await,
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

fn inspect(file: &Path, active: Option<String>, annotation: Option<&str>, json: bool) -> Result<()> {
  let raw = std::fs::read_to_string(file)
    .with_context(|| format!("reading annotations file {}", file.display()))?;
  let annotations = curation_core::model::decode_annotations(&raw)
    .with_context(|| format!("parsing annotations file {}", file.display()))?;

  let mut store = AnnotationStore::new();
  store.dispatch(AnnotationAction::Set {
    annotations,
    active_annotation_pk: active,
  });
  print_state(store.state(), annotation, json)
}

async fn fetch(
  config: &CliConfig,
  gdm: &str,
  active: Option<String>,
  backend: Option<String>,
  no_save: bool,
) -> Result<()> {
  let client = BackendClient::new(backend.unwrap_or_else(|| config.backend_url.clone()))?;
  let mut store = AnnotationStore::new();
  let state = client.fetch_into(&mut store, gdm, active).await;

  if let Some(message) = &state.fetch_error_message {
    bail!("{message}");
  }
  print!("{}", report::render(state));

  if !no_save {
    let snapshots = open_snapshots(config).await?;
    snapshots
      .save_snapshot(Snapshot::capture(state))
      .await
      .context("saving snapshot")?;
    snapshots
      .prune(config.keep_snapshots)
      .await
      .context("pruning snapshots")?;
    tracing::info!(path = %config.snapshot_path.display(), "snapshot saved");
  }
  Ok(())
}

async fn show(config: &CliConfig, annotation: Option<&str>, json: bool) -> Result<()> {
  let snapshots = open_snapshots(config).await?;
  let Some(snapshot) = snapshots.load_snapshot().await.context("loading snapshot")? else {
    bail!("no snapshot saved at {}", config.snapshot_path.display());
  };
  let mut store = AnnotationStore::new();
  store.rehydrate(snapshot);
  print_state(store.state(), annotation, json)
}

async fn serve(config: &CliConfig) -> Result<()> {
  let snapshots = open_snapshots(config).await?;
  let mut store = AnnotationStore::new();
  if let Some(snapshot) = snapshots.load_snapshot().await.context("loading snapshot")? {
    store.rehydrate(snapshot);
    tracing::info!(
      annotations = store.state().all_pks.len(),
      "rehydrated store from snapshot"
    );
  }

  let state = ApiState::new(store, Some(snapshots));
  let app = axum::Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http());

  let address: SocketAddr = format!("{}:{}", config.host, config.port)
    .parse()
    .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn open_snapshots(config: &CliConfig) -> Result<SqliteSnapshotStore> {
  SqliteSnapshotStore::open(&config.snapshot_path)
    .await
    .with_context(|| format!("failed to open snapshot store at {:?}", config.snapshot_path))
}

fn print_state(state: &AnnotationsState, annotation: Option<&str>, json: bool) -> Result<()> {
  if json {
    println!(
      "{}",
      serde_json::to_string_pretty(state).context("serialising state")?
    );
    return Ok(());
  }

  match annotation {
    Some(pk) => match report::render_annotation(state, pk) {
      Some(text) => print!("{text}"),
      None => bail!("annotation {pk} is not loaded"),
    },
    None => print!("{}", report::render(state)),
  }
  Ok(())
}
