//! `wfd-import`: import a WFD report into the knowledge base.
//!
//! Settings are layered: `wfd.toml` (or the path given with `--config`),
//! then `WFD_*` environment variables, then command-line flags.
//!
//! ```
//! wfd-import --kind rbd --in-file https://cdr.eionet.europa.eu/se/eu/wfd2016/RBDSUCA.xml \
//!   --mappings mappings.json --preview-file preview.wiki
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use wfd_core::config::{ImportKind, RunConfiguration, SinkKind};
use wfd_engine::{
  coordinator::{Coordinator, Sink},
  mapping::MappingTable,
  preview::WikitextRenderer,
};
use wfd_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Import WFD report data into a knowledge base")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "wfd.toml")]
  config: PathBuf,

  /// Dataset type: RBD or SWB.
  #[arg(long)]
  kind: Option<ImportKind>,

  /// Local XML file or http(s) URL of the report.
  #[arg(long = "in-file")]
  source: Option<String>,

  /// Allow creating entities that do not exist yet.
  #[arg(long)]
  new: bool,

  /// Compute plans without writing anything.
  #[arg(long)]
  dry_run: bool,

  /// Render plans as wikitext to this file instead of writing.
  #[arg(long)]
  preview_file: Option<PathBuf>,

  /// Stop after this many records have been dispatched.
  #[arg(long)]
  cutoff: Option<usize>,

  /// Path to the mapping document.
  #[arg(long)]
  mappings: Option<PathBuf>,

  /// Reporting year.
  #[arg(long)]
  year: Option<i32>,

  /// Path to the SQLite knowledge-base mirror.
  #[arg(long)]
  store: Option<PathBuf>,
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
  let config = load_configuration(&cli)?;

  // A broken mapping document stops the run before any record is read.
  let table = MappingTable::load(&config.mappings_path, config.kind)
    .context("invalid mapping configuration")?;

  let records = wfd_xml::load_records(&config.source, config.kind)
    .await
    .with_context(|| format!("failed to load {}", config.source))?;

  let store_path = expand_tilde(&config.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let coordinator = Coordinator::new(&config, &table, &store);
  match config.sink() {
    SinkKind::Preview(path) => {
      let renderer = WikitextRenderer;
      let mut sink = Sink::<SqliteStore>::preview(&renderer);
      coordinator.run(&records, &mut sink).await;
      let text = sink.preview_text().unwrap_or_default();
      tokio::fs::write(&path, text)
        .await
        .with_context(|| format!("failed to write preview to {path:?}"))?;
      tracing::info!("Preview written to {}", path.display());
    }
    SinkKind::DryRun => {
      coordinator.run(&records, &mut Sink::<SqliteStore>::DryRun).await;
    }
    SinkKind::Live => {
      coordinator.run(&records, &mut Sink::Live(&store)).await;
    }
  }

  Ok(())
}

/// Merge the configuration file, `WFD_*` environment variables and flags.
fn load_configuration(cli: &Cli) -> anyhow::Result<RunConfiguration> {
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("WFD"))
    .set_override_option("kind", cli.kind.map(ImportKind::as_str))?
    .set_override_option("source", cli.source.clone())?
    .set_override_option("policy", cli.new.then_some("allow_create"))?
    .set_override_option("dry_run", cli.dry_run.then_some(true))?
    .set_override_option("preview_path", cli.preview_file.as_deref().map(path_str))?
    .set_override_option("cutoff", cli.cutoff.map(|c| c as i64))?
    .set_override_option("mappings_path", cli.mappings.as_deref().map(path_str))?
    .set_override_option("year", cli.year.map(i64::from))?
    .set_override_option("store_path", cli.store.as_deref().map(path_str))?
    .build()
    .context("failed to read configuration")?;

  settings
    .try_deserialize()
    .context("failed to deserialise RunConfiguration")
}

fn path_str(path: &Path) -> String { path.to_string_lossy().into_owned() }

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

#[cfg(test)]
mod tests {
  use wfd_core::entity::CreationPolicy;

  use super::*;

  fn cli(config: &Path, args: &[&str]) -> Cli {
    let mut argv = vec!["wfd-import", "--config", config.to_str().unwrap()];
    argv.extend_from_slice(args);
    Cli::parse_from(argv)
  }

  #[test]
  fn flags_override_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wfd.toml");
    std::fs::write(
      &path,
      "kind = \"RBD\"\nsource = \"rbd.xml\"\ndry_run = true\nyear = 2010\n",
    )
    .unwrap();

    let config = load_configuration(&cli(&path, &[
      "--kind", "swb", "--cutoff", "3", "--new",
    ]))
    .unwrap();

    assert_eq!(config.kind, ImportKind::Swb);
    assert_eq!(config.source, "rbd.xml");
    assert_eq!(config.cutoff, Some(3));
    assert_eq!(config.year, 2010);
    assert_eq!(config.policy, CreationPolicy::AllowCreate);
    assert_eq!(config.sink(), SinkKind::DryRun);
  }

  #[test]
  fn flags_alone_are_enough() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_configuration(&cli(&dir.path().join("absent.toml"), &[
      "--kind",
      "rbd",
      "--in-file",
      "rbd.xml",
      "--preview-file",
      "preview.wiki",
    ]))
    .unwrap();

    assert_eq!(config.kind, ImportKind::Rbd);
    assert_eq!(config.policy, CreationPolicy::EnrichOnly);
    assert_eq!(config.sink(), SinkKind::Preview(PathBuf::from("preview.wiki")));
    assert_eq!(config.mappings_path, PathBuf::from("mappings.json"));
  }

  #[test]
  fn source_is_required() {
    let dir = tempfile::tempdir().unwrap();
    let result =
      load_configuration(&cli(&dir.path().join("absent.toml"), &["--kind", "rbd"]));
    assert!(result.is_err());
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/wfd.sqlite")),
      PathBuf::from(home).join("wfd.sqlite")
    );
    assert_eq!(expand_tilde(Path::new("wfd.sqlite")), PathBuf::from("wfd.sqlite"));
  }
}
