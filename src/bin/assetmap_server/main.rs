use std::path::PathBuf;

use assetmap::config::Config;
use assetmap::pipeline::build_payload;
use assetmap::remote::{Session, serve};
use assetmap::source::DataSourceConfig;
use clap::Parser as CliParser;
use tracing_subscriber::EnvFilter;

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Port to listen on (localhost only).
  #[arg(short, long)]
  port: Option<u16>,

  /// Directory with one csv file per category.
  #[arg(long, conflicts_with = "sqlite")]
  csv: Option<PathBuf>,

  /// SQLite database with one table per category.
  #[arg(long)]
  sqlite: Option<PathBuf>,

  /// GeoJSON file with country polygons.
  #[arg(short, long)]
  boundaries: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_target(false)
    .with_env_filter(EnvFilter::from_default_env())
    .compact()
    .init();

  let args = Args::parse();
  let mut config = Config::new();
  if let Some(dir) = args.csv {
    config.data_source = Some(DataSourceConfig::Csv { dir });
  }
  if let Some(path) = args.sqlite {
    config.data_source = Some(DataSourceConfig::Sqlite { path });
  }
  config.boundaries_path = args.boundaries.or(config.boundaries_path);
  let port = args.port.unwrap_or_else(|| config.listen_port());

  let payload = build_payload(&config).await;
  tracing::info!(
    markers = payload.markers.len(),
    overlays = payload.overlays.len(),
    "Payload ready"
  );

  serve(Session::new(payload), port).await
}
