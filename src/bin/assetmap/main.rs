use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use assetmap::config::Config;
use assetmap::geocode::GeocoderConfig;
use assetmap::map::payload::Diagnostics;
use assetmap::pipeline::build_payload;
use assetmap::source::DataSourceConfig;
use clap::Parser as CliParser;

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Directory with one csv file per category.
  #[arg(long, conflicts_with = "sqlite")]
  csv: Option<PathBuf>,

  /// SQLite database with one table per category.
  #[arg(long)]
  sqlite: Option<PathBuf>,

  /// Directory with GeoNames postal code dumps (`DE.txt`, `AT.txt`, ...). Tried first.
  #[arg(short, long)]
  postal_codes: Option<PathBuf>,

  /// Asks OpenStreetMap Nominatim for postal codes the tables do not know.
  #[arg(long, default_value_t = false)]
  nominatim: bool,

  /// GeoJSON file with country polygons.
  #[arg(short, long)]
  boundaries: Option<PathBuf>,

  /// Distance between markers sharing a postal code, in meters.
  #[arg(long)]
  step: Option<f64>,

  /// Where to write the payload. `-` writes to stdout.
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Pretty prints the payload.
  #[arg(long, default_value_t = false)]
  pretty: bool,
}

impl Args {
  fn apply(self, mut config: Config) -> Config {
    if let Some(dir) = self.csv {
      config.data_source = Some(DataSourceConfig::Csv { dir });
    }
    if let Some(path) = self.sqlite {
      config.data_source = Some(DataSourceConfig::Sqlite { path });
    }
    if let Some(dir) = self.postal_codes {
      config.geocoders.insert(0, GeocoderConfig::GeoNames { dir });
    }
    if self.nominatim {
      config.geocoders.push(GeocoderConfig::Nominatim { base_url: None });
    }
    config.boundaries_path = self.boundaries.or(config.boundaries_path);
    config.jitter_step_meters = self.step.or(config.jitter_step_meters);
    config.output = self.output.or(config.output);
    config
  }
}

fn print_diagnostics(diagnostics: &Diagnostics) {
  eprintln!(
    "{} markers from {} rows",
    diagnostics.markers, diagnostics.rows_read
  );
  for (dataset, reason) in &diagnostics.skipped_datasets {
    eprintln!("  skipped {dataset}: {reason}");
  }
  for (country, count) in &diagnostics.geocode_dropped {
    eprintln!("  {country}: {count} rows without coordinates");
  }
  for (country, error) in &diagnostics.failed_lookups {
    eprintln!("  {country}: lookup failed: {error}");
  }
  if diagnostics.excluded_asset_type > 0 {
    eprintln!(
      "  {} rows with unknown asset type",
      diagnostics.excluded_asset_type
    );
  }
  if diagnostics.excluded_measurement > 0 {
    eprintln!(
      "  {} rows hidden, no measurement installed",
      diagnostics.excluded_measurement
    );
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  env_logger::init();

  let args = Args::parse();
  let pretty = args.pretty;
  let config = args.apply(Config::new());

  let payload = build_payload(&config).await;
  print_diagnostics(&payload.diagnostics);

  let json = if pretty {
    serde_json::to_string_pretty(&payload)?
  } else {
    serde_json::to_string(&payload)?
  };

  let output = config.output();
  if output.as_os_str() == "-" {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(json.as_bytes())?;
    stdout.write_all(b"\n")?;
  } else {
    std::fs::write(&output, json)
      .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("Payload written to {}", output.display());
  }
  Ok(())
}
