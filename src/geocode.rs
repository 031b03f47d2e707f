pub mod providers;

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::country::CountryCode;
use crate::map::coordinates::WGS84Coordinate;

/// Width of home country postal codes.
const HOME_POSTAL_CODE_WIDTH: usize = 5;

static FLOAT_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.0$").expect("valid regex"));

/// Errors of a single lookup call. They only ever affect one country group.
#[derive(Error, Debug)]
pub enum GeocodeError {
  #[error("no postal code data for country {0}")]
  UnsupportedCountry(CountryCode),
  #[error("failed to read postal code table {path}: {source}")]
  Table { path: PathBuf, source: csv::Error },
  #[error("lookup failed: {0}")]
  Lookup(String),
}

/// Resolves postal codes of one country to coordinates.
#[async_trait::async_trait]
pub trait PostalCodeLookup: Send + Sync {
  /// Human-readable name of the provider
  fn name(&self) -> &str;

  /// Looks up all `postal_codes` of `country` in one go. The result has one entry per input
  /// code, `None` where the code is unknown. An `Err` means the whole group failed.
  async fn lookup(
    &self,
    country: CountryCode,
    postal_codes: &[String],
  ) -> Result<Vec<Option<WGS84Coordinate>>, GeocodeError>;
}

/// Configuration for lookup providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeocoderConfig {
  /// Offline GeoNames postal code dumps, one `<CC>.txt` per country.
  GeoNames { dir: PathBuf },
  /// OpenStreetMap Nominatim (free, rate limited).
  Nominatim { base_url: Option<String> },
}

/// Strips the float artefact (`10115.0`) spreadsheets leave on numeric postal codes.
#[must_use]
pub fn clean_postal_code(raw: &str) -> String {
  let trimmed = raw.replace('\u{a0}', " ");
  FLOAT_SUFFIX.replace(trimmed.trim(), "").trim().to_string()
}

/// The code used for lookups. Home country codes are zero padded, since leading zeros get lost
/// when a column is read as a number.
#[must_use]
pub fn normalize_postal_code(raw: &str, country: CountryCode) -> String {
  let code = clean_postal_code(raw);
  if country.is_home() {
    format!("{code:0>HOME_POSTAL_CODE_WIDTH$}")
  } else {
    code
  }
}

/// Result of geocoding a batch of rows.
#[derive(Debug, Default)]
pub struct GeocodeOutcome {
  /// One entry per request, in request order.
  pub points: Vec<Option<WGS84Coordinate>>,
  /// Number of rows per country that could not be resolved.
  pub unresolved: BTreeMap<CountryCode, usize>,
  /// Groups where no provider could answer at all, with the last error.
  pub failed_groups: Vec<(CountryCode, String)>,
}

impl GeocodeOutcome {
  #[must_use]
  pub fn unresolved_total(&self) -> usize {
    self.unresolved.values().sum()
  }
}

/// Geocodes rows grouped by country, asking the providers in order.
pub struct Geocoder {
  providers: Vec<Box<dyn PostalCodeLookup>>,
}

impl Geocoder {
  #[must_use]
  pub fn new(providers: Vec<Box<dyn PostalCodeLookup>>) -> Self {
    Self { providers }
  }

  /// Builds the provider chain from configuration. Providers that cannot be created are logged
  /// and left out.
  #[must_use]
  pub fn with_config(configs: &[GeocoderConfig]) -> Self {
    let mut chain: Vec<Box<dyn PostalCodeLookup>> = Vec::new();
    for config in configs {
      match config {
        GeocoderConfig::GeoNames { dir } => {
          chain.push(Box::new(providers::GeoNamesTable::new(dir.clone())));
        }
        GeocoderConfig::Nominatim { base_url } => {
          match providers::NominatimProvider::new(base_url.clone()) {
            Ok(provider) => chain.push(Box::new(provider)),
            Err(e) => log::error!("Cannot create Nominatim provider: {e}"),
          }
        }
      }
    }
    if chain.is_empty() {
      log::warn!("No geocoding provider configured, every row will be dropped");
    }
    Self::new(chain)
  }

  #[must_use]
  pub fn provider_names(&self) -> Vec<String> {
    self.providers.iter().map(|p| p.name().to_string()).collect()
  }

  /// Geocodes `(country, raw postal code)` pairs. Each country is one group and a failing group
  /// never affects the others.
  pub async fn geocode(&self, requests: &[(CountryCode, String)]) -> GeocodeOutcome {
    let mut groups: BTreeMap<CountryCode, Vec<usize>> = BTreeMap::new();
    for (i, (country, _)) in requests.iter().enumerate() {
      groups.entry(*country).or_default().push(i);
    }

    let mut outcome = GeocodeOutcome {
      points: vec![None; requests.len()],
      ..Default::default()
    };

    for (country, rows) in groups {
      let codes: Vec<String> = rows
        .iter()
        .map(|i| normalize_postal_code(&requests[*i].1, country))
        .collect();
      let resolved = self.geocode_group(country, &codes, &mut outcome).await;

      let mut unresolved = 0;
      for (row, code) in rows.iter().zip(&codes) {
        let point = resolved.get(code).copied();
        if point.is_none() {
          unresolved += 1;
        }
        outcome.points[*row] = point;
      }
      if unresolved > 0 {
        log::debug!("{country}: {unresolved} of {} postal codes unresolved", rows.len());
        outcome.unresolved.insert(country, unresolved);
      }
    }
    outcome
  }

  async fn geocode_group(
    &self,
    country: CountryCode,
    codes: &[String],
    outcome: &mut GeocodeOutcome,
  ) -> HashMap<String, WGS84Coordinate> {
    let mut pending: Vec<String> = codes.iter().unique().cloned().collect();

    let mut resolved = HashMap::new();
    let mut last_error = None;
    let mut answered = false;
    for provider in &self.providers {
      if pending.is_empty() {
        break;
      }
      match provider.lookup(country, &pending).await {
        Ok(points) => {
          answered = true;
          let mut still_pending = Vec::new();
          let points = points.into_iter().chain(std::iter::repeat(None));
          for (code, point) in pending.into_iter().zip(points) {
            match point.filter(WGS84Coordinate::is_valid) {
              Some(p) => {
                resolved.insert(code, p);
              }
              None => still_pending.push(code),
            }
          }
          pending = still_pending;
        }
        Err(e) => {
          log::warn!("Provider '{}' failed for {country}: {e}", provider.name());
          last_error = Some(e.to_string());
        }
      }
    }

    if !answered && let Some(e) = last_error {
      outcome.failed_groups.push((country, e));
    }
    resolved
  }
}
