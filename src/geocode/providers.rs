use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use serde_json::Value;
use surf_governor::GovernorMiddleware;

use super::{GeocodeError, PostalCodeLookup};
use crate::country::CountryCode;
use crate::map::coordinates::WGS84Coordinate;

const POSTAL_CODE_COLUMN: usize = 1;
const LATITUDE_COLUMN: usize = 9;
const LONGITUDE_COLUMN: usize = 10;

type PostalCodeTable = HashMap<String, WGS84Coordinate>;

/// Offline lookup in GeoNames postal code dumps (`<dir>/<CC>.txt`).
pub struct GeoNamesTable {
  dir: PathBuf,
  cache: Mutex<HashMap<CountryCode, Arc<PostalCodeTable>>>,
}

impl GeoNamesTable {
  #[must_use]
  pub fn new(dir: PathBuf) -> Self {
    Self {
      dir,
      cache: Mutex::default(),
    }
  }

  fn table(&self, country: CountryCode) -> Result<Arc<PostalCodeTable>, GeocodeError> {
    if let Some(table) = self.cache.lock().ok().and_then(|c| c.get(&country).cloned()) {
      return Ok(table);
    }

    let table = Arc::new(self.read_table(country)?);
    if let Ok(mut cache) = self.cache.lock() {
      cache.insert(country, table.clone());
    }
    Ok(table)
  }

  /// Reads a dump and averages all places sharing a postal code.
  fn read_table(&self, country: CountryCode) -> Result<PostalCodeTable, GeocodeError> {
    let path = self.dir.join(format!("{country}.txt"));
    if !path.is_file() {
      return Err(GeocodeError::UnsupportedCountry(country));
    }
    let table_error = |source| GeocodeError::Table {
      path: path.clone(),
      source,
    };
    let mut reader = csv::ReaderBuilder::new()
      .delimiter(b'\t')
      .has_headers(false)
      .flexible(true)
      .quoting(false)
      .from_path(&path)
      .map_err(table_error)?;

    let mut sums: HashMap<String, (f64, f64, u32)> = HashMap::new();
    for record in reader.records() {
      let record = record.map_err(table_error)?;
      let parsed = (
        record.get(POSTAL_CODE_COLUMN).map(str::trim),
        record
          .get(LATITUDE_COLUMN)
          .and_then(|v| v.trim().parse::<f64>().ok()),
        record
          .get(LONGITUDE_COLUMN)
          .and_then(|v| v.trim().parse::<f64>().ok()),
      );
      let (Some(code), Some(lat), Some(lon)) = parsed else {
        continue;
      };
      let entry = sums.entry(code.to_string()).or_insert((0., 0., 0));
      entry.0 += lat;
      entry.1 += lon;
      entry.2 += 1;
    }

    log::debug!("Loaded {} postal codes from {}", sums.len(), path.display());
    Ok(
      sums
        .into_iter()
        .map(|(code, (lat, lon, n))| {
          let n = f64::from(n);
          (code, WGS84Coordinate::new(lat / n, lon / n))
        })
        .collect(),
    )
  }
}

#[async_trait::async_trait]
impl PostalCodeLookup for GeoNamesTable {
  fn name(&self) -> &str {
    "GeoNames postal codes"
  }

  async fn lookup(
    &self,
    country: CountryCode,
    postal_codes: &[String],
  ) -> Result<Vec<Option<WGS84Coordinate>>, GeocodeError> {
    let table = self.table(country)?;
    Ok(
      postal_codes
        .iter()
        .map(|code| table.get(code).copied())
        .collect(),
    )
  }
}

/// OpenStreetMap Nominatim provider (free, one request per second)
pub struct NominatimProvider {
  base_url: String,
  client: surf::Client,
}

impl NominatimProvider {
  /// # Errors
  /// If the rate limiter cannot be set up.
  pub fn new(base_url: Option<String>) -> anyhow::Result<Self> {
    let limiter =
      GovernorMiddleware::per_second(1).map_err(|e| anyhow!("Rate limiter setup failed: {e}"))?;
    Ok(Self {
      base_url: base_url.unwrap_or_else(|| "https://nominatim.openstreetmap.org".to_string()),
      client: surf::Client::new().with(limiter),
    })
  }

  fn url(&self, country: CountryCode, postal_code: &str) -> String {
    format!(
      "{}/search?format=json&limit=1&postalcode={}&countrycodes={}",
      self.base_url,
      urlencoding::encode(postal_code),
      country.as_str().to_lowercase()
    )
  }

  async fn lookup_one(
    &self,
    country: CountryCode,
    postal_code: &str,
  ) -> anyhow::Result<Option<WGS84Coordinate>> {
    let response = self
      .client
      .get(self.url(country, postal_code))
      .header("User-Agent", "assetmap/0.1 (postal code placement)")
      .recv_json::<Value>()
      .await
      .map_err(|e| anyhow!("Nominatim API request failed: {}", e))?;
    Ok(parse_first_hit(&response))
  }
}

fn parse_first_hit(response: &Value) -> Option<WGS84Coordinate> {
  let item = response.as_array()?.first()?;
  let lat = item["lat"].as_str()?.parse::<f64>().ok()?;
  let lon = item["lon"].as_str()?.parse::<f64>().ok()?;
  Some(WGS84Coordinate::new(lat, lon))
}

#[async_trait::async_trait]
impl PostalCodeLookup for NominatimProvider {
  fn name(&self) -> &str {
    "OpenStreetMap Nominatim"
  }

  async fn lookup(
    &self,
    country: CountryCode,
    postal_codes: &[String],
  ) -> Result<Vec<Option<WGS84Coordinate>>, GeocodeError> {
    let mut points = Vec::with_capacity(postal_codes.len());
    for code in postal_codes {
      match self.lookup_one(country, code).await {
        Ok(point) => points.push(point),
        Err(e) => {
          log::debug!("{country} {code}: {e}");
          points.push(None);
        }
      }
    }
    Ok(points)
  }
}
