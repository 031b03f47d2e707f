use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde_json::Value;
use thiserror::Error;

use super::payload::{CountryOverlay, LabelPayload};
use crate::country::{CountryCode, country_by_name};

/// Property holding the country name in Natural Earth style data sets.
pub const DEFAULT_NAME_PROPERTY: &str = "ADMIN";

#[derive(Error, Debug)]
pub enum BoundaryError {
  #[error("boundary file not found: {0}")]
  NotFound(PathBuf),
  #[error("failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("invalid GeoJSON: {0}")]
  Json(#[from] serde_json::Error),
  #[error("expected a FeatureCollection, got {0}")]
  NotFeatureCollection(String),
}

/// Reads a GeoJSON file of country polygons.
///
/// # Errors
/// If the file cannot be read or is not a feature collection.
pub fn load_boundaries(
  path: &Path,
  name_property: &str,
) -> Result<Vec<CountryOverlay>, BoundaryError> {
  if !path.is_file() {
    return Err(BoundaryError::NotFound(path.to_path_buf()));
  }
  let data = std::fs::read_to_string(path).map_err(|source| BoundaryError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let value: Value = serde_json::from_str(&data)?;
  parse_boundaries(&value, name_property)
}

/// Groups the features of a collection by country. Features whose name is not in the country
/// table are dropped, and so is the home country. Overlays are sorted by name.
///
/// # Errors
/// If `value` is not a feature collection.
pub fn parse_boundaries(
  value: &Value,
  name_property: &str,
) -> Result<Vec<CountryOverlay>, BoundaryError> {
  match value.get("type").and_then(Value::as_str) {
    Some("FeatureCollection") => {}
    Some(other) => return Err(BoundaryError::NotFeatureCollection(other.to_string())),
    None => return Err(BoundaryError::NotFeatureCollection("no type".to_string())),
  }

  let mut grouped: BTreeMap<CountryCode, Vec<Value>> = BTreeMap::new();
  let mut unknown = 0;
  for feature in value
    .get("features")
    .and_then(Value::as_array)
    .into_iter()
    .flatten()
  {
    let name = feature
      .get("properties")
      .and_then(|p| p.get(name_property))
      .and_then(Value::as_str)
      .map(str::trim)
      .unwrap_or_default();
    if name.is_empty() {
      continue;
    }
    match country_by_name(name) {
      Some(country) if country.code.is_home() => {}
      Some(country) => grouped.entry(country.code).or_default().push(feature.clone()),
      None => unknown += 1,
    }
  }
  if unknown > 0 {
    log::debug!("Ignored {unknown} features of countries outside the country table");
  }

  let mut overlays: Vec<_> = grouped
    .into_iter()
    .filter_map(|(code, features)| {
      let country = code.country()?;
      Some(CountryOverlay {
        code,
        name: country.name.to_string(),
        neighbor: country.neighbor,
        capital: country.capital.as_ref().map(LabelPayload::from),
        features,
      })
    })
    .collect();
  overlays.sort_by_key(|o| o.name.to_lowercase());

  log::info!(
    "Loaded {} country overlays, neighbors: {}",
    overlays.len(),
    overlays
      .iter()
      .filter(|o| o.neighbor)
      .map(|o| o.name.as_str())
      .join(", ")
  );
  Ok(overlays)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn feature(name: &str) -> Value {
    json!({
      "type": "Feature",
      "properties": { "ADMIN": name },
      "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] }
    })
  }

  #[test]
  fn groups_and_joins_features() {
    let collection = json!({
      "type": "FeatureCollection",
      "features": [
        feature("Netherlands"),
        feature("Germany"),
        feature("Austria"),
        feature("Netherlands"),
        feature("Atlantis"),
        { "type": "Feature", "properties": {}, "geometry": null },
      ]
    });

    let overlays = parse_boundaries(&collection, DEFAULT_NAME_PROPERTY).unwrap();

    let names: Vec<_> = overlays.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["Austria", "Netherlands"]);
    assert_eq!(overlays[1].features.len(), 2);
    assert!(overlays[1].neighbor);
    assert_eq!(overlays[0].capital.as_ref().unwrap().text, "Vienna");
  }

  #[test]
  fn balkan_countries_get_overlays() {
    let collection = json!({
      "type": "FeatureCollection",
      "features": [
        feature("Republic of Serbia"),
        feature("Bosnia and Herzegovina"),
        feature("Kosovo"),
        feature("Russia"),
      ]
    });

    let overlays = parse_boundaries(&collection, DEFAULT_NAME_PROPERTY).unwrap();

    let codes: Vec<_> = overlays.iter().map(|o| o.code.as_str()).collect();
    assert_eq!(codes, vec!["BA", "XK", "RS"]);
    assert_eq!(overlays[0].capital.as_ref().unwrap().text, "Sarajevo");
    assert!(overlays[1].capital.is_none());
    assert_eq!(overlays[2].capital.as_ref().unwrap().text, "Belgrade");
    assert!(overlays.iter().all(|o| !o.neighbor));
  }

  #[test]
  fn uses_configured_name_property() {
    let collection = json!({
      "type": "FeatureCollection",
      "features": [{ "type": "Feature", "properties": { "NAME_DE": "Schweiz" }, "geometry": null }]
    });
    let overlays = parse_boundaries(&collection, "NAME_DE").unwrap();
    assert_eq!(overlays[0].code.as_str(), "CH");
    assert!(parse_boundaries(&collection, DEFAULT_NAME_PROPERTY).unwrap().is_empty());
  }

  #[test]
  fn rejects_other_geojson() {
    assert!(matches!(
      parse_boundaries(&feature("Austria"), DEFAULT_NAME_PROPERTY),
      Err(BoundaryError::NotFeatureCollection(_))
    ));
    assert!(matches!(
      load_boundaries(Path::new("/does/not/exist.geojson"), DEFAULT_NAME_PROPERTY),
      Err(BoundaryError::NotFound(_))
    ));
  }
}
