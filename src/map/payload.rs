//! The static description of a map handed to the renderer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::coordinates::{BoundingBox, WGS84Coordinate};
use super::marker::{AssetType, Category, MarkerDescriptor};
use crate::country::{Capital, CountryCode, HOME_LABELS};

/// A plain text label at a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPayload {
  pub text: String,
  pub coordinate: WGS84Coordinate,
}

impl From<&Capital> for LabelPayload {
  fn from(capital: &Capital) -> Self {
    Self {
      text: capital.city.to_string(),
      coordinate: capital.coordinate(),
    }
  }
}

/// A foreign country that can be shown or hidden as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryOverlay {
  pub code: CountryCode,
  pub name: String,
  /// Shown on first load.
  pub neighbor: bool,
  pub capital: Option<LabelPayload>,
  /// The GeoJSON features of the country, passed through untouched.
  pub features: Vec<Value>,
}

/// What happened to the input on the way to the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
  pub rows_read: usize,
  /// Data sets that were not processed, with the reason.
  pub skipped_datasets: Vec<(String, String)>,
  /// Rows without coordinates per country.
  pub geocode_dropped: BTreeMap<CountryCode, usize>,
  /// Countries whose lookup failed as a whole.
  pub failed_lookups: Vec<(CountryCode, String)>,
  pub excluded_asset_type: usize,
  pub excluded_measurement: usize,
  pub markers: usize,
}

impl Diagnostics {
  #[must_use]
  pub fn geocode_dropped_total(&self) -> usize {
    self.geocode_dropped.values().sum()
  }
}

/// Everything the renderer needs to draw the initial map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPayload {
  pub generated_at: DateTime<Utc>,
  pub markers: Vec<MarkerDescriptor>,
  pub overlays: Vec<CountryOverlay>,
  pub home_labels: Vec<LabelPayload>,
  /// `None` if there are no markers.
  pub bounds: Option<BoundingBox>,
  pub categories: Vec<Category>,
  pub asset_types: Vec<AssetType>,
  pub diagnostics: Diagnostics,
}

impl MapPayload {
  #[must_use]
  pub fn new(
    markers: Vec<MarkerDescriptor>,
    overlays: Vec<CountryOverlay>,
    diagnostics: Diagnostics,
  ) -> Self {
    let bounds = BoundingBox::from_iterator(markers.iter().map(|m| m.coordinate));
    Self {
      generated_at: Utc::now(),
      markers,
      overlays,
      home_labels: HOME_LABELS.iter().map(LabelPayload::from).collect(),
      bounds: bounds.is_valid().then_some(bounds),
      categories: Category::all().to_vec(),
      asset_types: AssetType::all().to_vec(),
      diagnostics,
    }
  }

  #[must_use]
  pub fn overlay(&self, code: CountryCode) -> Option<&CountryOverlay> {
    self.overlays.iter().find(|o| o.code == code)
  }
}
