use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::coordinates::WGS84Coordinate;
use crate::country::CountryCode;

/// The data sets that are turned into markers. Any other data set is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
  #[serde(rename = "EZA")]
  Eza,
  #[serde(rename = "EZAR")]
  Ezar,
  #[serde(rename = "OSNV")]
  Osnv,
  #[serde(rename = "EZE")]
  Eze,
}

impl Category {
  #[must_use]
  pub fn name(&self) -> &'static str {
    match self {
      Category::Eza => "EZA",
      Category::Ezar => "EZAR",
      Category::Osnv => "OSNV",
      Category::Eze => "EZE",
    }
  }

  #[must_use]
  pub fn all() -> &'static [Category] {
    &[Category::Eza, Category::Ezar, Category::Osnv, Category::Eze]
  }
}

impl FromStr for Category {
  type Err = ();

  fn from_str(input: &str) -> Result<Self, Self::Err> {
    Category::all()
      .iter()
      .find(|c| c.name() == input.trim())
      .copied()
      .ok_or(())
  }
}

impl Display for Category {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// Kind of plant a project belongs to. Rows with any other value never become markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetType {
  Batterie,
  Wind,
  #[serde(rename = "BHKW")]
  Bhkw,
  #[serde(rename = "HKW")]
  Hkw,
  Wasser,
  #[serde(rename = "PV")]
  Pv,
  #[serde(rename = "EZAR")]
  Ezar,
}

impl AssetType {
  #[must_use]
  pub fn name(&self) -> &'static str {
    match self {
      AssetType::Batterie => "Batterie",
      AssetType::Wind => "Wind",
      AssetType::Bhkw => "BHKW",
      AssetType::Hkw => "HKW",
      AssetType::Wasser => "Wasser",
      AssetType::Pv => "PV",
      AssetType::Ezar => "EZAR",
    }
  }

  #[must_use]
  pub fn all() -> &'static [AssetType] {
    &[
      AssetType::Batterie,
      AssetType::Wind,
      AssetType::Pv,
      AssetType::Bhkw,
      AssetType::Hkw,
      AssetType::Wasser,
      AssetType::Ezar,
    ]
  }
}

impl FromStr for AssetType {
  type Err = ();

  /// Case sensitive: `wind` is not `Wind`.
  fn from_str(input: &str) -> Result<Self, Self::Err> {
    AssetType::all()
      .iter()
      .find(|a| a.name() == input)
      .copied()
      .ok_or(())
  }
}

impl Display for AssetType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// Only offers are told apart, everything else counts as an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Status {
  Quote,
  #[default]
  Order,
}

impl Status {
  /// Label in the language of the source data.
  #[must_use]
  pub fn label(&self) -> &'static str {
    match self {
      Status::Quote => "Angebot",
      Status::Order => "Auftrag",
    }
  }

  #[must_use]
  pub fn normalize(value: Option<&str>) -> Self {
    match value {
      Some(v) if v.trim().eq_ignore_ascii_case(Status::Quote.label()) => Status::Quote,
      _ => Status::Order,
    }
  }
}

/// Identity of a marker, assigned in build order starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub u32);

impl Display for MarkerId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "proj-{}", self.0)
  }
}

/// Fields only shown in the marker popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDetails {
  pub reference_id: String,
  pub customer: String,
  pub postal_code: String,
}

/// Everything the renderer and the synchronizer know about a marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDescriptor {
  pub id: MarkerId,
  pub category: Category,
  pub asset_type: AssetType,
  pub status: Status,
  pub country: CountryCode,
  pub name: String,
  pub coordinate: WGS84Coordinate,
  pub details: MarkerDetails,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_collapses_to_two_values() {
    assert_eq!(Status::normalize(Some("Angebot")), Status::Quote);
    assert_eq!(Status::normalize(Some("  angebot ")), Status::Quote);
    assert_eq!(Status::normalize(Some("Auftrag")), Status::Order);
    assert_eq!(Status::normalize(Some("storniert")), Status::Order);
    assert_eq!(Status::normalize(Some("")), Status::Order);
    assert_eq!(Status::normalize(None), Status::Order);
  }

  #[test]
  fn asset_types_match_exactly() {
    assert_eq!("Wind".parse::<AssetType>(), Ok(AssetType::Wind));
    assert_eq!("BHKW".parse::<AssetType>(), Ok(AssetType::Bhkw));
    assert!("wind".parse::<AssetType>().is_err());
    assert!("Solar".parse::<AssetType>().is_err());
    for asset_type in AssetType::all() {
      assert_eq!(asset_type.name().parse::<AssetType>(), Ok(*asset_type));
    }
  }

  #[test]
  fn serialized_names_match_display_names() {
    for category in Category::all() {
      assert_eq!(
        serde_json::to_string(category).unwrap(),
        format!("\"{}\"", category.name())
      );
    }
    for asset_type in AssetType::all() {
      assert_eq!(
        serde_json::to_string(asset_type).unwrap(),
        format!("\"{}\"", asset_type.name())
      );
    }
  }

  #[test]
  fn categories_parse_trimmed() {
    assert_eq!(" OSNV ".parse::<Category>(), Ok(Category::Osnv));
    assert!("Projekte".parse::<Category>().is_err());
  }
}
