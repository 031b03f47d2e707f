//! Row level cleaning and exclusion rules.

use crate::map::marker::AssetType;

/// Shown for empty display values.
pub const PLACEHOLDER: &str = "—";

/// Values of the measurement column that hide a project.
const MEASUREMENT_NEGATIVE: [&str; 4] = ["nein", "no", "false", "0"];

/// Replaces non-breaking spaces and trims. Blank values become `None`.
#[must_use]
pub fn clean_text(value: Option<&str>) -> Option<String> {
  let cleaned = value?.replace('\u{a0}', " ");
  let cleaned = cleaned.trim();
  (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// [`clean_text`] with a placeholder for blank values.
#[must_use]
pub fn display_text(value: Option<&str>) -> String {
  clean_text(value).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// The asset type of a row, `None` if it is not one of the known types.
#[must_use]
pub fn parse_asset_type(value: Option<&str>) -> Option<AssetType> {
  value?.replace('\u{a0}', "").trim().parse().ok()
}

/// True if the row states that no measurement is installed. A missing value never hides a row.
#[must_use]
pub fn is_measurement_negative(value: Option<&str>) -> bool {
  clean_text(value).is_some_and(|v| MEASUREMENT_NEGATIVE.contains(&v.to_lowercase().as_str()))
}
