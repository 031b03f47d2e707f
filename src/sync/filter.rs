use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::country::CountryCode;
use crate::map::marker::{AssetType, Category, MarkerDescriptor};
use crate::map::payload::CountryOverlay;

/// The three filter dimensions of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
  pub categories: BTreeSet<Category>,
  pub asset_types: BTreeSet<AssetType>,
  pub visible_countries: BTreeSet<CountryCode>,
}

impl FilterState {
  /// Everything active, neighbor overlays shown.
  #[must_use]
  pub fn initial(overlays: &[CountryOverlay]) -> Self {
    Self {
      categories: Category::all().iter().copied().collect(),
      asset_types: AssetType::all().iter().copied().collect(),
      visible_countries: overlays
        .iter()
        .filter(|o| o.neighbor)
        .map(|o| o.code)
        .collect(),
    }
  }

  /// Returns whether the category is active afterwards.
  pub fn toggle_category(&mut self, category: Category) -> bool {
    toggle(&mut self.categories, category)
  }

  /// Returns whether the asset type is active afterwards.
  pub fn toggle_asset_type(&mut self, asset_type: AssetType) -> bool {
    toggle(&mut self.asset_types, asset_type)
  }

  /// Returns whether the country is shown afterwards.
  pub fn toggle_country(&mut self, country: CountryCode) -> bool {
    toggle(&mut self.visible_countries, country)
  }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) -> bool {
  if set.remove(&value) {
    false
  } else {
    set.insert(value);
    true
  }
}

/// Decides which markers are shown. Home country markers only depend on category and asset type,
/// all others also need their country in the visible set. Only countries with an overlay can be
/// toggled, so markers of any other foreign country stay hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityRule {
  switchable: BTreeSet<CountryCode>,
}

impl VisibilityRule {
  #[must_use]
  pub fn new(overlays: &[CountryOverlay]) -> Self {
    Self {
      switchable: overlays
        .iter()
        .map(|o| o.code)
        .filter(|c| !c.is_home())
        .collect(),
    }
  }

  #[must_use]
  pub fn is_switchable(&self, country: CountryCode) -> bool {
    self.switchable.contains(&country)
  }

  #[must_use]
  pub fn is_visible(&self, marker: &MarkerDescriptor, state: &FilterState) -> bool {
    state.categories.contains(&marker.category)
      && state.asset_types.contains(&marker.asset_type)
      && (marker.country.is_home() || state.visible_countries.contains(&marker.country))
  }

  /// Visibility of every marker, in marker order.
  #[must_use]
  pub fn visibility(&self, markers: &[MarkerDescriptor], state: &FilterState) -> Vec<bool> {
    markers.iter().map(|m| self.is_visible(m, state)).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::country::HOME_COUNTRY;
  use crate::map::coordinates::WGS84Coordinate;
  use crate::map::marker::{MarkerDetails, MarkerId, Status};

  fn overlay(code: &str, neighbor: bool) -> CountryOverlay {
    CountryOverlay {
      code: CountryCode::parse(code).unwrap(),
      name: code.to_string(),
      neighbor,
      capital: None,
      features: Vec::new(),
    }
  }

  fn marker(category: Category, asset_type: AssetType, country: &str) -> MarkerDescriptor {
    MarkerDescriptor {
      id: MarkerId(0),
      category,
      asset_type,
      status: Status::Order,
      country: CountryCode::parse(country).unwrap(),
      name: "x".to_string(),
      coordinate: WGS84Coordinate::new(50., 10.),
      details: MarkerDetails {
        reference_id: "1".to_string(),
        customer: "—".to_string(),
        postal_code: "1".to_string(),
      },
    }
  }

  #[test]
  fn initial_state_shows_neighbors_only() {
    let overlays = [overlay("AT", true), overlay("IT", false)];
    let state = FilterState::initial(&overlays);
    assert_eq!(state.categories.len(), Category::all().len());
    assert_eq!(state.asset_types.len(), AssetType::all().len());
    assert_eq!(
      state.visible_countries.iter().map(CountryCode::as_str).collect::<Vec<_>>(),
      vec!["AT"]
    );
  }

  #[test]
  fn toggles_flip() {
    let mut state = FilterState::initial(&[]);
    assert!(!state.toggle_category(Category::Eza));
    assert!(state.toggle_category(Category::Eza));
    assert!(!state.toggle_asset_type(AssetType::Pv));
    assert!(state.toggle_country(HOME_COUNTRY));
  }

  #[test]
  fn all_three_dimensions_count() {
    let overlays = [overlay("AT", true), overlay("IT", false)];
    let rule = VisibilityRule::new(&overlays);
    let mut state = FilterState::initial(&overlays);

    let home = marker(Category::Eza, AssetType::Wind, "DE");
    let austria = marker(Category::Eza, AssetType::Wind, "AT");
    let italy = marker(Category::Eza, AssetType::Wind, "IT");
    let spain = marker(Category::Eza, AssetType::Wind, "ES");
    assert_eq!(
      rule.visibility(&[home.clone(), austria.clone(), italy.clone(), spain.clone()], &state),
      vec![true, true, false, false]
    );

    state.toggle_country(austria.country);
    assert!(!rule.is_visible(&austria, &state));
    assert!(rule.is_visible(&home, &state));

    state.toggle_asset_type(AssetType::Wind);
    assert!(!rule.is_visible(&home, &state));
  }

  #[test]
  fn countries_without_overlay_stay_hidden() {
    let rule = VisibilityRule::new(&[]);
    let state = FilterState::initial(&[]);
    let spain = marker(Category::Eza, AssetType::Wind, "ES");
    let unknown = marker(Category::Eza, AssetType::Wind, "XX");

    assert!(!rule.is_switchable(spain.country));
    assert!(!rule.is_visible(&spain, &state));
    assert!(!rule.is_visible(&unknown, &state));
    assert!(rule.is_visible(&marker(Category::Eza, AssetType::Wind, "DE"), &state));
  }
}
