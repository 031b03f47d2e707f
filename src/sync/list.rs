//! The sorted sidebar list of visible markers.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::country::CountryCode;
use crate::map::marker::{AssetType, Category, MarkerDescriptor, MarkerId, Status};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
  pub id: MarkerId,
  pub name: String,
  pub category: Category,
  pub asset_type: AssetType,
  pub status: Status,
  pub country: CountryCode,
}

impl From<&MarkerDescriptor> for ListEntry {
  fn from(marker: &MarkerDescriptor) -> Self {
    Self {
      id: marker.id,
      name: marker.name.clone(),
      category: marker.category,
      asset_type: marker.asset_type,
      status: marker.status,
      country: marker.country,
    }
  }
}

/// Case insensitive key with whitespace collapsed. Non-breaking spaces count as spaces.
#[must_use]
pub fn normalized_name(name: &str) -> String {
  name
    .split(|c: char| c.is_whitespace() || c == '\u{a0}')
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// [`normalized_name`] with diacritics folded the way German phone books sort (`ä` as `a`,
/// `ß` as `ss`).
#[must_use]
pub fn sort_key(name: &str) -> String {
  let mut key = String::with_capacity(name.len());
  for c in normalized_name(name).chars() {
    match c {
      'ß' => key.push_str("ss"),
      'æ' => key.push_str("ae"),
      'œ' => key.push_str("oe"),
      c => key.push(fold(c)),
    }
  }
  key
}

fn fold(c: char) -> char {
  match c {
    'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ą' => 'a',
    'ç' | 'ć' | 'č' => 'c',
    'ď' | 'đ' => 'd',
    'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
    'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => 'i',
    'ł' | 'ľ' | 'ĺ' => 'l',
    'ñ' | 'ń' | 'ň' => 'n',
    'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => 'o',
    'ř' | 'ŕ' => 'r',
    'ś' | 'š' | 'ş' | 'ș' => 's',
    'ť' | 'ţ' | 'ț' => 't',
    'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => 'u',
    'ý' | 'ÿ' => 'y',
    'ź' | 'ż' | 'ž' => 'z',
    c => c,
  }
}

/// Folded name first, then the unfolded name so that `Muller` and `Müller` keep a fixed order,
/// then the id.
fn list_key(entry: &ListEntry) -> (String, String, MarkerId) {
  (sort_key(&entry.name), normalized_name(&entry.name), entry.id)
}

#[must_use]
pub fn compare(a: &ListEntry, b: &ListEntry) -> Ordering {
  list_key(a).cmp(&list_key(b))
}

/// The entries of all visible markers, sorted.
#[must_use]
pub fn sorted_entries(markers: &[MarkerDescriptor], visible: &[bool]) -> Vec<ListEntry> {
  let mut entries: Vec<_> = markers
    .iter()
    .zip(visible)
    .filter(|(_, visible)| **visible)
    .map(|(marker, _)| ListEntry::from(marker))
    .collect();
  entries.sort_by_cached_key(list_key);
  entries
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::country::HOME_COUNTRY;
  use rstest::rstest;

  fn entry(id: u32, name: &str) -> ListEntry {
    ListEntry {
      id: MarkerId(id),
      name: name.to_string(),
      category: Category::Eza,
      asset_type: AssetType::Wind,
      status: Status::Order,
      country: HOME_COUNTRY,
    }
  }

  #[rstest]
  #[case("Windpark\u{a0}Nord", "windpark nord")]
  #[case("  Straße  am   See ", "strasse am see")]
  #[case("Öko Energie", "oko energie")]
  #[case("Élan", "elan")]
  fn sort_keys(#[case] name: &str, #[case] key: &str) {
    assert_eq!(sort_key(name), key);
  }

  #[test]
  fn sorting_ignores_case_and_diacritics() {
    let mut entries = vec![
      entry(0, "Zeppelin"),
      entry(1, "ärger"),
      entry(2, "Anlage"),
      entry(3, "Müller"),
      entry(4, "muller"),
      entry(5, "Bach"),
    ];
    entries.sort_by(compare);
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Anlage", "ärger", "Bach", "muller", "Müller", "Zeppelin"]);
  }

  #[test]
  fn equal_names_keep_id_order() {
    let mut entries = vec![
      entry(7, "Windpark"),
      entry(2, "WINDPARK"),
      entry(5, "windpark\u{a0}"),
    ];
    entries.sort_by(compare);
    let ids: Vec<_> = entries.iter().map(|e| e.id.0).collect();
    assert_eq!(ids, vec![2, 5, 7]);
  }
}
