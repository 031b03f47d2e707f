//! The shared country table and the normalizer turning free text into country codes.
//!
//! Every component that needs to go from a code to a name, a name to a code or a country to its
//! capital goes through [`COUNTRIES`]; there is no second mapping anywhere in the crate.

use std::collections::HashMap;
use std::fmt::Display;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::map::coordinates::WGS84Coordinate;

/// A two letter, upper case, ASCII country code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode([u8; 2]);

/// The country all records belong to unless they say otherwise.
pub const HOME_COUNTRY: CountryCode = CountryCode(*b"DE");

impl CountryCode {
  /// Accepts exactly two ASCII letters in any case. Codes name postal code dumps and overlays,
  /// so a pair of non-ASCII letters such as `Öl` is not a code and goes through the alias lookup.
  #[must_use]
  pub fn parse(value: &str) -> Option<Self> {
    match value.as_bytes() {
      [a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
        Some(Self([a.to_ascii_uppercase(), b.to_ascii_uppercase()]))
      }
      _ => None,
    }
  }

  #[must_use]
  pub fn as_str(&self) -> &str {
    // Only ever constructed from ASCII letters.
    std::str::from_utf8(&self.0).unwrap_or("??")
  }

  #[must_use]
  pub fn is_home(&self) -> bool {
    *self == HOME_COUNTRY
  }

  /// The table entry for this code, if it is one of the known countries.
  #[must_use]
  pub fn country(&self) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.code == *self)
  }
}

impl Display for CountryCode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl TryFrom<String> for CountryCode {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::parse(&value).ok_or_else(|| format!("not a two letter country code: {value:?}"))
  }
}

impl From<CountryCode> for String {
  fn from(code: CountryCode) -> Self {
    code.as_str().to_string()
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capital {
  pub city: &'static str,
  pub lat: f64,
  pub lon: f64,
}

impl Capital {
  #[must_use]
  pub fn coordinate(&self) -> WGS84Coordinate {
    WGS84Coordinate::new(self.lat, self.lon)
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Country {
  pub code: CountryCode,
  /// English name, as used by the boundary data set.
  pub name: &'static str,
  /// Lower case spellings besides the name, German and English.
  pub aliases: &'static [&'static str],
  pub capital: Option<Capital>,
  /// Shown by default so cross border projects are visible on first load.
  pub neighbor: bool,
}

const fn country(
  code: &[u8; 2],
  name: &'static str,
  aliases: &'static [&'static str],
  capital: Option<Capital>,
  neighbor: bool,
) -> Country {
  Country {
    code: CountryCode(*code),
    name,
    aliases,
    capital,
    neighbor,
  }
}

const fn capital(city: &'static str, lat: f64, lon: f64) -> Option<Capital> {
  Some(Capital { city, lat, lon })
}

#[rustfmt::skip]
pub static COUNTRIES: &[Country] = &[
  country(b"DE", "Germany", &["deu", "deutschland", "bundesrepublik deutschland"], capital("Berlin", 52.5200, 13.4050), false),
  country(b"AT", "Austria", &["aut", "österreich", "osterreich", "oesterreich"], capital("Vienna", 48.2082, 16.3738), true),
  country(b"BE", "Belgium", &["bel", "belgien"], capital("Brussels", 50.8503, 4.3517), true),
  country(b"CH", "Switzerland", &["che", "schweiz"], capital("Bern", 46.9480, 7.4474), true),
  country(b"CZ", "Czechia", &["cze", "czech republic", "tschechien"], capital("Prague", 50.0755, 14.4378), true),
  country(b"DK", "Denmark", &["dnk", "dänemark", "danemark", "danmark"], capital("Copenhagen", 55.6761, 12.5683), true),
  country(b"FR", "France", &["fra", "frankreich"], capital("Paris", 48.8566, 2.3522), true),
  country(b"LU", "Luxembourg", &["lux", "luxemburg"], capital("Luxembourg", 49.6116, 6.1319), true),
  country(b"NL", "Netherlands", &["nld", "niederlande", "holland"], capital("Amsterdam", 52.3676, 4.9041), true),
  country(b"PL", "Poland", &["pol", "polen"], capital("Warsaw", 52.2297, 21.0122), true),
  country(b"BG", "Bulgaria", &["bgr", "bulgarien"], capital("Sofia", 42.6977, 23.3219), false),
  country(b"CY", "Cyprus", &["cyp", "zypern"], capital("Nicosia", 35.1856, 33.3823), false),
  country(b"EE", "Estonia", &["est", "estland"], capital("Tallinn", 59.4370, 24.7536), false),
  country(b"ES", "Spain", &["esp", "spanien"], capital("Madrid", 40.4168, -3.7038), false),
  country(b"FI", "Finland", &["fin", "finnland"], capital("Helsinki", 60.1699, 24.9384), false),
  country(b"GB", "United Kingdom", &["gbr", "großbritannien", "grossbritannien", "vereinigtes königreich"], capital("London", 51.5074, -0.1278), false),
  country(b"GR", "Greece", &["grc", "griechenland"], capital("Athens", 37.9838, 23.7275), false),
  country(b"HR", "Croatia", &["hrv", "kroatien"], capital("Zagreb", 45.8150, 15.9819), false),
  country(b"HU", "Hungary", &["hun", "ungarn"], capital("Budapest", 47.4979, 19.0402), false),
  country(b"IE", "Ireland", &["irl", "irland"], capital("Dublin", 53.3498, -6.2603), false),
  country(b"IS", "Iceland", &["isl", "island"], capital("Reykjavik", 64.1466, -21.9426), false),
  country(b"IT", "Italy", &["ita", "italien"], capital("Rome", 41.9028, 12.4964), false),
  country(b"LI", "Liechtenstein", &["lie"], None, false),
  country(b"LT", "Lithuania", &["ltu", "litauen"], capital("Vilnius", 54.6872, 25.2797), false),
  country(b"LV", "Latvia", &["lva", "lettland"], capital("Riga", 56.9496, 24.1052), false),
  country(b"MT", "Malta", &["mlt"], capital("Valletta", 35.8989, 14.5146), false),
  country(b"NO", "Norway", &["nor", "norwegen"], capital("Oslo", 59.9139, 10.7522), false),
  country(b"PT", "Portugal", &["prt"], capital("Lisbon", 38.7223, -9.1393), false),
  country(b"RO", "Romania", &["rou", "rumänien", "rumanien"], capital("Bucharest", 44.4268, 26.1025), false),
  country(b"SE", "Sweden", &["swe", "schweden"], capital("Stockholm", 59.3293, 18.0686), false),
  country(b"SI", "Slovenia", &["svn", "slowenien"], capital("Ljubljana", 46.0569, 14.5058), false),
  country(b"SK", "Slovakia", &["svk", "slowakei"], capital("Bratislava", 48.1486, 17.1077), false),
  country(b"AL", "Albania", &["alb", "albanien"], capital("Tirana", 41.3275, 19.8187), false),
  country(b"AD", "Andorra", &[], None, false),
  country(b"AM", "Armenia", &["arm", "armenien"], None, false),
  country(b"AX", "Aland", &["ala", "åland", "aland islands", "åland islands", "ålandinseln"], None, false),
  country(b"AZ", "Azerbaijan", &["aze", "aserbaidschan"], None, false),
  country(b"BA", "Bosnia and Herzegovina", &["bih", "bosnia and herz.", "bosnien und herzegowina", "bosnien-herzegowina"], capital("Sarajevo", 43.8563, 18.4131), false),
  country(b"BY", "Belarus", &["blr", "weißrussland", "weissrussland"], capital("Minsk", 53.9006, 27.5590), false),
  country(b"FO", "Faroe Islands", &["fro", "färöer", "faroer"], None, false),
  country(b"GE", "Georgia", &["geo", "georgien"], None, false),
  country(b"GG", "Guernsey", &["ggy"], None, false),
  country(b"IM", "Isle of Man", &["imn", "insel man"], None, false),
  country(b"JE", "Jersey", &["jey"], None, false),
  country(b"MC", "Monaco", &["mco"], None, false),
  country(b"MD", "Moldova", &["mda", "moldau", "republik moldau"], capital("Chisinau", 47.0105, 28.8638), false),
  country(b"ME", "Montenegro", &["mne"], capital("Podgorica", 42.4304, 19.2594), false),
  country(b"MK", "North Macedonia", &["mkd", "macedonia", "nordmazedonien", "mazedonien"], capital("Skopje", 41.9973, 21.4280), false),
  country(b"RS", "Serbia", &["srb", "serbien", "republic of serbia"], capital("Belgrade", 44.7866, 20.4489), false),
  country(b"UA", "Ukraine", &["ukr"], capital("Kyiv", 50.4501, 30.5234), false),
  country(b"VA", "Vatican", &["vat", "vatikan", "vatikanstadt", "vatican city", "holy see"], None, false),
  country(b"XK", "Kosovo", &["kosova"], None, false),
];

/// State capitals of the home country, drawn as plain labels.
#[rustfmt::skip]
pub static HOME_LABELS: &[Capital] = &[
  Capital { city: "Berlin", lat: 52.5200, lon: 13.4050 },
  Capital { city: "Hamburg", lat: 53.5488, lon: 9.9872 },
  Capital { city: "Bremen", lat: 53.0793, lon: 8.8017 },
  Capital { city: "Hannover", lat: 52.3759, lon: 9.7320 },
  Capital { city: "Kiel", lat: 54.3233, lon: 10.1228 },
  Capital { city: "Schwerin", lat: 53.6355, lon: 11.4012 },
  Capital { city: "Potsdam", lat: 52.3906, lon: 13.0645 },
  Capital { city: "Magdeburg", lat: 52.1205, lon: 11.6276 },
  Capital { city: "Dresden", lat: 51.0504, lon: 13.7373 },
  Capital { city: "Erfurt", lat: 50.9848, lon: 11.0299 },
  Capital { city: "Wiesbaden", lat: 50.0826, lon: 8.2415 },
  Capital { city: "Mainz", lat: 49.9929, lon: 8.2473 },
  Capital { city: "Saarbrücken", lat: 49.2402, lon: 6.9969 },
  Capital { city: "Stuttgart", lat: 48.7758, lon: 9.1829 },
  Capital { city: "München", lat: 48.1374, lon: 11.5755 },
  Capital { city: "Düsseldorf", lat: 51.2277, lon: 6.7735 },
];

/// Lower case name or alias to table entry.
static ALIASES: Lazy<HashMap<String, &'static Country>> = Lazy::new(|| {
  let mut aliases = HashMap::new();
  for country in COUNTRIES {
    aliases.insert(country.name.to_lowercase(), country);
    for alias in country.aliases {
      aliases.insert((*alias).to_string(), country);
    }
  }
  aliases
});

/// Finds a country by its English name or one of its aliases, ignoring case.
#[must_use]
pub fn country_by_name(name: &str) -> Option<&'static Country> {
  ALIASES.get(&name.trim().to_lowercase()).copied()
}

/// Maps free text to a country code. Never fails: anything that cannot be resolved belongs to
/// the home country.
#[must_use]
pub fn normalize_country(value: Option<&str>) -> CountryCode {
  let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
    return HOME_COUNTRY;
  };

  if let Some(code) = CountryCode::parse(value) {
    return code;
  }

  country_by_name(value).map_or(HOME_COUNTRY, |c| c.code)
}
