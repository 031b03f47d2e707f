use serde::{Deserialize, Serialize};

/// Mean meters per degree of latitude, also used for longitude at the equator.
pub const METERS_PER_DEGREE: f64 = 111_320.;

const EARTH_RADIUS_METERS: f64 = 6_371_000.;

/// The standard WGS84 coordinate system.
#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct WGS84Coordinate {
  #[serde(alias = "latitude")]
  pub lat: f64,
  #[serde(alias = "longitude")]
  pub lon: f64,
}

impl WGS84Coordinate {
  #[must_use]
  pub fn new(lat: f64, lon: f64) -> Self {
    Self { lat, lon }
  }

  #[must_use]
  pub fn is_valid(&self) -> bool {
    -90.0 < self.lat && self.lat < 90.0 && -180.0 < self.lon && self.lon < 180.0
  }

  /// Bitwise identity of the coordinate. Two points share a key only if they are exactly equal,
  /// which is what happens when several postal codes resolve to the same table entry.
  #[must_use]
  pub fn exact_key(&self) -> (u64, u64) {
    (self.lat.to_bits(), self.lon.to_bits())
  }

  /// Shifts the coordinate by a metric offset using a flat-earth approximation that is good
  /// enough at marker scale.
  #[must_use]
  pub fn offset_by_meters(&self, east: f64, north: f64) -> Self {
    let d_lat = north / METERS_PER_DEGREE;
    let d_lon = east / (METERS_PER_DEGREE * self.lat.to_radians().cos().max(1e-6));
    Self {
      lat: self.lat + d_lat,
      lon: self.lon + d_lon,
    }
  }
}

/// Great circle distance (haversine).
#[must_use]
pub fn distance_in_meters(coord1: WGS84Coordinate, coord2: WGS84Coordinate) -> f64 {
  let d_lat = (coord2.lat - coord1.lat).to_radians();
  let d_lon = (coord2.lon - coord1.lon).to_radians();
  let a = f64::sin(d_lat / 2.0) * f64::sin(d_lat / 2.0)
    + f64::cos(coord1.lat.to_radians())
      * f64::cos(coord2.lat.to_radians())
      * f64::sin(d_lon / 2.0)
      * f64::sin(d_lon / 2.0);
  let c = 2.0 * f64::atan2(a.sqrt(), (1.0 - a).sqrt());
  EARTH_RADIUS_METERS * c
}

/// Axis aligned box in degrees. The renderer fits its initial view to it.
#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
  pub min_lat: f64,
  pub min_lon: f64,
  pub max_lat: f64,
  pub max_lon: f64,
}

impl Default for BoundingBox {
  fn default() -> Self {
    Self::get_invalid()
  }
}

impl BoundingBox {
  #[must_use]
  pub fn get_invalid() -> Self {
    Self {
      min_lat: f64::MAX,
      min_lon: f64::MAX,
      max_lat: f64::MIN,
      max_lon: f64::MIN,
    }
  }

  pub fn from_iterator<I: IntoIterator<Item = WGS84Coordinate>>(positions: I) -> Self {
    let mut bb = Self::get_invalid();
    positions
      .into_iter()
      .for_each(|pos| bb.add_coordinate(pos));
    bb
  }

  #[must_use]
  pub fn is_valid(&self) -> bool {
    self.min_lat <= self.max_lat && self.min_lon <= self.max_lon
  }

  pub fn add_coordinate(&mut self, coord: WGS84Coordinate) {
    self.min_lat = self.min_lat.min(coord.lat);
    self.min_lon = self.min_lon.min(coord.lon);
    self.max_lat = self.max_lat.max(coord.lat);
    self.max_lon = self.max_lon.max(coord.lon);
  }

  #[must_use]
  pub fn center(&self) -> WGS84Coordinate {
    WGS84Coordinate {
      lat: f64::midpoint(self.min_lat, self.max_lat),
      lon: f64::midpoint(self.min_lon, self.max_lon),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use assert_approx_eq::assert_approx_eq;

  #[test]
  fn distance() {
    let coord1 = WGS84Coordinate { lat: 0.0, lon: 0.0 };
    let coord2 = WGS84Coordinate { lat: 0.0, lon: 1.0 };
    assert_approx_eq!(distance_in_meters(coord1, coord2), 111_195.08, 0.2);

    let alexanderplatz = WGS84Coordinate {
      lat: 52.520_754,
      lon: 13.409_496,
    };
    let hamburg_hbf = WGS84Coordinate {
      lat: 53.552_7,
      lon: 10.006_6,
    };
    assert_approx_eq!(
      distance_in_meters(alexanderplatz, hamburg_hbf),
      254_785.,
      100.
    );
  }

  #[test]
  fn offset_north_is_latitude_only() {
    let berlin = WGS84Coordinate::new(52.52, 13.405);
    let moved = berlin.offset_by_meters(0., METERS_PER_DEGREE);
    assert_approx_eq!(moved.lat, 53.52, 1e-9);
    assert_approx_eq!(moved.lon, 13.405, 1e-12);
  }

  #[test]
  fn offset_east_grows_with_latitude() {
    let equator = WGS84Coordinate::new(0., 10.).offset_by_meters(1000., 0.);
    let north = WGS84Coordinate::new(60., 10.).offset_by_meters(1000., 0.);
    assert_approx_eq!(equator.lon - 10., 1000. / METERS_PER_DEGREE, 1e-12);
    // cos(60°) = 0.5 doubles the longitudinal delta.
    assert_approx_eq!(north.lon - 10., 2000. / METERS_PER_DEGREE, 1e-9);
  }

  #[test]
  fn offset_at_pole_stays_finite() {
    let pole = WGS84Coordinate::new(90., 0.).offset_by_meters(10., 0.);
    assert!(pole.lon.is_finite());
  }

  #[test]
  fn bounding_box() {
    let bb = BoundingBox::from_iterator([
      WGS84Coordinate::new(50., 8.),
      WGS84Coordinate::new(54., 12.),
      WGS84Coordinate::new(52., 6.),
    ]);
    assert!(bb.is_valid());
    assert_eq!(bb.center(), WGS84Coordinate::new(52., 9.));
    assert!(!BoundingBox::from_iterator([]).is_valid());
  }
}
