//! Spreads markers that resolve to the same point along an Archimedean spiral.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::coordinates::WGS84Coordinate;

/// Default distance between spiral arms in meters.
pub const DEFAULT_STEP_METERS: f64 = 120.;

/// Angle between two consecutive spiral positions in radians (about 51.6°).
const ANGULAR_STEP: f64 = 0.9;

/// Planar offset in meters.
#[derive(Debug, Default, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct MetricOffset {
  pub east: f64,
  pub north: f64,
}

impl MetricOffset {
  /// The offset of the `index`-th marker of a group.
  #[must_use]
  #[allow(clippy::cast_precision_loss)]
  pub fn spiral(index: usize, step: f64) -> Self {
    let i = index as f64;
    let radius = step * i.sqrt();
    Self {
      east: radius * (ANGULAR_STEP * i).cos(),
      north: radius * (ANGULAR_STEP * i).sin(),
    }
  }

  #[must_use]
  pub fn magnitude(&self) -> f64 {
    self.east.hypot(self.north)
  }

  #[must_use]
  pub fn apply(&self, origin: WGS84Coordinate) -> WGS84Coordinate {
    origin.offset_by_meters(self.east, self.north)
  }
}

/// The first `n` spiral offsets.
#[must_use]
pub fn spiral(n: usize, step: f64) -> Vec<MetricOffset> {
  (0..n).map(|i| MetricOffset::spiral(i, step)).collect()
}

/// Assigns every point its final position. Points that are exactly equal form a group and are
/// numbered in the order they appear in `points`, so the result only depends on that order.
#[derive(Debug, Clone)]
pub struct Placement {
  step: f64,
  seen: HashMap<(u64, u64), usize>,
}

impl Default for Placement {
  fn default() -> Self {
    Self::new(DEFAULT_STEP_METERS)
  }
}

impl Placement {
  #[must_use]
  pub fn new(step: f64) -> Self {
    Self {
      step,
      seen: HashMap::new(),
    }
  }

  /// Places the next marker at `point`.
  pub fn place(&mut self, point: WGS84Coordinate) -> WGS84Coordinate {
    let index = self.seen.entry(point.exact_key()).or_insert(0);
    let offset = MetricOffset::spiral(*index, self.step);
    *index += 1;
    offset.apply(point)
  }

  /// Places all points at once.
  pub fn place_all(step: f64, points: &[WGS84Coordinate]) -> Vec<WGS84Coordinate> {
    let mut placement = Self::new(step);
    points.iter().map(|p| placement.place(*p)).collect()
  }
}
