//! Geographic bounding box.

use serde::{Deserialize, Serialize};

use crate::lnglat::LngLat;

/// Axis-aligned rectangle in geographic coordinates.
///
/// Bounds do not wrap around the antimeridian: `west` is always less than or equal to `east`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LngLatBounds {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
}

impl LngLatBounds {
    /// Bounds of the whole Web Mercator world.
    pub const WORLD: Self = Self {
        west: -180.0,
        south: -85.051_129,
        east: 180.0,
        north: 85.051_129,
    };

    /// Creates new bounds from south-west and north-east corners values.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Zero-size bounds containing a single point.
    pub fn from_point(point: LngLat) -> Self {
        Self {
            west: point.lng(),
            south: point.lat(),
            east: point.lng(),
            north: point.lat(),
        }
    }

    /// Minimal bounds containing all the given points. Returns `None` if the iterator is empty.
    pub fn from_points(mut points: impl Iterator<Item = LngLat>) -> Option<Self> {
        let first = points.next()?;
        let mut bounds = Self::from_point(first);
        for point in points {
            bounds.extend(point);
        }

        Some(bounds)
    }

    /// Western edge (minimum longitude).
    pub fn west(&self) -> f64 {
        self.west
    }

    /// Southern edge (minimum latitude).
    pub fn south(&self) -> f64 {
        self.south
    }

    /// Eastern edge (maximum longitude).
    pub fn east(&self) -> f64 {
        self.east
    }

    /// Northern edge (maximum latitude).
    pub fn north(&self) -> f64 {
        self.north
    }

    /// South-west corner.
    pub fn south_west(&self) -> LngLat {
        LngLat::new(self.west, self.south)
    }

    /// North-east corner.
    pub fn north_east(&self) -> LngLat {
        LngLat::new(self.east, self.north)
    }

    /// Center of the box.
    pub fn center(&self) -> LngLat {
        LngLat::new(
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }

    /// Grows the bounds to include the point.
    pub fn extend(&mut self, point: LngLat) {
        self.west = self.west.min(point.lng());
        self.south = self.south.min(point.lat());
        self.east = self.east.max(point.lng());
        self.north = self.north.max(point.lat());
    }

    /// Returns true if the point is inside the bounds or on its edge.
    ///
    /// Points with NaN components are never contained.
    pub fn contains(&self, point: LngLat) -> bool {
        self.west <= point.lng()
            && self.east >= point.lng()
            && self.south <= point.lat()
            && self.north >= point.lat()
    }

    /// Smallest bounds containing both `self` and `other`.
    pub fn merge(&self, other: Self) -> Self {
        Self {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }
}
