//! Value types used by the `wayfarer` map engine.
//!
//! Geographic positions are represented by [`LngLat`] (degrees, longitude first, the same axis
//! order GeoJSON uses). [`CoordKey`] is a rounded, hashable form of a position which is used to
//! recognize repeated interactions with the same point on the map. [`LngLatBounds`] is the
//! rectangle used to frame the camera, and [`Padding`] / [`ScreenOffset`] describe screen-space
//! adjustments in pixels.

pub mod bounds;
pub mod error;
mod lnglat;
pub mod screen;

pub use bounds::LngLatBounds;
pub use lnglat::{CoordKey, LngLat, COORD_KEY_SCALE};
pub use screen::{Padding, ScreenOffset, ScreenPoint};
