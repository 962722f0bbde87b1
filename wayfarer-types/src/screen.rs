//! Screen-space types. All values are in CSS pixels.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Position on the screen in pixels from the top-left corner of the map container.
pub type ScreenPoint = Point2<f64>;

/// Pixel offset. Positive `x` goes right, positive `y` goes down.
pub type ScreenOffset = Vector2<f64>;

/// Inner padding of the map viewport in pixels.
///
/// When the camera is fitted to bounds or panned, the padded area is treated as covered by page
/// chrome and the target is placed inside the remaining part of the viewport.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    /// Top padding.
    pub top: f64,
    /// Right padding.
    pub right: f64,
    /// Bottom padding.
    pub bottom: f64,
    /// Left padding.
    pub left: f64,
}

impl Padding {
    /// Creates a new padding.
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Same padding on every side.
    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    /// Offset of the center of the padded area relative to the center of the viewport.
    pub fn center_offset(&self) -> ScreenOffset {
        ScreenOffset::new(
            (self.left - self.right) / 2.0,
            (self.top - self.bottom) / 2.0,
        )
    }
}
