//! Placement of the legs of a spiderfied cluster.
//!
//! Small clusters are laid out on a circle around the cluster center, larger ones on an
//! Archimedean spiral so the points never overlap however many there are.

use std::f64::consts::PI;

use nalgebra::Vector2;
use wayfarer_types::ScreenOffset;

use crate::config::SpiderfierConfig;

/// Screen placement of one leg relative to the cluster center.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LegPlacement {
    /// Angle of the leg in radians.
    pub angle: f64,
    /// Length of the leg in pixels.
    pub length: f64,
    /// Offset of the leg foot from the cluster center.
    pub offset: ScreenOffset,
}

impl LegPlacement {
    fn new(angle: f64, length: f64) -> Self {
        Self {
            angle,
            length,
            offset: Vector2::new(length * angle.cos(), length * angle.sin()),
        }
    }
}

/// Computes leg placements for clusters of a given size.
#[derive(Debug, Clone, Default)]
pub struct Spiderfier {
    config: SpiderfierConfig,
}

impl Spiderfier {
    /// Creates a new spiderfier.
    pub fn new(config: SpiderfierConfig) -> Self {
        Self { config }
    }

    /// Placements of `count` legs.
    pub fn place(&self, count: usize) -> Vec<LegPlacement> {
        match count {
            0 => vec![],
            _ if count < self.config.circle_spiral_switchover => self.circle(count),
            _ => self.spiral(count),
        }
    }

    fn circle(&self, count: usize) -> Vec<LegPlacement> {
        let circumference = self.config.circle_foot_separation * (2 + count) as f64;
        let length = circumference / (2.0 * PI);
        let step = 2.0 * PI / count as f64;

        (0..count)
            .map(|i| LegPlacement::new(i as f64 * step, length))
            .collect()
    }

    fn spiral(&self, count: usize) -> Vec<LegPlacement> {
        let mut length = self.config.spiral_length_start;
        let mut angle = 0.0;

        (0..count)
            .map(|i| {
                angle += self.config.spiral_foot_separation / length + i as f64 * 0.0005;
                let placement = LegPlacement::new(angle, length);
                length += 2.0 * PI * self.config.spiral_length_factor / angle;
                placement
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn small_clusters_form_a_circle() {
        let placements = Spiderfier::default().place(4);
        assert_eq!(placements.len(), 4);

        let expected_length = 25.0 * 6.0 / (2.0 * PI);
        for (i, leg) in placements.iter().enumerate() {
            assert_abs_diff_eq!(leg.length, expected_length);
            assert_abs_diff_eq!(leg.angle, i as f64 * PI / 2.0);
            assert_abs_diff_eq!(leg.offset.norm(), expected_length, epsilon = 1e-9);
        }

        assert_abs_diff_eq!(placements[1].offset.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(placements[1].offset.y, expected_length, epsilon = 1e-9);
    }

    #[test]
    fn threshold_switches_to_spiral() {
        let spiderfier = Spiderfier::default();

        let below = spiderfier.place(11);
        assert!(below.windows(2).all(|w| w[0].length == w[1].length));

        let at = spiderfier.place(12);
        assert_abs_diff_eq!(at[0].length, 15.0);
        assert!(at.windows(2).all(|w| w[1].length > w[0].length));
    }

    #[test]
    fn spiral_legs_never_overlap() {
        let placements = Spiderfier::default().place(100);
        assert_eq!(placements.len(), 100);

        for pair in placements.windows(2) {
            assert!(pair[1].length > pair[0].length);
            assert!(pair[1].angle > pair[0].angle);
            assert!((pair[1].offset - pair[0].offset).norm() > 10.0);
        }
    }

    #[test]
    fn empty_cluster_has_no_legs() {
        assert!(Spiderfier::default().place(0).is_empty());
    }
}
