use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};

use crate::error::WayfarerTypesError;

/// Number of [`CoordKey`] units in one degree. Keys are rounded to 6 decimal places.
pub const COORD_KEY_SCALE: f64 = 1_000_000.0;

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct LngLat {
    lng: f64,
    lat: f64,
}

impl LngLat {
    /// Creates a new position from longitude and latitude (in degrees).
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Longitude in degrees.
    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Returns false if any of the components is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    /// Rounded key of the position.
    pub fn key(&self) -> CoordKey {
        CoordKey::from(*self)
    }

    /// Position as a GeoJSON position vector (`[lng, lat]`).
    pub fn to_position(&self) -> Vec<f64> {
        vec![self.lng, self.lat]
    }
}

impl TryFrom<&[f64]> for LngLat {
    type Error = WayfarerTypesError;

    fn try_from(value: &[f64]) -> Result<Self, Self::Error> {
        match value {
            [lng, lat, ..] => Ok(Self::new(*lng, *lat)),
            _ => Err(WayfarerTypesError::Conversion(
                "position must contain at least 2 dimensions".to_string(),
            )),
        }
    }
}

impl AbsDiffEq for LngLat {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.lng.abs_diff_eq(&other.lng, epsilon) && self.lat.abs_diff_eq(&other.lat, epsilon)
    }
}

impl RelativeEq for LngLat {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.lng.relative_eq(&other.lng, epsilon, max_relative)
            && self.lat.relative_eq(&other.lat, epsilon, max_relative)
    }
}

/// Creates a new [`LngLat`] from longitude and latitude values (in degrees).
///
/// ```
/// use wayfarer_types::lnglat;
///
/// let point = lnglat!(2.2945, 48.8584);
/// assert_eq!(point.lat(), 48.8584);
/// ```
#[macro_export]
macro_rules! lnglat {
    ($lng:expr, $lat:expr) => {
        ::wayfarer_types::LngLat::new($lng, $lat)
    };
}

/// Position rounded to 6 decimal places, stored as integer micro-degrees.
///
/// Two positions that print the same with 6 decimals produce equal keys, so the key can be used
/// to recognize that an interaction targets the same point as before without comparing floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordKey {
    lng: i64,
    lat: i64,
}

impl CoordKey {
    /// Longitude in micro-degrees.
    pub fn lng_micro(&self) -> i64 {
        self.lng
    }

    /// Latitude in micro-degrees.
    pub fn lat_micro(&self) -> i64 {
        self.lat
    }
}

impl From<LngLat> for CoordKey {
    fn from(value: LngLat) -> Self {
        Self {
            lng: (value.lng * COORD_KEY_SCALE).round() as i64,
            lat: (value.lat * COORD_KEY_SCALE).round() as i64,
        }
    }
}
