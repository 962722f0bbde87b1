//! Error types used by the crate.

use thiserror::Error;
use wayfarer_types::error::WayfarerTypesError;

/// Wayfarer error type.
///
/// Most engine operations never return these to the page: failures are logged and the
/// interaction degrades silently. The type is used at the seams where the caller can react,
/// such as configuration loading, map creation or data conversion.
#[derive(Debug, Error)]
pub enum MapError {
    /// Failed to load data from the network.
    #[error("failed to load data: {0}")]
    Io(String),
    /// Error decoding JSON data.
    #[error("failed to decode data")]
    Decoding(#[from] serde_json::Error),
    /// Invalid GeoJSON input.
    #[error("invalid geojson: {0}")]
    GeoJson(#[from] geojson::Error),
    /// A feature property could not be interpreted.
    #[error("malformed feature property `{property}`: {reason}")]
    MalformedProperty {
        /// Property name.
        property: &'static str,
        /// What was wrong with it.
        reason: String,
    },
    /// Coordinate conversion error.
    #[error(transparent)]
    Coordinate(#[from] WayfarerTypesError),
    /// Source, layer or cluster was not found on the map.
    #[error("item not found: {0}")]
    NotFound(String),
    /// Configuration values are inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Navigation path template could not be formatted.
    #[error("invalid path template: {0}")]
    Template(String),
    /// Error reported by the map surface implementation.
    #[error("surface error: {0}")]
    Surface(String),
}

impl From<strfmt::FmtError> for MapError {
    fn from(value: strfmt::FmtError) -> Self {
        Self::Template(value.to_string())
    }
}
