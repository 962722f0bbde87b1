//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error, PartialEq)]
pub enum WayfarerTypesError {
    /// Input could not be converted into a coordinate.
    #[error("invalid coordinate: {0}")]
    Conversion(String),
}
