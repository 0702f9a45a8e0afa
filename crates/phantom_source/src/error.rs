//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid construction arguments, geometry lifecycle violations, region/profile
//! mismatches, the rejection-sampling attempt cap, malformed voxel maps, IO, and
//! generic errors.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("geometry not finalized: close the geometry before classifying points")]
    GeometryNotFinalized,

    #[error("geometry is closed and can no longer be modified")]
    GeometryClosed,

    #[error("region '{name}' matches no configured activity prefix")]
    UnrecognizedRegion { name: String },

    #[error("point ({x}, {y}, {z}) lies outside the geometry")]
    OutsideGeometry { x: f64, y: f64, z: f64 },

    #[error("no acceptable region sampled after {attempts} attempts")]
    NoAcceptableRegion { attempts: u64 },

    #[error("unknown material '{name}'")]
    UnknownMaterial { name: String },

    #[error("malformed voxel map: {0}")]
    MalformedMap(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
