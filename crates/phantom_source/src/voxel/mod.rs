//! Voxel maps of a scalar field sampled over a geometry.
//!
//! - [`VoxelMap`] holds a raster and reads/writes the positional big-endian raw format.
//! - [`VoxelMapExporter`] sweeps a [`VoxelMapConfig`] grid over a
//!   [`crate::geometry::SpatialClassifier`] and fills a map with density or attenuation.
//! - [`AttenuationLookup`] supplies per-material coefficients for attenuation maps.
pub mod attenuation;
pub mod export;
pub mod raw;

pub use attenuation::{AttenuationLookup, AttenuationTable};
pub use export::{MapAttribute, VoxelMapConfig, VoxelMapExporter};
pub use raw::VoxelMap;
