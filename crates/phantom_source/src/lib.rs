#![forbid(unsafe_code)]
//! phantom_source: synthetic source generation and diagnostic maps for PET phantoms.
//!
//! Modules:
//! - sampling: alias-method weighted sampler, disk/ball/bound shape sampling
//! - geometry: spatial classifier over a frozen volume hierarchy (incl. a built-in volume tree)
//! - voxel: density / attenuation map rasterization and the raw big-endian map format
//! - phantom: activity-weighted vertex generation, point sources, Jaszczak and NEMA-7 phantoms
//!
//! Lengths are in millimetres, densities in kg/m³.
pub mod error;
pub mod geometry;
pub mod phantom;
pub mod sampling;
pub mod voxel;

/// Convenient re-exports for common types. Import with `use phantom_source::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::geometry::{
        GeometryProvider, Material, RegionHit, Solid, SpatialClassifier, VolumeId, VolumeTree,
    };
    pub use crate::phantom::{
        generate_primaries, AcceptanceCounters, ActivityProfile, FnSink, GeneratorConfig,
        JaszczakPhantom, Nema7Phantom, Nema7Region, Nema7VertexSource, PointSources,
        PrefixCounts, PrimaryVertex, RegionActivityVertexGenerator, SourceMix, VecSink,
        VertexSink, VertexSource,
    };
    pub use crate::sampling::{sample_disk, sample_in_ball, SamplingBound, WeightedSampler};
    pub use crate::voxel::{
        AttenuationLookup, AttenuationTable, MapAttribute, VoxelMap, VoxelMapConfig,
        VoxelMapExporter,
    };
}
