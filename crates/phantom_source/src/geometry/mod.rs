//! Point-to-region classification over a frozen volume hierarchy.
//!
//! A [`GeometryProvider`] owns the spatial partition and answers point-location
//! queries once it is closed. [`SpatialClassifier`] wraps a closed provider and
//! is what the voxel exporter and the vertex generator consume.
//!
//! [`VolumeTree`] is the provider implementation shipped with this crate.
use std::sync::Arc;

use glam::DVec3;
use mint::Vector3;

use crate::error::{Error, Result};

pub mod material;
pub mod volume;

pub use material::Material;
pub use volume::{Solid, VolumeId, VolumeTree};

/// Result of locating a point: the innermost region containing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionHit<'a> {
    /// Display name of the region, e.g. `Rod_2_14`.
    pub name: &'a str,
    /// Name of the region's material.
    pub material: &'a str,
    /// Material density in kg/m³.
    pub density: f64,
}

/// Point-location oracle over a spatial partition.
///
/// Implementors must be read-only once [`GeometryProvider::is_closed`] returns
/// `true`; classifiers rely on that to serve concurrent queries without locking.
/// Each implementation documents how it resolves points lying exactly on a
/// boundary between two regions.
pub trait GeometryProvider: Send + Sync {
    /// Whether the partition has been finalized.
    fn is_closed(&self) -> bool;

    /// Locates `point` (millimetres), or `None` when it lies outside the outermost region.
    fn locate(&self, point: Vector3<f64>) -> Option<RegionHit<'_>>;
}

/// Classifies points into regions of a closed geometry.
#[derive(Clone)]
pub struct SpatialClassifier {
    provider: Arc<dyn GeometryProvider>,
}

impl std::fmt::Debug for SpatialClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialClassifier").finish_non_exhaustive()
    }
}

impl SpatialClassifier {
    /// Binds a classifier to `provider`.
    ///
    /// Fails with [`Error::GeometryNotFinalized`] if the provider has not been closed.
    pub fn new(provider: Arc<dyn GeometryProvider>) -> Result<Self> {
        if !provider.is_closed() {
            return Err(Error::GeometryNotFinalized);
        }
        Ok(Self { provider })
    }

    /// Convenience constructor taking ownership of a concrete provider.
    pub fn from_provider<G>(provider: G) -> Result<Self>
    where
        G: GeometryProvider + 'static,
    {
        Self::new(Arc::new(provider))
    }

    /// Returns the innermost region containing `p`, or `None` outside the geometry.
    #[inline]
    pub fn classify(&self, p: DVec3) -> Option<RegionHit<'_>> {
        self.provider.locate(p.into())
    }

    #[inline]
    pub fn classify_xyz(&self, x: f64, y: f64, z: f64) -> Option<RegionHit<'_>> {
        self.classify(DVec3::new(x, y, z))
    }

    /// Shared handle to the underlying provider.
    pub fn provider(&self) -> &Arc<dyn GeometryProvider> {
        &self.provider
    }
}
