//! Rasterizing a geometry's density or attenuation onto a regular grid.
//!
//! The grid is centered on [`VoxelMapConfig::center`] (the classifier's origin by
//! default). Each voxel takes the value at its center point; there is no
//! sub-voxel averaging, so voxels straddling a boundary take whichever region
//! their center falls in.
use std::path::Path;
use std::time::Instant;

use glam::DVec3;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geometry::SpatialClassifier;
use crate::voxel::raw::PendingFile;
use crate::voxel::{AttenuationLookup, VoxelMap};

/// Scalar written into each voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MapAttribute {
    /// Material density in kg/m³.
    Density,
    /// Linear attenuation in 1/m: density times the material's mass attenuation coefficient.
    Attenuation,
}

impl MapAttribute {
    fn label(self) -> &'static str {
        match self {
            Self::Density => "density",
            Self::Attenuation => "attenuation",
        }
    }
}

/// Grid and attribute selection for a voxel map export.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelMapConfig {
    /// Full physical width of the grid along each axis, in mm.
    pub full_widths: DVec3,
    /// Number of voxels along each axis.
    pub n_voxels: [u16; 3],
    /// World-space center of the grid.
    pub center: DVec3,
    /// Attribute sampled into each voxel.
    pub attribute: MapAttribute,
    /// Worker threads sharing the sweep; `1` sweeps on the calling thread.
    pub threads: usize,
}

impl Default for VoxelMapConfig {
    fn default() -> Self {
        Self {
            full_widths: DVec3::splat(301.0),
            n_voxels: [301, 301, 301],
            center: DVec3::ZERO,
            attribute: MapAttribute::Density,
            threads: 1,
        }
    }
}

impl VoxelMapConfig {
    pub fn new(full_widths: DVec3, n_voxels: [u16; 3]) -> Self {
        Self {
            full_widths,
            n_voxels,
            ..Default::default()
        }
    }

    /// Sets the attribute sampled into each voxel.
    pub fn with_attribute(mut self, attribute: MapAttribute) -> Self {
        self.attribute = attribute;
        self
    }

    /// Sets the grid center in world coordinates.
    pub fn with_center(mut self, center: DVec3) -> Self {
        self.center = center;
        self
    }

    /// Sets the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.full_widths.is_finite() || self.full_widths.min_element() <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "full widths must be finite and > 0, got {}",
                self.full_widths
            )));
        }
        if self.n_voxels.contains(&0) {
            return Err(Error::InvalidArgument(format!(
                "voxel counts must be >= 1, got {:?}",
                self.n_voxels
            )));
        }
        if !self.center.is_finite() {
            return Err(Error::InvalidArgument("grid center must be finite".into()));
        }
        if self.threads == 0 {
            return Err(Error::InvalidConfig("threads must be >= 1".into()));
        }
        Ok(())
    }

    /// Edge length of one voxel along each axis.
    pub fn voxel_size(&self) -> DVec3 {
        self.full_widths / self.counts()
    }

    /// Total number of voxels.
    pub fn voxel_count(&self) -> usize {
        self.n_voxels.iter().map(|n| *n as usize).product()
    }

    /// World-space center of voxel `(i, j, k)`.
    #[inline]
    pub fn voxel_center(&self, i: usize, j: usize, k: usize) -> DVec3 {
        let index = DVec3::new(i as f64, j as f64, k as f64);
        self.center + (index + 0.5) * self.voxel_size() - self.full_widths / 2.0
    }

    fn counts(&self) -> DVec3 {
        let [nx, ny, nz] = self.n_voxels;
        DVec3::new(nx as f64, ny as f64, nz as f64)
    }
}

/// Samples a [`SpatialClassifier`] at every voxel center of a grid.
pub struct VoxelMapExporter<'a> {
    config: VoxelMapConfig,
    classifier: &'a SpatialClassifier,
    attenuation: Option<&'a dyn AttenuationLookup>,
}

impl<'a> VoxelMapExporter<'a> {
    pub fn try_new(config: VoxelMapConfig, classifier: &'a SpatialClassifier) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            classifier,
            attenuation: None,
        })
    }

    /// Supplies the coefficients used by [`MapAttribute::Attenuation`].
    pub fn with_attenuation(mut self, lookup: &'a dyn AttenuationLookup) -> Self {
        self.attenuation = Some(lookup);
        self
    }

    pub fn config(&self) -> &VoxelMapConfig {
        &self.config
    }

    /// Sweeps the grid and returns the filled map.
    pub fn rasterize(&self) -> Result<VoxelMap> {
        if self.config.attribute == MapAttribute::Attenuation && self.attenuation.is_none() {
            return Err(Error::InvalidConfig(
                "attenuation map requires an attenuation lookup".into(),
            ));
        }

        let [nx, ny, nz] = self.config.n_voxels;
        let w = self.config.full_widths.as_vec3();
        let mut map = VoxelMap::new([nx, ny, nz], [w.x, w.y, w.z])?;

        info!(
            "Calculating {} map with {} x {} x {} voxels across {} x {} x {} mm",
            self.config.attribute.label(),
            nx,
            ny,
            nz,
            w.x,
            w.y,
            w.z
        );
        let start = Instant::now();

        let slab = nx as usize * ny as usize;
        let threads = self.config.threads.min(nz as usize);
        if threads <= 1 {
            self.fill_slabs(map.data_mut(), 0)?;
        } else {
            let slabs_per_worker = (nz as usize).div_ceil(threads);
            let chunk_len = slab * slabs_per_worker;
            std::thread::scope(|s| {
                let workers: Vec<_> = map
                    .data_mut()
                    .chunks_mut(chunk_len)
                    .enumerate()
                    .map(|(w, chunk)| s.spawn(move || self.fill_slabs(chunk, w * slabs_per_worker)))
                    .collect();
                workers.into_iter().try_for_each(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
            })?;
        }

        let seconds = start.elapsed().as_secs_f64();
        info!(
            seconds,
            voxels_per_second = map.len() as f64 / seconds.max(f64::MIN_POSITIVE),
            "Voxel map done."
        );
        Ok(map)
    }

    /// Rasterizes and writes the map to `path`.
    ///
    /// The destination is opened before the sweep so an unwritable path fails
    /// fast; nothing is left at `path` unless the whole map was written.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<VoxelMap> {
        let path = path.as_ref();
        let mut pending = PendingFile::create(path)?;
        let map = self.rasterize()?;
        map.write_to(pending.writer())?;
        pending.commit()?;
        info!("Wrote {} map to: {}", self.config.attribute.label(), path.display());
        Ok(map)
    }

    /// Fills consecutive z-slabs starting at slab `k0`.
    fn fill_slabs(&self, out: &mut [f32], k0: usize) -> Result<()> {
        let [nx, ny, _] = self.config.n_voxels.map(usize::from);
        let slab = nx * ny;
        debug!(k0, slabs = out.len() / slab, "Filling voxel slabs.");
        for (dk, plane) in out.chunks_mut(slab).enumerate() {
            let k = k0 + dk;
            for j in 0..ny {
                for i in 0..nx {
                    let p = self.config.voxel_center(i, j, k);
                    plane[i + nx * j] = self.sample(p)?;
                }
            }
        }
        Ok(())
    }

    #[inline]
    fn sample(&self, p: DVec3) -> Result<f32> {
        let Some(hit) = self.classifier.classify(p) else {
            return Ok(0.0);
        };
        let value = match self.config.attribute {
            MapAttribute::Density => hit.density,
            MapAttribute::Attenuation => {
                let lookup = self.attenuation.ok_or_else(|| {
                    Error::InvalidConfig("attenuation map requires an attenuation lookup".into())
                })?;
                let mu = lookup
                    .attenuation_coefficient(hit.material)
                    .ok_or_else(|| Error::UnknownMaterial {
                        name: hit.material.to_owned(),
                    })?;
                mu * hit.density
            }
        };
        Ok(value as f32)
    }
}
