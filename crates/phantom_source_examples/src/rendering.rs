use std::path::Path;

use anyhow::{bail, Context};
use glam::DVec3;
use image::{GrayImage, Luma, Rgb, RgbImage};
use phantom_source::prelude::{PrimaryVertex, VoxelMap};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Writes z-slice `k` of `map` as a grayscale PNG, one pixel per voxel.
///
/// Values are scaled linearly by the slice maximum, or logarithmically when
/// `log_scale` is set (useful for maps spanning vacuum to steel). Image rows
/// run from +y at the top to -y at the bottom.
pub fn render_map_slice_to_png(
    map: &VoxelMap,
    k: usize,
    log_scale: bool,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let [nx, ny, nz] = map.n_voxels();
    let Some(slice) = map.slice_z(k) else {
        bail!("slice {k} out of range (map has {nz} slices)");
    };

    let scale = |v: f32| -> f64 {
        let v = f64::from(v.max(0.0));
        if log_scale {
            v.ln_1p()
        } else {
            v
        }
    };
    let max = slice.iter().copied().map(scale).fold(0.0, f64::max);

    let nx = u32::from(nx);
    let ny = u32::from(ny);
    let img = GrayImage::from_fn(nx, ny, |x, y| {
        let v = slice[(x + nx * (ny - 1 - y)) as usize];
        let level = if max > 0.0 { scale(v) / max } else { 0.0 };
        Luma([(level * 255.0).round() as u8])
    });
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), slice = k, "Map slice written.");
    Ok(())
}

/// Plane onto which vertices are projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Xy,
    Xz,
    Yz,
}

impl Projection {
    fn project(self, p: DVec3) -> (f64, f64) {
        match self {
            Projection::Xy => (p.x, p.y),
            Projection::Xz => (p.x, p.z),
            Projection::Yz => (p.y, p.z),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    pub image_size: (u32, u32),
    /// Half width of the square window, centered on the origin, in mm.
    pub half_extent: f64,
    pub projection: Projection,
    pub background: [u8; 3],
    pub color: [u8; 3],
}

impl ProjectionConfig {
    pub fn new(image_size: (u32, u32), half_extent: f64) -> Self {
        Self {
            image_size,
            half_extent,
            projection: Projection::Xy,
            background: [16, 16, 16],
            color: [255, 200, 64],
        }
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_background(mut self, background: [u8; 3]) -> Self {
        self.background = background;
        self
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }
}

/// Histograms `vertices` onto a plane and writes the hit density as a PNG.
pub fn render_vertices_to_png(
    vertices: &[PrimaryVertex],
    config: &ProjectionConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let (w, h) = config.image_size;
    if w == 0 || h == 0 || config.half_extent <= 0.0 {
        bail!("empty projection window");
    }

    let mut counts = vec![0u32; (w * h) as usize];
    let span = 2.0 * config.half_extent;
    for vertex in vertices {
        let (u, v) = config.projection.project(vertex.position);
        let px = ((u + config.half_extent) / span * f64::from(w)).floor();
        let py = ((config.half_extent - v) / span * f64::from(h)).floor();
        if px < 0.0 || py < 0.0 || px >= f64::from(w) || py >= f64::from(h) {
            continue;
        }
        counts[py as usize * w as usize + px as usize] += 1;
    }

    let max = counts.iter().copied().max().unwrap_or(0).max(1) as f64;
    let [br, bg, bb] = config.background.map(f64::from);
    let [cr, cg, cb] = config.color.map(f64::from);
    let img = RgbImage::from_fn(w, h, |x, y| {
        let t = (f64::from(counts[(y * w + x) as usize]) / max).sqrt();
        let mix = |b: f64, c: f64| (b + (c - b) * t).round() as u8;
        Rgb([mix(br, cr), mix(bg, cg), mix(bb, cb)])
    });
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), vertices = vertices.len(), "Vertex projection written.");
    Ok(())
}
