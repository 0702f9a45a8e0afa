//! Uniform proposal distributions over simple bounding shapes.
use std::f64::consts::{PI, TAU};

use glam::DVec3;
use rand::RngCore;

use crate::error::{Error, Result};
use crate::sampling::{uniform_f64, unit_f64};

/// Draw a point uniformly by area on a disk of the given radius centered at the origin.
///
/// The radial variate goes through a square root; `r = R * u` would crowd
/// samples toward the center.
#[inline]
pub fn sample_disk(radius: f64, rng: &mut dyn RngCore) -> (f64, f64) {
    let u = unit_f64(rng);
    let theta = TAU * unit_f64(rng);
    let r = radius * u.sqrt();
    (r * theta.cos(), r * theta.sin())
}

/// Draw a point uniformly by volume inside a ball of the given radius centered at the origin.
pub fn sample_in_ball(radius: f64, rng: &mut dyn RngCore) -> DVec3 {
    let r = radius * unit_f64(rng).cbrt();
    let cos_theta = uniform_f64(rng, -1.0, 1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = TAU * unit_f64(rng);
    DVec3::new(
        r * sin_theta * phi.cos(),
        r * sin_theta * phi.sin(),
        r * cos_theta,
    )
}

/// Shape enclosing a phantom, used as the proposal distribution of the rejection sampler.
///
/// All shapes are centered on the origin; cylinders run along z.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SamplingBound {
    Cylinder { radius: f64, half_length: f64 },
    Box { half: DVec3 },
    Sphere { radius: f64 },
}

impl SamplingBound {
    pub fn cylinder(radius: f64, half_length: f64) -> Self {
        Self::Cylinder {
            radius,
            half_length,
        }
    }

    pub fn cuboid(half: DVec3) -> Self {
        Self::Box { half }
    }

    pub fn sphere(radius: f64) -> Self {
        Self::Sphere { radius }
    }

    /// Validates that every dimension is finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        let dims: &[f64] = match self {
            Self::Cylinder {
                radius,
                half_length,
            } => &[*radius, *half_length],
            Self::Box { half } => &[half.x, half.y, half.z],
            Self::Sphere { radius } => &[*radius],
        };
        if dims.iter().all(|d| d.is_finite() && *d > 0.0) {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "sampling bound dimensions must be finite and > 0: {self:?}"
            )))
        }
    }

    /// Enclosed volume in cubic length units.
    pub fn volume(&self) -> f64 {
        match *self {
            Self::Cylinder {
                radius,
                half_length,
            } => PI * radius * radius * 2.0 * half_length,
            Self::Box { half } => 8.0 * half.x * half.y * half.z,
            Self::Sphere { radius } => 4.0 / 3.0 * PI * radius.powi(3),
        }
    }

    /// Whether `p` lies inside the bound (surface included).
    pub fn contains(&self, p: DVec3) -> bool {
        match *self {
            Self::Cylinder {
                radius,
                half_length,
            } => p.z.abs() <= half_length && p.x * p.x + p.y * p.y <= radius * radius,
            Self::Box { half } => p.abs().cmple(half).all(),
            Self::Sphere { radius } => p.length_squared() <= radius * radius,
        }
    }

    /// Draws a point uniformly by volume inside the bound.
    pub fn sample(&self, rng: &mut dyn RngCore) -> DVec3 {
        match *self {
            Self::Cylinder {
                radius,
                half_length,
            } => {
                let z = uniform_f64(rng, -half_length, half_length);
                let (x, y) = sample_disk(radius, rng);
                DVec3::new(x, y, z)
            }
            Self::Box { half } => DVec3::new(
                uniform_f64(rng, -half.x, half.x),
                uniform_f64(rng, -half.y, half.y),
                uniform_f64(rng, -half.z, half.z),
            ),
            Self::Sphere { radius } => sample_in_ball(radius, rng),
        }
    }
}
