//! Random-variate primitives shared by the samplers and generators.
//!
//! This module provides the uniform draws everything else is built from, the
//! alias-method [`WeightedSampler`], and the bounding-shape samplers used as
//! proposal distributions for rejection sampling.
use rand::RngCore;

pub mod alias;
pub mod shapes;

pub use alias::WeightedSampler;
pub use shapes::{sample_disk, sample_in_ball, SamplingBound};

const F64_UNIT: f64 = 1.0 / (1u64 << 53) as f64;

/// Generate a random float in the half-open range [0, 1) with 53 bits of precision.
#[inline]
pub fn unit_f64(rng: &mut dyn RngCore) -> f64 {
    (rng.next_u64() >> 11) as f64 * F64_UNIT
}

/// Generate a random float in the half-open range [lo, hi).
#[inline]
pub fn uniform_f64(rng: &mut dyn RngCore, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * unit_f64(rng)
}

/// Generate a random index in `[0, n)`.
///
/// Uses a widening multiply of a 64-bit draw; the bias is below `n / 2^64`.
#[inline]
pub fn uniform_index(rng: &mut dyn RngCore, n: usize) -> usize {
    debug_assert!(n > 0, "uniform_index requires n > 0");
    ((rng.next_u64() as u128 * n as u128) >> 64) as usize
}
