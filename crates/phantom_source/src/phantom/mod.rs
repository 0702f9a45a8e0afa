//! Synthetic source generation for radioactive phantoms.
//!
//! - [`RegionActivityVertexGenerator`] draws vertices distributed by region activity.
//! - [`PointSources`] and [`SourceMix`] cover point-like sources and weighted mixtures.
//! - [`JaszczakPhantom`] builds a complete rod-and-sphere phantom with its generator.
//! - [`Nema7Phantom`] builds the image-quality phantom, sampled region first.
//!
//! Every source implements [`VertexSource`]; [`generate_primaries`] drives a
//! source into a [`VertexSink`], the hand-off point to whatever emits particles
//! from each vertex.
use glam::DVec3;
use rand::RngCore;

use crate::error::Result;

pub mod generator;
pub mod jaszczak;
pub mod nema7;
pub mod profile;
pub mod sink;
pub mod sources;

pub use generator::{GeneratorConfig, RegionActivityVertexGenerator};
pub use jaszczak::JaszczakPhantom;
pub use nema7::{Nema7Phantom, Nema7Region, Nema7Sphere, Nema7VertexSource};
pub use profile::{AcceptanceCounters, ActivityProfile, PrefixCounts};
pub use sink::{FnSink, PrimaryVertex, VecSink, VertexSink};
pub use sources::{PointSources, SourceMix};

/// Anything that produces emission vertices.
pub trait VertexSource: Send {
    fn generate_vertex(&mut self, rng: &mut dyn RngCore) -> Result<DVec3>;
}

impl<S: VertexSource + ?Sized> VertexSource for Box<S> {
    fn generate_vertex(&mut self, rng: &mut dyn RngCore) -> Result<DVec3> {
        (**self).generate_vertex(rng)
    }
}

/// Draws `count` vertices from `source`, emitting each at time zero into `sink`.
///
/// Stops at the first error; vertices already emitted stay emitted.
pub fn generate_primaries(
    source: &mut dyn VertexSource,
    sink: &mut dyn VertexSink,
    count: usize,
    rng: &mut dyn RngCore,
) -> Result<()> {
    for _ in 0..count {
        let position = source.generate_vertex(rng)?;
        sink.send(PrimaryVertex::at(position));
    }
    Ok(())
}
