//! Consumers of generated vertices.
//!
//! A [`VertexSink`] receives each [`PrimaryVertex`] produced by
//! [`crate::phantom::generate_primaries`]; the particle emitter attached to a
//! simulation is one, and the sinks here cover discarding, forwarding, and
//! collecting.
use glam::DVec3;

/// An emission point and time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimaryVertex {
    /// Position in mm.
    pub position: DVec3,
    /// Emission time in ns.
    pub time: f64,
}

impl PrimaryVertex {
    pub fn new(position: DVec3, time: f64) -> Self {
        Self { position, time }
    }

    /// A vertex emitted at time zero.
    pub fn at(position: DVec3) -> Self {
        Self::new(position, 0.0)
    }
}

/// Receives generated vertices.
pub trait VertexSink {
    fn send(&mut self, vertex: PrimaryVertex);
}

/// A no-op sink.
impl VertexSink for () {
    #[inline]
    fn send(&mut self, _vertex: PrimaryVertex) {}
}

/// A sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(PrimaryVertex),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(PrimaryVertex),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> VertexSink for FnSink<F>
where
    F: FnMut(PrimaryVertex),
{
    #[inline]
    fn send(&mut self, vertex: PrimaryVertex) {
        (self.f)(vertex);
    }
}

/// A sink that collects all vertices in a `Vec`.
#[derive(Debug, Default)]
pub struct VecSink {
    vertices: Vec<PrimaryVertex>,
}

impl VecSink {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(cap),
        }
    }

    pub fn into_inner(self) -> Vec<PrimaryVertex> {
        self.vertices
    }

    pub fn as_slice(&self) -> &[PrimaryVertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

impl VertexSink for VecSink {
    #[inline]
    fn send(&mut self, vertex: PrimaryVertex) {
        self.vertices.push(vertex);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_sink_forwards_every_vertex() {
        let mut seen = 0;
        {
            let mut sink = FnSink::new(|v: PrimaryVertex| {
                assert_eq!(v.time, 1.5);
                seen += 1;
            });
            sink.send(PrimaryVertex::new(DVec3::ZERO, 1.5));
            sink.send(PrimaryVertex::new(DVec3::ONE, 1.5));
        }
        assert_eq!(seen, 2);
    }

    #[test]
    fn vec_sink_collects_in_order() {
        let mut sink = VecSink::with_capacity(2);
        sink.send(PrimaryVertex::at(DVec3::X));
        sink.send(PrimaryVertex::at(DVec3::Y));
        let all = sink.into_inner();
        assert_eq!(all[0].position, DVec3::X);
        assert_eq!(all[1].position, DVec3::Y);
    }

    #[test]
    fn unit_sink_discards() {
        <() as VertexSink>::send(&mut (), PrimaryVertex::at(DVec3::Z));
    }
}
