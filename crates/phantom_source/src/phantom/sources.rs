//! Point sources and weighted mixtures of vertex sources.
use glam::DVec3;
use rand::RngCore;

use crate::error::{Error, Result};
use crate::phantom::VertexSource;
use crate::sampling::{uniform_index, WeightedSampler};

/// A fixed set of point-like sources, each chosen with equal probability.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSources {
    points: Vec<DVec3>,
}

impl PointSources {
    pub fn new(points: Vec<DVec3>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::InvalidArgument(
                "point sources need at least one point".into(),
            ));
        }
        if let Some(p) = points.iter().find(|p| !p.is_finite()) {
            return Err(Error::InvalidArgument(format!(
                "point source {p} is not finite"
            )));
        }
        Ok(Self { points })
    }

    /// Six point sources for a spatial-resolution measurement: at 10, 100 and
    /// 200 mm off axis, both at the axial center and 3/8 of the axial field of
    /// view away from it.
    pub fn spatial_resolution(fov_length: f64) -> Result<Self> {
        if !fov_length.is_finite() || fov_length <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "field of view length must be > 0, got {fov_length}"
            )));
        }
        let z_offset = 3.0 / 8.0 * fov_length;
        let points = [0.0, z_offset]
            .into_iter()
            .flat_map(|z| [10.0, 100.0, 200.0].map(|y| DVec3::new(0.0, y, z)))
            .collect();
        Self::new(points)
    }

    pub fn points(&self) -> &[DVec3] {
        &self.points
    }
}

impl VertexSource for PointSources {
    fn generate_vertex(&mut self, rng: &mut dyn RngCore) -> Result<DVec3> {
        Ok(self.points[uniform_index(rng, self.points.len())])
    }
}

/// Weighted mixture of vertex sources: each draw first picks a source, then
/// delegates to it.
pub struct SourceMix {
    sources: Vec<Box<dyn VertexSource>>,
    pick: WeightedSampler,
}

impl SourceMix {
    /// Builds a mixture; weights follow [`WeightedSampler::new`] rules.
    pub fn new(sources: Vec<(Box<dyn VertexSource>, f64)>) -> Result<Self> {
        let weights: Vec<f64> = sources.iter().map(|(_, w)| *w).collect();
        let pick = WeightedSampler::new(&weights)?;
        Ok(Self {
            sources: sources.into_iter().map(|(s, _)| s).collect(),
            pick,
        })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Share of draws that go to source `i`.
    pub fn share_of(&self, i: usize) -> Option<f64> {
        self.pick.probability_of(i)
    }
}

impl VertexSource for SourceMix {
    fn generate_vertex(&mut self, rng: &mut dyn RngCore) -> Result<DVec3> {
        let i = self.pick.sample(rng);
        self.sources[i].generate_vertex(rng)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn point_sources_reject_empty_and_non_finite_input() {
        assert!(PointSources::new(Vec::new()).is_err());
        assert!(PointSources::new(vec![DVec3::new(f64::NAN, 0.0, 0.0)]).is_err());
        assert!(PointSources::spatial_resolution(0.0).is_err());
    }

    #[test]
    fn spatial_resolution_layout_has_six_points() {
        let sources = PointSources::spatial_resolution(800.0).unwrap();
        assert_eq!(sources.points().len(), 6);
        assert!(sources.points().contains(&DVec3::new(0.0, 200.0, 300.0)));
        assert!(sources.points().contains(&DVec3::new(0.0, 10.0, 0.0)));
    }

    #[test]
    fn point_sources_are_visited_evenly() {
        let mut sources = PointSources::new(vec![DVec3::X, DVec3::Y]).unwrap();
        let mut rng = StdRng::seed_from_u64(6);
        let n = 50_000;
        let xs = (0..n)
            .filter(|_| sources.generate_vertex(&mut rng).unwrap() == DVec3::X)
            .count();
        assert!((xs as f64 / n as f64 - 0.5).abs() < 0.01);
    }

    #[test]
    fn mix_follows_source_weights() {
        let a = PointSources::new(vec![DVec3::X]).unwrap();
        let b = PointSources::new(vec![DVec3::Y]).unwrap();
        let mut mix = SourceMix::new(vec![
            (Box::new(a) as Box<dyn VertexSource>, 1.0),
            (Box::new(b) as Box<dyn VertexSource>, 3.0),
        ])
        .unwrap();
        assert_eq!(mix.share_of(1), Some(0.75));

        let mut rng = StdRng::seed_from_u64(12);
        let n = 100_000;
        let ys = (0..n)
            .filter(|_| mix.generate_vertex(&mut rng).unwrap() == DVec3::Y)
            .count();
        assert!((ys as f64 / n as f64 - 0.75).abs() < 0.01);
    }

    #[test]
    fn empty_mix_is_rejected() {
        assert!(matches!(
            SourceMix::new(Vec::new()),
            Err(Error::InvalidArgument(_))
        ));
    }
}
