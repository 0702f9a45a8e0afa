//! Activity-weighted emission vertices by rejection sampling.
//!
//! Proposals are drawn uniformly from a [`SamplingBound`] enclosing the phantom,
//! classified into a region, and accepted with probability equal to the
//! activity of the region's family. Accepted points are therefore distributed
//! in proportion to activity times volume.
use glam::DVec3;
use rand::RngCore;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geometry::SpatialClassifier;
use crate::phantom::{AcceptanceCounters, ActivityProfile, VertexSource};
use crate::sampling::{unit_f64, SamplingBound};

const MAX_ACTIVITY_TOLERANCE: f64 = 1e-9;

/// Rejection-loop limits.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratorConfig {
    /// Proposals drawn for a single vertex before giving up.
    pub max_attempts: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1_000_000,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the proposal cap per vertex.
    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfig("max_attempts must be >= 1".into()));
        }
        Ok(())
    }
}

/// Draws emission points matching a per-family relative activity profile.
#[derive(Debug, Clone)]
pub struct RegionActivityVertexGenerator {
    bound: SamplingBound,
    profile: ActivityProfile,
    classifier: SpatialClassifier,
    config: GeneratorConfig,
    counters: AcceptanceCounters,
}

impl RegionActivityVertexGenerator {
    /// Creates a generator over `classifier`, proposing points inside `bound`.
    ///
    /// `profile` must already be normalized: every activity in `[0, 1]` with a
    /// maximum of 1. Activities above 1 are rejected; a maximum below 1 is
    /// legal but wastes proposals and is logged.
    pub fn try_new(
        bound: SamplingBound,
        profile: ActivityProfile,
        classifier: SpatialClassifier,
    ) -> Result<Self> {
        bound.validate()?;
        profile.validate()?;
        if let Some((prefix, activity)) = profile.iter().find(|(_, a)| *a > 1.0) {
            return Err(Error::InvalidConfig(format!(
                "activity of '{prefix}' is {activity}; normalize the profile so its maximum is 1"
            )));
        }
        let max = profile.max_activity();
        if (max - 1.0).abs() > MAX_ACTIVITY_TOLERANCE {
            warn!(
                max_activity = max,
                "Activity profile maximum is not 1; acceptance will be lower than necessary."
            );
        }

        let counters = AcceptanceCounters::for_profile(&profile);
        Ok(Self {
            bound,
            profile,
            classifier,
            config: GeneratorConfig::default(),
            counters,
        })
    }

    /// Replaces the rejection-loop limits.
    pub fn with_config(mut self, config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn bound(&self) -> &SamplingBound {
        &self.bound
    }

    pub fn profile(&self) -> &ActivityProfile {
        &self.profile
    }

    pub fn classifier(&self) -> &SpatialClassifier {
        &self.classifier
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn counters(&self) -> &AcceptanceCounters {
        &self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters.reset();
    }

    /// Draws one accepted vertex.
    ///
    /// Fails with [`Error::UnrecognizedRegion`] when a proposal lands in a region
    /// no prefix covers, [`Error::OutsideGeometry`] when it misses the geometry
    /// altogether, and [`Error::NoAcceptableRegion`] once `max_attempts`
    /// proposals have all been rejected.
    pub fn generate(&mut self, rng: &mut dyn RngCore) -> Result<DVec3> {
        for _ in 0..self.config.max_attempts {
            let p = self.bound.sample(rng);
            let hit = self
                .classifier
                .classify(p)
                .ok_or(Error::OutsideGeometry {
                    x: p.x,
                    y: p.y,
                    z: p.z,
                })?;
            let family = self.profile.match_prefix(hit.name).ok_or_else(|| {
                Error::UnrecognizedRegion {
                    name: hit.name.to_owned(),
                }
            })?;

            if unit_f64(rng) < self.profile.activity_at(family) {
                self.counters.keep(family);
                return Ok(p);
            }
            self.counters.reject(family);
        }

        warn!(
            attempts = self.config.max_attempts,
            "No acceptable region sampled; is every reachable activity zero?"
        );
        Err(Error::NoAcceptableRegion {
            attempts: self.config.max_attempts,
        })
    }

    /// Logs the per-family counters at debug level.
    pub fn log_counters(&self) {
        for (prefix, counts) in self.counters.iter() {
            debug!(prefix, kept = counts.kept, rejected = counts.rejected, "Region acceptance.");
        }
        if let Some(ratio) = self.counters.acceptance_ratio() {
            debug!(ratio, "Overall acceptance.");
        }
    }
}

impl VertexSource for RegionActivityVertexGenerator {
    fn generate_vertex(&mut self, rng: &mut dyn RngCore) -> Result<DVec3> {
        self.generate(rng)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::test_fixtures::small_phantom;

    fn generator(profile: ActivityProfile) -> RegionActivityVertexGenerator {
        let (classifier, bound) = small_phantom();
        RegionActivityVertexGenerator::try_new(bound, profile, classifier).unwrap()
    }

    #[test]
    fn body_only_profile_never_emits_from_inserts() {
        let mut generator = generator(ActivityProfile::from_pairs([
            ("Body", 1.0),
            ("Rod", 0.0),
            ("Sphere", 0.0),
        ]));
        let mut rng = StdRng::seed_from_u64(31);
        for _ in 0..5_000 {
            let v = generator.generate(&mut rng).unwrap();
            let hit = generator.classifier().classify(v).unwrap();
            assert!(hit.name.starts_with("Body"), "vertex landed in {}", hit.name);
        }
        assert_eq!(generator.counters().get("Rod").unwrap().kept, 0);
        assert_eq!(generator.counters().get("Sphere").unwrap().kept, 0);
        assert_eq!(generator.counters().get("Body").unwrap().kept, 5_000);
    }

    #[test]
    fn accepted_counts_follow_activity_times_volume() {
        let mut generator = generator(ActivityProfile::from_pairs([
            ("Body", 0.0),
            ("Rod", 1.0),
            ("Sphere", 0.5),
        ]));
        let mut rng = StdRng::seed_from_u64(4242);
        for _ in 0..20_000 {
            generator.generate(&mut rng).unwrap();
        }
        let sphere = generator.counters().get("Sphere").unwrap().kept as f64;
        let rod = generator.counters().get("Rod").unwrap().kept as f64;

        let sphere_volume = 4.0 / 3.0 * PI * 10.0f64.powi(3);
        let rod_volume = PI * 5.0f64.powi(2) * 40.0;
        let expected = 0.5 * sphere_volume / (1.0 * rod_volume);
        let observed = sphere / rod;
        assert!(
            (observed / expected - 1.0).abs() < 0.06,
            "sphere/rod = {observed}, expected {expected}"
        );
    }

    #[test]
    fn rejection_keeps_unit_activity_proposals() {
        let mut generator = generator(ActivityProfile::from_pairs([
            ("Body", 1.0),
            ("Rod", 1.0),
            ("Sphere", 1.0),
        ]));
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..1_000 {
            generator.generate(&mut rng).unwrap();
        }
        assert_eq!(generator.counters().total_rejected(), 0);
        assert_eq!(generator.counters().acceptance_ratio(), Some(1.0));
    }

    // Added guard: a plain rejection loop never terminates on an all-zero
    // profile. The attempt cap is new behaviour that turns that hang into an error.
    #[test]
    fn added_attempt_cap_stops_all_zero_profile_instead_of_hanging() {
        let mut generator = generator(ActivityProfile::from_pairs([
            ("Body", 0.0),
            ("Rod", 0.0),
            ("Sphere", 0.0),
        ]))
        .with_config(GeneratorConfig::new().with_max_attempts(1_000))
        .unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let err = generator.generate(&mut rng).unwrap_err();
        assert!(matches!(err, Error::NoAcceptableRegion { attempts: 1_000 }));
        assert_eq!(generator.counters().total_rejected(), 1_000);
    }

    #[test]
    fn unlisted_family_is_a_configuration_error() {
        let mut generator =
            generator(ActivityProfile::from_pairs([("Body", 0.0), ("Sphere", 1.0)]));
        let mut rng = StdRng::seed_from_u64(17);
        let err = (0..500)
            .find_map(|_| generator.generate(&mut rng).err())
            .expect("a proposal should eventually land in a rod");
        assert!(matches!(err, Error::UnrecognizedRegion { ref name } if name.starts_with("Rod")));
    }

    #[test]
    fn unnormalized_profiles_and_bad_bounds_are_rejected() {
        let (classifier, bound) = small_phantom();
        let profile = ActivityProfile::from_pairs([("Body", 2.0), ("Rod", 1.0), ("Sphere", 0.0)]);
        assert!(matches!(
            RegionActivityVertexGenerator::try_new(bound, profile.clone(), classifier.clone()),
            Err(Error::InvalidConfig(_))
        ));
        assert!(RegionActivityVertexGenerator::try_new(
            SamplingBound::cylinder(-1.0, 1.0),
            profile.normalized().unwrap(),
            classifier,
        )
        .is_err());
    }

    #[test]
    fn bound_larger_than_world_reports_outside_points() {
        let (classifier, _) = small_phantom();
        let profile = ActivityProfile::from_pairs([("Body", 1.0), ("Rod", 1.0), ("Sphere", 1.0)]);
        let mut generator = RegionActivityVertexGenerator::try_new(
            SamplingBound::sphere(1_000.0),
            profile,
            classifier,
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let err = (0..100)
            .find_map(|_| generator.generate(&mut rng).err())
            .expect("a proposal should miss the world");
        assert!(matches!(err, Error::OutsideGeometry { .. }));
    }

    #[test]
    fn seeded_generators_are_reproducible() {
        let profile = ActivityProfile::from_pairs([("Body", 0.2), ("Rod", 1.0), ("Sphere", 0.7)]);
        let mut a = generator(profile.clone());
        let mut b = generator(profile);
        let mut rng_a = StdRng::seed_from_u64(123);
        let mut rng_b = StdRng::seed_from_u64(123);
        for _ in 0..100 {
            assert_eq!(
                a.generate(&mut rng_a).unwrap(),
                b.generate(&mut rng_b).unwrap()
            );
        }
        assert_eq!(a.counters(), b.counters());
    }
}
