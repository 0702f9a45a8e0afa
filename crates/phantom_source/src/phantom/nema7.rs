//! NEMA NU-2 section 7 image-quality phantom.
//!
//! A background cylinder holding a central lung insert and a ring of spheres
//! of individually chosen size and activity. Unlike the rejection generator,
//! vertices are drawn region first: a region is picked with probability
//! proportional to activity times volume, then a point is drawn uniformly
//! inside it.
use std::f64::consts::{PI, TAU};

use glam::DVec3;
use rand::RngCore;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geometry::material::Material;
use crate::geometry::volume::{Solid, VolumeTree};
use crate::geometry::SpatialClassifier;
use crate::phantom::{GeneratorConfig, VertexSource};
use crate::sampling::{sample_in_ball, SamplingBound, WeightedSampler};

pub const BODY: &str = "Body";
pub const LUNG: &str = "Lung";
pub const SPHERE_PREFIX: &str = "Sphere";
const WORLD: &str = "World";

/// One sphere of the ring.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nema7Sphere {
    pub radius: f64,
    /// Activity per unit volume, relative to the other regions.
    pub activity: f64,
}

/// Region of the phantom a point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nema7Region {
    Sphere(usize),
    Lung,
    Body,
}

/// Phantom dimensions (mm) and activities.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nema7Phantom {
    /// Spheres in placement order around the ring.
    pub spheres: Vec<Nema7Sphere>,
    /// Radius of the inactive central lung insert, if any.
    pub lung_radius: Option<f64>,
    /// Background activity of the body.
    pub activity: f64,
    /// Radius of the ring of sphere centers.
    pub inner_radius: f64,
    /// Radius of the body cylinder.
    pub outer_radius: f64,
    pub half_length: f64,
}

impl Default for Nema7Phantom {
    fn default() -> Self {
        Self {
            spheres: Vec::new(),
            lung_radius: None,
            activity: 1.0,
            inner_radius: 114.4,
            outer_radius: 152.0,
            half_length: 70.0,
        }
    }
}

impl Nema7Phantom {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard arrangement: six spheres of 10 to 37 mm diameter, the
    /// four smallest hot at 4:1 against the background, the two largest cold,
    /// around a 51 mm lung insert.
    pub fn standard() -> Self {
        [10.0, 13.0, 17.0, 22.0, 28.0, 37.0]
            .into_iter()
            .zip([4.0, 4.0, 4.0, 4.0, 0.0, 0.0])
            .fold(Self::default(), |phantom, (d, a)| {
                phantom.with_sphere_diameter(d, a)
            })
            .with_lung_diameter(51.0)
    }

    /// Appends a sphere to the ring.
    pub fn with_sphere(mut self, radius: f64, activity: f64) -> Self {
        self.spheres.push(Nema7Sphere { radius, activity });
        self
    }

    pub fn with_sphere_diameter(self, diameter: f64, activity: f64) -> Self {
        self.with_sphere(diameter / 2.0, activity)
    }

    pub fn with_lung(mut self, radius: f64) -> Self {
        self.lung_radius = Some(radius);
        self
    }

    pub fn with_lung_diameter(self, diameter: f64) -> Self {
        self.with_lung(diameter / 2.0)
    }

    /// Sets the background activity of the body.
    pub fn with_activity(mut self, activity: f64) -> Self {
        self.activity = activity;
        self
    }

    pub fn with_inner_radius(mut self, r: f64) -> Self {
        self.inner_radius = r;
        self
    }

    pub fn with_outer_radius(mut self, r: f64) -> Self {
        self.outer_radius = r;
        self
    }

    /// Sets the full axial length of the body.
    pub fn with_length(mut self, length: f64) -> Self {
        self.half_length = length / 2.0;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (what, v) in [
            ("inner_radius", self.inner_radius),
            ("outer_radius", self.outer_radius),
            ("half_length", self.half_length),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(Error::InvalidConfig(format!("{what} must be > 0, got {v}")));
            }
        }
        if !self.activity.is_finite() || self.activity < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "background activity must be finite and >= 0, got {}",
                self.activity
            )));
        }
        if let Some(lung) = self.lung_radius {
            if !lung.is_finite() || lung <= 0.0 || lung >= self.outer_radius {
                return Err(Error::InvalidConfig(format!(
                    "lung radius {lung} must lie in (0, {})",
                    self.outer_radius
                )));
            }
        }

        let lung = self.lung_radius.unwrap_or(0.0);
        for (n, s) in self.spheres.iter().enumerate() {
            if !s.radius.is_finite() || s.radius <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "sphere {n} radius must be > 0, got {}",
                    s.radius
                )));
            }
            if !s.activity.is_finite() || s.activity < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "sphere {n} activity must be finite and >= 0, got {}",
                    s.activity
                )));
            }
            if self.inner_radius + s.radius > self.outer_radius || s.radius > self.half_length {
                return Err(Error::InvalidConfig(format!(
                    "sphere {n} of radius {} does not fit inside the body",
                    s.radius
                )));
            }
            if self.inner_radius - s.radius < lung {
                return Err(Error::InvalidConfig(format!(
                    "sphere {n} of radius {} cuts into the lung insert",
                    s.radius
                )));
            }
            for (m, other) in self.spheres.iter().enumerate().skip(n + 1) {
                let gap = self.sphere_position(n).distance(self.sphere_position(m));
                if gap < s.radius + other.radius {
                    return Err(Error::InvalidConfig(format!(
                        "spheres {n} and {m} overlap"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Center of sphere `n`: `n` equal steps around the ring, starting on +y.
    pub fn sphere_position(&self, n: usize) -> DVec3 {
        let count = self.spheres.len().max(1) as f64;
        let angle = n as f64 * TAU / count;
        DVec3::new(
            self.inner_radius * angle.sin(),
            self.inner_radius * angle.cos(),
            0.0,
        )
    }

    /// Region containing `p`, or `None` outside the body. Surfaces count as
    /// inside, spheres before the lung before the body.
    pub fn in_which_region(&self, p: DVec3) -> Option<Nema7Region> {
        let r2 = p.x * p.x + p.y * p.y;
        if p.z.abs() > self.half_length || r2 > self.outer_radius * self.outer_radius {
            return None;
        }
        if let Some(n) = self
            .spheres
            .iter()
            .enumerate()
            .position(|(n, s)| p.distance_squared(self.sphere_position(n)) <= s.radius * s.radius)
        {
            return Some(Nema7Region::Sphere(n));
        }
        match self.lung_radius {
            Some(lung) if r2 <= lung * lung => Some(Nema7Region::Lung),
            _ => Some(Nema7Region::Body),
        }
    }

    /// Volume of a region, with the inserts subtracted from the body.
    pub fn region_volume(&self, region: Nema7Region) -> f64 {
        let cylinder = |r: f64| PI * r * r * 2.0 * self.half_length;
        let ball = |r: f64| 4.0 / 3.0 * PI * r.powi(3);
        match region {
            Nema7Region::Sphere(n) => self.spheres.get(n).map_or(0.0, |s| ball(s.radius)),
            Nema7Region::Lung => self.lung_radius.map_or(0.0, cylinder),
            Nema7Region::Body => {
                cylinder(self.outer_radius)
                    - self.lung_radius.map_or(0.0, cylinder)
                    - self.spheres.iter().map(|s| ball(s.radius)).sum::<f64>()
            }
        }
    }

    /// Activity per unit volume of a region; the lung is inactive.
    pub fn region_activity(&self, region: Nema7Region) -> f64 {
        match region {
            Nema7Region::Sphere(n) => self.spheres.get(n).map_or(0.0, |s| s.activity),
            Nema7Region::Lung => 0.0,
            Nema7Region::Body => self.activity,
        }
    }

    /// Every region, spheres first.
    pub fn regions(&self) -> impl Iterator<Item = Nema7Region> + '_ {
        (0..self.spheres.len())
            .map(Nema7Region::Sphere)
            .chain(self.lung_radius.map(|_| Nema7Region::Lung))
            .chain(std::iter::once(Nema7Region::Body))
    }

    /// Builds and closes the phantom geometry.
    ///
    /// Spheres are named `Sphere_{n}`, the insert `Lung`, the cylinder `Body`.
    pub fn geometry(&self) -> Result<VolumeTree> {
        self.validate()?;

        let world_half = DVec3::new(self.outer_radius, self.outer_radius, self.half_length) * 1.1;
        let mut tree = VolumeTree::new(WORLD, Solid::cuboid(world_half), Material::air());
        let body = tree.place(
            BODY,
            Solid::cylinder(self.outer_radius, self.half_length),
            Material::water(),
            tree.world(),
        )?;
        if let Some(lung) = self.lung_radius {
            tree.place(
                LUNG,
                Solid::cylinder(lung, self.half_length),
                Material::lung(),
                body,
            )?;
        }
        for (n, s) in self.spheres.iter().enumerate() {
            tree.place_at(
                format!("{SPHERE_PREFIX}_{n}"),
                Solid::orb(s.radius),
                Material::water(),
                body,
                self.sphere_position(n),
            )?;
        }
        tree.close()?;
        Ok(tree)
    }

    pub fn classifier(&self) -> Result<SpatialClassifier> {
        SpatialClassifier::from_provider(self.geometry()?)
    }

    /// A region-first vertex source for this phantom.
    pub fn vertex_source(&self) -> Result<Nema7VertexSource> {
        Nema7VertexSource::try_new(self.clone())
    }
}

/// Draws vertices by picking a region by activity times volume, then a
/// uniform point inside it.
#[derive(Debug, Clone)]
pub struct Nema7VertexSource {
    phantom: Nema7Phantom,
    regions: Vec<Nema7Region>,
    pick: WeightedSampler,
    body_bound: SamplingBound,
    config: GeneratorConfig,
}

impl Nema7VertexSource {
    /// Fails with [`Error::InvalidConfig`] when the phantom is invalid or no
    /// region carries any activity.
    pub fn try_new(phantom: Nema7Phantom) -> Result<Self> {
        phantom.validate()?;
        // Inactive regions are left out of the table entirely.
        let (regions, weights): (Vec<_>, Vec<_>) = phantom
            .regions()
            .map(|r| (r, phantom.region_activity(r) * phantom.region_volume(r)))
            .filter(|(_, w)| *w > 0.0)
            .unzip();
        if regions.is_empty() {
            return Err(Error::InvalidConfig(
                "no region of the phantom is active".into(),
            ));
        }
        let pick = WeightedSampler::new(&weights)?;
        debug!(regions = regions.len(), "Region table built.");

        let body_bound = SamplingBound::cylinder(phantom.outer_radius, phantom.half_length);
        Ok(Self {
            phantom,
            regions,
            pick,
            body_bound,
            config: GeneratorConfig::default(),
        })
    }

    /// Replaces the cap on body proposals per vertex.
    pub fn with_config(mut self, config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn phantom(&self) -> &Nema7Phantom {
        &self.phantom
    }

    /// Share of vertices each active region receives.
    pub fn region_shares(&self) -> impl Iterator<Item = (Nema7Region, f64)> + '_ {
        self.regions
            .iter()
            .enumerate()
            .filter_map(|(i, r)| self.pick.probability_of(i).map(|p| (*r, p)))
    }

    /// Draws one vertex.
    pub fn generate(&mut self, rng: &mut dyn RngCore) -> Result<DVec3> {
        match self.regions[self.pick.sample(rng)] {
            Nema7Region::Sphere(n) => {
                let radius = self.phantom.spheres[n].radius;
                Ok(self.phantom.sphere_position(n) + sample_in_ball(radius, rng))
            }
            Nema7Region::Lung => {
                let lung = self.phantom.lung_radius.unwrap_or(0.0);
                Ok(SamplingBound::cylinder(lung, self.phantom.half_length).sample(rng))
            }
            Nema7Region::Body => self.generate_in_body(rng),
        }
    }

    fn generate_in_body(&self, rng: &mut dyn RngCore) -> Result<DVec3> {
        for _ in 0..self.config.max_attempts {
            let p = self.body_bound.sample(rng);
            if self.phantom.in_which_region(p) == Some(Nema7Region::Body) {
                return Ok(p);
            }
        }
        warn!(
            attempts = self.config.max_attempts,
            "No body point found outside the inserts."
        );
        Err(Error::NoAcceptableRegion {
            attempts: self.config.max_attempts,
        })
    }
}

impl VertexSource for Nema7VertexSource {
    fn generate_vertex(&mut self, rng: &mut dyn RngCore) -> Result<DVec3> {
        self.generate(rng)
    }
}
