//! Jaszczak-style resolution phantom.
//!
//! A water cylinder holding six spheres of increasing size on a ring in its
//! upper part and six sectors of hex-packed rods in its lower part. Rod
//! sectors are separated by corridors of constant width; each sector packs
//! rods of one diameter as densely as the body radius allows.
use std::f64::consts::{PI, TAU};

use glam::{DVec2, DVec3};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::material::Material;
use crate::geometry::volume::{Solid, VolumeTree};
use crate::geometry::SpatialClassifier;
use crate::phantom::{ActivityProfile, RegionActivityVertexGenerator};
use crate::sampling::SamplingBound;

pub const BODY: &str = "Body";
pub const SPHERE_PREFIX: &str = "Sphere";
pub const ROD_PREFIX: &str = "Rod";
const WORLD: &str = "World";

/// Hexagonal lattice basis, in units of the rod diameter.
const LATTICE_A: DVec2 = DVec2::new(2.0, 0.0);
const LATTICE_B: DVec2 = DVec2::new(1.0, 1.732_050_807_568_877_2);

/// Phantom dimensions (mm) and relative activities.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JaszczakPhantom {
    pub body_height: f64,
    pub body_radius: f64,
    pub sphere_radii: [f64; 6],
    pub rod_radii: [f64; 6],
    pub rod_height: f64,
    /// Height of the sphere centers above the bottom of the body.
    pub sphere_height: f64,
    /// Width of the corridors between rod sectors.
    pub gap: f64,
    /// Minimum clearance between a rod and the body wall.
    pub margin: f64,
    pub body_activity: f64,
    pub sphere_activity: f64,
    pub rod_activity: f64,
    /// Surround the body with vacuum instead of air.
    pub evacuated: bool,
}

impl Default for JaszczakPhantom {
    fn default() -> Self {
        Self {
            body_height: 186.0,
            body_radius: 216.0 / 2.0,
            sphere_radii: [9.5, 12.7, 15.9, 19.1, 25.4, 31.8].map(|d| d / 2.0),
            rod_radii: [3.2, 4.8, 6.4, 7.9, 9.5, 11.1].map(|d| d / 2.0),
            rod_height: 88.0,
            sphere_height: 127.0,
            gap: 14.4,
            margin: 0.1,
            body_activity: 0.0,
            sphere_activity: 1.0,
            rod_activity: 2.0,
            evacuated: false,
        }
    }
}

impl JaszczakPhantom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body_height(mut self, h: f64) -> Self {
        self.body_height = h;
        self
    }

    pub fn with_body_radius(mut self, r: f64) -> Self {
        self.body_radius = r;
        self
    }

    pub fn with_body_diameter(self, d: f64) -> Self {
        self.with_body_radius(d / 2.0)
    }

    pub fn with_sphere_radii(mut self, radii: [f64; 6]) -> Self {
        self.sphere_radii = radii;
        self
    }

    pub fn with_sphere_diameters(self, diameters: [f64; 6]) -> Self {
        self.with_sphere_radii(diameters.map(|d| d / 2.0))
    }

    pub fn with_rod_radii(mut self, radii: [f64; 6]) -> Self {
        self.rod_radii = radii;
        self
    }

    pub fn with_rod_diameters(self, diameters: [f64; 6]) -> Self {
        self.with_rod_radii(diameters.map(|d| d / 2.0))
    }

    pub fn with_rod_height(mut self, h: f64) -> Self {
        self.rod_height = h;
        self
    }

    pub fn with_sphere_height(mut self, h: f64) -> Self {
        self.sphere_height = h;
        self
    }

    pub fn with_body_activity(mut self, a: f64) -> Self {
        self.body_activity = a;
        self
    }

    pub fn with_sphere_activity(mut self, a: f64) -> Self {
        self.sphere_activity = a;
        self
    }

    pub fn with_rod_activity(mut self, a: f64) -> Self {
        self.rod_activity = a;
        self
    }

    pub fn with_evacuated(mut self, evacuated: bool) -> Self {
        self.evacuated = evacuated;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let lengths = [
            ("body_height", self.body_height),
            ("body_radius", self.body_radius),
            ("rod_height", self.rod_height),
            ("sphere_height", self.sphere_height),
        ];
        for (what, v) in lengths {
            if !v.is_finite() || v <= 0.0 {
                return Err(Error::InvalidConfig(format!("{what} must be > 0, got {v}")));
            }
        }
        for (what, v) in [("gap", self.gap), ("margin", self.margin)] {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::InvalidConfig(format!("{what} must be >= 0, got {v}")));
            }
        }
        for r in self.sphere_radii.iter().chain(&self.rod_radii) {
            if !r.is_finite() || *r <= 0.0 {
                return Err(Error::InvalidConfig(format!("radii must be > 0, got {r}")));
            }
        }
        if self.rod_height > self.body_height {
            return Err(Error::InvalidConfig(format!(
                "rods ({}) are taller than the body ({})",
                self.rod_height, self.body_height
            )));
        }

        let ring = self.sphere_ring_radius();
        let half = self.body_height / 2.0;
        let rod_top = -half + self.rod_height;
        let z = self.sphere_z();
        for r in self.sphere_radii {
            if ring + r > self.body_radius || z + r > half {
                return Err(Error::InvalidConfig(format!(
                    "sphere of radius {r} does not fit inside the body"
                )));
            }
            if z - r < rod_top {
                return Err(Error::InvalidConfig(format!(
                    "sphere of radius {r} reaches down into the rods"
                )));
            }
        }

        for (a, b) in [
            ("body", self.body_activity),
            ("sphere", self.sphere_activity),
            ("rod", self.rod_activity),
        ] {
            if !b.is_finite() || b < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{a} activity must be finite and >= 0, got {b}"
                )));
            }
        }
        Ok(())
    }

    fn sphere_ring_radius(&self) -> f64 {
        self.body_radius / 2.0
    }

    fn sphere_z(&self) -> f64 {
        -self.body_height / 2.0 + self.sphere_height
    }

    fn rod_z(&self) -> f64 {
        (-self.body_height + self.rod_height) / 2.0
    }

    /// Sphere centers, in body coordinates. Sphere `n` sits at `n` sixths of a
    /// turn around the ring.
    pub fn sphere_centers(&self) -> [DVec3; 6] {
        let ring = self.sphere_ring_radius();
        let z = self.sphere_z();
        std::array::from_fn(|n| {
            let angle = n as f64 * TAU / 6.0;
            DVec3::new(ring * angle.cos(), ring * angle.sin(), z)
        })
    }

    /// Axis positions (x, y) of the rods in sector `sector`, which holds rods
    /// of radius `rod_radii[5 - sector]` rotated `sector` sixths of a turn.
    pub fn rod_sector(&self, sector: usize) -> Vec<DVec2> {
        let r = self.rod_radii[5 - sector % 6];
        let d = 2.0 * r;
        let origin = DVec2::new(
            self.gap * (PI / 6.0).cos() + r * 3f64.sqrt(),
            self.gap * (PI / 6.0).sin() + r,
        );
        let rotation = DVec2::from_angle(sector as f64 * TAU / 6.0);
        let mut axes = Vec::new();

        for a in 0.. {
            let before = axes.len();
            for b in 0.. {
                let p = (LATTICE_A * a as f64 + LATTICE_B * b as f64) * d + origin;
                if p.length() + r + self.margin >= self.body_radius {
                    break;
                }
                axes.push(rotation.rotate(p));
            }
            if axes.len() == before {
                break;
            }
        }
        axes
    }

    /// Builds and closes the phantom geometry.
    ///
    /// Spheres are named `Sphere_{n}`, rods `Rod_{sector}_{n}`, the body `Body`.
    pub fn geometry(&self) -> Result<VolumeTree> {
        self.validate()?;

        let half = self.body_height / 2.0;
        let world_half = DVec3::new(self.body_radius, self.body_radius, half) * 1.1;
        let world_material = if self.evacuated {
            Material::galactic()
        } else {
            Material::air()
        };
        let mut tree = VolumeTree::new(WORLD, Solid::cuboid(world_half), world_material);
        let body = tree.place(
            BODY,
            Solid::cylinder(self.body_radius, half),
            Material::water(),
            tree.world(),
        )?;

        let spheres = self.sphere_centers().into_iter().zip(self.sphere_radii);
        for (n, (center, r)) in spheres.enumerate() {
            tree.place_at(
                format!("{SPHERE_PREFIX}_{n}"),
                Solid::orb(r),
                Material::water(),
                body,
                center,
            )?;
        }

        let rod_z = self.rod_z();
        let mut rods = 0;
        for sector in 0..6 {
            let r = self.rod_radii[5 - sector];
            for (n, axis) in self.rod_sector(sector).into_iter().enumerate() {
                tree.place_at(
                    format!("{ROD_PREFIX}_{sector}_{n}"),
                    Solid::cylinder(r, self.rod_height / 2.0),
                    Material::water(),
                    body,
                    axis.extend(rod_z),
                )?;
                rods += 1;
            }
        }

        tree.close()?;
        debug!(rods, volumes = tree.len(), "Jaszczak phantom built.");
        Ok(tree)
    }

    /// Raw relative activities per family; see [`ActivityProfile::normalized`].
    pub fn activity_profile(&self) -> ActivityProfile {
        ActivityProfile::new()
            .with(BODY, self.body_activity)
            .with(SPHERE_PREFIX, self.sphere_activity)
            .with(ROD_PREFIX, self.rod_activity)
    }

    /// The body cylinder, which encloses every active region.
    pub fn sampling_bound(&self) -> SamplingBound {
        SamplingBound::cylinder(self.body_radius, self.body_height / 2.0)
    }

    pub fn classifier(&self) -> Result<SpatialClassifier> {
        SpatialClassifier::from_provider(self.geometry()?)
    }

    /// A vertex generator for this phantom with its activities normalized.
    pub fn vertex_generator(&self) -> Result<RegionActivityVertexGenerator> {
        RegionActivityVertexGenerator::try_new(
            self.sampling_bound(),
            self.activity_profile().normalized()?,
            self.classifier()?,
        )
    }
}
