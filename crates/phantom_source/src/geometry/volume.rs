//! A nested-solid geometry provider.
//!
//! [`VolumeTree`] holds axis-aligned solids placed inside one another, starting
//! from a world volume. Placement is allowed until [`VolumeTree::close`] is
//! called; afterwards the tree is read-only and can be located against.
//!
//! Boundary tie-break: surfaces count as inside, and location descends into the
//! first daughter containing the point, so on a shared boundary the nearer
//! (innermost) region wins.
use glam::DVec3;
use mint::Vector3;
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::{GeometryProvider, Material, RegionHit};

/// Handle to a volume inside a [`VolumeTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VolumeId(pub usize);

/// Solid shapes, centered on their local origin; tubes run along z.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Solid {
    Box { half: DVec3 },
    Tube { rmin: f64, rmax: f64, half_z: f64 },
    Orb { radius: f64 },
}

impl Solid {
    pub fn cuboid(half: DVec3) -> Self {
        Self::Box { half }
    }

    /// A full cylinder of the given radius and half-length.
    pub fn cylinder(radius: f64, half_z: f64) -> Self {
        Self::Tube {
            rmin: 0.0,
            rmax: radius,
            half_z,
        }
    }

    pub fn tube(rmin: f64, rmax: f64, half_z: f64) -> Self {
        Self::Tube { rmin, rmax, half_z }
    }

    pub fn orb(radius: f64) -> Self {
        Self::Orb { radius }
    }

    pub fn validate(&self) -> Result<()> {
        let ok = match *self {
            Self::Box { half } => half.is_finite() && half.min_element() > 0.0,
            Self::Tube { rmin, rmax, half_z } => {
                rmin.is_finite()
                    && rmax.is_finite()
                    && half_z.is_finite()
                    && rmin >= 0.0
                    && rmax > rmin
                    && half_z > 0.0
            }
            Self::Orb { radius } => radius.is_finite() && radius > 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!("degenerate solid {self:?}")))
        }
    }

    /// Whether the local point `p` is inside the solid, surface included.
    #[inline]
    pub fn contains(&self, p: DVec3) -> bool {
        match *self {
            Self::Box { half } => p.abs().cmple(half).all(),
            Self::Tube { rmin, rmax, half_z } => {
                let r2 = p.x * p.x + p.y * p.y;
                p.z.abs() <= half_z && r2 <= rmax * rmax && r2 >= rmin * rmin
            }
            Self::Orb { radius } => p.length_squared() <= radius * radius,
        }
    }

    /// Radius of a sphere around the local origin enclosing the solid.
    pub fn bounding_radius(&self) -> f64 {
        match *self {
            Self::Box { half } => half.length(),
            Self::Tube { rmax, half_z, .. } => rmax.hypot(half_z),
            Self::Orb { radius } => radius,
        }
    }

    /// Volume of the solid itself, daughters not subtracted.
    pub fn volume(&self) -> f64 {
        use std::f64::consts::PI;
        match *self {
            Self::Box { half } => 8.0 * half.x * half.y * half.z,
            Self::Tube { rmin, rmax, half_z } => PI * (rmax * rmax - rmin * rmin) * 2.0 * half_z,
            Self::Orb { radius } => 4.0 / 3.0 * PI * radius.powi(3),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    solid: Solid,
    material: Material,
    parent: Option<VolumeId>,
    /// Center in world coordinates.
    origin: DVec3,
    reach_sq: f64,
    daughters: Vec<usize>,
}

/// Hierarchy of placed solids rooted at a world volume.
#[derive(Debug, Clone)]
pub struct VolumeTree {
    nodes: Vec<Node>,
    closed: bool,
}

impl VolumeTree {
    /// Creates an open tree whose world volume is centered on the origin.
    pub fn new(name: impl Into<String>, solid: Solid, material: Material) -> Self {
        Self {
            nodes: vec![Node {
                name: name.into(),
                solid,
                material,
                parent: None,
                origin: DVec3::ZERO,
                reach_sq: solid.bounding_radius().powi(2),
                daughters: Vec::new(),
            }],
            closed: false,
        }
    }

    pub fn world(&self) -> VolumeId {
        VolumeId(0)
    }

    /// Places a volume at the center of `parent`.
    pub fn place(
        &mut self,
        name: impl Into<String>,
        solid: Solid,
        material: Material,
        parent: VolumeId,
    ) -> Result<VolumeId> {
        self.place_at(name, solid, material, parent, DVec3::ZERO)
    }

    /// Places a volume inside `parent`, offset from the parent's center.
    pub fn place_at(
        &mut self,
        name: impl Into<String>,
        solid: Solid,
        material: Material,
        parent: VolumeId,
        offset: DVec3,
    ) -> Result<VolumeId> {
        if self.closed {
            return Err(Error::GeometryClosed);
        }
        solid.validate()?;
        if !offset.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "placement offset {offset} is not finite"
            )));
        }
        let parent_origin = self
            .nodes
            .get(parent.0)
            .map(|n| n.origin)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown parent volume {parent:?}")))?;

        let id = self.nodes.len();
        self.nodes.push(Node {
            name: name.into(),
            solid,
            material,
            parent: Some(parent),
            origin: parent_origin + offset,
            reach_sq: solid.bounding_radius().powi(2),
            daughters: Vec::new(),
        });
        self.nodes[parent.0].daughters.push(id);
        Ok(VolumeId(id))
    }

    /// Freezes the tree. Validates the world solid; placement fails from here on.
    pub fn close(&mut self) -> Result<()> {
        self.nodes[0].solid.validate()?;
        self.closed = true;
        debug!(volumes = self.nodes.len(), "Geometry closed.");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn name(&self, id: VolumeId) -> Option<&str> {
        self.nodes.get(id.0).map(|n| n.name.as_str())
    }

    pub fn material(&self, id: VolumeId) -> Option<&Material> {
        self.nodes.get(id.0).map(|n| &n.material)
    }

    pub fn solid(&self, id: VolumeId) -> Option<&Solid> {
        self.nodes.get(id.0).map(|n| &n.solid)
    }

    pub fn parent(&self, id: VolumeId) -> Option<VolumeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Center of the volume in world coordinates.
    pub fn global_origin(&self, id: VolumeId) -> Option<DVec3> {
        self.nodes.get(id.0).map(|n| n.origin)
    }

    /// Finds the first volume with exactly this name.
    pub fn find(&self, name: &str) -> Option<VolumeId> {
        self.nodes.iter().position(|n| n.name == name).map(VolumeId)
    }

    /// Iterates over all volume names in placement order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.name.as_str())
    }

    /// Innermost volume containing `p`, or `None` outside the world.
    ///
    /// Fails with [`Error::GeometryNotFinalized`] until the tree is closed.
    pub fn locate_id(&self, p: DVec3) -> Result<Option<VolumeId>> {
        if !self.closed {
            return Err(Error::GeometryNotFinalized);
        }
        Ok(self.innermost(p))
    }

    fn innermost(&self, p: DVec3) -> Option<VolumeId> {
        let world = &self.nodes[0];
        if !world.solid.contains(p - world.origin) {
            return None;
        }

        let mut current = 0;
        'descend: loop {
            for &d in &self.nodes[current].daughters {
                let node = &self.nodes[d];
                let local = p - node.origin;
                if local.length_squared() <= node.reach_sq && node.solid.contains(local) {
                    current = d;
                    continue 'descend;
                }
            }
            return Some(VolumeId(current));
        }
    }
}

impl GeometryProvider for VolumeTree {
    fn is_closed(&self) -> bool {
        self.closed
    }

    fn locate(&self, point: Vector3<f64>) -> Option<RegionHit<'_>> {
        if !self.closed {
            return None;
        }
        let node = &self.nodes[self.innermost(DVec3::from(point))?.0];
        Some(RegionHit {
            name: &node.name,
            material: &node.material.name,
            density: node.material.density,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_level_tree() -> VolumeTree {
        let mut tree = VolumeTree::new(
            "World",
            Solid::cuboid(DVec3::splat(100.0)),
            Material::air(),
        );
        let body = tree
            .place("Body", Solid::cylinder(50.0, 40.0), Material::water(), tree.world())
            .unwrap();
        tree.place_at(
            "Sphere_0",
            Solid::orb(10.0),
            Material::water(),
            body,
            DVec3::new(20.0, 0.0, 10.0),
        )
        .unwrap();
        tree.place_at(
            "Shell",
            Solid::tube(30.0, 35.0, 5.0),
            Material::pmma(),
            body,
            DVec3::new(0.0, 0.0, -20.0),
        )
        .unwrap();
        tree
    }

    #[test]
    fn placement_after_close_fails() {
        let mut tree = two_level_tree();
        tree.close().unwrap();
        let err = tree
            .place("Late", Solid::orb(1.0), Material::air(), tree.world())
            .unwrap_err();
        assert!(matches!(err, Error::GeometryClosed));
    }

    #[test]
    fn degenerate_solids_and_unknown_parents_are_rejected() {
        let mut tree = two_level_tree();
        assert!(tree
            .place("Flat", Solid::cylinder(5.0, 0.0), Material::air(), tree.world())
            .is_err());
        assert!(tree
            .place("Lost", Solid::orb(1.0), Material::air(), VolumeId(99))
            .is_err());
    }

    #[test]
    fn locate_descends_to_innermost_volume() {
        let mut tree = two_level_tree();
        tree.close().unwrap();
        let at = |x, y, z| {
            tree.locate_id(DVec3::new(x, y, z))
                .unwrap()
                .and_then(|id| tree.name(id))
        };
        assert_eq!(at(20.0, 0.0, 10.0), Some("Sphere_0"));
        assert_eq!(at(0.0, 0.0, 0.0), Some("Body"));
        assert_eq!(at(0.0, 32.0, -20.0), Some("Shell"));
        // Inside the shell's hole.
        assert_eq!(at(0.0, 10.0, -20.0), Some("Body"));
        assert_eq!(at(0.0, 0.0, 45.0), Some("World"));
        assert_eq!(at(0.0, 0.0, 101.0), None);
    }

    #[test]
    fn shared_boundary_resolves_to_inner_region() {
        let mut tree = two_level_tree();
        tree.close().unwrap();
        // Surface point of the sphere, also inside the body.
        let id = tree.locate_id(DVec3::new(30.0, 0.0, 10.0)).unwrap().unwrap();
        assert_eq!(tree.name(id), Some("Sphere_0"));
    }

    #[test]
    fn open_tree_locates_nothing() {
        let tree = two_level_tree();
        assert!(tree.locate(DVec3::ZERO.into()).is_none());
        assert!(matches!(
            tree.locate_id(DVec3::ZERO),
            Err(Error::GeometryNotFinalized)
        ));
    }

    #[test]
    fn global_origins_accumulate_offsets() {
        let mut tree = two_level_tree();
        let sphere = tree.find("Sphere_0").unwrap();
        let inner = tree
            .place_at(
                "Core",
                Solid::orb(1.0),
                Material::water(),
                sphere,
                DVec3::new(0.0, 2.0, 0.0),
            )
            .unwrap();
        assert_eq!(
            tree.global_origin(inner),
            Some(DVec3::new(20.0, 2.0, 10.0))
        );
        assert_eq!(tree.parent(inner), Some(sphere));
    }
}
