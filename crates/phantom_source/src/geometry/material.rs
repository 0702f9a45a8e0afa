//! Materials and a catalogue of the presets the phantoms use.
//!
//! Densities are in kg/m³. Preset names follow the NIST material database names
//! where one exists.

/// A named bulk material.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    pub name: String,
    pub density: f64,
}

impl Material {
    pub fn new(name: impl Into<String>, density: f64) -> Self {
        Self {
            name: name.into(),
            density,
        }
    }

    pub fn air() -> Self {
        Self::new("G4_AIR", 1.20479)
    }

    pub fn water() -> Self {
        Self::new("G4_WATER", 1000.0)
    }

    pub fn pmma() -> Self {
        Self::new("G4_PLEXIGLASS", 1190.0)
    }

    pub fn stainless_steel() -> Self {
        Self::new("G4_STAINLESS-STEEL", 8000.0)
    }

    /// Intergalactic vacuum, the conventional stand-in for empty space.
    pub fn galactic() -> Self {
        Self::new("G4_Galactic", 1e-22)
    }

    pub fn quartz() -> Self {
        Self::new("Quartz", 2320.0)
    }

    pub fn liquid_xenon() -> Self {
        Self::new("LXe", 2980.0)
    }

    /// Low-density lung-equivalent insert material (0.3 g/mL).
    pub fn lung() -> Self {
        Self::new("Lung", 300.0)
    }
}
