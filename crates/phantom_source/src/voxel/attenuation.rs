//! Per-material attenuation coefficients for attenuation maps.
use std::collections::HashMap;

/// Source of mass attenuation coefficients (m²/kg) keyed by material name.
///
/// Linear attenuation (1/m) is the coefficient times the material density.
pub trait AttenuationLookup: Send + Sync {
    fn attenuation_coefficient(&self, material: &str) -> Option<f64>;
}

/// Map-backed [`AttenuationLookup`].
#[derive(Debug, Clone, Default)]
pub struct AttenuationTable {
    coefficients: HashMap<String, f64>,
}

impl AttenuationTable {
    pub fn new() -> Self {
        Self {
            coefficients: HashMap::new(),
        }
    }

    /// Approximate total mass attenuation at 511 keV for the bundled material presets.
    pub fn at_511_kev() -> Self {
        let mut table = Self::new();
        table.register("G4_AIR", 0.008_71);
        table.register("G4_WATER", 0.009_69);
        table.register("G4_PLEXIGLASS", 0.009_37);
        table.register("G4_STAINLESS-STEEL", 0.008_36);
        table.register("G4_Galactic", 0.017_29);
        table.register("Quartz", 0.008_71);
        table.register("LXe", 0.009_40);
        table.register("Lung", 0.009_58);
        table
    }

    /// Registers or replaces the coefficient for `material`.
    pub fn register(&mut self, material: impl Into<String>, coefficient: f64) {
        self.coefficients.insert(material.into(), coefficient);
    }

    pub fn with(mut self, material: impl Into<String>, coefficient: f64) -> Self {
        self.register(material, coefficient);
        self
    }

    pub fn contains(&self, material: &str) -> bool {
        self.coefficients.contains_key(material)
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}

impl AttenuationLookup for AttenuationTable {
    fn attenuation_coefficient(&self, material: &str) -> Option<f64> {
        self.coefficients.get(material).copied()
    }
}
