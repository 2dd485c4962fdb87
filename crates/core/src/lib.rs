//! Core units, constants, and shared primitives for the Parker wind workspace.
//!
//! Everything here is expressed in cgs units. The data model types
//! ([`RadialGrid`], [`AtmosphericStructure`], [`IonizationState`]) are shared
//! read-only between the wind, ionization, and transit crates.

pub mod error;
pub mod grid;
pub mod math;
pub mod model;
pub mod roots;

pub use error::{DomainError, RootFindError};
pub use grid::RadialGrid;
pub use model::{
    AtmosphericStructure, Composition, HeliumStages, HydrogenStages, Ion, IonizationState,
};

/// Physical constants expressed in cgs units (unless stated otherwise).
pub mod constants {
    /// Gravitational constant (cm³ g⁻¹ s⁻²).
    pub const G: f64 = 6.674_30e-8;
    /// Boltzmann constant (erg K⁻¹).
    pub const K_B: f64 = 1.380_649e-16;
    /// Mass of the hydrogen atom (g).
    pub const M_H: f64 = 1.673_557_5e-24;
    /// Helium atom mass in units of `M_H`.
    pub const HE_MASS_RATIO: f64 = 3.9715;
    /// Electron mass (g).
    pub const M_E: f64 = 9.109_383_7e-28;
    /// Elementary charge (esu).
    pub const E_CHARGE: f64 = 4.803_204_71e-10;
    /// Speed of light (cm s⁻¹).
    pub const C: f64 = 2.997_924_58e10;
    /// Planck constant (erg s).
    pub const H: f64 = 6.626_070_15e-27;
    /// Centimetres per ångström.
    pub const ANGSTROM_CM: f64 = 1.0e-8;
    /// Ergs per electron volt.
    pub const EV_ERG: f64 = 1.602_176_634e-12;
    /// Earth mass (g).
    pub const M_EARTH: f64 = 5.9722e27;
    /// Earth equatorial radius (cm).
    pub const R_EARTH: f64 = 6.3781e8;
    /// Jupiter mass (g).
    pub const M_JUPITER: f64 = 1.898_13e30;
    /// Jupiter equatorial radius (cm).
    pub const R_JUPITER: f64 = 7.1492e9;
    /// Solar radius (cm).
    pub const R_SUN: f64 = 6.957e10;
    /// Centimetres per astronomical unit.
    pub const AU_CM: f64 = 1.495_978_707e13;
}

/// Basic unit conversion helpers.
pub mod units {
    use super::constants::{AU_CM, M_JUPITER, R_JUPITER, R_SUN};

    /// Convert Jupiter masses to grams.
    #[inline]
    pub fn jupiter_masses_to_g(v: f64) -> f64 {
        v * M_JUPITER
    }

    /// Convert Jupiter radii to centimetres.
    #[inline]
    pub fn jupiter_radii_to_cm(v: f64) -> f64 {
        v * R_JUPITER
    }

    /// Convert solar radii to centimetres.
    #[inline]
    pub fn solar_radii_to_cm(v: f64) -> f64 {
        v * R_SUN
    }

    /// Convert astronomical units to centimetres.
    #[inline]
    pub fn au_to_cm(v: f64) -> f64 {
        v * AU_CM
    }
}
