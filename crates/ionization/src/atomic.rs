//! Atomic data seam: photoionization cross-sections and recombination coefficients.
//!
//! Tabulated databases live outside this workspace; they plug in through
//! [`AtomicData`]. [`StandardAtomicData`] carries the analytic fits used by
//! default.

use wind_core::Ion;

/// Absorbing stages, in the order used by column and rate arrays.
pub const ABSORBERS: [Ion; 3] = [Ion::HI, Ion::HeI, Ion::HeII];

/// Photoionization threshold wavelengths (Å) of [`ABSORBERS`].
pub const THRESHOLD_ANGSTROM: [f64; 3] = [911.75, 504.26, 227.84];

const HYDROGENIC_SIGMA0_CM2: f64 = 6.30e-18;
const HELIUM_SIGMA0_CM2: f64 = 7.42e-18;

/// Provider of the microphysics consumed by the ionization balance.
pub trait AtomicData: Send + Sync {
    /// Photoionization cross-section (cm²) of `absorber` at `wavelength_angstrom`.
    ///
    /// Zero longward of the threshold and for stages that cannot be ionized further.
    fn photoionization_cross_section(&self, absorber: Ion, wavelength_angstrom: f64) -> f64;

    /// Recombination coefficient (cm³ s⁻¹) onto `recombining` (H II, He II or He III).
    fn recombination_coefficient(&self, recombining: Ion, temperature_k: f64) -> f64;
}

/// Power-law recombination coefficient α = a (T / T0)^p.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecombinationLaw {
    pub coefficient_cm3_s: f64,
    pub reference_temperature_k: f64,
    pub exponent: f64,
}

impl RecombinationLaw {
    pub fn evaluate(&self, temperature_k: f64) -> f64 {
        self.coefficient_cm3_s * (temperature_k / self.reference_temperature_k).powf(self.exponent)
    }
}

/// Analytic hydrogenic and helium fits with case-B recombination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardAtomicData {
    /// H II + e → H I.
    pub hydrogen: RecombinationLaw,
    /// He II + e → He I.
    pub helium_single: RecombinationLaw,
    /// He III + e → He II.
    pub helium_double: RecombinationLaw,
}

impl Default for StandardAtomicData {
    fn default() -> Self {
        Self {
            hydrogen: RecombinationLaw {
                coefficient_cm3_s: 2.59e-13,
                reference_temperature_k: 1.0e4,
                exponent: -0.7,
            },
            helium_single: RecombinationLaw {
                coefficient_cm3_s: 2.72e-13,
                reference_temperature_k: 1.0e4,
                exponent: -0.789,
            },
            // hydrogenic scaling α_Z(T) = Z α_H(T / Z²) with Z = 2
            helium_double: RecombinationLaw {
                coefficient_cm3_s: 5.18e-13,
                reference_temperature_k: 4.0e4,
                exponent: -0.7,
            },
        }
    }
}

impl AtomicData for StandardAtomicData {
    fn photoionization_cross_section(&self, absorber: Ion, wavelength_angstrom: f64) -> f64 {
        match absorber {
            Ion::HI => hydrogenic_cross_section(1.0, THRESHOLD_ANGSTROM[0], wavelength_angstrom),
            Ion::HeI => helium_cross_section(wavelength_angstrom),
            Ion::HeII => hydrogenic_cross_section(2.0, THRESHOLD_ANGSTROM[2], wavelength_angstrom),
            Ion::HII | Ion::HeIII => 0.0,
        }
    }

    fn recombination_coefficient(&self, recombining: Ion, temperature_k: f64) -> f64 {
        match recombining {
            Ion::HII => self.hydrogen.evaluate(temperature_k),
            Ion::HeII => self.helium_single.evaluate(temperature_k),
            Ion::HeIII => self.helium_double.evaluate(temperature_k),
            Ion::HI | Ion::HeI => 0.0,
        }
    }
}

/// Exact hydrogenic ground-state cross-section for nuclear charge `z`.
pub fn hydrogenic_cross_section(z: f64, threshold_angstrom: f64, wavelength_angstrom: f64) -> f64 {
    if !(wavelength_angstrom > 0.0 && wavelength_angstrom <= threshold_angstrom) {
        return 0.0;
    }
    let energy_ratio = threshold_angstrom / wavelength_angstrom;
    let sigma0 = HYDROGENIC_SIGMA0_CM2 / (z * z);
    let eps = (energy_ratio - 1.0).sqrt();
    if eps < 1.0e-8 {
        return sigma0;
    }
    let numerator = (4.0 - 4.0 * eps.atan() / eps).exp();
    let denominator = 1.0 - (-2.0 * std::f64::consts::PI / eps).exp();
    sigma0 * energy_ratio.powi(-4) * numerator / denominator
}

/// Two-term power-law fit for neutral helium.
pub fn helium_cross_section(wavelength_angstrom: f64) -> f64 {
    let threshold = THRESHOLD_ANGSTROM[1];
    if !(wavelength_angstrom > 0.0 && wavelength_angstrom <= threshold) {
        return 0.0;
    }
    let x = threshold / wavelength_angstrom;
    HELIUM_SIGMA0_CM2 * (1.66 * x.powf(-2.05) - 0.66 * x.powf(-3.05))
}
