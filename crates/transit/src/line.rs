//! Atomic line data and the local absorption cross-section.

use std::f64::consts::PI;

use wind_core::constants::{ANGSTROM_CM, C, E_CHARGE, K_B, M_E};
use wind_core::{DomainError, Ion};

use crate::voigt::voigt_profile;

/// Classical line strength π e² / (m_e c) in cm² s⁻¹.
const CLASSICAL_CROSS_SECTION: f64 = PI * E_CHARGE * E_CHARGE / (M_E * C);

/// One bound-bound transition of an absorbing ion.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralLine {
    pub name: String,
    pub ion: Ion,
    /// Rest wavelength (Å).
    pub wavelength_angstrom: f64,
    pub oscillator_strength: f64,
    /// Spontaneous decay rate (s⁻¹) setting the natural width.
    pub einstein_a_s: f64,
    /// Half-width (Å) of the region around the line where it is modelled.
    pub window_angstrom: f64,
}

impl SpectralLine {
    /// H I Lyman α (both fine-structure components combined).
    pub fn lyman_alpha() -> Self {
        Self {
            name: "H I Lya".to_string(),
            ion: Ion::HI,
            wavelength_angstrom: 1215.67,
            oscillator_strength: 0.4164,
            einstein_a_s: 6.265e8,
            window_angstrom: 5.0,
        }
    }

    /// He II 304 Å, the hydrogenic Lyman α of ionized helium.
    pub fn helium_ii_304() -> Self {
        Self {
            name: "He II 304".to_string(),
            ion: Ion::HeII,
            wavelength_angstrom: 303.78,
            oscillator_strength: 0.4162,
            einstein_a_s: 1.003e10,
            window_angstrom: 1.5,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        DomainError::require_positive("line wavelength", self.wavelength_angstrom)?;
        DomainError::require_positive("oscillator strength", self.oscillator_strength)?;
        DomainError::require_non_negative("Einstein A coefficient", self.einstein_a_s)?;
        DomainError::require_positive("line window", self.window_angstrom)?;
        Ok(())
    }

    pub fn covers(&self, wavelength_angstrom: f64) -> bool {
        (wavelength_angstrom - self.wavelength_angstrom).abs() <= self.window_angstrom
    }

    /// Wavelength interval (Å) over which the line is modelled.
    pub fn range_angstrom(&self) -> (f64, f64) {
        (
            self.wavelength_angstrom - self.window_angstrom,
            self.wavelength_angstrom + self.window_angstrom,
        )
    }

    /// Lorentzian half-width at half-maximum in wavelength (cm).
    pub fn lorentz_width_cm(&self) -> f64 {
        let lambda0 = self.wavelength_angstrom * ANGSTROM_CM;
        let gamma_nu = self.einstein_a_s / (4.0 * PI);
        lambda0 * lambda0 * gamma_nu / C
    }

    /// Doppler parameter b = √(2kT/m + v_turb²) in cm s⁻¹.
    pub fn doppler_parameter_cm_s(&self, temperature_k: f64, turbulence: bool) -> f64 {
        let mass = self.ion.mass_g();
        let thermal = 2.0 * K_B * temperature_k / mass;
        let turbulent = if turbulence {
            5.0 * K_B * temperature_k / (3.0 * mass)
        } else {
            0.0
        };
        (thermal + turbulent).sqrt()
    }

    /// Absorption cross-section (cm²) at `wavelength_angstrom` for gas at
    /// `temperature_k` moving towards the observer at `los_velocity_cm_s`.
    pub fn cross_section(
        &self,
        wavelength_angstrom: f64,
        temperature_k: f64,
        los_velocity_cm_s: f64,
        turbulence: bool,
    ) -> f64 {
        let widths = self.widths(temperature_k, turbulence);
        self.cross_section_with(wavelength_angstrom, widths, los_velocity_cm_s)
    }

    /// Gaussian σ and Lorentzian γ in wavelength (cm) for a gas temperature.
    pub(crate) fn widths(&self, temperature_k: f64, turbulence: bool) -> LineWidths {
        let lambda0 = self.wavelength_angstrom * ANGSTROM_CM;
        let b = self.doppler_parameter_cm_s(temperature_k, turbulence);
        LineWidths {
            gaussian_cm: lambda0 * b / (C * std::f64::consts::SQRT_2),
            lorentz_cm: self.lorentz_width_cm(),
        }
    }

    pub(crate) fn cross_section_with(
        &self,
        wavelength_angstrom: f64,
        widths: LineWidths,
        los_velocity_cm_s: f64,
    ) -> f64 {
        let lambda0 = self.wavelength_angstrom * ANGSTROM_CM;
        // approaching gas absorbs blueward of the rest wavelength
        let centre = lambda0 * (1.0 - los_velocity_cm_s / C);
        let offset = wavelength_angstrom * ANGSTROM_CM - centre;
        let phi = voigt_profile(offset, widths.gaussian_cm, widths.lorentz_cm);
        CLASSICAL_CROSS_SECTION * self.oscillator_strength * lambda0 * lambda0 / C * phi
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LineWidths {
    pub gaussian_cm: f64,
    pub lorentz_cm: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrated_cross_section_matches_oscillator_strength() {
        // ∫ σ dν = (π e² / m_e c) f
        let line = SpectralLine::lyman_alpha();
        let lambda0 = line.wavelength_angstrom;
        let h = 1.0e-4;
        let total_lambda_cm: f64 = (-50_000..=50_000)
            .map(|i| line.cross_section(lambda0 + i as f64 * h, 1.0e4, 0.0, false) * h * ANGSTROM_CM)
            .sum();
        let lambda0_cm = lambda0 * ANGSTROM_CM;
        let total_nu = total_lambda_cm * C / (lambda0_cm * lambda0_cm);
        let expected = CLASSICAL_CROSS_SECTION * line.oscillator_strength;
        assert!((total_nu - expected).abs() / expected < 2.0e-2, "{total_nu} vs {expected}");
    }

    #[test]
    fn approaching_gas_is_blueshifted() {
        let line = SpectralLine::lyman_alpha();
        let blue = line.wavelength_angstrom - 0.2;
        let red = line.wavelength_angstrom + 0.2;
        let v = 2.0e6;
        assert!(line.cross_section(blue, 5.0e3, v, false) > line.cross_section(red, 5.0e3, v, false));
    }

    #[test]
    fn window_bounds() {
        let line = SpectralLine::lyman_alpha();
        assert!(line.covers(1215.67 + 4.9));
        assert!(!line.covers(1215.67 + 5.1));
    }
}
