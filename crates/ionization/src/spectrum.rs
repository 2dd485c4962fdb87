//! Stellar irradiance at the planet, as delivered by the flux provider.

use wind_core::DomainError;
use wind_core::math::interp_linear;

/// Spectral irradiance F_λ (erg s⁻¹ cm⁻² Å⁻¹) sampled on increasing wavelengths (Å).
#[derive(Debug, Clone, PartialEq)]
pub struct StellarSpectrum {
    wavelength_angstrom: Vec<f64>,
    flux: Vec<f64>,
}

impl StellarSpectrum {
    pub fn new(wavelength_angstrom: Vec<f64>, flux: Vec<f64>) -> Result<Self, DomainError> {
        if wavelength_angstrom.len() < 2 {
            return Err(DomainError::GridTooShort {
                points: wavelength_angstrom.len(),
            });
        }
        DomainError::require_len("spectral flux", wavelength_angstrom.len(), flux.len())?;
        for (index, w) in wavelength_angstrom.iter().enumerate() {
            if !(w.is_finite() && *w > 0.0) {
                return Err(DomainError::NonFinite {
                    quantity: "wavelength",
                    index,
                });
            }
        }
        for index in 1..wavelength_angstrom.len() {
            if wavelength_angstrom[index] <= wavelength_angstrom[index - 1] {
                return Err(DomainError::NonMonotonicGrid {
                    index,
                    previous: wavelength_angstrom[index - 1],
                    current: wavelength_angstrom[index],
                });
            }
        }
        for &f in &flux {
            DomainError::require_non_negative("spectral flux", f)?;
        }
        Ok(Self {
            wavelength_angstrom,
            flux,
        })
    }

    /// Constant F_λ over `[min_angstrom, max_angstrom]`.
    pub fn flat(
        min_angstrom: f64,
        max_angstrom: f64,
        points: usize,
        flux: f64,
    ) -> Result<Self, DomainError> {
        if points < 2 {
            return Err(DomainError::GridTooShort { points });
        }
        let step = (max_angstrom - min_angstrom) / (points - 1) as f64;
        let wavelengths = (0..points)
            .map(|i| min_angstrom + step * i as f64)
            .collect();
        Self::new(wavelengths, vec![flux; points])
    }

    pub fn wavelength_angstrom(&self) -> &[f64] {
        &self.wavelength_angstrom
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    /// Multiply every flux sample by `factor`.
    pub fn scaled(&self, factor: f64) -> Result<Self, DomainError> {
        DomainError::require_non_negative("flux scale factor", factor)?;
        Ok(Self {
            wavelength_angstrom: self.wavelength_angstrom.clone(),
            flux: self.flux.iter().map(|f| f * factor).collect(),
        })
    }

    /// Inverse-square rescaling from the distance the table was measured at.
    pub fn at_distance(&self, from_cm: f64, to_cm: f64) -> Result<Self, DomainError> {
        DomainError::require_positive("reference distance", from_cm)?;
        DomainError::require_positive("target distance", to_cm)?;
        self.scaled((from_cm / to_cm).powi(2))
    }

    /// Linear resampling onto `wavelength_angstrom`; zero outside the table.
    pub fn resample(&self, wavelength_angstrom: &[f64]) -> Result<Self, DomainError> {
        let flux = wavelength_angstrom
            .iter()
            .map(|&w| interp_linear(&self.wavelength_angstrom, &self.flux, w).unwrap_or(0.0))
            .collect();
        Self::new(wavelength_angstrom.to_vec(), flux)
    }

    /// Wavelength-integrated flux (erg s⁻¹ cm⁻²) shortward of `max_angstrom`.
    pub fn integrated_flux_below(&self, max_angstrom: f64) -> f64 {
        let mut total = 0.0;
        for i in 0..self.wavelength_angstrom.len() - 1 {
            let (w0, w1) = (self.wavelength_angstrom[i], self.wavelength_angstrom[i + 1]);
            if w1 > max_angstrom {
                break;
            }
            total += 0.5 * (w1 - w0) * (self.flux[i] + self.flux[i + 1]);
        }
        total
    }
}
