//! Optical depth along straight lines of sight through the atmosphere.

use wind_core::math::{bracket, interp_linear, interp_log, trapezoid};
use wind_core::{AtmosphericStructure, DomainError, IonizationState};

use crate::line::{LineWidths, SpectralLine};

/// Local gas properties along one chord, sampled on its integration nodes.
#[derive(Debug, Clone)]
struct ChordSample {
    z_cm: Vec<f64>,
    density_cm3: Vec<f64>,
    velocity_los_cm_s: Vec<f64>,
    widths: Vec<LineWidths>,
}

/// Absorber profiles of one line interpolated from an atmosphere.
#[derive(Debug, Clone)]
pub(crate) struct LineAbsorber<'a> {
    pub line: &'a SpectralLine,
    radii_cm: &'a [f64],
    density_cm3: Vec<f64>,
    temperature_k: &'a [f64],
    velocity_cm_s: &'a [f64],
}

impl<'a> LineAbsorber<'a> {
    pub fn new(
        line: &'a SpectralLine,
        atmosphere: &'a AtmosphericStructure,
        state: &IonizationState,
    ) -> Result<Self, DomainError> {
        atmosphere
            .grid
            .check_len("ionization state", state.len())?;
        Ok(Self {
            line,
            radii_cm: atmosphere.grid.radii(),
            density_cm3: atmosphere.number_density_profile(line.ion, state),
            temperature_k: &atmosphere.temperature_k,
            velocity_cm_s: &atmosphere.velocity_cm_s,
        })
    }

    fn sample(
        &self,
        impact_cm: f64,
        cutoff_cm: f64,
        nodes: usize,
        settings: ChordSettings,
    ) -> ChordSample {
        let z_max = (cutoff_cm * cutoff_cm - impact_cm * impact_cm).max(0.0).sqrt();
        let half = nodes.max(2);
        // quadratic spacing: dense near the tangent point where the density peaks
        let mut z_cm = Vec::with_capacity(2 * half - 1);
        for k in (1..half).rev() {
            let s = k as f64 / (half - 1) as f64;
            z_cm.push(-z_max * s * s);
        }
        for k in 0..half {
            let s = k as f64 / (half - 1) as f64;
            z_cm.push(z_max * s * s);
        }

        let mut density_cm3 = Vec::with_capacity(z_cm.len());
        let mut velocity_los_cm_s = Vec::with_capacity(z_cm.len());
        let mut widths = Vec::with_capacity(z_cm.len());
        for &z in &z_cm {
            let r = (impact_cm * impact_cm + z * z).sqrt();
            let n = interp_log(self.radii_cm, &self.density_cm3, r).unwrap_or(0.0);
            let t = interp_linear(self.radii_cm, self.temperature_k, r)
                .unwrap_or(self.temperature_k[0]);
            let v = if settings.outflow_doppler {
                interp_linear(self.radii_cm, self.velocity_cm_s, r).unwrap_or(0.0) * z / r
            } else {
                0.0
            };
            density_cm3.push(n);
            velocity_los_cm_s.push(v);
            widths.push(self.line.widths(t, settings.turbulence));
        }
        ChordSample {
            z_cm,
            density_cm3,
            velocity_los_cm_s,
            widths,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ChordSettings {
    pub turbulence: bool,
    pub outflow_doppler: bool,
}

/// Chord optical depth τ(b, λ) on an impact-parameter grid.
#[derive(Debug, Clone, PartialEq)]
pub struct OpticalDepthMap {
    pub impact_cm: Vec<f64>,
    pub wavelength_angstrom: Vec<f64>,
    /// `tau[i][j]` for impact parameter `i` and wavelength `j`.
    pub tau: Vec<Vec<f64>>,
    pub cutoff_radius_cm: f64,
}

impl OpticalDepthMap {
    pub(crate) fn compute(
        absorbers: &[LineAbsorber<'_>],
        impact_cm: Vec<f64>,
        wavelength_angstrom: &[f64],
        cutoff_radius_cm: f64,
        chord_points: usize,
        settings: ChordSettings,
    ) -> Self {
        let mut tau = Vec::with_capacity(impact_cm.len());
        for &b in &impact_cm {
            let mut row = vec![0.0; wavelength_angstrom.len()];
            if b < cutoff_radius_cm {
                for absorber in absorbers {
                    let sample = absorber.sample(b, cutoff_radius_cm, chord_points, settings);
                    for (j, &w) in wavelength_angstrom.iter().enumerate() {
                        if !absorber.line.covers(w) {
                            continue;
                        }
                        let opacity: Vec<f64> = (0..sample.z_cm.len())
                            .map(|k| {
                                sample.density_cm3[k]
                                    * absorber.line.cross_section_with(
                                        w,
                                        sample.widths[k],
                                        sample.velocity_los_cm_s[k],
                                    )
                            })
                            .collect();
                        row[j] += trapezoid(&sample.z_cm, &opacity);
                    }
                }
            }
            tau.push(row);
        }
        Self {
            impact_cm,
            wavelength_angstrom: wavelength_angstrom.to_vec(),
            tau,
            cutoff_radius_cm,
        }
    }

    /// Optical depth at impact parameter `impact_cm` for wavelength index `j`.
    ///
    /// Zero at and beyond the cutoff radius; clamped to the innermost chord below
    /// the grid.
    pub fn at(&self, impact_cm: f64, j: usize) -> f64 {
        match self.locate(impact_cm) {
            Lookup::Outside => 0.0,
            Lookup::Inner => self.tau[0][j],
            Lookup::Between(i, t) => self.tau[i][j] + t * (self.tau[i + 1][j] - self.tau[i][j]),
        }
    }

    /// Optical depth at `impact_cm` for every wavelength, written into `out`.
    pub fn fill_at(&self, impact_cm: f64, out: &mut [f64]) {
        match self.locate(impact_cm) {
            Lookup::Outside => out.fill(0.0),
            Lookup::Inner => out.copy_from_slice(&self.tau[0]),
            Lookup::Between(i, t) => {
                for (j, value) in out.iter_mut().enumerate() {
                    *value = self.tau[i][j] + t * (self.tau[i + 1][j] - self.tau[i][j]);
                }
            }
        }
    }

    fn locate(&self, impact_cm: f64) -> Lookup {
        if impact_cm >= self.cutoff_radius_cm || self.impact_cm.is_empty() {
            return Lookup::Outside;
        }
        if impact_cm <= self.impact_cm[0] {
            return Lookup::Inner;
        }
        match bracket(&self.impact_cm, impact_cm) {
            Some(i) => {
                let width = self.impact_cm[i + 1] - self.impact_cm[i];
                let t = (impact_cm - self.impact_cm[i]) / width;
                Lookup::Between(i, t)
            }
            None => Lookup::Outside,
        }
    }
}

enum Lookup {
    Outside,
    Inner,
    Between(usize, f64),
}
