//! Line radiative transfer through a spherically symmetric escaping atmosphere.
//!
//! The atmosphere is viewed edge-on against the stellar disk. For each impact
//! parameter b the line optical depth is integrated along the chord, and the
//! absorbed fraction of starlight follows from integrating 1 − e^{−τ} over the
//! annulus between the opaque planet and the cutoff radius.

pub mod chord;
pub mod line;
pub mod map;
pub mod voigt;

use std::f64::consts::PI;

use log::{debug, warn};
use thiserror::Error;
use wind_core::math::trapezoid;
use wind_core::{AtmosphericStructure, DomainError, IonizationState};

pub use chord::OpticalDepthMap;
pub use line::SpectralLine;
pub use map::{LightCurve, TransitMap};

use chord::{ChordSettings, LineAbsorber};

#[derive(Debug, Error)]
pub enum TransitError {
    #[error("invalid transit input: {0}")]
    Domain(#[from] DomainError),
    #[error("no spectral lines configured")]
    NoLines,
    #[error("wavelength {wavelength_angstrom} Å lies outside every line window")]
    WavelengthOutOfRange { wavelength_angstrom: f64 },
    #[error(
        "disk integration did not settle after {refinements} refinements (relative change {relative_change:.3e} at {wavelength_angstrom} Å)"
    )]
    DiskIntegrationDiverged {
        wavelength_angstrom: f64,
        relative_change: f64,
        refinements: usize,
    },
    #[error("invalid transit geometry: {0}")]
    InvalidGeometry(String),
    #[error(
        "absorbing gas is truncated at the cutoff radius {cutoff_radius_cm:.4e} cm (optical depth {optical_depth:.3e} at {wavelength_angstrom} Å just inside it); extend the radial grid"
    )]
    OpaqueCutoff {
        cutoff_radius_cm: f64,
        optical_depth: f64,
        wavelength_angstrom: f64,
    },
}

/// Sizes of the planet, the star and the absorbing envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitGeometry {
    pub planet_radius_cm: f64,
    pub stellar_radius_cm: f64,
    /// Outer edge of the absorbing gas; the outer grid radius when `None`.
    pub cutoff_radius_cm: Option<f64>,
}

impl TransitGeometry {
    /// Validated cutoff radius for `atmosphere`.
    pub fn cutoff_for(&self, atmosphere: &AtmosphericStructure) -> Result<f64, TransitError> {
        DomainError::require_positive("planet radius", self.planet_radius_cm)?;
        DomainError::require_positive("stellar radius", self.stellar_radius_cm)?;
        let outer = atmosphere.grid.outer();
        let cutoff = match self.cutoff_radius_cm {
            Some(r) => DomainError::require_positive("cutoff radius", r)?,
            None => outer,
        };
        if cutoff <= self.planet_radius_cm {
            return Err(TransitError::InvalidGeometry(format!(
                "cutoff radius {cutoff:.4e} cm does not exceed the planet radius {:.4e} cm",
                self.planet_radius_cm
            )));
        }
        if cutoff > outer {
            return Err(TransitError::InvalidGeometry(format!(
                "cutoff radius {cutoff:.4e} cm lies beyond the outer grid radius {outer:.4e} cm"
            )));
        }
        Ok(cutoff)
    }

    /// Fraction of the stellar disk covered by the opaque planet.
    pub fn planet_disk_depth(&self) -> f64 {
        (self.planet_radius_cm / self.stellar_radius_cm).powi(2)
    }
}

/// Resolution and physics switches of the transfer calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransmissionSettings {
    /// Nodes on each half of a chord.
    pub chord_points: usize,
    /// Impact parameters of the coarsest disk quadrature.
    pub impact_points: usize,
    /// Refinement stops once the spectrum changes by less than this, relative to its peak.
    pub disk_tolerance: f64,
    pub max_refinements: usize,
    /// Add the microturbulent velocity √(5kT/3m) to the Doppler width.
    pub turbulence: bool,
    /// Shift the line by the outflow velocity projected on the line of sight.
    pub outflow_doppler: bool,
    /// Largest optical depth of the outermost interior chord for which the gas
    /// counts as thin at the cutoff.
    pub edge_optical_depth: f64,
}

impl Default for TransmissionSettings {
    fn default() -> Self {
        Self {
            chord_points: 100,
            impact_points: 32,
            disk_tolerance: 1.0e-3,
            max_refinements: 5,
            turbulence: true,
            outflow_doppler: true,
            edge_optical_depth: 1.0,
        }
    }
}

impl TransmissionSettings {
    fn validate(&self) -> Result<(), DomainError> {
        if self.chord_points < 2 {
            return Err(DomainError::GridTooShort {
                points: self.chord_points,
            });
        }
        if self.impact_points < 2 {
            return Err(DomainError::GridTooShort {
                points: self.impact_points,
            });
        }
        DomainError::require_positive("disk tolerance", self.disk_tolerance)?;
        DomainError::require_positive("edge optical depth", self.edge_optical_depth)?;
        Ok(())
    }

    fn chord(&self) -> ChordSettings {
        ChordSettings {
            turbulence: self.turbulence,
            outflow_doppler: self.outflow_doppler,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumPoint {
    pub wavelength_angstrom: f64,
    /// Fraction of starlight removed by the extended atmosphere.
    pub absorption: f64,
    /// Total in-transit depth, planet disk included.
    pub transit_depth: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransmissionSpectrum {
    pub points: Vec<SpectrumPoint>,
    pub planet_disk_depth: f64,
    /// Impact parameters of the accepted disk quadrature.
    pub impact_points: usize,
    pub refinements: usize,
}

impl TransmissionSpectrum {
    pub fn absorption(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.absorption).collect()
    }

    pub fn peak_absorption(&self) -> f64 {
        self.points.iter().map(|p| p.absorption).fold(0.0, f64::max)
    }
}

/// Computes transmission spectra and light curves for a set of lines.
#[derive(Debug, Clone)]
pub struct TransmissionEngine {
    lines: Vec<SpectralLine>,
    pub settings: TransmissionSettings,
}

impl TransmissionEngine {
    pub fn new(
        lines: Vec<SpectralLine>,
        settings: TransmissionSettings,
    ) -> Result<Self, TransitError> {
        if lines.is_empty() {
            return Err(TransitError::NoLines);
        }
        for line in &lines {
            line.validate()?;
        }
        settings.validate()?;
        Ok(Self { lines, settings })
    }

    pub fn lines(&self) -> &[SpectralLine] {
        &self.lines
    }

    /// Evenly spaced wavelengths across every line window, merged in order.
    pub fn wavelength_grid(&self, points_per_line: usize) -> Vec<f64> {
        let points = points_per_line.max(2);
        let mut grid: Vec<f64> = Vec::with_capacity(points * self.lines.len());
        for line in &self.lines {
            let (lo, hi) = line.range_angstrom();
            let step = (hi - lo) / (points - 1) as f64;
            grid.extend((0..points).map(|i| lo + step * i as f64));
        }
        grid.sort_by(f64::total_cmp);
        grid.dedup();
        grid
    }

    /// Reject wavelengths that no configured line models.
    pub fn check_wavelengths(&self, wavelength_angstrom: &[f64]) -> Result<(), TransitError> {
        if wavelength_angstrom.is_empty() {
            return Err(DomainError::GridTooShort { points: 0 }.into());
        }
        for &w in wavelength_angstrom {
            if !w.is_finite() || !self.lines.iter().any(|line| line.covers(w)) {
                return Err(TransitError::WavelengthOutOfRange {
                    wavelength_angstrom: w,
                });
            }
        }
        Ok(())
    }

    /// Chord optical depths on a geometric impact grid from the planet radius to the cutoff.
    pub fn optical_depth_map(
        &self,
        atmosphere: &AtmosphericStructure,
        state: &IonizationState,
        geometry: &TransitGeometry,
        wavelength_angstrom: &[f64],
        impact_points: usize,
    ) -> Result<OpticalDepthMap, TransitError> {
        atmosphere.validate()?;
        self.check_wavelengths(wavelength_angstrom)?;
        let cutoff = geometry.cutoff_for(atmosphere)?;
        let absorbers = self.absorbers(atmosphere, state)?;
        let impact = impact_grid(geometry.planet_radius_cm, cutoff, impact_points.max(2));
        Ok(OpticalDepthMap::compute(
            &absorbers,
            impact,
            wavelength_angstrom,
            cutoff,
            self.settings.chord_points,
            self.settings.chord(),
        ))
    }

    /// Transmission spectrum with the disk quadrature refined to `disk_tolerance`.
    pub fn spectrum(
        &self,
        atmosphere: &AtmosphericStructure,
        state: &IonizationState,
        geometry: &TransitGeometry,
        wavelength_angstrom: &[f64],
    ) -> Result<TransmissionSpectrum, TransitError> {
        atmosphere.validate()?;
        self.check_wavelengths(wavelength_angstrom)?;
        let cutoff = geometry.cutoff_for(atmosphere)?;
        let absorbers = self.absorbers(atmosphere, state)?;
        let disk_depth = geometry.planet_disk_depth();

        let map_at = |points: usize| {
            OpticalDepthMap::compute(
                &absorbers,
                impact_grid(geometry.planet_radius_cm, cutoff, points),
                wavelength_angstrom,
                cutoff,
                self.settings.chord_points,
                self.settings.chord(),
            )
        };

        let mut points = self.settings.impact_points;
        let coarse = map_at(points);
        let edge = edge_optical_depth(&coarse);
        let opaque_edge = edge.0 > self.settings.edge_optical_depth;
        if opaque_edge {
            warn!(
                "optical depth {:.3e} at {} Å just inside the cutoff radius {:.4e} cm; absorption is truncated there",
                edge.0, wavelength_angstrom[edge.1], cutoff
            );
        }
        let mut accepted = disk_absorption(&coarse, geometry.stellar_radius_cm);
        let mut refinements = 0;
        while refinements < self.settings.max_refinements {
            let finer_points = 2 * points - 1;
            let finer = disk_absorption(&map_at(finer_points), geometry.stellar_radius_cm);
            let (change, worst) = relative_change(&accepted, &finer);
            refinements += 1;
            points = finer_points;
            accepted = finer;
            debug!(
                "disk refinement {}: {} impact parameters, relative change {:.3e}",
                refinements, points, change
            );
            if change < self.settings.disk_tolerance {
                break;
            }
            if refinements == self.settings.max_refinements {
                if opaque_edge {
                    return Err(TransitError::OpaqueCutoff {
                        cutoff_radius_cm: cutoff,
                        optical_depth: edge.0,
                        wavelength_angstrom: wavelength_angstrom[edge.1],
                    });
                }
                return Err(TransitError::DiskIntegrationDiverged {
                    wavelength_angstrom: wavelength_angstrom[worst],
                    relative_change: change,
                    refinements,
                });
            }
        }
        Ok(assemble(
            wavelength_angstrom,
            accepted,
            disk_depth,
            points,
            refinements,
        ))
    }

    /// Relative stellar flux at each orbital phase and wavelength.
    ///
    /// `impact_parameter` is the projected offset of the planet from the stellar
    /// equator in stellar radii. The chord optical depths use the impact grid
    /// that [`TransmissionEngine::spectrum`] accepts for the same wavelengths.
    #[allow(clippy::too_many_arguments)]
    pub fn light_curve(
        &self,
        atmosphere: &AtmosphericStructure,
        state: &IonizationState,
        geometry: &TransitGeometry,
        wavelength_angstrom: &[f64],
        map: &TransitMap,
        impact_parameter: f64,
        phases: &[f64],
    ) -> Result<LightCurve, TransitError> {
        if !(impact_parameter.is_finite() && impact_parameter >= 0.0) {
            return Err(TransitError::InvalidGeometry(format!(
                "impact parameter {impact_parameter} must be finite and non-negative"
            )));
        }
        let spectrum = self.spectrum(atmosphere, state, geometry, wavelength_angstrom)?;
        let depth = self.optical_depth_map(
            atmosphere,
            state,
            geometry,
            wavelength_angstrom,
            spectrum.impact_points,
        )?;
        let mut flux = Vec::with_capacity(phases.len());
        for &phase in phases {
            if !phase.is_finite() {
                return Err(TransitError::InvalidGeometry(format!(
                    "orbital phase {phase} is not finite"
                )));
            }
            flux.push(map.relative_flux(geometry, &depth, phase, impact_parameter));
        }
        Ok(LightCurve {
            phases: phases.to_vec(),
            wavelength_angstrom: wavelength_angstrom.to_vec(),
            flux,
            impact_points: spectrum.impact_points,
        })
    }

    fn absorbers<'a>(
        &'a self,
        atmosphere: &'a AtmosphericStructure,
        state: &IonizationState,
    ) -> Result<Vec<LineAbsorber<'a>>, DomainError> {
        self.lines
            .iter()
            .map(|line| LineAbsorber::new(line, atmosphere, state))
            .collect()
    }
}

/// Impact parameters with ln b = ln R_p + ln(R_cut / R_p) s (2 − s) for evenly spaced s.
///
/// Spacing is geometric at the planet and shrinks quadratically towards the
/// cutoff, so √(R_cut − b) is evenly spaced where the chords shorten to zero.
fn impact_grid(inner_cm: f64, outer_cm: f64, points: usize) -> Vec<f64> {
    let span = (outer_cm / inner_cm).ln();
    let last = (points - 1) as f64;
    let mut grid: Vec<f64> = (0..points)
        .map(|i| {
            let s = i as f64 / last;
            inner_cm * (span * s * (2.0 - s)).exp()
        })
        .collect();
    grid[0] = inner_cm;
    grid[points - 1] = outer_cm;
    grid
}

/// Largest optical depth on the outermost chord inside the cutoff, and its wavelength index.
fn edge_optical_depth(map: &OpticalDepthMap) -> (f64, usize) {
    let row = map.impact_cm.len().saturating_sub(2);
    map.tau[row]
        .iter()
        .copied()
        .enumerate()
        .fold((0.0, 0), |acc, (j, tau)| if tau > acc.0 { (tau, j) } else { acc })
}

/// ∫ (1 − e^{−τ}) 2πb db / (π R*²) for every wavelength of `map`.
fn disk_absorption(map: &OpticalDepthMap, stellar_radius_cm: f64) -> Vec<f64> {
    let stellar_area = PI * stellar_radius_cm * stellar_radius_cm;
    (0..map.wavelength_angstrom.len())
        .map(|j| {
            let integrand: Vec<f64> = map
                .impact_cm
                .iter()
                .zip(&map.tau)
                .map(|(b, row)| -(-row[j]).exp_m1() * 2.0 * PI * b)
                .collect();
            trapezoid(&map.impact_cm, &integrand) / stellar_area
        })
        .collect()
}

/// Largest change between two spectra relative to the finer one's peak, and its index.
fn relative_change(coarse: &[f64], fine: &[f64]) -> (f64, usize) {
    let peak = fine.iter().fold(0.0_f64, |acc, a| acc.max(a.abs()));
    if peak == 0.0 {
        return (0.0, 0);
    }
    let mut worst = (0.0, 0);
    for (j, (a, b)) in coarse.iter().zip(fine).enumerate() {
        let change = (a - b).abs() / peak;
        if change > worst.0 {
            worst = (change, j);
        }
    }
    worst
}

fn assemble(
    wavelength_angstrom: &[f64],
    absorption: Vec<f64>,
    planet_disk_depth: f64,
    impact_points: usize,
    refinements: usize,
) -> TransmissionSpectrum {
    let points = wavelength_angstrom
        .iter()
        .zip(absorption)
        .map(|(&w, a)| SpectrumPoint {
            wavelength_angstrom: w,
            absorption: a,
            transit_depth: planet_disk_depth + a,
        })
        .collect();
    TransmissionSpectrum {
        points,
        planet_disk_depth,
        impact_points,
        refinements,
    }
}
