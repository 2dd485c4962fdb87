//! Pixelated stellar disk for phase-resolved transit light curves.

use wind_core::DomainError;

use crate::{OpticalDepthMap, TransitError, TransitGeometry};

/// Uniformly bright stellar disk on a square pixel grid, normalised to unit flux.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitMap {
    grid_size: usize,
    star_radius_px: f64,
    /// Pixel fluxes, row-major; zero outside the stellar disk.
    flux: Vec<f64>,
}

impl TransitMap {
    pub fn new(grid_size: usize) -> Result<Self, TransitError> {
        if grid_size < 3 {
            return Err(DomainError::GridTooShort { points: grid_size }.into());
        }
        let star_radius_px = grid_size as f64 / 2.0;
        let mut flux = vec![0.0; grid_size * grid_size];
        let mut lit = 0usize;
        for iy in 0..grid_size {
            for ix in 0..grid_size {
                let (dx, dy) = pixel_offset(ix, iy, star_radius_px);
                if dx * dx + dy * dy <= star_radius_px * star_radius_px {
                    flux[iy * grid_size + ix] = 1.0;
                    lit += 1;
                }
            }
        }
        let norm = 1.0 / lit as f64;
        flux.iter_mut().for_each(|f| *f *= norm);
        Ok(Self {
            grid_size,
            star_radius_px,
            flux,
        })
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Pixel fluxes, row-major.
    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn total_flux(&self) -> f64 {
        self.flux.iter().sum()
    }

    /// Stellar flux left with the planet at `phase`, one value per map wavelength.
    ///
    /// Phases of −0.5, 0 and +0.5 place the planet centre on the left limb, the
    /// disk centre, and the right limb respectively; `impact_parameter` is in
    /// stellar radii.
    pub fn relative_flux(
        &self,
        geometry: &TransitGeometry,
        depth: &OpticalDepthMap,
        phase: f64,
        impact_parameter: f64,
    ) -> Vec<f64> {
        let n = self.grid_size;
        let px_cm = geometry.stellar_radius_cm / self.star_radius_px;
        let planet_x = phase * n as f64;
        let planet_y = impact_parameter * self.star_radius_px;

        let mut total = vec![0.0; depth.wavelength_angstrom.len()];
        let mut tau = vec![0.0; total.len()];
        for iy in 0..n {
            for ix in 0..n {
                let f = self.flux[iy * n + ix];
                if f == 0.0 {
                    continue;
                }
                let (dx, dy) = pixel_offset(ix, iy, self.star_radius_px);
                let r_cm = (dx - planet_x).hypot(dy - planet_y) * px_cm;
                if r_cm < geometry.planet_radius_cm {
                    continue;
                }
                if r_cm >= depth.cutoff_radius_cm {
                    total.iter_mut().for_each(|t| *t += f);
                    continue;
                }
                depth.fill_at(r_cm, &mut tau);
                for (t, tau_j) in total.iter_mut().zip(&tau) {
                    *t += f * (-tau_j).exp();
                }
            }
        }
        total
    }
}

/// Offset of a pixel centre from the grid centre, in pixels.
fn pixel_offset(ix: usize, iy: usize, centre: f64) -> (f64, f64) {
    (ix as f64 + 0.5 - centre, iy as f64 + 0.5 - centre)
}

/// Relative flux per orbital phase (rows) and wavelength (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct LightCurve {
    pub phases: Vec<f64>,
    pub wavelength_angstrom: Vec<f64>,
    pub flux: Vec<Vec<f64>>,
    /// Impact parameters of the chord optical depth map behind the curve.
    pub impact_points: usize,
}

impl LightCurve {
    /// Flux at every phase for wavelength index `j`.
    pub fn at_wavelength(&self, j: usize) -> Vec<f64> {
        self.flux.iter().map(|row| row[j]).collect()
    }
}
