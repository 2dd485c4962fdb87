//! Steady-state ionization of an escaping hydrogen/helium atmosphere.
//!
//! Ionizing photons arrive from the star, so the column of absorbers is
//! accumulated from the outer boundary inwards. At each radius the locally
//! attenuated photoionization rates are balanced against case-B recombination.

pub mod atomic;
mod balance;
pub mod spectrum;

use std::sync::Arc;

use log::{debug, warn};
use thiserror::Error;
use wind_core::constants::{ANGSTROM_CM, C, H};
use wind_core::math::trapezoid_weights;
use wind_core::{
    AtmosphericStructure, Composition, DomainError, HeliumStages, HydrogenStages, Ion,
    IonizationState, RootFindError,
};

pub use atomic::{ABSORBERS, AtomicData, RecombinationLaw, StandardAtomicData};
pub use spectrum::StellarSpectrum;

use balance::{LocalRates, solve_local};

/// Optical depths beyond this are treated as fully opaque.
pub const MAX_OPTICAL_DEPTH: f64 = 700.0;

#[derive(Debug, Error)]
pub enum IonizationError {
    #[error("invalid ionization input: {0}")]
    Domain(#[from] DomainError),
    #[error("ionization balance failed at r = {radius_cm:.6e} cm: {source}")]
    RootFind {
        radius_cm: f64,
        #[source]
        source: RootFindError,
    },
}

/// Photon-number weights and cross-sections on the ionizing part of a spectrum.
///
/// Built once per solve session and shared read-only by every iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoionizationTable {
    wavelength_angstrom: Vec<f64>,
    /// Photons s⁻¹ cm⁻² carried by each spectral bin.
    photon_weight: Vec<f64>,
    /// Cross-sections (cm²) of [`ABSORBERS`] per bin.
    cross_section_cm2: [Vec<f64>; 3],
}

impl PhotoionizationTable {
    pub fn new(
        spectrum: &StellarSpectrum,
        atomic: &dyn AtomicData,
        composition: Composition,
    ) -> Result<Self, DomainError> {
        composition.validate()?;
        let wavelengths = spectrum.wavelength_angstrom();
        let bin_width = trapezoid_weights(wavelengths);
        let mut table = Self {
            wavelength_angstrom: Vec::new(),
            photon_weight: Vec::new(),
            cross_section_cm2: [Vec::new(), Vec::new(), Vec::new()],
        };
        let with_helium = matches!(composition, Composition::HydrogenHelium { .. });
        for (j, &w) in wavelengths.iter().enumerate() {
            let sigma = ABSORBERS.map(|ion| {
                if ion == Ion::HI || with_helium {
                    atomic.photoionization_cross_section(ion, w)
                } else {
                    0.0
                }
            });
            if sigma.iter().all(|s| *s <= 0.0) {
                continue;
            }
            let photon_energy = H * C / (w * ANGSTROM_CM);
            table.wavelength_angstrom.push(w);
            table
                .photon_weight
                .push(spectrum.flux()[j] * bin_width[j] / photon_energy);
            for (k, s) in sigma.into_iter().enumerate() {
                table.cross_section_cm2[k].push(s);
            }
        }
        if table.photon_weight.iter().all(|w| *w <= 0.0) {
            warn!("stellar spectrum carries no ionizing photons; the atmosphere stays neutral");
        }
        Ok(table)
    }

    pub fn wavelength_angstrom(&self) -> &[f64] {
        &self.wavelength_angstrom
    }

    /// Photoionization rates (s⁻¹) of [`ABSORBERS`] behind the given columns (cm⁻²).
    pub fn rates(&self, columns_cm2: [f64; 3]) -> [f64; 3] {
        let mut rates = [0.0; 3];
        for j in 0..self.photon_weight.len() {
            let tau: f64 = (0..3)
                .map(|k| self.cross_section_cm2[k][j] * columns_cm2[k])
                .sum();
            let attenuated = self.photon_weight[j] * (-tau.min(MAX_OPTICAL_DEPTH)).exp();
            for (k, rate) in rates.iter_mut().enumerate() {
                *rate += attenuated * self.cross_section_cm2[k][j];
            }
        }
        rates
    }
}

/// Tolerances for the per-radius electron-density root search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceSettings {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for BalanceSettings {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-12,
            max_iterations: 200,
        }
    }
}

/// Ionization profile together with the radiation field that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct IonizationSolution {
    pub state: IonizationState,
    /// Columns of H I, He I, He II between each radius and the star (cm⁻²).
    pub column_density_cm2: Vec<[f64; 3]>,
    /// Attenuated photoionization rates of H I, He I, He II (s⁻¹).
    pub photoionization_rate_s: Vec<[f64; 3]>,
    pub electron_density_cm3: Vec<f64>,
}

/// Outside-in photoionization equilibrium solver.
#[derive(Clone)]
pub struct IonizationBalanceSolver {
    table: Arc<PhotoionizationTable>,
    atomic: Arc<dyn AtomicData>,
    composition: Composition,
    pub settings: BalanceSettings,
}

impl std::fmt::Debug for IonizationBalanceSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IonizationBalanceSolver")
            .field("bins", &self.table.photon_weight.len())
            .field("composition", &self.composition)
            .field("settings", &self.settings)
            .finish()
    }
}

impl IonizationBalanceSolver {
    pub fn new(
        spectrum: &StellarSpectrum,
        atomic: Arc<dyn AtomicData>,
        composition: Composition,
        settings: BalanceSettings,
    ) -> Result<Self, DomainError> {
        let table = PhotoionizationTable::new(spectrum, atomic.as_ref(), composition)?;
        Ok(Self {
            table: Arc::new(table),
            atomic,
            composition,
            settings,
        })
    }

    pub fn composition(&self) -> Composition {
        self.composition
    }

    pub fn table(&self) -> &PhotoionizationTable {
        &self.table
    }

    /// Ionization fractions for the density and temperature of `atmosphere`.
    pub fn solve(
        &self,
        atmosphere: &AtmosphericStructure,
    ) -> Result<IonizationSolution, IonizationError> {
        atmosphere.validate()?;
        if atmosphere.composition != self.composition {
            return Err(DomainError::CompositionMismatch(
                "atmosphere composition differs from the photoionization table",
            )
            .into());
        }
        let radii = atmosphere.grid.radii();
        let n = radii.len();
        let y = atmosphere.composition.helium_per_hydrogen();

        let mut hydrogen = vec![HydrogenStages::NEUTRAL; n];
        let mut helium = vec![HeliumStages::NEUTRAL; n];
        let mut columns = vec![[0.0; 3]; n];
        let mut rates = vec![[0.0; 3]; n];
        let mut electrons = vec![0.0; n];

        let outer = n - 1;
        let local = self.balance_at(atmosphere, outer, [0.0; 3])?;
        hydrogen[outer] = local.0;
        helium[outer] = local.1;
        rates[outer] = local.2;
        electrons[outer] = local.3;

        for i in (0..outer).rev() {
            let dr = radii[i + 1] - radii[i];
            let n_h = atmosphere.hydrogen_density(i);
            let outer_absorbers = absorber_densities(
                atmosphere.hydrogen_density(i + 1),
                y,
                &hydrogen[i + 1],
                &helium[i + 1],
            );

            // predictor: the shell carries the outer neighbour's absorbers
            let predicted = add_columns(columns[i + 1], outer_absorbers, dr);
            let (h_pred, he_pred, _, _) = self.balance_at(atmosphere, i, predicted)?;
            let local_absorbers = absorber_densities(n_h, y, &h_pred, &he_pred);

            // corrector: trapezoid over the shell with the predicted local state
            let mut corrected = columns[i + 1];
            for k in 0..3 {
                corrected[k] += 0.5 * (outer_absorbers[k] + local_absorbers[k]) * dr;
            }
            let local = self.balance_at(atmosphere, i, corrected)?;
            columns[i] = corrected;
            hydrogen[i] = local.0;
            helium[i] = local.1;
            rates[i] = local.2;
            electrons[i] = local.3;
        }

        let state = match atmosphere.composition {
            Composition::Hydrogen => IonizationState::Hydrogen { hydrogen },
            Composition::HydrogenHelium { he_to_h } => IonizationState::HydrogenHelium {
                he_to_h,
                hydrogen,
                helium,
            },
        };
        debug!(
            "ionization sweep: ionized H fraction {:.4} at the base, {:.4} at the outer edge",
            state.fraction(Ion::HII, 0),
            state.fraction(Ion::HII, outer)
        );
        Ok(IonizationSolution {
            state,
            column_density_cm2: columns,
            photoionization_rate_s: rates,
            electron_density_cm3: electrons,
        })
    }

    fn balance_at(
        &self,
        atmosphere: &AtmosphericStructure,
        i: usize,
        columns_cm2: [f64; 3],
    ) -> Result<(HydrogenStages, HeliumStages, [f64; 3], f64), IonizationError> {
        let temperature = atmosphere.temperature_k[i];
        let photoionization = self.table.rates(columns_cm2);
        let recombination = [Ion::HII, Ion::HeII, Ion::HeIII]
            .map(|ion| self.atomic.recombination_coefficient(ion, temperature));
        let rates = LocalRates {
            photoionization,
            recombination,
        };
        let balance = solve_local(
            atmosphere.hydrogen_density(i),
            atmosphere.composition.helium_per_hydrogen(),
            &rates,
            self.settings.tolerance,
            self.settings.max_iterations,
        )
        .map_err(|source| IonizationError::RootFind {
            radius_cm: atmosphere.grid.radii()[i],
            source,
        })?;
        Ok((
            balance.hydrogen,
            balance.helium,
            photoionization,
            balance.electron_density_cm3,
        ))
    }
}

fn absorber_densities(
    hydrogen_density: f64,
    helium_per_hydrogen: f64,
    hydrogen: &HydrogenStages,
    helium: &HeliumStages,
) -> [f64; 3] {
    let n_he = hydrogen_density * helium_per_hydrogen;
    [
        hydrogen_density * hydrogen.neutral,
        n_he * helium.neutral,
        n_he * helium.single,
    ]
}

fn add_columns(columns: [f64; 3], densities: [f64; 3], path_cm: f64) -> [f64; 3] {
    let mut out = columns;
    for k in 0..3 {
        out[k] += densities[k] * path_cm;
    }
    out
}
