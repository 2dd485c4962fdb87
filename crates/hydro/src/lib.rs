//! Transonic Parker wind solver.
//!
//! The sonic point is placed analytically at r_s = GM / (2 c_s²); the velocity
//! at every other radius comes from the branch-aware root of the Parker
//! relation (see [`parker`]), and density follows from mass-flux conservation.

mod closure;
pub mod parker;

use std::f64::consts::PI;
use std::ops::Range;
use std::sync::Arc;

use log::{debug, warn};
use thiserror::Error;
use wind_core::{AtmosphericStructure, Composition, DomainError, RadialGrid, RootFindError};

pub use parker::{Branch, dimensionless_velocity, sonic_radius, sound_speed};

/// Temperature of the outflow.
#[derive(Debug, Clone, PartialEq)]
pub enum TemperatureProfile {
    Isothermal { temperature_k: f64 },
    /// One temperature per grid radius.
    Tabulated { temperature_k: Vec<f64> },
}

impl TemperatureProfile {
    /// Temperatures sampled on `grid`.
    pub fn on_grid(&self, grid: &RadialGrid) -> Result<Vec<f64>, DomainError> {
        let values = match self {
            TemperatureProfile::Isothermal { temperature_k } => {
                DomainError::require_positive("temperature", *temperature_k)?;
                vec![*temperature_k; grid.len()]
            }
            TemperatureProfile::Tabulated { temperature_k } => {
                grid.check_len("temperature profile", temperature_k.len())?;
                temperature_k.clone()
            }
        };
        for (t, r) in values.iter().zip(grid.radii()) {
            if !(t.is_finite() && *t > 0.0) {
                return Err(DomainError::NonPhysicalAt {
                    quantity: "temperature",
                    value: *t,
                    radius_cm: *r,
                });
            }
        }
        Ok(values)
    }

    fn uniform_value(&self) -> Option<f64> {
        match self {
            TemperatureProfile::Isothermal { temperature_k } => Some(*temperature_k),
            TemperatureProfile::Tabulated { .. } => None,
        }
    }
}

/// Mean molecular weight of the mixture, usually derived from the ionization state.
#[derive(Debug, Clone, PartialEq)]
pub enum MolecularWeight {
    Uniform(f64),
    Profile(Vec<f64>),
}

impl MolecularWeight {
    fn on_grid(&self, grid: &RadialGrid) -> Result<Vec<f64>, DomainError> {
        let values = match self {
            MolecularWeight::Uniform(mu) => vec![*mu; grid.len()],
            MolecularWeight::Profile(mu) => {
                grid.check_len("mean molecular weight profile", mu.len())?;
                mu.clone()
            }
        };
        for (mu, r) in values.iter().zip(grid.radii()) {
            if !(mu.is_finite() && *mu > 0.0) {
                return Err(DomainError::NonPhysicalAt {
                    quantity: "mean molecular weight",
                    value: *mu,
                    radius_cm: *r,
                });
            }
        }
        Ok(values)
    }
}

/// How the absolute density scale of the wind is fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalization {
    MassLossRate { g_s: f64 },
    /// Mass density at a reference radius.
    BaseDensity { radius_cm: f64, density_g_cm3: f64 },
}

/// Physical inputs of one wind solve.
#[derive(Debug, Clone, PartialEq)]
pub struct WindParameters {
    pub planet_mass_g: f64,
    pub temperature: TemperatureProfile,
    pub molecular_weight: MolecularWeight,
    pub normalization: Normalization,
}

/// Root-finding controls for the Parker relation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-13,
            max_iterations: 200,
        }
    }
}

/// Conditions at the critical point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SonicPoint {
    pub radius_cm: f64,
    pub sound_speed_cm_s: f64,
    pub density_g_cm3: f64,
    pub pressure_dyn_cm2: f64,
}

/// Contiguous grid indices lying on one branch of the solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSegment {
    pub branch: Branch,
    pub indices: Range<usize>,
}

/// Velocity and density of the transonic wind on a radial grid.
#[derive(Debug, Clone, PartialEq)]
pub struct WindSolution {
    pub grid: Arc<RadialGrid>,
    pub velocity_cm_s: Vec<f64>,
    pub density_g_cm3: Vec<f64>,
    pub temperature_k: Vec<f64>,
    pub sonic: SonicPoint,
    pub mass_loss_rate_g_s: f64,
    pub mean_molecular_weight: f64,
    /// Subsonic segment followed by the supersonic one; either may be empty.
    pub segments: Vec<BranchSegment>,
    pub sonic_in_domain: bool,
}

impl WindSolution {
    /// Package the profiles as an [`AtmosphericStructure`].
    pub fn to_structure(&self, composition: Composition) -> AtmosphericStructure {
        AtmosphericStructure {
            grid: Arc::clone(&self.grid),
            density_g_cm3: self.density_g_cm3.clone(),
            velocity_cm_s: self.velocity_cm_s.clone(),
            temperature_k: self.temperature_k.clone(),
            composition,
        }
    }

    /// v / c_s at every radius.
    pub fn mach_profile(&self) -> Vec<f64> {
        self.velocity_cm_s
            .iter()
            .map(|v| v / self.sonic.sound_speed_cm_s)
            .collect()
    }

    /// Gas pressure ρ c̄² (dyn cm⁻²) of the effective isothermal closure.
    pub fn pressure_profile(&self) -> Vec<f64> {
        let cs2 = self.sonic.sound_speed_cm_s * self.sonic.sound_speed_cm_s;
        self.density_g_cm3.iter().map(|rho| rho * cs2).collect()
    }
}

#[derive(Debug, Error)]
pub enum WindError {
    #[error("invalid wind input: {0}")]
    Domain(#[from] DomainError),
    #[error("Parker relation root search failed at r = {radius_cm:.6e} cm: {source}")]
    RootFind {
        radius_cm: f64,
        #[source]
        source: RootFindError,
    },
    #[error(
        "no transonic solution in domain: sonic radius {sonic_radius_cm:.6e} cm lies below the inner radius {inner_radius_cm:.6e} cm"
    )]
    NoTransonicSolution {
        sonic_radius_cm: f64,
        inner_radius_cm: f64,
    },
    #[error("wind profile overflowed at r = {radius_cm:.6e} cm (deep subsonic velocity underflow)")]
    NonFiniteProfile { radius_cm: f64 },
}

/// Isothermal Parker wind solver.
#[derive(Debug, Clone, Default)]
pub struct ParkerWindSolver {
    pub settings: SolverSettings,
}

impl ParkerWindSolver {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// Solve the transonic wind on `grid`.
    ///
    /// `previous_velocity_cm_s`, when given, weights the effective sound speed
    /// of non-uniform temperature or molecular-weight profiles by the kinetic
    /// energy of the previous iterate.
    pub fn solve(
        &self,
        grid: &Arc<RadialGrid>,
        params: &WindParameters,
        previous_velocity_cm_s: Option<&[f64]>,
    ) -> Result<WindSolution, WindError> {
        DomainError::require_positive("planet mass", params.planet_mass_g)?;
        let temperature = params.temperature.on_grid(grid)?;
        let mu = params.molecular_weight.on_grid(grid)?;
        if let Some(v) = previous_velocity_cm_s {
            grid.check_len("previous velocity", v.len())?;
        }

        let closure = match (params.temperature.uniform_value(), &params.molecular_weight) {
            (Some(t), MolecularWeight::Uniform(mu)) => closure::uniform(t, *mu),
            _ => closure::energy_weighted(
                grid.radii(),
                params.planet_mass_g,
                &temperature,
                &mu,
                previous_velocity_cm_s,
            ),
        };
        let cs = closure.sound_speed_cm_s;
        let r_s = sonic_radius(params.planet_mass_g, cs);

        if r_s < grid.inner() {
            return Err(WindError::NoTransonicSolution {
                sonic_radius_cm: r_s,
                inner_radius_cm: grid.inner(),
            });
        }
        let sonic_in_domain = r_s <= grid.outer();
        if !sonic_in_domain {
            warn!(
                "sonic radius {:.4e} cm lies beyond the outer radius {:.4e} cm; wind is subsonic throughout",
                r_s,
                grid.outer()
            );
        }

        let mut mach = Vec::with_capacity(grid.len());
        for &r in grid.radii() {
            let (u, _) = self.mach_at(r, r_s)?;
            mach.push(u);
        }

        let mass_loss_rate = match params.normalization {
            Normalization::MassLossRate { g_s } => {
                DomainError::require_positive("mass-loss rate", g_s)?
            }
            Normalization::BaseDensity {
                radius_cm,
                density_g_cm3,
            } => {
                DomainError::require_positive("reference radius", radius_cm)?;
                DomainError::require_positive("base density", density_g_cm3)?;
                let (u0, _) = self.mach_at(radius_cm, r_s)?;
                4.0 * PI * radius_cm * radius_cm * density_g_cm3 * u0 * cs
            }
        };

        let velocity: Vec<f64> = mach.iter().map(|u| u * cs).collect();
        let mut density = Vec::with_capacity(grid.len());
        for (&r, &v) in grid.radii().iter().zip(&velocity) {
            let rho = mass_loss_rate / (4.0 * PI * r * r * v);
            if !(rho.is_finite() && v > 0.0) {
                return Err(WindError::NonFiniteProfile { radius_cm: r });
            }
            density.push(rho);
        }

        let split = grid.radii().partition_point(|&r| r < r_s);
        let segments = vec![
            BranchSegment {
                branch: Branch::Subsonic,
                indices: 0..split,
            },
            BranchSegment {
                branch: Branch::Supersonic,
                indices: split..grid.len(),
            },
        ];

        let rho_s = mass_loss_rate / (4.0 * PI * r_s * r_s * cs);
        debug!(
            "parker wind: c_s = {:.4e} cm/s, r_s = {:.4e} cm, mdot = {:.4e} g/s, mu = {:.4}",
            cs, r_s, mass_loss_rate, closure.mean_molecular_weight
        );

        Ok(WindSolution {
            grid: Arc::clone(grid),
            velocity_cm_s: velocity,
            density_g_cm3: density,
            temperature_k: temperature,
            sonic: SonicPoint {
                radius_cm: r_s,
                sound_speed_cm_s: cs,
                density_g_cm3: rho_s,
                pressure_dyn_cm2: rho_s * cs * cs,
            },
            mass_loss_rate_g_s: mass_loss_rate,
            mean_molecular_weight: closure.mean_molecular_weight,
            segments,
            sonic_in_domain,
        })
    }

    fn mach_at(&self, radius_cm: f64, sonic_radius_cm: f64) -> Result<(f64, Branch), WindError> {
        dimensionless_velocity(
            radius_cm / sonic_radius_cm,
            self.settings.tolerance,
            self.settings.max_iterations,
        )
        .map_err(|source| WindError::RootFind { radius_cm, source })
    }
}
