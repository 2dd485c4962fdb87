//! Fixed-point coupling of the Parker wind and the ionization balance.
//!
//! The wind needs the mean molecular weight, which depends on the ionization
//! state, which in turn depends on the wind density. Each pass solves the wind
//! with the (relaxed) molecular weight of the previous pass, then the
//! ionization on the new wind, until the ionization fractions stop changing.

use std::sync::Arc;

use log::{debug, info};
use thiserror::Error;
use wind_core::{AtmosphericStructure, Composition, DomainError, IonizationState, RadialGrid};
use wind_hydro::{
    MolecularWeight, Normalization, ParkerWindSolver, TemperatureProfile, WindError,
    WindParameters, WindSolution,
};
use wind_ionization::{IonizationBalanceSolver, IonizationError, IonizationSolution};

/// Controls of the outer fixed-point loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationSettings {
    /// Converged once the max relative change of the fractions drops below this.
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Weight ω of the new molecular weight, μ ← (1 − ω) μ + ω μ_new.
    pub relaxation: f64,
    /// Molecular weight assumed before any ionization state exists.
    pub initial_mean_molecular_weight: f64,
    /// Fractions below this are compared absolutely rather than relatively.
    pub fraction_floor: f64,
}

impl Default for IterationSettings {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-6,
            max_iterations: 50,
            relaxation: 0.5,
            initial_mean_molecular_weight: 1.0,
            fraction_floor: 1.0e-6,
        }
    }
}

impl IterationSettings {
    fn validate(&self) -> Result<(), DomainError> {
        DomainError::require_positive("iteration tolerance", self.tolerance)?;
        DomainError::require_positive(
            "initial mean molecular weight",
            self.initial_mean_molecular_weight,
        )?;
        DomainError::require_positive("fraction floor", self.fraction_floor)?;
        if !(self.relaxation > 0.0 && self.relaxation <= 1.0) {
            return Err(DomainError::NonPositive {
                quantity: "relaxation factor in (0, 1]",
                value: self.relaxation,
            });
        }
        if self.max_iterations == 0 {
            return Err(DomainError::NonPositive {
                quantity: "maximum iteration count",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Physical definition of one self-consistent structure.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureProblem {
    pub grid: Arc<RadialGrid>,
    pub planet_mass_g: f64,
    pub temperature: TemperatureProfile,
    pub normalization: Normalization,
    pub composition: Composition,
}

/// Bookkeeping of the fixed-point loop together with the current iterate.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceState {
    pub iteration: usize,
    /// Residual of the latest iteration; infinite until two iterates exist.
    pub residual: f64,
    pub residual_history: Vec<f64>,
    /// Molecular weight fed to the next wind solve.
    pub molecular_weight: MolecularWeight,
    /// Velocity of the current iterate, weighting the next closure.
    pub velocity_cm_s: Option<Vec<f64>>,
    /// Ionization state of the current iterate, the reference of the next residual.
    pub ionization: Option<IonizationState>,
}

impl ConvergenceState {
    /// Nothing solved yet; the wind starts from a uniform molecular weight.
    pub fn cold(initial_mean_molecular_weight: f64) -> Self {
        Self {
            iteration: 0,
            residual: f64::INFINITY,
            residual_history: Vec::new(),
            molecular_weight: MolecularWeight::Uniform(initial_mean_molecular_weight),
            velocity_cm_s: None,
            ionization: None,
        }
    }

    /// Resume from the profiles of an earlier solution.
    pub fn seeded(seed: &StructureSolution) -> Self {
        Self {
            molecular_weight: MolecularWeight::Profile(seed.molecular_weight.clone()),
            velocity_cm_s: Some(seed.atmosphere.velocity_cm_s.clone()),
            ionization: Some(seed.ionization.state.clone()),
            ..Self::cold(1.0)
        }
    }

    /// Record a new ionization state and return its residual against the current one.
    fn record(&mut self, state: &IonizationState, floor: f64) -> f64 {
        let residual = self
            .ionization
            .as_ref()
            .map_or(f64::INFINITY, |prev| state.max_relative_change(prev, floor));
        self.iteration += 1;
        self.residual = residual;
        self.residual_history.push(residual);
        residual
    }

    /// Molecular weight profile used by the latest wind solve.
    fn used_weight(&self, points: usize) -> Vec<f64> {
        match &self.molecular_weight {
            MolecularWeight::Uniform(mu) => vec![*mu; points],
            MolecularWeight::Profile(mu) => mu.clone(),
        }
    }

    /// Move to the next iterate, relaxing the molecular weight towards `ionization`'s.
    fn advance(&mut self, wind: &WindSolution, ionization: IonizationState, relaxation: f64) {
        let used = self.used_weight(wind.grid.len());
        let target = ionization.mean_molecular_weight_profile();
        let relaxed = used
            .iter()
            .zip(&target)
            .map(|(old, new)| (1.0 - relaxation) * old + relaxation * new)
            .collect();
        self.molecular_weight = MolecularWeight::Profile(relaxed);
        self.velocity_cm_s = Some(wind.velocity_cm_s.clone());
        self.ionization = Some(ionization);
    }

    pub fn is_converged(&self, tolerance: f64) -> bool {
        self.residual.is_finite() && self.residual < tolerance
    }
}

/// Summary of a structure solve.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureDiagnostics {
    pub sonic_radius_cm: f64,
    pub sound_speed_cm_s: f64,
    pub mass_loss_rate_g_s: f64,
    /// Effective molecular weight of the isothermal closure.
    pub mean_molecular_weight: f64,
    pub iterations: usize,
    pub residual: f64,
    pub residual_history: Vec<f64>,
    pub sonic_in_domain: bool,
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureSolution {
    pub atmosphere: AtmosphericStructure,
    pub wind: WindSolution,
    pub ionization: IonizationSolution,
    /// Molecular weight profile fed to the final wind solve.
    pub molecular_weight: Vec<f64>,
    pub diagnostics: StructureDiagnostics,
}

/// Last iterate of a loop that ran out of iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct NonConvergence {
    pub last_iterate: StructureSolution,
    pub residual: f64,
    pub iterations: usize,
}

impl NonConvergence {
    /// Accept the approximate structure.
    pub fn into_last_iterate(self) -> StructureSolution {
        self.last_iterate
    }
}

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("invalid structure input: {0}")]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Wind(#[from] WindError),
    #[error(transparent)]
    Ionization(#[from] IonizationError),
    #[error(
        "structure iteration did not converge after {} iterations (residual {:.3e})",
        .0.iterations,
        .0.residual
    )]
    NotConverged(Box<NonConvergence>),
}

/// Alternates [`ParkerWindSolver`] and [`IonizationBalanceSolver`] to a fixed point.
#[derive(Debug, Clone)]
pub struct StructureIterator {
    pub wind: ParkerWindSolver,
    pub ionization: IonizationBalanceSolver,
    pub settings: IterationSettings,
}

impl StructureIterator {
    pub fn new(
        wind: ParkerWindSolver,
        ionization: IonizationBalanceSolver,
        settings: IterationSettings,
    ) -> Self {
        Self {
            wind,
            ionization,
            settings,
        }
    }

    /// Iterate from a uniform initial molecular weight.
    pub fn solve(&self, problem: &StructureProblem) -> Result<StructureSolution, StructureError> {
        self.solve_from(problem, None)
    }

    /// Iterate starting from a previous solution of the same problem.
    ///
    /// The seed supplies the molecular weight profile, the velocity used by the
    /// closure weighting, and the reference ionization state for the first
    /// residual.
    pub fn solve_from(
        &self,
        problem: &StructureProblem,
        seed: Option<&StructureSolution>,
    ) -> Result<StructureSolution, StructureError> {
        self.settings.validate()?;
        problem.composition.validate()?;
        let settings = &self.settings;
        let n = problem.grid.len();

        let mut state = match seed {
            Some(s) => {
                problem.grid.check_len("seed molecular weight", s.molecular_weight.len())?;
                ConvergenceState::seeded(s)
            }
            None => ConvergenceState::cold(settings.initial_mean_molecular_weight),
        };

        loop {
            let params = WindParameters {
                planet_mass_g: problem.planet_mass_g,
                temperature: problem.temperature.clone(),
                molecular_weight: state.molecular_weight.clone(),
                normalization: problem.normalization,
            };
            let wind = self
                .wind
                .solve(&problem.grid, &params, state.velocity_cm_s.as_deref())?;
            let atmosphere = wind.to_structure(problem.composition);
            let ionization = self.ionization.solve(&atmosphere)?;

            let residual = state.record(&ionization.state, settings.fraction_floor);
            debug!(
                "structure iteration {}: residual {:.3e}, r_s = {:.4e} cm, mu = {:.4}",
                state.iteration, residual, wind.sonic.radius_cm, wind.mean_molecular_weight
            );

            let converged = state.is_converged(settings.tolerance);
            if converged || state.iteration >= settings.max_iterations {
                let used_weight = state.used_weight(n);
                let solution = assemble(atmosphere, wind, ionization, used_weight, &state, converged);
                if converged {
                    info!(
                        "structure converged after {} iterations (residual {:.3e})",
                        state.iteration, state.residual
                    );
                    return Ok(solution);
                }
                return Err(StructureError::NotConverged(Box::new(NonConvergence {
                    last_iterate: solution,
                    residual: state.residual,
                    iterations: state.iteration,
                })));
            }

            state.advance(&wind, ionization.state, settings.relaxation);
        }
    }
}

fn assemble(
    atmosphere: AtmosphericStructure,
    wind: WindSolution,
    ionization: IonizationSolution,
    molecular_weight: Vec<f64>,
    state: &ConvergenceState,
    converged: bool,
) -> StructureSolution {
    let diagnostics = StructureDiagnostics {
        sonic_radius_cm: wind.sonic.radius_cm,
        sound_speed_cm_s: wind.sonic.sound_speed_cm_s,
        mass_loss_rate_g_s: wind.mass_loss_rate_g_s,
        mean_molecular_weight: wind.mean_molecular_weight,
        iterations: state.iteration,
        residual: state.residual,
        residual_history: state.residual_history.clone(),
        sonic_in_domain: wind.sonic_in_domain,
        converged,
    };
    StructureSolution {
        atmosphere,
        wind,
        ionization,
        molecular_weight,
        diagnostics,
    }
}
