//! Scenario pipeline: manifest → structure iteration → transmission.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use thiserror::Error;
use wind_config::{
    ConfigError, GridSpacing, LineConfig, LinePreset, NormalizationConfig, RecombinationConfig,
    ScenarioConfig, SpectrumConfig, load_spectrum_table,
};
use wind_core::units::{au_to_cm, jupiter_masses_to_g, jupiter_radii_to_cm, solar_radii_to_cm};
use wind_core::{Composition, DomainError, Ion, RadialGrid};
use wind_export::diagnostics::{Diagnostics, TransitSummary};
use wind_export::{
    light_curve as light_curve_csv, spectrum as spectrum_csv, structure as structure_csv,
};
use wind_ionization::{BalanceSettings, RecombinationLaw, StandardAtomicData, StellarSpectrum};
use wind_structure::{
    IonizationBalanceSolver, IterationSettings, Normalization, ParkerWindSolver, SolverSettings,
    StructureError, StructureIterator, StructureProblem, StructureSolution, TemperatureProfile,
};
use wind_transit::{
    LightCurve, SpectralLine, TransitError, TransitGeometry, TransitMap, TransmissionEngine,
    TransmissionSettings, TransmissionSpectrum,
};

pub use wind_config::{load_scenario, load_scenarios};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid scenario input: {0}")]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Structure(#[from] StructureError),
    #[error(transparent)]
    Transit(#[from] TransitError),
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
    #[error("unknown absorbing ion '{0}'")]
    UnknownIon(String),
}

pub fn planet_radius_cm(config: &ScenarioConfig) -> f64 {
    jupiter_radii_to_cm(config.planet.radius_jupiter)
}

pub fn radial_grid(config: &ScenarioConfig) -> Result<Arc<RadialGrid>, PipelineError> {
    let rp = planet_radius_cm(config);
    let inner = config.grid.inner_planet_radii * rp;
    let outer = config.grid.outer_planet_radii * rp;
    let grid = match config.grid.spacing {
        GridSpacing::Linear => RadialGrid::linear(inner, outer, config.grid.points)?,
        GridSpacing::Geometric => RadialGrid::geometric(inner, outer, config.grid.points)?,
    };
    Ok(Arc::new(grid))
}

pub fn composition(config: &ScenarioConfig) -> Composition {
    match config.wind.he_to_h {
        Some(he_to_h) => Composition::HydrogenHelium { he_to_h },
        None => Composition::Hydrogen,
    }
}

pub fn structure_problem(config: &ScenarioConfig) -> Result<StructureProblem, PipelineError> {
    let grid = radial_grid(config)?;
    let temperature = match &config.wind.temperature_profile_k {
        Some(profile) => TemperatureProfile::Tabulated {
            temperature_k: profile.clone(),
        },
        None => TemperatureProfile::Isothermal {
            temperature_k: config.wind.temperature_k,
        },
    };
    let normalization = match config.wind.normalization {
        NormalizationConfig::MassLossRate { g_s } => Normalization::MassLossRate { g_s },
        NormalizationConfig::BaseDensity {
            density_g_cm3,
            radius_planet_radii,
        } => Normalization::BaseDensity {
            radius_cm: radius_planet_radii * planet_radius_cm(config),
            density_g_cm3,
        },
    };
    Ok(StructureProblem {
        grid,
        planet_mass_g: jupiter_masses_to_g(config.planet.mass_jupiter),
        temperature,
        normalization,
        composition: composition(config),
    })
}

/// Irradiance at the planet's orbital distance.
pub fn stellar_spectrum(config: &ScenarioConfig) -> Result<StellarSpectrum, PipelineError> {
    match &config.spectrum {
        SpectrumConfig::Table { path, distance_au } => {
            let table = load_spectrum_table(path)?;
            let spectrum = StellarSpectrum::new(table.wavelength_angstrom, table.flux)?;
            Ok(spectrum.at_distance(
                au_to_cm(*distance_au),
                au_to_cm(config.planet.orbital_distance_au),
            )?)
        }
        SpectrumConfig::Flat {
            flux,
            min_angstrom,
            max_angstrom,
            points,
        } => Ok(StellarSpectrum::flat(
            *min_angstrom,
            *max_angstrom,
            *points,
            *flux,
        )?),
    }
}

pub fn atomic_data(config: &ScenarioConfig) -> StandardAtomicData {
    let law = |c: RecombinationConfig| RecombinationLaw {
        coefficient_cm3_s: c.coefficient_cm3_s,
        reference_temperature_k: c.reference_temperature_k,
        exponent: c.exponent,
    };
    let mut atomic = StandardAtomicData::default();
    if let Some(c) = config.atomic.hydrogen {
        atomic.hydrogen = law(c);
    }
    if let Some(c) = config.atomic.helium_single {
        atomic.helium_single = law(c);
    }
    if let Some(c) = config.atomic.helium_double {
        atomic.helium_double = law(c);
    }
    atomic
}

pub fn structure_iterator(config: &ScenarioConfig) -> Result<StructureIterator, PipelineError> {
    let spectrum = stellar_spectrum(config)?;
    info!(
        "{}: ionizing flux {:.3e} erg/s/cm^2 at the planet",
        config.name,
        spectrum.integrated_flux_below(911.8)
    );
    let balance = BalanceSettings {
        tolerance: config.solver.root_tolerance,
        ..BalanceSettings::default()
    };
    let ionization = IonizationBalanceSolver::new(
        &spectrum,
        Arc::new(atomic_data(config)),
        composition(config),
        balance,
    )?;
    let settings = IterationSettings {
        tolerance: config.solver.tolerance,
        max_iterations: config.solver.max_iterations,
        relaxation: config.solver.relaxation,
        initial_mean_molecular_weight: config.solver.initial_mean_molecular_weight,
        ..IterationSettings::default()
    };
    Ok(StructureIterator::new(
        ParkerWindSolver::new(SolverSettings::default()),
        ionization,
        settings,
    ))
}

/// Run the structure iteration; an unconverged last iterate is kept only when
/// `accept_unconverged` is set.
pub fn solve_structure(
    config: &ScenarioConfig,
    accept_unconverged: bool,
) -> Result<StructureSolution, PipelineError> {
    let problem = structure_problem(config)?;
    let iterator = structure_iterator(config)?;
    match iterator.solve(&problem) {
        Ok(solution) => {
            info!(
                "{}: sonic radius {:.3} R_p, mass-loss rate {:.3e} g/s",
                config.name,
                solution.diagnostics.sonic_radius_cm / planet_radius_cm(config),
                solution.diagnostics.mass_loss_rate_g_s
            );
            Ok(solution)
        }
        Err(StructureError::NotConverged(report)) if accept_unconverged => {
            warn!(
                "{}: accepting unconverged structure after {} iterations (residual {:.3e})",
                config.name, report.iterations, report.residual
            );
            Ok(report.into_last_iterate())
        }
        Err(err) => Err(err.into()),
    }
}

pub fn spectral_lines(config: &ScenarioConfig) -> Result<Vec<SpectralLine>, PipelineError> {
    config
        .lines
        .iter()
        .map(|line| match line {
            LineConfig::Preset {
                preset,
                window_angstrom,
            } => {
                let mut line = match preset {
                    LinePreset::LymanAlpha => SpectralLine::lyman_alpha(),
                    LinePreset::HeliumII304 => SpectralLine::helium_ii_304(),
                };
                if let Some(window) = window_angstrom {
                    line.window_angstrom = *window;
                }
                Ok(line)
            }
            LineConfig::Custom {
                name,
                ion,
                wavelength_angstrom,
                oscillator_strength,
                einstein_a_s,
                window_angstrom,
            } => Ok(SpectralLine {
                name: name.clone(),
                ion: Ion::parse(ion).ok_or_else(|| PipelineError::UnknownIon(ion.clone()))?,
                wavelength_angstrom: *wavelength_angstrom,
                oscillator_strength: *oscillator_strength,
                einstein_a_s: *einstein_a_s,
                window_angstrom: *window_angstrom,
            }),
        })
        .collect()
}

pub fn transmission_engine(config: &ScenarioConfig) -> Result<TransmissionEngine, PipelineError> {
    let t = &config.transit;
    let settings = TransmissionSettings {
        chord_points: t.chord_points,
        impact_points: t.impact_points,
        disk_tolerance: t.disk_tolerance,
        max_refinements: t.max_refinements,
        turbulence: t.turbulence,
        outflow_doppler: t.outflow_doppler,
        edge_optical_depth: t.edge_optical_depth,
    };
    Ok(TransmissionEngine::new(spectral_lines(config)?, settings)?)
}

pub fn transit_geometry(config: &ScenarioConfig) -> TransitGeometry {
    let rp = planet_radius_cm(config);
    TransitGeometry {
        planet_radius_cm: rp,
        stellar_radius_cm: solar_radii_to_cm(config.star.radius_solar),
        cutoff_radius_cm: config.transit.cutoff_planet_radii.map(|c| c * rp),
    }
}

pub fn transmission(
    config: &ScenarioConfig,
    solution: &StructureSolution,
) -> Result<TransmissionSpectrum, PipelineError> {
    let engine = transmission_engine(config)?;
    let wavelengths = engine.wavelength_grid(config.transit.wavelength_points);
    Ok(engine.spectrum(
        &solution.atmosphere,
        &solution.ionization.state,
        &transit_geometry(config),
        &wavelengths,
    )?)
}

pub fn light_curve(
    config: &ScenarioConfig,
    solution: &StructureSolution,
) -> Result<LightCurve, PipelineError> {
    let engine = transmission_engine(config)?;
    let wavelengths = engine.wavelength_grid(config.transit.wavelength_points);
    let map = TransitMap::new(config.transit.map_grid_size)?;
    Ok(engine.light_curve(
        &solution.atmosphere,
        &solution.ionization.state,
        &transit_geometry(config),
        &wavelengths,
        &map,
        config.transit.impact_parameter,
        &config.transit.phases,
    )?)
}

/// Per-radius CSV records of a structure solution.
pub fn structure_records(solution: &StructureSolution) -> Vec<structure_csv::Record> {
    let atmosphere = &solution.atmosphere;
    let state = &solution.ionization.state;
    let mach = solution.wind.mach_profile();
    let pressure = solution.wind.pressure_profile();
    atmosphere
        .grid
        .radii()
        .iter()
        .enumerate()
        .map(|(i, &r)| structure_csv::Record {
            radius_cm: r,
            density_g_cm3: atmosphere.density_g_cm3[i],
            velocity_cm_s: atmosphere.velocity_cm_s[i],
            temperature_k: atmosphere.temperature_k[i],
            mach: mach[i],
            mean_molecular_weight: state.mean_molecular_weight(i),
            electron_density_cm3: solution.ionization.electron_density_cm3[i],
            fractions: Ion::ALL.map(|ion| state.fraction(ion, i)),
            columns_cm2: solution.ionization.column_density_cm2[i],
            pressure_dyn_cm2: pressure[i],
        })
        .collect()
}

pub fn diagnostics(
    config: &ScenarioConfig,
    solution: &StructureSolution,
    spectrum: Option<&TransmissionSpectrum>,
) -> Diagnostics {
    let d = &solution.diagnostics;
    let transit = spectrum.map(|s| {
        let peak = s
            .points
            .iter()
            .copied()
            .max_by(|a, b| a.absorption.total_cmp(&b.absorption));
        TransitSummary {
            planet_disk_depth: s.planet_disk_depth,
            peak_absorption: peak.map_or(0.0, |p| p.absorption),
            peak_wavelength_angstrom: peak.map(|p| p.wavelength_angstrom),
            impact_points: s.impact_points,
            refinements: s.refinements,
        }
    });
    Diagnostics {
        scenario: config.name.clone(),
        generated_utc: chrono::Utc::now().to_rfc3339(),
        converged: d.converged,
        iterations: d.iterations,
        residual: Some(d.residual).filter(|r| r.is_finite()),
        residual_history: d
            .residual_history
            .iter()
            .copied()
            .filter(|r| r.is_finite())
            .collect(),
        sonic_radius_cm: d.sonic_radius_cm,
        sonic_radius_planet_radii: d.sonic_radius_cm / planet_radius_cm(config),
        sonic_in_domain: d.sonic_in_domain,
        sound_speed_cm_s: d.sound_speed_cm_s,
        mass_loss_rate_g_s: d.mass_loss_rate_g_s,
        mean_molecular_weight: d.mean_molecular_weight,
        transit,
    }
}

pub fn write_structure_csv(
    path: &Path,
    solution: &StructureSolution,
) -> Result<(), PipelineError> {
    let mut writer = wind_export::writer_for_path(path)?;
    structure_csv::write_header(&mut *writer)?;
    for record in structure_records(solution) {
        record.write_to(&mut *writer)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_spectrum_csv(
    path: &Path,
    spectrum: &TransmissionSpectrum,
) -> Result<(), PipelineError> {
    let mut writer = wind_export::writer_for_path(path)?;
    spectrum_csv::write_header(&mut *writer)?;
    for p in &spectrum.points {
        spectrum_csv::Record {
            wavelength_angstrom: p.wavelength_angstrom,
            absorption: p.absorption,
            transit_depth: p.transit_depth,
        }
        .write_to(&mut *writer)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_light_curve_csv(path: &Path, curve: &LightCurve) -> Result<(), PipelineError> {
    let mut writer = wind_export::writer_for_path(path)?;
    light_curve_csv::write(
        &mut *writer,
        &curve.phases,
        &curve.wavelength_angstrom,
        &curve.flux,
    )?;
    writer.flush()?;
    Ok(())
}

pub fn write_diagnostics_json(
    path: &Path,
    diagnostics: &Diagnostics,
) -> Result<(), PipelineError> {
    let mut writer = wind_export::writer_for_path(path)?;
    wind_export::diagnostics::write_json(&mut *writer, diagnostics)?;
    writer.flush()?;
    Ok(())
}
