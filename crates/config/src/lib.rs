//! Configuration models and loaders for Parker wind scenarios.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// One planet/star system and the models to run on it.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub name: String,
    pub planet: PlanetConfig,
    pub star: StarConfig,
    pub wind: WindConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    pub spectrum: SpectrumConfig,
    #[serde(default)]
    pub atomic: AtomicConfig,
    #[serde(default = "default_lines")]
    pub lines: Vec<LineConfig>,
    #[serde(default)]
    pub transit: TransitConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PlanetConfig {
    pub mass_jupiter: f64,
    pub radius_jupiter: f64,
    pub orbital_distance_au: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StarConfig {
    pub radius_solar: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WindConfig {
    pub temperature_k: f64,
    /// Per-radius temperatures overriding `temperature_k`; one per grid point.
    #[serde(default)]
    pub temperature_profile_k: Option<Vec<f64>>,
    pub normalization: NormalizationConfig,
    /// He/H number ratio; pure hydrogen when absent.
    #[serde(default)]
    pub he_to_h: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NormalizationConfig {
    MassLossRate {
        g_s: f64,
    },
    BaseDensity {
        density_g_cm3: f64,
        #[serde(default = "one")]
        radius_planet_radii: f64,
    },
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GridSpacing {
    Linear,
    #[default]
    Geometric,
}

/// Radial grid in planet radii.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    pub inner_planet_radii: f64,
    pub outer_planet_radii: f64,
    pub points: usize,
    pub spacing: GridSpacing,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            inner_planet_radii: 1.0,
            outer_planet_radii: 10.0,
            points: 200,
            spacing: GridSpacing::Geometric,
        }
    }
}

/// Controls of the structure iteration.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SolverConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub relaxation: f64,
    pub initial_mean_molecular_weight: f64,
    pub root_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-6,
            max_iterations: 50,
            relaxation: 0.5,
            initial_mean_molecular_weight: 1.0,
            root_tolerance: 1.0e-12,
        }
    }
}

/// Where the stellar irradiance comes from.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpectrumConfig {
    /// CSV with `wavelength_angstrom,flux` columns measured at `distance_au`.
    Table {
        path: PathBuf,
        #[serde(default = "one")]
        distance_au: f64,
    },
    /// Constant F_λ at the planet.
    Flat {
        flux: f64,
        min_angstrom: f64,
        max_angstrom: f64,
        #[serde(default = "default_spectrum_points")]
        points: usize,
    },
}

/// Power-law recombination coefficient α = a (T / T0)^p.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct RecombinationConfig {
    pub coefficient_cm3_s: f64,
    pub reference_temperature_k: f64,
    pub exponent: f64,
}

/// Overrides of the default case-B recombination laws.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct AtomicConfig {
    pub hydrogen: Option<RecombinationConfig>,
    pub helium_single: Option<RecombinationConfig>,
    pub helium_double: Option<RecombinationConfig>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinePreset {
    LymanAlpha,
    #[serde(rename = "helium_ii_304")]
    HeliumII304,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum LineConfig {
    Preset {
        preset: LinePreset,
        #[serde(default)]
        window_angstrom: Option<f64>,
    },
    Custom {
        name: String,
        ion: String,
        wavelength_angstrom: f64,
        oscillator_strength: f64,
        einstein_a_s: f64,
        window_angstrom: f64,
    },
}

fn default_lines() -> Vec<LineConfig> {
    vec![LineConfig::Preset {
        preset: LinePreset::LymanAlpha,
        window_angstrom: None,
    }]
}

/// Transmission spectrum and light-curve settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TransitConfig {
    pub wavelength_points: usize,
    pub chord_points: usize,
    pub impact_points: usize,
    pub disk_tolerance: f64,
    pub max_refinements: usize,
    pub turbulence: bool,
    pub outflow_doppler: bool,
    /// Optical depth above which the gas at the cutoff counts as truncated.
    pub edge_optical_depth: f64,
    /// Outer edge of the absorbing gas in planet radii; the grid edge when absent.
    pub cutoff_planet_radii: Option<f64>,
    pub map_grid_size: usize,
    /// Projected planet offset from the stellar equator in stellar radii.
    pub impact_parameter: f64,
    pub phases: Vec<f64>,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            wavelength_points: 200,
            chord_points: 100,
            impact_points: 32,
            disk_tolerance: 1.0e-3,
            max_refinements: 5,
            turbulence: true,
            outflow_doppler: true,
            edge_optical_depth: 1.0,
            cutoff_planet_radii: None,
            map_grid_size: 201,
            impact_parameter: 0.0,
            phases: (0..=24).map(|i| -0.6 + 0.05 * i as f64).collect(),
        }
    }
}

fn one() -> f64 {
    1.0
}

fn default_spectrum_points() -> usize {
    200
}

/// Stellar spectrum samples read from a CSV table.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumTable {
    pub wavelength_angstrom: Vec<f64>,
    pub flux: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct SpectrumRow {
    wavelength_angstrom: f64,
    flux: f64,
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to read spectrum table: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid scenario '{scenario}': {reason}")]
    Invalid { scenario: String, reason: String },
}

impl ScenarioConfig {
    /// Reject settings that cannot describe a physical scenario.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid {
            scenario: self.name.clone(),
            reason,
        };
        let positive = [
            ("planet.mass_jupiter", self.planet.mass_jupiter),
            ("planet.radius_jupiter", self.planet.radius_jupiter),
            ("planet.orbital_distance_au", self.planet.orbital_distance_au),
            ("star.radius_solar", self.star.radius_solar),
            ("wind.temperature_k", self.wind.temperature_k),
            ("grid.inner_planet_radii", self.grid.inner_planet_radii),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{field} must be positive (got {value})")));
            }
        }
        if self.grid.outer_planet_radii <= self.grid.inner_planet_radii {
            return Err(invalid(format!(
                "grid.outer_planet_radii ({}) must exceed grid.inner_planet_radii ({})",
                self.grid.outer_planet_radii, self.grid.inner_planet_radii
            )));
        }
        if self.grid.points < 2 {
            return Err(invalid(format!(
                "grid.points must be at least 2 (got {})",
                self.grid.points
            )));
        }
        if let Some(profile) = &self.wind.temperature_profile_k {
            if profile.len() != self.grid.points {
                return Err(invalid(format!(
                    "wind.temperature_profile_k has {} entries but the grid has {} points",
                    profile.len(),
                    self.grid.points
                )));
            }
        }
        if self.lines.is_empty() {
            return Err(invalid("at least one spectral line is required".to_string()));
        }
        Ok(())
    }

    /// Resolve a relative spectrum table path against `base`.
    fn resolve_paths(&mut self, base: &Path) {
        if let SpectrumConfig::Table { path, .. } = &mut self.spectrum {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Load scenario manifests from a YAML file, a TOML file, or a directory of TOML files.
pub fn load_scenarios<P: AsRef<Path>>(path: P) -> Result<Vec<ScenarioConfig>, ConfigError> {
    let path = path.as_ref();
    let mut scenarios: Vec<ScenarioConfig> = load_records(path)?;
    let base = if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    };
    for scenario in &mut scenarios {
        scenario.resolve_paths(&base);
        scenario.validate()?;
    }
    Ok(scenarios)
}

/// Load one scenario, selected by name when the manifest holds several.
pub fn load_scenario<P: AsRef<Path>>(
    path: P,
    name: Option<&str>,
) -> Result<ScenarioConfig, ConfigError> {
    let path = path.as_ref();
    let scenarios = load_scenarios(path)?;
    let missing = |reason: String| ConfigError::Invalid {
        scenario: name.unwrap_or_default().to_string(),
        reason,
    };
    match name {
        Some(wanted) => scenarios
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| missing(format!("not found in {}", path.display()))),
        None => scenarios
            .into_iter()
            .next()
            .ok_or_else(|| missing(format!("{} holds no scenarios", path.display()))),
    }
}

/// Read a `wavelength_angstrom,flux` CSV table.
pub fn load_spectrum_table<P: AsRef<Path>>(path: P) -> Result<SpectrumTable, ConfigError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;
    let mut table = SpectrumTable {
        wavelength_angstrom: Vec::new(),
        flux: Vec::new(),
    };
    for row in reader.deserialize() {
        let row: SpectrumRow = row?;
        table.wavelength_angstrom.push(row.wavelength_angstrom);
        table.flux.push(row.flux);
    }
    if table.wavelength_angstrom.len() < 2 {
        return Err(ConfigError::Invalid {
            scenario: path.display().to_string(),
            reason: "spectrum table needs at least two rows".to_string(),
        });
    }
    Ok(table)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(records: OneOrMany<T>) -> Self {
        match records {
            OneOrMany::Many(list) => list,
            OneOrMany::One(record) => vec![record],
        }
    }
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        let records: OneOrMany<T> = serde_yaml::from_reader(reader)?;
        Ok(records.into())
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "toml").unwrap_or(false))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}
