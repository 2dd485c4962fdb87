//! Atmosphere data model shared by the wind, ionization, and transit stages.

use std::fmt;
use std::sync::Arc;

use crate::constants::{HE_MASS_RATIO, M_H};
use crate::error::DomainError;
use crate::grid::RadialGrid;

/// Ionization stages tracked by the solvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ion {
    HI,
    HII,
    HeI,
    HeII,
    HeIII,
}

/// Chemical element of an [`Ion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Hydrogen,
    Helium,
}

impl Ion {
    pub const ALL: [Ion; 5] = [Ion::HI, Ion::HII, Ion::HeI, Ion::HeII, Ion::HeIII];

    pub fn element(self) -> Element {
        match self {
            Ion::HI | Ion::HII => Element::Hydrogen,
            Ion::HeI | Ion::HeII | Ion::HeIII => Element::Helium,
        }
    }

    /// Net charge in units of the elementary charge.
    pub fn charge(self) -> u8 {
        match self {
            Ion::HI | Ion::HeI => 0,
            Ion::HII | Ion::HeII => 1,
            Ion::HeIII => 2,
        }
    }

    /// Particle mass in grams (electron mass neglected).
    pub fn mass_g(self) -> f64 {
        match self.element() {
            Element::Hydrogen => M_H,
            Element::Helium => HE_MASS_RATIO * M_H,
        }
    }

    /// Ion produced by photoionizing this stage, if any.
    pub fn ionized(self) -> Option<Ion> {
        match self {
            Ion::HI => Some(Ion::HII),
            Ion::HeI => Some(Ion::HeII),
            Ion::HeII => Some(Ion::HeIII),
            Ion::HII | Ion::HeIII => None,
        }
    }

    pub fn parse(label: &str) -> Option<Ion> {
        match label.to_ascii_uppercase().replace(' ', "").as_str() {
            "HI" | "H0" => Some(Ion::HI),
            "HII" | "H+" => Some(Ion::HII),
            "HEI" | "HE0" => Some(Ion::HeI),
            "HEII" | "HE+" => Some(Ion::HeII),
            "HEIII" | "HE++" => Some(Ion::HeIII),
            _ => None,
        }
    }
}

impl fmt::Display for Ion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Ion::HI => "H I",
            Ion::HII => "H II",
            Ion::HeI => "He I",
            Ion::HeII => "He II",
            Ion::HeIII => "He III",
        };
        f.write_str(label)
    }
}

/// Gas mixture of the outflow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Composition {
    /// Pure hydrogen.
    Hydrogen,
    /// Hydrogen plus helium with the given He/H number ratio.
    HydrogenHelium { he_to_h: f64 },
}

impl Composition {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Composition::HydrogenHelium { he_to_h } = self {
            DomainError::require_non_negative("He/H number ratio", *he_to_h)?;
        }
        Ok(())
    }

    /// Helium nuclei per hydrogen nucleus.
    pub fn helium_per_hydrogen(&self) -> f64 {
        match self {
            Composition::Hydrogen => 0.0,
            Composition::HydrogenHelium { he_to_h } => *he_to_h,
        }
    }

    /// Mass per hydrogen nucleus in units of `M_H`.
    pub fn mass_per_hydrogen(&self) -> f64 {
        1.0 + HE_MASS_RATIO * self.helium_per_hydrogen()
    }

    /// Hydrogen nuclei number density (cm⁻³) for a mass density (g cm⁻³).
    pub fn hydrogen_density(&self, mass_density_g_cm3: f64) -> f64 {
        mass_density_g_cm3 / (M_H * self.mass_per_hydrogen())
    }

    /// Mass density (g cm⁻³) for a hydrogen nuclei number density (cm⁻³).
    pub fn mass_density(&self, hydrogen_density_cm3: f64) -> f64 {
        hydrogen_density_cm3 * M_H * self.mass_per_hydrogen()
    }

    /// Fully neutral ionization state on `points` radii.
    pub fn neutral_state(&self, points: usize) -> IonizationState {
        let hydrogen = vec![HydrogenStages::NEUTRAL; points];
        match self {
            Composition::Hydrogen => IonizationState::Hydrogen { hydrogen },
            Composition::HydrogenHelium { he_to_h } => IonizationState::HydrogenHelium {
                he_to_h: *he_to_h,
                hydrogen,
                helium: vec![HeliumStages::NEUTRAL; points],
            },
        }
    }
}

/// Hydrogen stage fractions at one radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydrogenStages {
    pub neutral: f64,
    pub ionized: f64,
}

impl HydrogenStages {
    pub const NEUTRAL: HydrogenStages = HydrogenStages {
        neutral: 1.0,
        ionized: 0.0,
    };

    /// Build from the ionized fraction, keeping the pair normalised.
    pub fn from_ionized(ionized: f64) -> Self {
        let ionized = ionized.clamp(0.0, 1.0);
        Self {
            neutral: 1.0 - ionized,
            ionized,
        }
    }

    pub fn sum(&self) -> f64 {
        self.neutral + self.ionized
    }
}

/// Helium stage fractions at one radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeliumStages {
    pub neutral: f64,
    pub single: f64,
    pub double: f64,
}

impl HeliumStages {
    pub const NEUTRAL: HeliumStages = HeliumStages {
        neutral: 1.0,
        single: 0.0,
        double: 0.0,
    };

    /// Normalise unnormalised stage weights.
    ///
    /// An all-zero triple (no flux and no electrons) is taken as neutral.
    pub fn from_weights(neutral: f64, single: f64, double: f64) -> Self {
        let total = neutral + single + double;
        if total > 0.0 && total.is_finite() {
            Self {
                neutral: neutral / total,
                single: single / total,
                double: double / total,
            }
        } else {
            Self::NEUTRAL
        }
    }

    pub fn sum(&self) -> f64 {
        self.neutral + self.single + self.double
    }

    /// Free electrons contributed per helium nucleus.
    pub fn electrons(&self) -> f64 {
        self.single + 2.0 * self.double
    }
}

/// Per-radius ionization fractions, one variant per tracked composition.
#[derive(Debug, Clone, PartialEq)]
pub enum IonizationState {
    Hydrogen {
        hydrogen: Vec<HydrogenStages>,
    },
    HydrogenHelium {
        he_to_h: f64,
        hydrogen: Vec<HydrogenStages>,
        helium: Vec<HeliumStages>,
    },
}

impl IonizationState {
    pub fn len(&self) -> usize {
        self.hydrogen().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hydrogen(&self) -> &[HydrogenStages] {
        match self {
            IonizationState::Hydrogen { hydrogen } => hydrogen,
            IonizationState::HydrogenHelium { hydrogen, .. } => hydrogen,
        }
    }

    pub fn helium(&self) -> Option<&[HeliumStages]> {
        match self {
            IonizationState::Hydrogen { .. } => None,
            IonizationState::HydrogenHelium { helium, .. } => Some(helium),
        }
    }

    pub fn composition(&self) -> Composition {
        match self {
            IonizationState::Hydrogen { .. } => Composition::Hydrogen,
            IonizationState::HydrogenHelium { he_to_h, .. } => {
                Composition::HydrogenHelium { he_to_h: *he_to_h }
            }
        }
    }

    /// Fraction of the parent element held in `ion` at radius index `i`.
    ///
    /// Helium stages read as zero for a pure-hydrogen state.
    pub fn fraction(&self, ion: Ion, i: usize) -> f64 {
        match ion {
            Ion::HI => self.hydrogen()[i].neutral,
            Ion::HII => self.hydrogen()[i].ionized,
            Ion::HeI => self.helium().map_or(0.0, |he| he[i].neutral),
            Ion::HeII => self.helium().map_or(0.0, |he| he[i].single),
            Ion::HeIII => self.helium().map_or(0.0, |he| he[i].double),
        }
    }

    /// Free electrons per hydrogen nucleus at radius index `i`.
    pub fn electrons_per_hydrogen(&self, i: usize) -> f64 {
        match self {
            IonizationState::Hydrogen { hydrogen } => hydrogen[i].ionized,
            IonizationState::HydrogenHelium {
                he_to_h,
                hydrogen,
                helium,
            } => hydrogen[i].ionized + he_to_h * helium[i].electrons(),
        }
    }

    /// Mean mass per free particle (ions, atoms, electrons) in units of `M_H`.
    pub fn mean_molecular_weight(&self, i: usize) -> f64 {
        let composition = self.composition();
        let particles = 1.0 + composition.helium_per_hydrogen() + self.electrons_per_hydrogen(i);
        composition.mass_per_hydrogen() / particles
    }

    pub fn mean_molecular_weight_profile(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| self.mean_molecular_weight(i))
            .collect()
    }

    /// Largest deviation from unity of any element's stage sum.
    pub fn max_normalization_error(&self) -> f64 {
        let h = self
            .hydrogen()
            .iter()
            .map(|s| (s.sum() - 1.0).abs())
            .fold(0.0, f64::max);
        let he = self
            .helium()
            .map(|he| {
                he.iter()
                    .map(|s| (s.sum() - 1.0).abs())
                    .fold(0.0, f64::max)
            })
            .unwrap_or(0.0);
        h.max(he)
    }

    /// Maximum relative change of any stage fraction between two states.
    ///
    /// Each difference is scaled by the larger of the two values, with a floor of
    /// `floor` so that vanishing trace fractions do not dominate.
    pub fn max_relative_change(&self, other: &IonizationState, floor: f64) -> f64 {
        let mut worst = 0.0_f64;
        let n = self.len().min(other.len());
        for i in 0..n {
            for ion in Ion::ALL {
                let a = self.fraction(ion, i);
                let b = other.fraction(ion, i);
                let scale = a.abs().max(b.abs()).max(floor);
                worst = worst.max((a - b).abs() / scale);
            }
        }
        worst
    }
}

/// Converged density, velocity, and temperature profiles on a radial grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AtmosphericStructure {
    pub grid: Arc<RadialGrid>,
    pub density_g_cm3: Vec<f64>,
    pub velocity_cm_s: Vec<f64>,
    pub temperature_k: Vec<f64>,
    pub composition: Composition,
}

impl AtmosphericStructure {
    pub fn validate(&self) -> Result<(), DomainError> {
        self.grid.check_len("density", self.density_g_cm3.len())?;
        self.grid.check_len("velocity", self.velocity_cm_s.len())?;
        self.grid.check_len("temperature", self.temperature_k.len())?;
        self.composition.validate()?;
        for (i, &r) in self.grid.radii().iter().enumerate() {
            let rho = self.density_g_cm3[i];
            if !rho.is_finite() || rho < 0.0 {
                return Err(DomainError::NonPhysicalAt {
                    quantity: "density",
                    value: rho,
                    radius_cm: r,
                });
            }
            let t = self.temperature_k[i];
            if !t.is_finite() || t <= 0.0 {
                return Err(DomainError::NonPhysicalAt {
                    quantity: "temperature",
                    value: t,
                    radius_cm: r,
                });
            }
        }
        Ok(())
    }

    /// Hydrogen nuclei density at radius index `i`.
    pub fn hydrogen_density(&self, i: usize) -> f64 {
        self.composition.hydrogen_density(self.density_g_cm3[i])
    }

    /// Number density (cm⁻³) of `ion` at radius index `i`.
    pub fn number_density(&self, ion: Ion, state: &IonizationState, i: usize) -> f64 {
        let n_h = self.hydrogen_density(i);
        let nuclei = match ion.element() {
            Element::Hydrogen => n_h,
            Element::Helium => n_h * self.composition.helium_per_hydrogen(),
        };
        nuclei * state.fraction(ion, i)
    }

    pub fn number_density_profile(&self, ion: Ion, state: &IonizationState) -> Vec<f64> {
        (0..self.grid.len())
            .map(|i| self.number_density(ion, state, i))
            .collect()
    }

    /// Mass flux ρ v r² at every radius (g s⁻¹ sr⁻¹).
    pub fn mass_flux_profile(&self) -> Vec<f64> {
        self.grid
            .radii()
            .iter()
            .zip(self.density_g_cm3.iter().zip(&self.velocity_cm_s))
            .map(|(r, (rho, v))| rho * v * r * r)
            .collect()
    }
}
