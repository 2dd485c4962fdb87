//! Local photoionization/recombination equilibrium at a single radius.

use wind_core::roots::brent;
use wind_core::{HeliumStages, HydrogenStages, RootFindError};

/// Rates entering the balance at one radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LocalRates {
    /// Photoionization rates (s⁻¹) of H I, He I, He II.
    pub photoionization: [f64; 3],
    /// Recombination coefficients (cm³ s⁻¹) onto H II, He II, He III.
    pub recombination: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LocalBalance {
    pub hydrogen: HydrogenStages,
    pub helium: HeliumStages,
    pub electron_density_cm3: f64,
}

fn hydrogen_stages(ionization: f64, recombination: f64) -> HydrogenStages {
    let total = ionization + recombination;
    if total > 0.0 {
        HydrogenStages::from_ionized(ionization / total)
    } else {
        HydrogenStages::NEUTRAL
    }
}

/// Steady two-step chain He I ⇄ He II ⇄ He III.
fn helium_stages(i0: f64, r1: f64, i1: f64, r2: f64) -> HeliumStages {
    let weights = (r1 * r2, i0 * r2, i0 * i1);
    if weights.0 + weights.1 + weights.2 > 0.0 {
        return HeliumStages::from_weights(weights.0, weights.1, weights.2);
    }
    // no recombination (n_e = 0): stages fed by ionization pile up at the last
    // reachable stage
    if i0 <= 0.0 {
        HeliumStages::NEUTRAL
    } else {
        HeliumStages {
            neutral: 0.0,
            single: 1.0,
            double: 0.0,
        }
    }
}

fn stages_at(rates: &LocalRates, electron_density: f64) -> (HydrogenStages, HeliumStages) {
    let [g_h, g_he0, g_he1] = rates.photoionization;
    let [a_h, a_he1, a_he2] = rates.recombination;
    let hydrogen = hydrogen_stages(g_h, electron_density * a_h);
    let helium = helium_stages(
        g_he0,
        electron_density * a_he1,
        g_he1,
        electron_density * a_he2,
    );
    (hydrogen, helium)
}

/// Solve n_e = n_H (x_H + y (h1 + 2 h2)) for the electron density.
///
/// The residual is monotonic in n_e on `[0, n_H (1 + 2y)]`, so the bracket always
/// holds for physical inputs; a failure here means non-finite inputs.
pub(crate) fn solve_local(
    hydrogen_density_cm3: f64,
    helium_per_hydrogen: f64,
    rates: &LocalRates,
    tolerance: f64,
    max_iterations: usize,
) -> Result<LocalBalance, RootFindError> {
    let n_max = hydrogen_density_cm3 * (1.0 + 2.0 * helium_per_hydrogen);
    if n_max <= 0.0 {
        let (hydrogen, helium) = stages_at(rates, 0.0);
        return Ok(LocalBalance {
            hydrogen,
            helium,
            electron_density_cm3: 0.0,
        });
    }

    let residual = |ne: f64| {
        let (h, he) = stages_at(rates, ne);
        ne - hydrogen_density_cm3 * (h.ionized + helium_per_hydrogen * he.electrons())
    };
    let ne = brent(residual, 0.0, n_max, tolerance * n_max, max_iterations)?;
    let (hydrogen, helium) = stages_at(rates, ne);
    Ok(LocalBalance {
        hydrogen,
        helium,
        electron_density_cm3: ne,
    })
}
