//! Effective isothermal closure for non-uniform temperature or composition.
//!
//! The transonic solution needs a single sound speed. When T(r) or μ(r) vary,
//! c_s² = kT/(μ m_H) is averaged with weights dE, E = Φ + v²/2, i.e. by the
//! specific energy the flow gains across each shell. Uniform inputs reproduce
//! kT/(μ m_H) exactly.

use wind_core::constants::{G, K_B, M_H};

/// Averaged closure quantities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Closure {
    pub sound_speed_cm_s: f64,
    pub mean_molecular_weight: f64,
    pub reference_temperature_k: f64,
}

pub(crate) fn uniform(temperature_k: f64, mean_molecular_weight: f64) -> Closure {
    Closure {
        sound_speed_cm_s: (K_B * temperature_k / (mean_molecular_weight * M_H)).sqrt(),
        mean_molecular_weight,
        reference_temperature_k: temperature_k,
    }
}

pub(crate) fn energy_weighted(
    radii_cm: &[f64],
    planet_mass_g: f64,
    temperature_k: &[f64],
    mean_molecular_weight: &[f64],
    previous_velocity_cm_s: Option<&[f64]>,
) -> Closure {
    let energy: Vec<f64> = radii_cm
        .iter()
        .enumerate()
        .map(|(i, &r)| {
            let kinetic = previous_velocity_cm_s.map_or(0.0, |v| 0.5 * v[i] * v[i]);
            -G * planet_mass_g / r + kinetic
        })
        .collect();
    let c2: Vec<f64> = temperature_k
        .iter()
        .zip(mean_molecular_weight)
        .map(|(t, mu)| K_B * t / (mu * M_H))
        .collect();

    let mut total_weight = 0.0;
    let mut c2_sum = 0.0;
    let mut t_sum = 0.0;
    for i in 0..radii_cm.len() - 1 {
        let mut weight = (energy[i + 1] - energy[i]).max(0.0);
        if !weight.is_finite() {
            weight = 0.0;
        }
        total_weight += weight;
        c2_sum += weight * 0.5 * (c2[i] + c2[i + 1]);
        t_sum += weight * 0.5 * (temperature_k[i] + temperature_k[i + 1]);
    }
    if total_weight <= 0.0 {
        // degenerate energy profile: plain radial average instead
        for i in 0..radii_cm.len() - 1 {
            let weight = radii_cm[i + 1] - radii_cm[i];
            total_weight += weight;
            c2_sum += weight * 0.5 * (c2[i] + c2[i + 1]);
            t_sum += weight * 0.5 * (temperature_k[i] + temperature_k[i + 1]);
        }
    }
    let c2_mean = c2_sum / total_weight;
    let t_mean = t_sum / total_weight;
    Closure {
        sound_speed_cm_s: c2_mean.sqrt(),
        mean_molecular_weight: K_B * t_mean / (M_H * c2_mean),
        reference_temperature_k: t_mean,
    }
}
