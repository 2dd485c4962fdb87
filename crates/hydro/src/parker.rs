//! Dimensionless isothermal Parker wind relation.
//!
//! With u = v / c_s and λ = r / r_s the steady momentum and continuity
//! equations integrate to
//!
//! ```text
//! u² − ln u² = 4 ln λ + 4 / λ − 3
//! ```
//!
//! The right-hand side has its minimum, 1, at λ = 1, where both roots merge at
//! u = 1. Inside the sonic point the subsonic root (u < 1) is the physical one,
//! outside it the supersonic root (u > 1).

use wind_core::constants::{G, K_B, M_H};
use wind_core::roots::safeguarded_newton;
use wind_core::{DomainError, RootFindError};

/// Which root of the Parker relation a radius sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Subsonic,
    Sonic,
    Supersonic,
}

/// Isothermal sound speed √(kT / μ m_H) in cm s⁻¹.
pub fn sound_speed(temperature_k: f64, mean_molecular_weight: f64) -> Result<f64, DomainError> {
    DomainError::require_positive("temperature", temperature_k)?;
    DomainError::require_positive("mean molecular weight", mean_molecular_weight)?;
    Ok((K_B * temperature_k / (mean_molecular_weight * M_H)).sqrt())
}

/// Sonic radius G M / (2 c_s²) in cm.
pub fn sonic_radius(planet_mass_g: f64, sound_speed_cm_s: f64) -> f64 {
    G * planet_mass_g / (2.0 * sound_speed_cm_s * sound_speed_cm_s)
}

/// Right-hand side of the Parker relation minus its sonic value, 4 ln λ + 4/λ − 4.
///
/// Written around λ = 1 to keep the excess accurate close to the sonic point.
pub fn sonic_excess(lambda: f64) -> f64 {
    let d = lambda - 1.0;
    (4.0 * (d.ln_1p() - d / lambda)).max(0.0)
}

/// Solve the Parker relation for u = v / c_s at λ = r / r_s.
///
/// Each branch is bracketed on its own side of u = 1 and the Newton iteration
/// is seeded from the matching asymptotic form, so the iteration cannot jump
/// to the other root.
pub fn dimensionless_velocity(
    lambda: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<(f64, Branch), RootFindError> {
    if !(lambda.is_finite() && lambda > 0.0) {
        return Err(RootFindError::NonFinite { x: lambda });
    }
    let excess = sonic_excess(lambda);
    if excess <= 4.0 * f64::EPSILON {
        return Ok((1.0, Branch::Sonic));
    }
    let c = 1.0 + excess;

    if lambda < 1.0 {
        // s = ln u² in (−C − 1, 0): h(s) = e^s − 1 − s − excess, decreasing
        let lo = -c - 1.0;
        let seed = if excess < 0.1 {
            (1.0 - (2.0 * excess).sqrt()).ln()
        } else {
            -c + (-c).exp()
        };
        let tol = tolerance.max(8.0 * f64::EPSILON * lo.abs());
        let s = safeguarded_newton(
            |s| (s.exp_m1() - s - excess, s.exp_m1()),
            seed,
            lo,
            0.0,
            tol,
            max_iterations,
        )?;
        Ok(((0.5 * s).exp(), Branch::Subsonic))
    } else {
        // t = u² − 1 in (0, C + ln C + 1): g(t) = t − ln(1 + t) − excess, increasing
        let hi = c + c.ln() + 1.0;
        let seed = if excess < 0.1 {
            (2.0 * excess).sqrt()
        } else {
            c + c.ln() - 1.0
        };
        let tol = tolerance.max(8.0 * f64::EPSILON * hi);
        let t = safeguarded_newton(
            |t| (t - t.ln_1p() - excess, t / (1.0 + t)),
            seed,
            0.0,
            hi,
            tol,
            max_iterations,
        )?;
        Ok(((1.0 + t).sqrt(), Branch::Supersonic))
    }
}
