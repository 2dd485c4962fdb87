//! Error types shared by every solver crate.

use thiserror::Error;

/// Non-physical or malformed inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("{quantity} must be positive (got {value})")]
    NonPositive { quantity: &'static str, value: f64 },
    #[error("{quantity} must be non-negative (got {value})")]
    Negative { quantity: &'static str, value: f64 },
    #[error("{quantity} is not finite at index {index}")]
    NonFinite { quantity: &'static str, index: usize },
    #[error("radial grid must contain at least two points (got {points})")]
    GridTooShort { points: usize },
    #[error("radial grid is not strictly increasing at index {index} ({previous} >= {current})")]
    NonMonotonicGrid {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("{quantity} has {actual} entries but the radial grid has {expected}")]
    LengthMismatch {
        quantity: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{quantity} = {value} at radius {radius_cm:.6e} cm is non-physical")]
    NonPhysicalAt {
        quantity: &'static str,
        value: f64,
        radius_cm: f64,
    },
    #[error("ionization state does not match composition: {0}")]
    CompositionMismatch(&'static str),
}

impl DomainError {
    /// Reject values that are not strictly positive and finite.
    pub fn require_positive(quantity: &'static str, value: f64) -> Result<f64, DomainError> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(DomainError::NonPositive { quantity, value })
        }
    }

    /// Reject values that are negative or not finite.
    pub fn require_non_negative(quantity: &'static str, value: f64) -> Result<f64, DomainError> {
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(DomainError::Negative { quantity, value })
        }
    }

    /// Check that a per-radius array matches the grid length.
    pub fn require_len(
        quantity: &'static str,
        expected: usize,
        actual: usize,
    ) -> Result<(), DomainError> {
        if expected == actual {
            Ok(())
        } else {
            Err(DomainError::LengthMismatch {
                quantity,
                expected,
                actual,
            })
        }
    }
}

/// Failures of the scalar root finders in [`crate::roots`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RootFindError {
    #[error("root not bracketed on [{lo:.6e}, {hi:.6e}] (f(lo) = {f_lo:.3e}, f(hi) = {f_hi:.3e})")]
    NotBracketed {
        lo: f64,
        hi: f64,
        f_lo: f64,
        f_hi: f64,
    },
    #[error("no convergence after {iterations} iterations (last estimate {estimate:.9e})")]
    NoConvergence { iterations: usize, estimate: f64 },
    #[error("function evaluated to a non-finite value at {x:.6e}")]
    NonFinite { x: f64 },
}
