//! Radial grids shared by every stage of a solve.

use crate::error::DomainError;

/// Strictly increasing, strictly positive radii in centimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGrid {
    radii_cm: Vec<f64>,
}

impl RadialGrid {
    /// Validate and wrap an explicit list of radii.
    pub fn new(radii_cm: Vec<f64>) -> Result<Self, DomainError> {
        if radii_cm.len() < 2 {
            return Err(DomainError::GridTooShort {
                points: radii_cm.len(),
            });
        }
        for (index, &r) in radii_cm.iter().enumerate() {
            if !r.is_finite() {
                return Err(DomainError::NonFinite {
                    quantity: "radius",
                    index,
                });
            }
            if r <= 0.0 {
                return Err(DomainError::NonPositive {
                    quantity: "radius",
                    value: r,
                });
            }
        }
        for index in 1..radii_cm.len() {
            let previous = radii_cm[index - 1];
            let current = radii_cm[index];
            if current <= previous {
                return Err(DomainError::NonMonotonicGrid {
                    index,
                    previous,
                    current,
                });
            }
        }
        Ok(Self { radii_cm })
    }

    /// Evenly spaced radii between `inner_cm` and `outer_cm` (inclusive).
    pub fn linear(inner_cm: f64, outer_cm: f64, points: usize) -> Result<Self, DomainError> {
        if points < 2 {
            return Err(DomainError::GridTooShort { points });
        }
        let step = (outer_cm - inner_cm) / (points - 1) as f64;
        let mut radii: Vec<f64> = (0..points).map(|i| inner_cm + step * i as f64).collect();
        radii[points - 1] = outer_cm;
        Self::new(radii)
    }

    /// Logarithmically spaced radii; denser close to the planet where density falls fastest.
    pub fn geometric(inner_cm: f64, outer_cm: f64, points: usize) -> Result<Self, DomainError> {
        if points < 2 {
            return Err(DomainError::GridTooShort { points });
        }
        DomainError::require_positive("inner radius", inner_cm)?;
        DomainError::require_positive("outer radius", outer_cm)?;
        let ratio = (outer_cm / inner_cm).ln() / (points - 1) as f64;
        let mut radii: Vec<f64> = (0..points)
            .map(|i| inner_cm * (ratio * i as f64).exp())
            .collect();
        radii[0] = inner_cm;
        radii[points - 1] = outer_cm;
        Self::new(radii)
    }

    pub fn radii(&self) -> &[f64] {
        &self.radii_cm
    }

    pub fn len(&self) -> usize {
        self.radii_cm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii_cm.is_empty()
    }

    pub fn inner(&self) -> f64 {
        self.radii_cm[0]
    }

    pub fn outer(&self) -> f64 {
        self.radii_cm[self.radii_cm.len() - 1]
    }

    /// Check that a per-radius array has one entry per grid point.
    pub fn check_len(&self, quantity: &'static str, actual: usize) -> Result<(), DomainError> {
        DomainError::require_len(quantity, self.len(), actual)
    }
}
