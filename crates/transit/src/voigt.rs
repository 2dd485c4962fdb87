//! Voigt line profile through the Faddeeva function.

use std::f64::consts::PI;

use num_complex::Complex64;

const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Faddeeva function w(z) for Im z >= 0 (Humlíček W4 rational approximation).
///
/// Relative accuracy is about 1e-4 over the upper half plane.
pub fn faddeeva(z: Complex64) -> Complex64 {
    let (x, y) = (z.re, z.im);
    let t = Complex64::new(y, -x);
    let s = x.abs() + y;
    if s >= 15.0 {
        t * 0.564_189_6 / (t * t + 0.5)
    } else if s >= 5.5 {
        let u = t * t;
        t * (u * 0.564_189_6 + 1.410_474) / (u * (u + 3.0) + 0.75)
    } else if y >= 0.195 * x.abs() - 0.176 {
        let num = t * (t * (t * (t * 0.564_223_6 + 3.778_987) + 11.964_82) + 20.209_33) + 16.4955;
        let den =
            t * (t * (t * (t * (t + 6.699_398) + 21.692_74) + 39.271_21) + 38.823_63) + 16.4955;
        num / den
    } else {
        let u = t * t;
        let num = t
            * (36183.31
                - u * (3321.9905
                    - u * (1540.787
                        - u * (219.0313 - u * (35.766_83 - u * (1.320_522 - u * 0.56419))))));
        let den = 32066.6
            - u * (24322.84
                - u * (9022.228
                    - u * (2186.181
                        - u * (364.2191 - u * (61.570_37 - u * (1.841_439 - u))))));
        u.exp() - num / den
    }
}

/// Area-normalised Voigt profile at offset `x` from line centre.
///
/// `sigma` is the Gaussian standard deviation and `gamma` the Lorentzian
/// half-width at half-maximum, both in the units of `x`.
pub fn voigt_profile(x: f64, sigma: f64, gamma: f64) -> f64 {
    if sigma <= 0.0 {
        if gamma <= 0.0 {
            return 0.0;
        }
        return gamma / (PI * (x * x + gamma * gamma));
    }
    let z = Complex64::new(x, gamma.max(0.0)) / (sigma * SQRT_2);
    faddeeva(z).re / (sigma * (2.0 * PI).sqrt())
}
