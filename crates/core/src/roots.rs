//! Bracketed scalar root finders.
//!
//! Both routines insist on a sign change over the supplied interval so that a
//! root on the wrong branch can never be returned silently.

use crate::error::RootFindError;

/// Brent's method on `[lo, hi]` with absolute tolerance `tolerance`.
pub fn brent<F>(
    mut f: F,
    lo: f64,
    hi: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<f64, RootFindError>
where
    F: FnMut(f64) -> f64,
{
    let (mut a, mut b) = (lo, hi);
    let (mut fa, mut fb) = (f(a), f(b));
    if !fa.is_finite() {
        return Err(RootFindError::NonFinite { x: a });
    }
    if !fb.is_finite() {
        return Err(RootFindError::NonFinite { x: b });
    }
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if fa.signum() == fb.signum() {
        return Err(RootFindError::NotBracketed {
            lo,
            hi,
            f_lo: fa,
            f_hi: fb,
        });
    }

    let (mut c, mut fc) = (b, fb);
    let mut d = b - a;
    let mut e = d;
    for _ in 0..max_iterations {
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
        let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * tolerance;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol1 || fb == 0.0 {
            return Ok(b);
        }
        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            // inverse quadratic interpolation, secant when only two points are distinct
            let s = fb / fa;
            let (mut p, mut q);
            if a == c {
                p = 2.0 * xm * s;
                q = 1.0 - s;
            } else {
                let qa = fa / fc;
                let r = fb / fc;
                p = s * (2.0 * xm * qa * (qa - r) - (b - a) * (r - 1.0));
                q = (qa - 1.0) * (r - 1.0) * (s - 1.0);
            }
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }
        a = b;
        fa = fb;
        if d.abs() > tol1 {
            b += d;
        } else {
            b += tol1.copysign(xm);
        }
        fb = f(b);
        if !fb.is_finite() {
            return Err(RootFindError::NonFinite { x: b });
        }
    }
    Err(RootFindError::NoConvergence {
        iterations: max_iterations,
        estimate: b,
    })
}

/// Newton iteration started from `seed`, falling back to bisection whenever a
/// step would leave the bracket `[lo, hi]` or fails to halve the residual.
///
/// `f` returns the function value and its derivative.
pub fn safeguarded_newton<F>(
    mut f: F,
    seed: f64,
    lo: f64,
    hi: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<f64, RootFindError>
where
    F: FnMut(f64) -> (f64, f64),
{
    let (f_lo, _) = f(lo);
    let (f_hi, _) = f(hi);
    if !f_lo.is_finite() {
        return Err(RootFindError::NonFinite { x: lo });
    }
    if !f_hi.is_finite() {
        return Err(RootFindError::NonFinite { x: hi });
    }
    if f_lo == 0.0 {
        return Ok(lo);
    }
    if f_hi == 0.0 {
        return Ok(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(RootFindError::NotBracketed {
            lo,
            hi,
            f_lo,
            f_hi,
        });
    }

    // orient so that f(x_neg) < 0 < f(x_pos)
    let (mut x_neg, mut x_pos) = if f_lo < 0.0 { (lo, hi) } else { (hi, lo) };
    let mut x = seed.clamp(lo.min(hi), lo.max(hi));
    let mut dx_old = (hi - lo).abs();
    let mut dx = dx_old;
    let (mut fx, mut dfx) = f(x);

    for _ in 0..max_iterations {
        if !fx.is_finite() || !dfx.is_finite() {
            return Err(RootFindError::NonFinite { x });
        }
        if fx == 0.0 {
            return Ok(x);
        }
        let leaves_bracket = ((x - x_pos) * dfx - fx) * ((x - x_neg) * dfx - fx) > 0.0;
        let too_slow = (2.0 * fx).abs() > (dx_old * dfx).abs();
        dx_old = dx;
        if dfx == 0.0 || leaves_bracket || too_slow {
            dx = 0.5 * (x_pos - x_neg);
            x = x_neg + dx;
        } else {
            dx = fx / dfx;
            x -= dx;
        }
        if dx.abs() < tolerance {
            return Ok(x);
        }
        (fx, dfx) = f(x);
        if fx < 0.0 {
            x_neg = x;
        } else {
            x_pos = x;
        }
    }
    Err(RootFindError::NoConvergence {
        iterations: max_iterations,
        estimate: x,
    })
}
