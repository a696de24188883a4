//! Random draws from an arbitrary 1D density.

use rand::Rng;

use crate::error::{Error, Result};

/// Maximum recursion depth of the adaptive Simpson quadrature.
const MAX_QUAD_DEPTH: u32 = 30;
const QUAD_TOLERANCE: f64 = 1.49e-8;

/// Draw `num` values from the (not necessarily normalised) density `f` on
/// `[vmin, vmax]`.
///
/// The CDF is sampled at `ncdf` evenly spaced points by integrating `f`
/// between neighbours, normalised, and inverted by linear interpolation of
/// uniform random numbers. Complex densities need a larger `ncdf`.
pub fn randbn<R, F>(rng: &mut R, f: F, num: usize, vmin: f64, vmax: f64, ncdf: usize) -> Result<Vec<f64>>
where
    R: Rng + ?Sized,
    F: Fn(f64) -> f64,
{
    if ncdf < 2 {
        return Err(Error::InvalidParameter {
            name: "ncdf",
            reason: format!("need at least 2 CDF samples, got {ncdf}"),
        });
    }
    if !(vmax > vmin) {
        return Err(Error::InvalidParameter {
            name: "vmax",
            reason: format!("range [{vmin}, {vmax}] is empty"),
        });
    }

    let step = (vmax - vmin) / (ncdf - 1) as f64;
    let values: Vec<f64> = (0..ncdf).map(|i| vmin + step * i as f64).collect();

    let mut cdf = Vec::with_capacity(ncdf);
    let mut total = 0.0;
    cdf.push(0.0);
    for w in values.windows(2) {
        total += integrate(&f, w[0], w[1]);
        cdf.push(total);
    }

    if !(total.is_finite() && total > 0.0) {
        return Err(Error::DegenerateInput {
            reason: format!("density integrates to {total} on [{vmin}, {vmax}]"),
        });
    }
    for c in cdf.iter_mut() {
        *c /= total;
    }

    Ok((0..num)
        .map(|_| invert_cdf(&cdf, &values, rng.random::<f64>()))
        .collect())
}

fn invert_cdf(cdf: &[f64], values: &[f64], u: f64) -> f64 {
    // First index with cdf >= u; cdf is non-decreasing from 0 to 1.
    let upper = cdf.partition_point(|&c| c < u).clamp(1, cdf.len() - 1);
    let lower = upper - 1;
    let span = cdf[upper] - cdf[lower];
    if span <= 0.0 {
        return values[lower];
    }
    values[lower] + (values[upper] - values[lower]) * (u - cdf[lower]) / span
}

/// Adaptive Simpson integration of `f` over `[a, b]`.
pub fn integrate<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64) -> f64 {
    let fa = f(a);
    let fb = f(b);
    let m = 0.5 * (a + b);
    let fm = f(m);
    let whole = simpson(a, b, fa, fm, fb);
    adaptive_simpson(f, a, b, fa, fm, fb, whole, QUAD_TOLERANCE, MAX_QUAD_DEPTH)
}

#[inline]
fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn adaptive_simpson<F: Fn(f64) -> f64>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tolerance: f64,
    depth: u32,
) -> f64 {
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = f(lm);
    let frm = f(rm);
    let left = simpson(a, m, fa, flm, fm);
    let right = simpson(m, b, fm, frm, fb);
    let delta = left + right - whole;

    if depth == 0 || delta.abs() <= 15.0 * tolerance {
        return left + right + delta / 15.0;
    }

    adaptive_simpson(f, a, m, fa, flm, fm, left, 0.5 * tolerance, depth - 1)
        + adaptive_simpson(f, m, b, fm, frm, fb, right, 0.5 * tolerance, depth - 1)
}
