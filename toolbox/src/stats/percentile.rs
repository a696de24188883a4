//! Percentiles and percentile-based uncertainties.

use crate::error::{Error, Result};

/// Lower and upper percentiles spanning the central 68.2% ("1-sigma") region.
pub const ONE_SIGMA_PERCENTILES: (f64, f64) = (15.9, 84.1);

/// Percentile `q` (0–100) of `values`, linearly interpolated between the
/// two nearest ranks. NaN values are ignored.
pub fn percentile(values: &[f64], q: f64) -> Result<f64> {
    let sorted = sorted_finite(values)?;
    Ok(percentile_sorted(&sorted, q))
}

/// Median of a distribution with uncertainties from the 15.9 and 84.1
/// percentiles, which for a Gaussian match the standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileErrors {
    pub median: f64,
    /// Upper uncertainty: `p84.1 - median`.
    pub plus: f64,
    /// Lower uncertainty: `median - p15.9`.
    pub minus: f64,
}

pub fn percentile_errors(values: &[f64]) -> Result<PercentileErrors> {
    let sorted = sorted_finite(values)?;
    let (lo, hi) = ONE_SIGMA_PERCENTILES;
    let low = percentile_sorted(&sorted, lo);
    let median = percentile_sorted(&sorted, 50.0);
    let high = percentile_sorted(&sorted, hi);
    Ok(PercentileErrors {
        median,
        plus: high - median,
        minus: median - low,
    })
}

fn sorted_finite(values: &[f64]) -> Result<Vec<f64>> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Err(Error::EmptyInput {
            what: "percentile values",
        });
    }
    sorted.sort_by(f64::total_cmp);
    Ok(sorted)
}

fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let q = q.clamp(0.0, 100.0);
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
