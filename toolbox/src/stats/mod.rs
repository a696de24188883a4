//! Statistical helpers: moments, histograms, densities, percentiles, limits,
//! and random sampling from arbitrary densities.

mod distributions;
mod histogram;
mod limits;
mod percentile;
mod random;


pub use distributions::{asym_gauss, multigauss, normal_pdf, FRAC_1_SQRT_2PI};
pub use histogram::Histogram;
pub use limits::{lims, minmax, nearest, whsf, ErrorBars, LimsConfig};
pub use percentile::{percentile, percentile_errors, PercentileErrors, ONE_SIGMA_PERCENTILES};
pub use random::{integrate, randbn};

use crate::error::{check_len, Error, Result};

/// Mean and population standard deviation (`ddof = 0`).
///
/// With weights, both are weighted moments: `Σw·x / Σw` and
/// `sqrt(Σw·(x − mean)² / Σw)`.
pub fn mean_std(data: &[f64], weights: Option<&[f64]>) -> Result<(f64, f64)> {
    if data.is_empty() {
        return Err(Error::EmptyInput { what: "sample" });
    }

    match weights {
        None => {
            let n = data.len() as f64;
            let mean = data.iter().sum::<f64>() / n;
            let variance = data.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
            Ok((mean, variance.sqrt()))
        }
        Some(w) => {
            check_len("weights", data.len(), w.len())?;
            let total: f64 = w.iter().sum();
            if !(total > 0.0) {
                return Err(Error::DegenerateInput {
                    reason: format!("sum of weights is {total}"),
                });
            }
            let mean = data.iter().zip(w).map(|(v, w)| v * w).sum::<f64>() / total;
            let variance = data
                .iter()
                .zip(w)
                .map(|(v, w)| w * (v - mean) * (v - mean))
                .sum::<f64>()
                / total;
            Ok((mean, variance.sqrt()))
        }
    }
}
