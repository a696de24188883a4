//! Normal-distribution fit to a density-normalised histogram.
//!
//! The sample is binned, the bin centres and heights become the (x, y)
//! points, and the normal pdf is fit to them by Levenberg-Marquardt starting
//! from the sample mean and standard deviation.

use serde::{Deserialize, Serialize};

use super::diagnostics::log_histogram_fit;
use super::lm_optimizer::{optimize, CurveModel, LmConfig};
use crate::error::{Error, Result};
use crate::stats::{mean_std, normal_pdf, Histogram};

/// Default number of histogram bins.
pub const DEFAULT_BINS: usize = 100;

/// Configuration for histogram-based Gaussian fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianFitConfig {
    /// Number of histogram bins.
    pub bins: usize,
    /// Log the histogram next to the fitted curve.
    pub show_plot: bool,
    /// Optional label used in the diagnostic output.
    pub label: Option<String>,
    /// Least-squares solver settings.
    pub lm: LmConfig,
}

impl Default for GaussianFitConfig {
    fn default() -> Self {
        Self {
            bins: DEFAULT_BINS,
            show_plot: false,
            label: None,
            lm: LmConfig::default(),
        }
    }
}

impl GaussianFitConfig {
    pub fn with_bins(bins: usize) -> Self {
        Self {
            bins,
            ..Default::default()
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) {
        assert!(self.bins >= 3, "bins must be at least 3, got {}", self.bins);
        self.lm.validate();
    }
}

/// Best-fit normal distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianFit {
    pub mean: f64,
    /// Always non-negative.
    pub std: f64,
    /// Covariance of `(mean, std)`.
    pub covariance: [[f64; 2]; 2],
    /// Sum of squared residuals against the histogram.
    pub chi2: f64,
    pub iterations: usize,
}

impl GaussianFit {
    /// One-sigma uncertainties of `(mean, std)`.
    pub fn errors(&self) -> (f64, f64) {
        (self.covariance[0][0].sqrt(), self.covariance[1][1].sqrt())
    }

    /// Fitted density at `x`.
    pub fn pdf(&self, x: f64) -> f64 {
        normal_pdf(x, self.mean, self.std)
    }
}

/// Normal pdf with parameters `[mean, std]`.
#[derive(Debug)]
pub(crate) struct NormalPdf;

impl CurveModel<2> for NormalPdf {
    #[inline]
    fn evaluate(&self, x: f64, params: &[f64; 2]) -> f64 {
        normal_pdf(x, params[0], params[1])
    }

    #[inline]
    fn jacobian_row(&self, x: f64, params: &[f64; 2]) -> [f64; 2] {
        let (_, d_mean, d_std) = normal_with_gradient(x, params[0], params[1]);
        [d_mean, d_std]
    }
}

/// Normal pdf and its partial derivatives with respect to mean and std.
#[inline]
pub(crate) fn normal_with_gradient(x: f64, mean: f64, std: f64) -> (f64, f64, f64) {
    let value = normal_pdf(x, mean, std);
    let dx = x - mean;
    let std2 = std * std;
    (
        value,
        value * dx / std2,
        value * (dx * dx / (std2 * std) - 1.0 / std),
    )
}

/// Histogram of a sample plus the moments used to seed a fit.
pub(crate) struct HistogramPoints {
    pub histogram: Histogram,
    pub centers: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

pub(crate) fn histogram_points(
    data: &[f64],
    weights: Option<&[f64]>,
    bins: usize,
) -> Result<HistogramPoints> {
    if data.len() < 2 {
        return Err(Error::DegenerateInput {
            reason: format!("gaussian fit needs at least 2 values, got {}", data.len()),
        });
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "data",
            reason: "gaussian fit input contains non-finite values".to_string(),
        });
    }

    let (mean, std) = mean_std(data, None)?;
    if !(std > 0.0) {
        return Err(Error::DegenerateInput {
            reason: "sample has zero dispersion".to_string(),
        });
    }

    let histogram = Histogram::new(data, weights, bins, true)?;
    let centers = histogram.centers();
    Ok(HistogramPoints {
        histogram,
        centers,
        mean,
        std,
    })
}

/// Fit a normal distribution to `data`.
///
/// # Errors
///
/// - `DegenerateInput` for fewer than 2 values or zero dispersion
/// - `NonConvergence` if the least-squares solver does not converge
pub fn fit_gauss(
    data: &[f64],
    weights: Option<&[f64]>,
    config: &GaussianFitConfig,
) -> Result<GaussianFit> {
    config.validate();

    let points = histogram_points(data, weights, config.bins)?;
    let seed = [points.mean, points.std];

    let result = optimize(
        &NormalPdf,
        &points.centers,
        &points.histogram.heights,
        seed,
        &config.lm,
    );

    if !result.converged || result.params.iter().any(|p| !p.is_finite()) {
        tracing::debug!(
            "Gaussian fit failed after {} iterations (seed mean={:.4}, std={:.4})",
            result.iterations,
            seed[0],
            seed[1]
        );
        return Err(Error::NonConvergence {
            iterations: result.iterations,
        });
    }

    let fit = GaussianFit {
        mean: result.params[0],
        std: result.params[1].abs(),
        covariance: result.covariance,
        chi2: result.chi2,
        iterations: result.iterations,
    };

    if config.show_plot {
        log_histogram_fit(
            config.label.as_deref().unwrap_or("value"),
            &points.centers,
            &points.histogram.heights,
            |x| fit.pdf(x),
        );
    }

    Ok(fit)
}
