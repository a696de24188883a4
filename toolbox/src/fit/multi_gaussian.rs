//! Mixtures of two or three normal components fit to a histogram.
//!
//! Component widths are bounded below by one histogram bin width so a
//! component cannot collapse onto a single bin, and fractions are bounded to
//! `[0, 1]`. The last fraction is implied (`1 − Σ others`).

use super::gaussian::{histogram_points, normal_with_gradient, GaussianFitConfig};
use super::lm_optimizer::{optimize, Bounds, CurveModel, LmResult};
use super::diagnostics::log_histogram_fit;
use crate::error::{Error, Result};
use crate::stats::normal_pdf;

/// One normal component of a mixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianComponent {
    pub mean: f64,
    pub std: f64,
    pub fraction: f64,
}

/// Best-fit mixture.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiGaussianFit {
    /// Components in parameter order.
    pub components: Vec<GaussianComponent>,
    /// Raw fitted parameters: `(mean_i, std_i)` pairs then the free fractions.
    pub params: Vec<f64>,
    /// Covariance of `params`, row-major.
    pub covariance: Vec<Vec<f64>>,
    pub chi2: f64,
    pub iterations: usize,
}

impl MultiGaussianFit {
    /// Mixture density at `x`.
    pub fn pdf(&self, x: f64) -> f64 {
        self.components
            .iter()
            .map(|c| c.fraction * normal_pdf(x, c.mean, c.std))
            .sum()
    }

    fn from_result<const N: usize>(result: &LmResult<N>, components: Vec<GaussianComponent>) -> Self {
        Self {
            components,
            params: result.params.to_vec(),
            covariance: result.covariance.iter().map(|row| row.to_vec()).collect(),
            chi2: result.chi2,
            iterations: result.iterations,
        }
    }
}

/// `f1·N(m1, s1) + (1 − f1)·N(m2, s2)`; params `[m1, s1, m2, s2, f1]`.
#[derive(Debug)]
struct TwoGaussians {
    bounds: Bounds<5>,
}

impl CurveModel<5> for TwoGaussians {
    fn evaluate(&self, x: f64, p: &[f64; 5]) -> f64 {
        p[4] * normal_pdf(x, p[0], p[1]) + (1.0 - p[4]) * normal_pdf(x, p[2], p[3])
    }

    fn jacobian_row(&self, x: f64, p: &[f64; 5]) -> [f64; 5] {
        let (n1, dm1, ds1) = normal_with_gradient(x, p[0], p[1]);
        let (n2, dm2, ds2) = normal_with_gradient(x, p[2], p[3]);
        let f1 = p[4];
        let f2 = 1.0 - f1;
        [f1 * dm1, f1 * ds1, f2 * dm2, f2 * ds2, n1 - n2]
    }

    fn constrain(&self, params: &mut [f64; 5]) {
        self.bounds.clamp(params);
    }
}

/// Three components; params `[m1, s1, m2, s2, m3, s3, f1, f2]`, `f3 = 1 − f1 − f2`.
#[derive(Debug)]
struct ThreeGaussians {
    bounds: Bounds<8>,
}

impl CurveModel<8> for ThreeGaussians {
    fn evaluate(&self, x: f64, p: &[f64; 8]) -> f64 {
        let f3 = 1.0 - p[6] - p[7];
        p[6] * normal_pdf(x, p[0], p[1])
            + p[7] * normal_pdf(x, p[2], p[3])
            + f3 * normal_pdf(x, p[4], p[5])
    }

    fn jacobian_row(&self, x: f64, p: &[f64; 8]) -> [f64; 8] {
        let (n1, dm1, ds1) = normal_with_gradient(x, p[0], p[1]);
        let (n2, dm2, ds2) = normal_with_gradient(x, p[2], p[3]);
        let (n3, dm3, ds3) = normal_with_gradient(x, p[4], p[5]);
        let (f1, f2) = (p[6], p[7]);
        let f3 = 1.0 - f1 - f2;
        [
            f1 * dm1,
            f1 * ds1,
            f2 * dm2,
            f2 * ds2,
            f3 * dm3,
            f3 * ds3,
            n1 - n3,
            n2 - n3,
        ]
    }

    /// Clamp to the box bounds, then scale the free fractions back onto
    /// `f1 + f2 ≤ 1` so the implied third fraction stays non-negative.
    fn constrain(&self, params: &mut [f64; 8]) {
        self.bounds.clamp(params);
        let sum = params[6] + params[7];
        if sum > 1.0 {
            params[6] /= sum;
            params[7] /= sum;
        }
    }
}

/// Fit a two-component normal mixture.
///
/// Seeds: means `m ∓ s/2`, widths `s`, fraction ½, where `m`, `s` are the
/// sample mean and standard deviation.
pub fn fit_two_gauss(
    data: &[f64],
    weights: Option<&[f64]>,
    config: &GaussianFitConfig,
) -> Result<MultiGaussianFit> {
    config.validate();
    let points = histogram_points(data, weights, config.bins)?;
    let (m, s) = (points.mean, points.std);
    let min_width = points.histogram.bin_width();

    let mut lower = [f64::NEG_INFINITY; 5];
    let mut upper = [f64::INFINITY; 5];
    lower[1] = min_width;
    lower[3] = min_width;
    lower[4] = 0.0;
    upper[4] = 1.0;

    let model = TwoGaussians {
        bounds: Bounds { lower, upper },
    };
    let mut seed = [m - 0.5 * s, s, m + 0.5 * s, s, 0.5];
    model.constrain(&mut seed);

    let result = optimize(&model, &points.centers, &points.histogram.heights, seed, &config.lm);
    check_converged(&result)?;

    let p = result.params;
    let fit = MultiGaussianFit::from_result(
        &result,
        vec![
            GaussianComponent {
                mean: p[0],
                std: p[1],
                fraction: p[4],
            },
            GaussianComponent {
                mean: p[2],
                std: p[3],
                fraction: 1.0 - p[4],
            },
        ],
    );
    maybe_log(config, &points.centers, &points.histogram.heights, &fit);
    Ok(fit)
}

/// Fit a three-component normal mixture.
///
/// Seeds: means `m − s/2`, `m`, `m + s/2`, widths `s`, fractions ⅓.
pub fn fit_three_gauss(
    data: &[f64],
    weights: Option<&[f64]>,
    config: &GaussianFitConfig,
) -> Result<MultiGaussianFit> {
    config.validate();
    let points = histogram_points(data, weights, config.bins)?;
    let (m, s) = (points.mean, points.std);
    let min_width = points.histogram.bin_width();

    let mut lower = [f64::NEG_INFINITY; 8];
    let mut upper = [f64::INFINITY; 8];
    for i in [1, 3, 5] {
        lower[i] = min_width;
    }
    for i in [6, 7] {
        lower[i] = 0.0;
        upper[i] = 1.0;
    }

    let model = ThreeGaussians {
        bounds: Bounds { lower, upper },
    };
    let third = 1.0 / 3.0;
    let mut seed = [m - 0.5 * s, s, m, s, m + 0.5 * s, s, third, third];
    model.constrain(&mut seed);

    let result = optimize(&model, &points.centers, &points.histogram.heights, seed, &config.lm);
    check_converged(&result)?;

    let p = result.params;
    let fit = MultiGaussianFit::from_result(
        &result,
        vec![
            GaussianComponent {
                mean: p[0],
                std: p[1],
                fraction: p[6],
            },
            GaussianComponent {
                mean: p[2],
                std: p[3],
                fraction: p[7],
            },
            GaussianComponent {
                mean: p[4],
                std: p[5],
                fraction: (1.0 - p[6] - p[7]).max(0.0),
            },
        ],
    );
    maybe_log(config, &points.centers, &points.histogram.heights, &fit);
    Ok(fit)
}

fn check_converged<const N: usize>(result: &LmResult<N>) -> Result<()> {
    if result.converged && result.params.iter().all(|p| p.is_finite()) {
        return Ok(());
    }
    tracing::debug!(
        "{}-parameter mixture fit failed after {} iterations",
        N,
        result.iterations
    );
    Err(Error::NonConvergence {
        iterations: result.iterations,
    })
}

fn maybe_log(config: &GaussianFitConfig, centers: &[f64], heights: &[f64], fit: &MultiGaussianFit) {
    if config.show_plot {
        log_histogram_fit(
            config.label.as_deref().unwrap_or("value"),
            centers,
            heights,
            |x| fit.pdf(x),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_gaussians() -> ThreeGaussians {
        let mut lower = [f64::NEG_INFINITY; 8];
        let mut upper = [f64::INFINITY; 8];
        for i in [6, 7] {
            lower[i] = 0.0;
            upper[i] = 1.0;
        }
        ThreeGaussians {
            bounds: Bounds { lower, upper },
        }
    }

    #[test]
    fn test_free_fractions_cannot_exceed_one() {
        let model = three_gaussians();
        let mut params = [0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 0.8, 0.8];
        model.constrain(&mut params);
        assert_eq!(params[6], 0.5);
        assert_eq!(params[7], 0.5);
        assert!(1.0 - params[6] - params[7] >= 0.0);

        let mut params = [0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 1.5, -0.2];
        model.constrain(&mut params);
        assert_eq!((params[6], params[7]), (1.0, 0.0));
    }

    #[test]
    fn test_valid_fractions_are_untouched() {
        let model = three_gaussians();
        let mut params = [0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 0.3, 0.6];
        model.constrain(&mut params);
        assert_eq!((params[6], params[7]), (0.3, 0.6));
    }
}
