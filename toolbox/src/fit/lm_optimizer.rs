//! Levenberg-Marquardt optimizer for 1D curve fitting.
//!
//! Generic over the number of model parameters. Parameter bounds are applied
//! by clamping after every update, and the parameter covariance is the
//! inverse normal matrix scaled by the reduced chi-square:
//! `inv(JᵀJ) · χ² / (m − n)`.

use serde::{Deserialize, Serialize};

use super::linear_solver::{invert, solve};

/// Smallest damping weight per parameter, relative to the largest diagonal
/// of `JᵀJ`. Keeps the damped system solvable when a parameter has no
/// influence on the model, e.g. a component whose fraction sits at 0.
const DAMPING_FLOOR: f64 = 1e-12;

/// Configuration for Levenberg-Marquardt optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    /// Maximum iterations.
    pub max_iterations: usize,
    /// Relative reduction of χ² below which the fit is converged.
    pub ftol: f64,
    /// Relative parameter step below which the fit is converged.
    pub xtol: f64,
    /// Initial damping parameter.
    pub initial_lambda: f64,
    /// Factor to increase lambda on failed step.
    pub lambda_up: f64,
    /// Factor to decrease lambda on successful step.
    pub lambda_down: f64,
    /// Damping above which the optimizer gives up.
    pub max_lambda: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 400,
            ftol: 1.49e-8,
            xtol: 1.49e-8,
            initial_lambda: 0.001,
            lambda_up: 10.0,
            lambda_down: 0.1,
            max_lambda: 1e10,
        }
    }
}

impl LmConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) {
        assert!(self.max_iterations > 0, "max_iterations must be positive");
        assert!(
            self.ftol > 0.0 && self.xtol > 0.0,
            "ftol and xtol must be positive, got {} and {}",
            self.ftol,
            self.xtol
        );
        assert!(
            self.lambda_up > 1.0 && self.lambda_down > 0.0 && self.lambda_down < 1.0,
            "lambda_up must be > 1 and lambda_down in (0, 1)"
        );
    }
}

/// Result of L-M optimization.
#[derive(Debug, Clone, Copy)]
pub struct LmResult<const N: usize> {
    pub params: [f64; N],
    /// Parameter covariance; all `inf` when it cannot be estimated.
    pub covariance: [[f64; N]; N],
    pub chi2: f64,
    pub converged: bool,
    pub iterations: usize,
}

/// Box bounds on the model parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<const N: usize> {
    pub lower: [f64; N],
    pub upper: [f64; N],
}

impl<const N: usize> Bounds<N> {
    pub fn unbounded() -> Self {
        Self {
            lower: [f64::NEG_INFINITY; N],
            upper: [f64::INFINITY; N],
        }
    }

    #[inline]
    pub fn clamp(&self, params: &mut [f64; N]) {
        for ((p, &lo), &hi) in params.iter_mut().zip(&self.lower).zip(&self.upper) {
            *p = p.clamp(lo, hi);
        }
    }
}

/// Trait for 1D curves that can be fit with L-M optimization.
pub trait CurveModel<const N: usize> {
    /// Evaluate the model at `x`.
    fn evaluate(&self, x: f64, params: &[f64; N]) -> f64;

    /// Partial derivatives with respect to each parameter at `x`.
    fn jacobian_row(&self, x: f64, params: &[f64; N]) -> [f64; N];

    /// Apply parameter constraints after an update.
    fn constrain(&self, _params: &mut [f64; N]) {}
}

/// Fit `model` to the points `(data_x, data_y)` starting from `initial_params`.
pub fn optimize<const N: usize, M: CurveModel<N>>(
    model: &M,
    data_x: &[f64],
    data_y: &[f64],
    initial_params: [f64; N],
    config: &LmConfig,
) -> LmResult<N> {
    debug_assert_eq!(data_x.len(), data_y.len());

    let mut params = initial_params;
    model.constrain(&mut params);
    let mut lambda = config.initial_lambda;
    let mut prev_chi2 = compute_chi2(model, data_x, data_y, &params);
    let mut converged = false;
    let mut iterations = 0;

    let n = data_x.len();
    let mut jacobian = Vec::with_capacity(n);
    let mut residuals = Vec::with_capacity(n);

    if prev_chi2.is_finite() {
        for iter in 0..config.max_iterations {
            iterations = iter + 1;

            if prev_chi2 == 0.0 {
                converged = true;
                break;
            }

            fill_jacobian_residuals(model, data_x, data_y, &params, &mut jacobian, &mut residuals);
            let (hessian, gradient) = compute_hessian_gradient(&jacobian, &residuals);

            if gradient.iter().all(|g| *g == 0.0) {
                converged = true;
                break;
            }

            let max_diagonal = (0..N).map(|i| hessian[i][i]).fold(0.0_f64, f64::max);
            let floor = DAMPING_FLOOR * max_diagonal;
            let mut damped_hessian = hessian;
            for (i, row) in damped_hessian.iter_mut().enumerate() {
                row[i] = row[i].max(floor) * (1.0 + lambda);
            }

            let Some(delta) = solve(&damped_hessian, &gradient) else {
                break;
            };

            let mut new_params = params;
            for (p, d) in new_params.iter_mut().zip(delta.iter()) {
                *p += d;
            }
            model.constrain(&mut new_params);

            let new_chi2 = compute_chi2(model, data_x, data_y, &new_params);
            let step_is_small = is_small_step(&params, &new_params, config.xtol);

            if new_chi2.is_finite() && new_chi2 < prev_chi2 {
                let reduction = (prev_chi2 - new_chi2) / prev_chi2;
                params = new_params;
                lambda *= config.lambda_down;
                prev_chi2 = new_chi2;

                if reduction <= config.ftol || step_is_small {
                    converged = true;
                    break;
                }
            } else {
                // No improvement possible at the parameter resolution we care about.
                if step_is_small {
                    converged = true;
                    break;
                }
                lambda *= config.lambda_up;
                if lambda > config.max_lambda {
                    break;
                }
            }
        }
    }

    let covariance = estimate_covariance(model, data_x, &params, prev_chi2);

    LmResult {
        params,
        covariance,
        chi2: prev_chi2,
        converged,
        iterations,
    }
}

fn is_small_step<const N: usize>(old: &[f64; N], new: &[f64; N], xtol: f64) -> bool {
    old.iter()
        .zip(new.iter())
        .all(|(&o, &n)| (n - o).abs() <= xtol * (o.abs() + xtol))
}

fn compute_chi2<const N: usize, M: CurveModel<N>>(
    model: &M,
    data_x: &[f64],
    data_y: &[f64],
    params: &[f64; N],
) -> f64 {
    data_x
        .iter()
        .zip(data_y.iter())
        .map(|(&x, &y)| {
            let residual = y - model.evaluate(x, params);
            residual * residual
        })
        .sum()
}

/// Fill jacobian and residuals buffers, reusing existing allocations.
fn fill_jacobian_residuals<const N: usize, M: CurveModel<N>>(
    model: &M,
    data_x: &[f64],
    data_y: &[f64],
    params: &[f64; N],
    jacobian: &mut Vec<[f64; N]>,
    residuals: &mut Vec<f64>,
) {
    jacobian.clear();
    residuals.clear();

    for (&x, &y) in data_x.iter().zip(data_y.iter()) {
        jacobian.push(model.jacobian_row(x, params));
        residuals.push(y - model.evaluate(x, params));
    }
}

/// Compute Hessian (JᵀJ) and gradient (Jᵀr).
/// Exploits symmetry: only computes upper triangle, then mirrors.
#[allow(clippy::needless_range_loop)]
pub fn compute_hessian_gradient<const N: usize>(
    jacobian: &[[f64; N]],
    residuals: &[f64],
) -> ([[f64; N]; N], [f64; N]) {
    let mut hessian = [[0.0f64; N]; N];
    let mut gradient = [0.0f64; N];

    for (row, &r) in jacobian.iter().zip(residuals.iter()) {
        for i in 0..N {
            gradient[i] += row[i] * r;
            for j in i..N {
                hessian[i][j] += row[i] * row[j];
            }
        }
    }

    for i in 1..N {
        for j in 0..i {
            hessian[i][j] = hessian[j][i];
        }
    }

    (hessian, gradient)
}

fn estimate_covariance<const N: usize, M: CurveModel<N>>(
    model: &M,
    data_x: &[f64],
    params: &[f64; N],
    chi2: f64,
) -> [[f64; N]; N] {
    let m = data_x.len();
    if m <= N || !chi2.is_finite() {
        return [[f64::INFINITY; N]; N];
    }

    let jacobian: Vec<[f64; N]> = data_x.iter().map(|&x| model.jacobian_row(x, params)).collect();
    let zeros = vec![0.0; m];
    let (hessian, _) = compute_hessian_gradient(&jacobian, &zeros);

    let Some(mut inverse) = invert(&hessian) else {
        tracing::warn!("Covariance of the parameters could not be estimated");
        return [[f64::INFINITY; N]; N];
    };

    let scale = chi2 / (m - N) as f64;
    for row in inverse.iter_mut() {
        for v in row.iter_mut() {
            *v *= scale;
        }
    }
    inverse
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y = a * x + b
    struct Line;

    impl CurveModel<2> for Line {
        fn evaluate(&self, x: f64, params: &[f64; 2]) -> f64 {
            params[0] * x + params[1]
        }

        fn jacobian_row(&self, x: f64, _params: &[f64; 2]) -> [f64; 2] {
            [x, 1.0]
        }
    }

    /// y = a * exp(-k x)
    struct Decay {
        bounds: Bounds<2>,
    }

    impl CurveModel<2> for Decay {
        fn evaluate(&self, x: f64, params: &[f64; 2]) -> f64 {
            params[0] * (-params[1] * x).exp()
        }

        fn jacobian_row(&self, x: f64, params: &[f64; 2]) -> [f64; 2] {
            let e = (-params[1] * x).exp();
            [e, -params[0] * x * e]
        }

        fn constrain(&self, params: &mut [f64; 2]) {
            self.bounds.clamp(params);
        }
    }

    #[test]
    fn test_exact_line_fit() {
        let xs: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.5 * x - 1.0).collect();
        let result = optimize(&Line, &xs, &ys, [0.0, 0.0], &LmConfig::default());
        assert!(result.converged);
        assert!((result.params[0] - 2.5).abs() < 1e-8);
        assert!((result.params[1] + 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_noisy_line_covariance_is_finite_and_positive() {
        let xs: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let ys: Vec<f64> = xs
            .iter()
            .enumerate()
            .map(|(i, x)| 1.5 * x + 0.3 + if i % 2 == 0 { 0.05 } else { -0.05 })
            .collect();
        let result = optimize(&Line, &xs, &ys, [1.0, 0.0], &LmConfig::default());
        assert!(result.converged);
        assert!(result.covariance[0][0] > 0.0 && result.covariance[0][0].is_finite());
        assert!(result.covariance[1][1] > 0.0 && result.covariance[1][1].is_finite());
        assert!((result.covariance[0][1] - result.covariance[1][0]).abs() < 1e-15);
    }

    #[test]
    fn test_exponential_decay_fit() {
        let xs: Vec<f64> = (0..40).map(|i| i as f64 * 0.25).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * (-0.7 * x).exp()).collect();
        let model = Decay {
            bounds: Bounds::unbounded(),
        };
        let result = optimize(&model, &xs, &ys, [1.0, 0.2], &LmConfig::default());
        assert!(result.converged);
        assert!((result.params[0] - 3.0).abs() < 1e-6);
        assert!((result.params[1] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_bounds_are_respected() {
        let xs: Vec<f64> = (0..40).map(|i| i as f64 * 0.25).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * (-0.7 * x).exp()).collect();
        let model = Decay {
            bounds: Bounds {
                lower: [0.0, 1.0],
                upper: [10.0, 5.0],
            },
        };
        let result = optimize(&model, &xs, &ys, [1.0, 2.0], &LmConfig::default());
        assert!(result.params[1] >= 1.0);
        assert!(result.params[0] <= 10.0);
    }

    #[test]
    fn test_too_few_points_gives_infinite_covariance() {
        let xs = [0.0, 1.0];
        let ys = [1.0, 3.0];
        let result = optimize(&Line, &xs, &ys, [0.0, 0.0], &LmConfig::default());
        assert!(result.converged);
        assert!(result.covariance[0][0].is_infinite());
    }

    #[test]
    fn test_non_finite_start_does_not_converge() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [1.0, f64::NAN, 3.0];
        let result = optimize(&Line, &xs, &ys, [0.0, 0.0], &LmConfig::default());
        assert!(!result.converged);
        assert_eq!(result.iterations, 0);
    }

    /// y = a * x, with a second parameter the model ignores.
    struct LineWithDeadParameter;

    impl CurveModel<2> for LineWithDeadParameter {
        fn evaluate(&self, x: f64, params: &[f64; 2]) -> f64 {
            params[0] * x
        }

        fn jacobian_row(&self, x: f64, _params: &[f64; 2]) -> [f64; 2] {
            [x, 0.0]
        }
    }

    #[test]
    fn test_parameter_without_influence_still_converges() {
        let xs: Vec<f64> = (1..30).map(|i| i as f64 * 0.5).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 1.75 * x + if x.fract() == 0.0 { 0.01 } else { -0.01 }).collect();
        let result = optimize(&LineWithDeadParameter, &xs, &ys, [0.5, 3.0], &LmConfig::default());
        assert!(result.converged);
        assert!((result.params[0] - 1.75).abs() < 1e-3);
        assert_eq!(result.params[1], 3.0);
    }

    #[test]
    fn test_hessian_is_symmetric() {
        let jac = [[1.0, 2.0, 3.0], [0.5, -1.0, 2.0]];
        let res = [1.0, -2.0];
        let (h, g) = compute_hessian_gradient(&jac, &res);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(h[i][j], h[j][i]);
            }
        }
        assert!((g[0] - 0.0).abs() < 1e-12);
        assert!((g[1] - 4.0).abs() < 1e-12);
        assert!((g[2] - -1.0).abs() < 1e-12);
    }
}
