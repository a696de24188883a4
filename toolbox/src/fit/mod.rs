//! Curve fitting: a generic Levenberg-Marquardt solver and the normal
//! (mixture) fits built on it.

mod diagnostics;
mod gaussian;
mod linear_solver;
mod lm_optimizer;
mod multi_gaussian;


pub use gaussian::{fit_gauss, GaussianFit, GaussianFitConfig, DEFAULT_BINS};
pub use lm_optimizer::{compute_hessian_gradient, optimize, Bounds, CurveModel, LmConfig, LmResult};
pub use multi_gaussian::{fit_three_gauss, fit_two_gauss, GaussianComponent, MultiGaussianFit};
