//! Iterative elliptical sigma clipping of 2D point sets.
//!
//! Each iteration fits independent normal distributions to the x and y
//! coordinates of the retained points, builds an axis-aligned ellipse with
//! semi-axes `sigma · std` centred on the fitted means, and drops every point
//! on or outside it. The loop stops once an iteration removes nothing or the
//! iteration cap is reached.
//!
//! An ellipse radius of `r(φ) = a·b / sqrt((a·sin φ)² + (b·cos φ)²)` against a
//! point distance `d` gives `d < r(φ) ⇔ (dx/a)² + (dy/b)² < 1`; the second form
//! is used since it stays well defined for infinite `sigma`.


use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{check_len, Error, Result};
use crate::fit::{fit_gauss, GaussianFit, GaussianFitConfig};

/// Configuration for [`clip2d`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipConfig {
    /// Clip threshold in standard deviations. May be infinite.
    pub sigma: f64,
    /// Maximum number of fit-and-clip iterations.
    pub max_iterations: usize,
    /// Settings for the per-axis Gaussian fits.
    pub fit: GaussianFitConfig,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            sigma: 3.0,
            max_iterations: 10,
            fit: GaussianFitConfig::default(),
        }
    }
}

impl ClipConfig {
    pub fn new(sigma: f64, max_iterations: usize) -> Self {
        let config = Self {
            sigma,
            max_iterations,
            ..Default::default()
        };
        config.validate();
        config
    }

    /// Validate configuration parameters.
    pub fn validate(&self) {
        assert!(self.sigma > 0.0, "Sigma must be positive, got {}", self.sigma);
        assert!(self.max_iterations > 0, "Max iterations must be at least 1");
        self.fit.validate();
    }
}

/// Axis-aligned clip ellipse built from two per-axis Gaussian fits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipEllipse {
    pub center: DVec2,
    /// Semi-axis along x (`sigma · std_x`).
    pub a: f64,
    /// Semi-axis along y (`sigma · std_y`).
    pub b: f64,
    pub fit_x: GaussianFit,
    pub fit_y: GaussianFit,
}

impl ClipEllipse {
    fn from_fits(fit_x: GaussianFit, fit_y: GaussianFit, sigma: f64) -> Self {
        Self {
            center: DVec2::new(fit_x.mean, fit_y.mean),
            a: sigma * fit_x.std,
            b: sigma * fit_y.std,
            fit_x,
            fit_y,
        }
    }

    /// Ellipse radius along polar angle `phi` measured from the centre.
    ///
    /// Diagnostic accessor for drawing or reporting the boundary; point
    /// classification goes through [`contains`](Self::contains).
    pub fn radius_at(&self, phi: f64) -> f64 {
        let (sin, cos) = phi.sin_cos();
        self.a * self.b / ((self.a * sin).powi(2) + (self.b * cos).powi(2)).sqrt()
    }

    /// True when `point` lies strictly inside the ellipse.
    #[inline]
    pub fn contains(&self, point: DVec2) -> bool {
        let d = point - self.center;
        (d.x / self.a).powi(2) + (d.y / self.b).powi(2) < 1.0
    }
}

/// Outcome of [`clip2d`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClipResult {
    /// Indices of retained points, ascending.
    pub keep: Vec<usize>,
    /// Indices of clipped points, ascending.
    pub fail: Vec<usize>,
    /// Ellipse of the last completed fit.
    pub ellipse: ClipEllipse,
    pub iterations: usize,
    /// Retained count before the first iteration and after each one.
    pub retained_history: Vec<usize>,
}

impl ClipResult {
    /// Classify test points against the final ellipse without refitting.
    pub fn test(&self, x: &[f64], y: &[f64]) -> Result<Vec<bool>> {
        check_len("test y coordinates", x.len(), y.len())?;
        Ok(x.iter()
            .zip(y)
            .map(|(&x, &y)| self.ellipse.contains(DVec2::new(x, y)))
            .collect())
    }
}

/// Elliptical sigma clipping of the points `(x[i], y[i])`.
///
/// # Errors
///
/// - `LengthMismatch` if `x` and `y` differ in length
/// - `DegenerateInput` if fewer than 2 points remain before a fit, or the
///   retained points have zero dispersion along an axis
/// - `NonConvergence` if a per-axis Gaussian fit fails
pub fn clip2d(x: &[f64], y: &[f64], config: &ClipConfig) -> Result<ClipResult> {
    clip2d_weighted(x, y, None, None, config)
}

/// [`clip2d`] with optional per-axis weights for the Gaussian fits.
pub fn clip2d_weighted(
    x: &[f64],
    y: &[f64],
    x_weights: Option<&[f64]>,
    y_weights: Option<&[f64]>,
    config: &ClipConfig,
) -> Result<ClipResult> {
    config.validate();
    check_len("y coordinates", x.len(), y.len())?;
    if let Some(w) = x_weights {
        check_len("x weights", x.len(), w.len())?;
    }
    if let Some(w) = y_weights {
        check_len("y weights", x.len(), w.len())?;
    }

    tracing::debug!("sigma clip at {} sigma over {} points", config.sigma, x.len());

    let mut keep: Vec<usize> = (0..x.len()).collect();
    let mut fail: Vec<usize> = Vec::new();
    let mut retained_history = vec![keep.len()];
    let mut iterations = 0;

    let mut ellipse = fit_ellipse(x, y, x_weights, y_weights, &keep, config)?;
    loop {
        iterations += 1;

        let (inside, outside): (Vec<usize>, Vec<usize>) = keep
            .iter()
            .partition(|&&i| ellipse.contains(DVec2::new(x[i], y[i])));
        let removed = outside.len();
        fail.extend(outside);
        keep = inside;
        retained_history.push(keep.len());

        tracing::debug!("  iteration {iterations}: removed {removed}");

        if removed == 0 || iterations >= config.max_iterations {
            break;
        }
        ellipse = fit_ellipse(x, y, x_weights, y_weights, &keep, config)?;
    }

    fail.sort_unstable();

    tracing::info!(
        "sigma clip: dispersions {:.4}|{:.4}, clip semi-axes {:.4}|{:.4}, removed {}, remaining {}",
        ellipse.fit_x.std,
        ellipse.fit_y.std,
        ellipse.a,
        ellipse.b,
        fail.len(),
        keep.len()
    );

    Ok(ClipResult {
        keep,
        fail,
        ellipse,
        iterations,
        retained_history,
    })
}

fn fit_ellipse(
    x: &[f64],
    y: &[f64],
    x_weights: Option<&[f64]>,
    y_weights: Option<&[f64]>,
    keep: &[usize],
    config: &ClipConfig,
) -> Result<ClipEllipse> {
    if keep.len() < 2 {
        return Err(Error::DegenerateInput {
            reason: format!("{} point(s) retained, need at least 2 to fit", keep.len()),
        });
    }

    let select = |values: &[f64]| -> Vec<f64> { keep.iter().map(|&i| values[i]).collect() };
    let xs = select(x);
    let ys = select(y);
    let xw = x_weights.map(select);
    let yw = y_weights.map(select);

    let fit_x = fit_gauss(&xs, xw.as_deref(), &config.fit)?;
    let fit_y = fit_gauss(&ys, yw.as_deref(), &config.fit)?;

    Ok(ClipEllipse::from_fits(fit_x, fit_y, config.sigma))
}
