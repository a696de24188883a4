//! Confidence ellipses from 2x2 covariance matrices.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use glam::DVec2;
use nalgebra::{DMatrix, Matrix2, SymmetricEigen};

use super::covariance::covariance;
use crate::error::{Error, Result};

/// Default number of boundary samples.
pub const DEFAULT_ELLIPSE_POINTS: usize = 101;

/// Rotated ellipse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub center: DVec2,
    pub semi_major: f64,
    pub semi_minor: f64,
    /// Counter-clockwise angle of the major axis from +x, in `(−π/2, π/2]`.
    pub angle: f64,
}

impl Ellipse {
    /// Ellipse at `sigma` standard deviations for a 2x2 covariance matrix.
    ///
    /// Semi-axes are `sqrt(λ)·sigma` for the eigenvalues λ of `cov`; the
    /// angle is the polar angle of the eigenvector of the largest eigenvalue.
    pub fn from_covariance(cov: &DMatrix<f64>, center: DVec2, sigma: f64) -> Result<Self> {
        if cov.shape() != (2, 2) {
            return Err(Error::InvalidParameter {
                name: "cov",
                reason: format!("expected a 2x2 matrix, got {:?}", cov.shape()),
            });
        }
        if cov.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "cov",
                reason: "covariance contains non-finite values".to_string(),
            });
        }

        let m = Matrix2::new(cov[(0, 0)], cov[(0, 1)], cov[(1, 0)], cov[(1, 1)]);
        let eigen = SymmetricEigen::new(m);
        let (major, minor) = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] {
            (0, 1)
        } else {
            (1, 0)
        };

        let axis = eigen.eigenvectors.column(major);
        // Round-off can leave a tiny negative eigenvalue for singular input.
        let semi = |i: usize| eigen.eigenvalues[i].max(0.0).sqrt() * sigma;

        Ok(Self {
            center,
            semi_major: semi(major),
            semi_minor: semi(minor),
            angle: normalize_axis_angle(axis[1].atan2(axis[0])),
        })
    }

    /// Covariance ellipse of the points `(x, y)`, centred on their (weighted) mean.
    pub fn from_samples(x: &[f64], y: &[f64], weights: Option<&[f64]>, sigma: f64) -> Result<Self> {
        let cov = covariance(&[x, y], weights)?;
        let center = match weights {
            Some(w) => {
                let total: f64 = w.iter().sum();
                let wx: f64 = x.iter().zip(w).map(|(v, w)| v * w).sum();
                let wy: f64 = y.iter().zip(w).map(|(v, w)| v * w).sum();
                DVec2::new(wx / total, wy / total)
            }
            None => {
                let n = x.len() as f64;
                DVec2::new(x.iter().sum::<f64>() / n, y.iter().sum::<f64>() / n)
            }
        };
        Self::from_covariance(&cov, center, sigma)
    }

    /// `n` boundary points at uniformly spaced eccentric anomalies over `[0, 2π]`.
    ///
    /// The first and last points coincide, closing the polygon.
    pub fn points(&self, n: usize) -> Vec<DVec2> {
        let (sin_rot, cos_rot) = self.angle.sin_cos();
        let step = if n > 1 { TAU / (n - 1) as f64 } else { 0.0 };
        (0..n)
            .map(|k| {
                let (sin_t, cos_t) = (step * k as f64).sin_cos();
                let u = self.semi_major * cos_t;
                let v = self.semi_minor * sin_t;
                self.center + DVec2::new(u * cos_rot - v * sin_rot, u * sin_rot + v * cos_rot)
            })
            .collect()
    }
}

fn normalize_axis_angle(angle: f64) -> f64 {
    if angle > FRAC_PI_2 {
        angle - PI
    } else if angle <= -FRAC_PI_2 {
        angle + PI
    } else {
        angle
    }
}

/// Boundary polygon of the `sigma` confidence ellipse of `(x, y)`.
pub fn cov_ellipse(
    x: &[f64],
    y: &[f64],
    weights: Option<&[f64]>,
    sigma: f64,
    n: usize,
) -> Result<Vec<DVec2>> {
    Ok(Ellipse::from_samples(x, y, weights, sigma)?.points(n))
}
