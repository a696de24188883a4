//! Probability densities: normal, asymmetric normal, multivariate normal.

use nalgebra::{DMatrix, DVector};

use crate::error::{check_len, Error, Result};

/// `1 / sqrt(2π)`.
pub const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Normal probability density with mean `mean` and width `std`.
///
/// The width enters squared in the exponent and by magnitude in the
/// normalisation, so `std` and `-std` give the same density.
#[inline]
pub fn normal_pdf(x: f64, mean: f64, std: f64) -> f64 {
    let z = (x - mean) / std;
    FRAC_1_SQRT_2PI / std.abs() * (-0.5 * z * z).exp()
}

/// Asymmetric normal density: width `sigma_lower` below `mu`, `sigma_upper`
/// at and above it, scaled so both halves join continuously and the whole
/// integrates to one.
pub fn asym_gauss(x: f64, mu: f64, sigma_lower: f64, sigma_upper: f64) -> f64 {
    let sigma_lower = sigma_lower.abs();
    let sigma_upper = sigma_upper.abs();
    let fac = 2.0 / (sigma_lower + sigma_upper);
    if x < mu {
        fac * sigma_lower * normal_pdf(x, mu, sigma_lower)
    } else {
        fac * sigma_upper * normal_pdf(x, mu, sigma_upper)
    }
}

/// Evaluate M multivariate Gaussians of dimension N, the i-th one at `x[i]`.
///
/// Negative Mahalanobis exponents (non positive-definite covariance) give
/// NaN for that point. With `normalize = false` the peak value is one.
pub fn multigauss(
    x: &[DVector<f64>],
    mu: &[DVector<f64>],
    cov: &[DMatrix<f64>],
    normalize: bool,
) -> Result<Vec<f64>> {
    check_len("multigauss mu", x.len(), mu.len())?;
    check_len("multigauss cov", x.len(), cov.len())?;

    x.iter()
        .zip(mu)
        .zip(cov)
        .map(|((x, mu), cov)| {
            let ndim = cov.nrows();
            check_len("multigauss covariance columns", ndim, cov.ncols())?;
            check_len("multigauss x dimension", ndim, x.len())?;
            check_len("multigauss mu dimension", ndim, mu.len())?;

            let inverse = cov.clone().try_inverse().ok_or(Error::SingularMatrix {
                context: "multigauss covariance",
            })?;

            let factor = if normalize {
                let two_pi_n = (2.0 * std::f64::consts::PI).powi(ndim as i32);
                1.0 / (two_pi_n * cov.determinant().abs()).sqrt()
            } else {
                1.0
            };

            let offset = x - mu;
            let exponent = offset.dot(&(&inverse * &offset));
            if exponent < 0.0 {
                Ok(f64::NAN)
            } else {
                Ok((-0.5 * exponent).exp() * factor)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_pdf_peak_and_symmetry() {
        assert!((normal_pdf(0.0, 0.0, 1.0) - FRAC_1_SQRT_2PI).abs() < 1e-15);
        assert!((normal_pdf(1.3, 1.0, 2.0) - normal_pdf(0.7, 1.0, 2.0)).abs() < 1e-15);
        assert!((normal_pdf(1.3, 1.0, 2.0) - normal_pdf(1.3, 1.0, -2.0)).abs() < 1e-15);
    }

    #[test]
    fn test_normal_pdf_integrates_to_one() {
        let step = 0.001;
        let integral: f64 = (-10_000..10_000)
            .map(|i| normal_pdf(i as f64 * step, 0.5, 1.5) * step)
            .sum();
        assert!((integral - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_asym_gauss_continuous_at_mu_and_normalised() {
        let below = asym_gauss(2.0 - 1e-12, 2.0, 1.0, 3.0);
        let at = asym_gauss(2.0, 2.0, 1.0, 3.0);
        assert!((below - at).abs() < 1e-9);

        let step = 0.001;
        let integral: f64 = (-30_000..30_000)
            .map(|i| asym_gauss(i as f64 * step, 2.0, 1.0, -3.0) * step)
            .sum();
        assert!((integral - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_asym_gauss_equal_widths_is_normal() {
        for x in [-2.0, 0.0, 0.4, 3.0] {
            assert!((asym_gauss(x, 0.4, 1.2, 1.2) - normal_pdf(x, 0.4, 1.2)).abs() < 1e-15);
        }
    }

    #[test]
    fn test_multigauss_matches_univariate() {
        let x = vec![DVector::from_vec(vec![1.0]), DVector::from_vec(vec![-0.5])];
        let mu = vec![DVector::from_vec(vec![0.0]), DVector::from_vec(vec![0.0])];
        let cov = vec![
            DMatrix::from_vec(1, 1, vec![4.0]),
            DMatrix::from_vec(1, 1, vec![1.0]),
        ];
        let values = multigauss(&x, &mu, &cov, true).unwrap();
        assert!((values[0] - normal_pdf(1.0, 0.0, 2.0)).abs() < 1e-14);
        assert!((values[1] - normal_pdf(-0.5, 0.0, 1.0)).abs() < 1e-14);
    }

    #[test]
    fn test_multigauss_unnormalised_peak_is_one() {
        let x = vec![DVector::from_vec(vec![1.0, 2.0])];
        let mu = x.clone();
        let cov = vec![DMatrix::from_row_slice(2, 2, &[2.0, 0.3, 0.3, 1.0])];
        let values = multigauss(&x, &mu, &cov, false).unwrap();
        assert!((values[0] - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_multigauss_2d_diagonal_is_product() {
        let x = vec![DVector::from_vec(vec![1.0, -1.0])];
        let mu = vec![DVector::from_vec(vec![0.0, 0.0])];
        let cov = vec![DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 4.0])];
        let values = multigauss(&x, &mu, &cov, true).unwrap();
        let expected = normal_pdf(1.0, 0.0, 1.0) * normal_pdf(-1.0, 0.0, 2.0);
        assert!((values[0] - expected).abs() < 1e-14);
    }

    #[test]
    fn test_multigauss_indefinite_gives_nan() {
        let x = vec![DVector::from_vec(vec![1.0, 0.0])];
        let mu = vec![DVector::from_vec(vec![0.0, 0.0])];
        let cov = vec![DMatrix::from_row_slice(2, 2, &[-1.0, 0.0, 0.0, 1.0])];
        let values = multigauss(&x, &mu, &cov, true).unwrap();
        assert!(values[0].is_nan());
    }

    #[test]
    fn test_multigauss_errors() {
        let x = vec![DVector::from_vec(vec![1.0, 0.0])];
        let mu = vec![DVector::from_vec(vec![0.0, 0.0])];
        let singular = vec![DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0])];
        assert!(matches!(
            multigauss(&x, &mu, &singular, true),
            Err(Error::SingularMatrix { .. })
        ));
        assert!(matches!(
            multigauss(&x, &[], &singular, true),
            Err(Error::LengthMismatch { .. })
        ));
    }
}
