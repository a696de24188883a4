//! Sample covariance matrices.

use nalgebra::DMatrix;

use crate::error::{check_len, Error, Result};

/// Population covariance of `M` variables observed `N` times.
///
/// `samples[i]` holds the `N` observations of variable `i`. Entries are
/// `E[i·j] − E[i]·E[j]`; with weights, every expectation is the weighted mean
/// `Σw·v / Σw`.
pub fn covariance(samples: &[&[f64]], weights: Option<&[f64]>) -> Result<DMatrix<f64>> {
    let Some(first) = samples.first() else {
        return Err(Error::EmptyInput { what: "covariance variables" });
    };
    let n = first.len();
    if n == 0 {
        return Err(Error::EmptyInput { what: "covariance samples" });
    }
    for s in samples {
        check_len("covariance samples", n, s.len())?;
    }
    if let Some(w) = weights {
        check_len("covariance weights", n, w.len())?;
    }

    let total = weights.map_or(n as f64, |w| w.iter().sum());
    if !(total > 0.0) {
        return Err(Error::DegenerateInput {
            reason: format!("sum of weights is {total}"),
        });
    }
    let expectation = |f: &dyn Fn(usize) -> f64| -> f64 {
        match weights {
            Some(w) => (0..n).map(|k| w[k] * f(k)).sum::<f64>() / total,
            None => (0..n).map(f).sum::<f64>() / total,
        }
    };

    let means: Vec<f64> = samples.iter().map(|s| expectation(&|k| s[k])).collect();

    let m = samples.len();
    let mut cov = DMatrix::zeros(m, m);
    for i in 0..m {
        for j in i..m {
            let (a, b) = (samples[i], samples[j]);
            let value = expectation(&|k| a[k] * b[k]) - means[i] * means[j];
            cov[(i, j)] = value;
            cov[(j, i)] = value;
        }
    }
    Ok(cov)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covariance_matches_hand_computation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let cov = covariance(&[&x, &y], None).unwrap();
        assert_eq!(cov.shape(), (2, 2));
        assert!((cov[(0, 0)] - 1.25).abs() < 1e-12);
        assert!((cov[(1, 1)] - 5.0).abs() < 1e-12);
        assert!((cov[(0, 1)] - 2.5).abs() < 1e-12);
        assert_eq!(cov[(0, 1)], cov[(1, 0)]);
    }

    #[test]
    fn test_weighted_covariance_acts_as_repeats() {
        let cov_w = covariance(&[&[0.0, 2.0]], Some(&[3.0, 1.0])).unwrap();
        let cov_r = covariance(&[&[0.0, 0.0, 0.0, 2.0]], None).unwrap();
        assert!((cov_w[(0, 0)] - cov_r[(0, 0)]).abs() < 1e-12);
    }

    #[test]
    fn test_covariance_errors() {
        assert!(matches!(covariance(&[], None), Err(Error::EmptyInput { .. })));
        assert!(matches!(
            covariance(&[&[1.0, 2.0], &[1.0]], None),
            Err(Error::LengthMismatch { .. })
        ));
        assert!(matches!(
            covariance(&[&[1.0, 2.0]], Some(&[0.0, 0.0])),
            Err(Error::DegenerateInput { .. })
        ));
    }
}
