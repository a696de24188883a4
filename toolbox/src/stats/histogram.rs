//! Fixed-width histograms with optional weights and density normalisation.

use crate::error::{check_len, Error, Result};

/// Histogram over `bins` equal-width bins spanning `[edges[0], edges[bins]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Bin edges, `bins + 1` values.
    pub edges: Vec<f64>,
    /// Per-bin heights: (weighted) counts, or densities when normalised.
    pub heights: Vec<f64>,
}

impl Histogram {
    /// Build a histogram of `data` over its own `[min, max]` range.
    ///
    /// Every bin is half-open except the last, which also includes the right
    /// edge. When all values are equal the range is widened to `v ± 0.5`.
    /// With `density`, heights are divided by total weight and bin width so
    /// that the histogram integrates to one.
    pub fn new(data: &[f64], weights: Option<&[f64]>, bins: usize, density: bool) -> Result<Self> {
        if bins == 0 {
            return Err(Error::InvalidParameter {
                name: "bins",
                reason: "histogram needs at least one bin".to_string(),
            });
        }
        if data.is_empty() {
            return Err(Error::EmptyInput {
                what: "histogram data",
            });
        }
        if let Some(w) = weights {
            check_len("histogram weights", data.len(), w.len())?;
        }

        let (mut lo, mut hi) = super::minmax(data).ok_or(Error::EmptyInput {
            what: "histogram data (all NaN)",
        })?;
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut heights = vec![0.0; bins];
        for (i, &v) in data.iter().enumerate() {
            if !(lo..=hi).contains(&v) {
                continue;
            }
            let index = (((v - lo) / width) as usize).min(bins - 1);
            heights[index] += weights.map_or(1.0, |w| w[i]);
        }

        if density {
            let total: f64 = heights.iter().sum();
            if total <= 0.0 {
                return Err(Error::DegenerateInput {
                    reason: "histogram total weight is not positive".to_string(),
                });
            }
            for h in heights.iter_mut() {
                *h /= total * width;
            }
        }

        Ok(Self { edges, heights })
    }

    pub fn bins(&self) -> usize {
        self.heights.len()
    }

    /// Width of a single bin.
    pub fn bin_width(&self) -> f64 {
        (self.edges[self.bins()] - self.edges[0]) / self.bins() as f64
    }

    /// Bin centres, one per bin.
    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|e| 0.5 * (e[0] + e[1])).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_edges() {
        let data = [0.0, 1.0, 1.5, 2.0, 3.0, 4.0];
        let h = Histogram::new(&data, None, 4, false).unwrap();
        assert_eq!(h.edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        // last bin includes the right edge
        assert_eq!(h.heights, vec![1.0, 2.0, 1.0, 2.0]);
        assert_eq!(h.centers(), vec![0.5, 1.5, 2.5, 3.5]);
        assert!((h.bin_width() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_density_integrates_to_one() {
        let data: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.37).sin()).collect();
        let h = Histogram::new(&data, None, 30, true).unwrap();
        let integral: f64 = h.heights.iter().map(|v| v * h.bin_width()).sum();
        assert!((integral - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weights() {
        let data = [0.0, 1.0, 2.0];
        let weights = [1.0, 2.0, 3.0];
        let h = Histogram::new(&data, Some(&weights), 2, false).unwrap();
        assert_eq!(h.heights, vec![1.0, 5.0]);
    }

    #[test]
    fn test_constant_data_widens_range() {
        let data = [2.0; 5];
        let h = Histogram::new(&data, None, 4, false).unwrap();
        assert!((h.edges[0] - 1.5).abs() < 1e-12);
        assert!((h.edges[4] - 2.5).abs() < 1e-12);
        assert_eq!(h.heights.iter().sum::<f64>(), 5.0);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Histogram::new(&[], None, 10, true),
            Err(Error::EmptyInput { .. })
        ));
        assert!(matches!(
            Histogram::new(&[1.0], None, 0, true),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            Histogram::new(&[1.0, 2.0], Some(&[1.0]), 3, true),
            Err(Error::LengthMismatch { .. })
        ));
        assert!(matches!(
            Histogram::new(&[1.0, 2.0], Some(&[0.0, 0.0]), 3, true),
            Err(Error::DegenerateInput { .. })
        ));
    }
}
