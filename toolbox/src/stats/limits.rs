//! Range helpers: padded plot limits, rounding to a base, significant figures.

use serde::{Deserialize, Serialize};

use crate::error::{check_len, Error, Result};

/// Minimum and maximum of `values`, ignoring NaN. `None` when nothing is left.
pub fn minmax(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Error bars to include when computing limits.
#[derive(Debug, Clone, Copy, Default)]
pub enum ErrorBars<'a> {
    #[default]
    None,
    /// Same error above and below each value.
    Symmetric(&'a [f64]),
    /// Separate upper (`plus`) and lower (`minus`) errors.
    Asymmetric { plus: &'a [f64], minus: &'a [f64] },
}

/// Options for [`lims`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimsConfig {
    /// Extra padding as a fraction of the range, (below, above).
    pub pad: (f64, f64),
    /// Pad in log10 space.
    pub log: bool,
    /// Make the limits symmetric around this value (in data units).
    pub pivot: Option<f64>,
}

impl Default for LimsConfig {
    fn default() -> Self {
        Self {
            pad: (0.0, 0.0),
            log: false,
            pivot: None,
        }
    }
}

impl LimsConfig {
    /// Same padding on both sides.
    pub fn padded(pad: f64) -> Self {
        Self {
            pad: (pad, pad),
            ..Default::default()
        }
    }
}

/// Limits of a distribution, optionally widened by error bars, padded, made
/// symmetric about a pivot, and computed in log space. NaN values are ignored.
pub fn lims(values: &[f64], errors: ErrorBars<'_>, config: &LimsConfig) -> Result<(f64, f64)> {
    let (plus, minus) = match errors {
        ErrorBars::None => (None, None),
        ErrorBars::Symmetric(e) => (Some(e), Some(e)),
        ErrorBars::Asymmetric { plus, minus } => (Some(plus), Some(minus)),
    };
    for e in [plus, minus].into_iter().flatten() {
        check_len("lims errors", values.len(), e.len())?;
    }

    let error_at = |e: Option<&[f64]>, i: usize| e.map_or(0.0, |e| e[i]);
    let lower: Vec<f64> = (0..values.len())
        .map(|i| values[i] - error_at(minus, i))
        .collect();
    let upper: Vec<f64> = (0..values.len())
        .map(|i| values[i] + error_at(plus, i))
        .collect();

    let empty = Error::EmptyInput {
        what: "lims values (all NaN)",
    };
    let (mut lo, _) = minmax(&lower).ok_or(empty)?;
    let (_, mut hi) = minmax(&upper).ok_or(Error::EmptyInput {
        what: "lims values (all NaN)",
    })?;

    let mut pivot = config.pivot;
    if config.log {
        lo = lo.log10();
        hi = hi.log10();
        pivot = pivot.map(f64::log10);
    }

    if let Some(pivot) = pivot {
        let offset = (pivot - lo).max(hi - pivot);
        lo = pivot - offset;
        hi = pivot + offset;
    }

    let range = hi - lo;
    let mut limits = (lo - range * config.pad.0, hi + range * config.pad.1);

    if config.log {
        limits = (10f64.powf(limits.0), 10f64.powf(limits.1));
    }

    Ok(limits)
}

/// Round `x` to the nearest multiple of `base` (ties to even).
///
/// Subject to the usual floating point caveats: `nearest(0.3, 0.1)` is
/// `0.30000000000000004`.
#[inline]
pub fn nearest(x: f64, base: f64) -> f64 {
    (x / base).round_ties_even() * base
}

/// Position of the first significant figure of `x`.
///
/// Positive values count digits after the decimal point, negative values
/// before it: `whsf(0.012) == 2`, `whsf(340.0) == -2`. The position is
/// re-evaluated after rounding to that figure, so `whsf(0.096) == 1`.
pub fn whsf(x: f64) -> Result<i32> {
    if !(x.is_finite() && x > 0.0) {
        return Err(Error::InvalidParameter {
            name: "x",
            reason: format!("significant figure needs a positive finite number, got {x}"),
        });
    }
    let sf = -(x.log10().floor() as i32);
    let scale = 10f64.powi(sf);
    let rounded = (x * scale).round_ties_even() / scale;
    Ok(-(rounded.log10().floor() as i32))
}
