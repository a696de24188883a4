//! Regular pixel grids over 2D point sets.

use glam::DVec2;

use super::config::{AxisSpec, GridConfig};
use crate::error::{check_len, Axis, Error, Result};
use crate::quantity::Unit;
use crate::stats::minmax;

/// Largest relative mismatch tolerated between span, count, and scale.
pub const GRID_TOLERANCE: f64 = 1e-3;

/// Resolved pixel layout along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridAxis {
    pub pixels: usize,
    pub scale: f64,
    pub min: f64,
    pub max: f64,
    pub unit: Option<Unit>,
}

impl GridAxis {
    /// Resolve the pixel count, scale, and limits of one axis, using `data`
    /// for any limits that have to be derived.
    pub fn resolve(axis: Axis, spec: &AxisSpec, data: &[f64]) -> Result<Self> {
        validate_spec(axis, spec)?;

        let data_range = || {
            minmax(data).ok_or(Error::EmptyInput {
                what: "coordinates (needed to derive pixel limits)",
            })
        };

        let (min, max) = match (spec.limits, spec.pixels, spec.scale) {
            (Some(limits), _, _) => limits,
            (None, Some(n), Some(scale)) => {
                let (lo, hi) = data_range()?;
                let mid = lo + 0.5 * (hi - lo);
                let half = 0.5 * n as f64 * scale;
                (mid - half, mid + half)
            }
            (None, Some(_), None) => data_range()?,
            (None, None, Some(scale)) => {
                let (lo, hi) = data_range()?;
                ((lo / scale).floor() * scale, (hi / scale).ceil() * scale)
            }
            (None, None, None) => underspecified(axis)?,
        };

        let span = max - min;
        if !(span > 0.0) {
            return Err(Error::DegenerateInput {
                reason: format!("{axis} pixel limits [{min}, {max}] have zero width"),
            });
        }

        let (pixels, scale) = match (spec.pixels, spec.scale) {
            (Some(n), Some(scale)) => (n, scale),
            (Some(n), None) => (n, span / n as f64),
            (None, Some(scale)) => {
                let raw = span / scale;
                let rounded = raw.round();
                if rounded < 1.0 || (1.0 - span / (rounded * scale)).abs() > GRID_TOLERANCE {
                    return Err(Error::NonIntegralPixelCount { axis, pixels: raw });
                }
                (rounded as usize, scale)
            }
            (None, None) => underspecified(axis)?,
        };

        let deviation = 1.0 - span / pixels as f64 / scale;
        if deviation.abs() > GRID_TOLERANCE {
            return Err(Error::Inconsistent { axis, deviation });
        }

        Ok(Self {
            pixels,
            scale,
            min,
            max,
            unit: spec.unit,
        })
    }

    /// Centre of pixel `i`.
    #[inline]
    pub fn center(&self, i: usize) -> f64 {
        self.min + (i as f64 + 0.5) * self.scale
    }

    /// Pixel index of `v`, or `None` outside `[min, max]`.
    ///
    /// Values are assigned to the nearest pixel centre, rounding ties to
    /// even. A value exactly on `max` belongs to the last pixel.
    #[inline]
    pub fn index_of(&self, v: f64) -> Option<usize> {
        if !(self.min..=self.max).contains(&v) {
            return None;
        }
        let i = self.to_normalized(v).round_ties_even().max(0.0) as usize;
        Some(i.min(self.pixels - 1))
    }

    /// Coordinate in units of pixels from the first pixel centre.
    #[inline]
    pub fn to_normalized(&self, v: f64) -> f64 {
        (v - self.center(0)) / self.scale
    }

    /// Inverse of [`to_normalized`](Self::to_normalized).
    #[inline]
    pub fn from_normalized(&self, u: f64) -> f64 {
        self.center(0) + u * self.scale
    }
}

fn validate_spec(axis: Axis, spec: &AxisSpec) -> Result<()> {
    match (spec.pixels, spec.scale, spec.limits) {
        (None, None, None) => {
            return Err(Error::Underspecified {
                axis,
                reason: "no pixel count, scale, or limits given",
            })
        }
        (None, None, Some(_)) => {
            return Err(Error::Underspecified {
                axis,
                reason: "limits need a pixel count or a pixel scale as well",
            })
        }
        _ => {}
    }

    if spec.pixels == Some(0) {
        return Err(Error::InvalidParameter {
            name: "pixels",
            reason: format!("{axis} pixel count must be at least 1"),
        });
    }
    if let Some(scale) = spec.scale {
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "scale",
                reason: format!("{axis} pixel scale must be positive and finite, got {scale}"),
            });
        }
    }
    if let Some((lo, hi)) = spec.limits {
        if !(lo.is_finite() && hi.is_finite() && hi > lo) {
            return Err(Error::InvalidParameter {
                name: "limits",
                reason: format!("{axis} limits ({lo}, {hi}) must be finite and increasing"),
            });
        }
    }
    Ok(())
}

fn underspecified<T>(axis: Axis) -> Result<T> {
    Err(Error::Underspecified {
        axis,
        reason: "no pixel count or scale given",
    })
}

/// Regular `nx × ny` grid. Pixel ids are row-major: `id = ix + iy · nx`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelGrid {
    pub x: GridAxis,
    pub y: GridAxis,
}

impl PixelGrid {
    pub fn resolve(x: &[f64], y: &[f64], config: &GridConfig) -> Result<Self> {
        Ok(Self {
            x: GridAxis::resolve(Axis::X, &config.x, x)?,
            y: GridAxis::resolve(Axis::Y, &config.y, y)?,
        })
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.x.pixels
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.y.pixels
    }

    /// Total number of pixels.
    #[inline]
    pub fn len(&self) -> usize {
        self.nx() * self.ny()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn pixel_id(&self, ix: usize, iy: usize) -> usize {
        ix + iy * self.nx()
    }

    /// Pixel containing `(x, y)`, or `None` outside the grid.
    #[inline]
    pub fn pixel_of(&self, x: f64, y: f64) -> Option<usize> {
        Some(self.pixel_id(self.x.index_of(x)?, self.y.index_of(y)?))
    }

    /// Centre of pixel `id`.
    pub fn center(&self, id: usize) -> DVec2 {
        DVec2::new(self.x.center(id % self.nx()), self.y.center(id / self.nx()))
    }

    /// Map real coordinates onto the grid's working scale, where pixel
    /// centres sit on integer positions starting at 0.
    #[inline]
    pub fn to_normalized(&self, p: DVec2) -> DVec2 {
        DVec2::new(self.x.to_normalized(p.x), self.y.to_normalized(p.y))
    }

    #[inline]
    pub fn from_normalized(&self, p: DVec2) -> DVec2 {
        DVec2::new(self.x.from_normalized(p.x), self.y.from_normalized(p.y))
    }
}

/// One pixel of a [`PixelTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixel {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    /// Number of data points in the pixel.
    pub count: usize,
    /// Owning Voronoi bin, once binned.
    pub bin: Option<usize>,
    /// Data points in the owning bin.
    pub bin_count: Option<usize>,
    /// Signal of the owning bin; NaN when unbinned.
    pub bin_signal: f64,
    /// Noise of the owning bin; NaN when unbinned.
    pub bin_noise: f64,
}

impl Pixel {
    pub(crate) fn clear_bin(&mut self) {
        self.bin = None;
        self.bin_count = None;
        self.bin_signal = f64::NAN;
        self.bin_noise = f64::NAN;
    }
}

/// Pixels of a grid in id order, together with the grid they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelTable {
    pub grid: PixelGrid,
    pub pixels: Vec<Pixel>,
}

impl PixelTable {
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Pixels holding at least one data point.
    pub fn occupied(&self) -> impl Iterator<Item = &Pixel> {
        self.pixels.iter().filter(|p| p.count > 0)
    }
}

/// Bin the points `(x, y)` into a regular pixel grid.
///
/// Returns the pixel table and, for every input point, its pixel id (`None`
/// outside the grid).
pub fn into_pixels(x: &[f64], y: &[f64], config: &GridConfig) -> Result<(PixelTable, Vec<Option<usize>>)> {
    check_len("y coordinates", x.len(), y.len())?;
    let grid = PixelGrid::resolve(x, y, config)?;

    tracing::info!(
        "bin 2D data into pixels: x scale {} over [{}, {}] ({} px), y scale {} over [{}, {}] ({} px), {} pixels total",
        grid.x.scale,
        grid.x.min,
        grid.x.max,
        grid.nx(),
        grid.y.scale,
        grid.y.min,
        grid.y.max,
        grid.ny(),
        grid.len()
    );

    let mut pixels: Vec<Pixel> = (0..grid.len())
        .map(|id| {
            let c = grid.center(id);
            Pixel {
                id,
                x: c.x,
                y: c.y,
                count: 0,
                bin: None,
                bin_count: None,
                bin_signal: f64::NAN,
                bin_noise: f64::NAN,
            }
        })
        .collect();

    let data_pix: Vec<Option<usize>> = x.iter().zip(y).map(|(&x, &y)| grid.pixel_of(x, y)).collect();
    for id in data_pix.iter().flatten() {
        pixels[*id].count += 1;
    }

    let outside = data_pix.iter().filter(|p| p.is_none()).count();
    if outside > 0 {
        tracing::debug!("{outside} of {} points fall outside the pixel grid", x.len());
    }

    Ok((PixelTable { grid, pixels }, data_pix))
}
