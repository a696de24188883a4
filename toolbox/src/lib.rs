//! Toolbox - numerical helpers for astronomical catalogue analysis.
//!
//! This library provides:
//! - Normal and normal-mixture fits to binned samples
//! - Iterative 2D sigma clipping against an elliptical boundary
//! - Covariance ellipses, rotations, and linear transformations
//! - Pixel grids and adaptive Voronoi binning to a target S/N
//! - Descriptive statistics, percentiles, plot limits, and random sampling
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use toolbox::{clip2d, into_pixels, into_vorbins, AxisSpec, ClipConfig, GridConfig, PoissonCounts, VorbinConfig};
//!
//! // Remove outliers from a 2D point cloud
//! let clip = clip2d(&x, &y, &ClipConfig::default())?;
//! println!("kept {} of {} points", clip.keep.len(), x.len());
//!
//! // Bin the survivors into pixels, then into bins of S/N 10
//! let grid = GridConfig::new(AxisSpec::with_scale(0.5), AxisSpec::with_scale(0.5));
//! let (mut pixels, data_pix) = into_pixels(&x, &y, &grid)?;
//! let (bins, data_bin) = into_vorbins(&mut pixels, &data_pix, &VorbinConfig::new(10.0), &PoissonCounts)?;
//! ```

mod error;

pub mod binning;
pub mod clip;
pub mod fit;
pub mod format;
pub mod geometry;
pub mod quantity;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Axis, Error, Result};

// ============================================================================
// Fitting
// ============================================================================

pub use fit::{
    fit_gauss, fit_three_gauss, fit_two_gauss, GaussianComponent, GaussianFit, GaussianFitConfig,
    MultiGaussianFit,
};

// ============================================================================
// Sigma clipping
// ============================================================================

pub use clip::{clip2d, clip2d_weighted, ClipConfig, ClipEllipse, ClipResult};

// ============================================================================
// Geometry
// ============================================================================

pub use geometry::{cov_ellipse, covariance, Ellipse};

// ============================================================================
// Binning
// ============================================================================

pub use binning::{
    // Configuration
    AxisSpec,
    GridConfig,
    VorbinConfig,
    VoronoiConfig,
    // Pixel grids
    PixelTable,
    into_pixels,
    // Voronoi bins
    BinTable,
    ExplicitSignal,
    PoissonCounts,
    SignalModel,
    into_vorbins,
};

// ============================================================================
// Units and formatting
// ============================================================================

pub use format::fmt_time;
pub use quantity::{Quantity, Unit};
