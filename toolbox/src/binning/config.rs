//! Configuration types for pixel and Voronoi binning.

use serde::{Deserialize, Serialize};

use crate::quantity::Unit;

// =============================================================================
// Pixel grid configuration
// =============================================================================

/// Pixel settings for one axis.
///
/// At least a pixel count or a scale must be given; limits are optional and
/// are derived from the data when missing:
///
/// - count only: the data's own `[min, max]`
/// - scale only: the data range rounded outward to multiples of the scale
/// - count and scale: `count · scale` wide, centred on the data midpoint
///
/// When all three are given they must agree to a relative `1e-3`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisSpec {
    pub pixels: Option<usize>,
    pub scale: Option<f64>,
    pub limits: Option<(f64, f64)>,
    /// Unit of the coordinate, recorded on the grid.
    pub unit: Option<Unit>,
}

impl AxisSpec {
    pub fn with_pixels(pixels: usize) -> Self {
        Self {
            pixels: Some(pixels),
            ..Default::default()
        }
    }

    pub fn with_scale(scale: f64) -> Self {
        Self {
            scale: Some(scale),
            ..Default::default()
        }
    }

    pub fn pixels(mut self, pixels: usize) -> Self {
        self.pixels = Some(pixels);
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn limits(mut self, min: f64, max: f64) -> Self {
        self.limits = Some((min, max));
        self
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }
}

/// Pixel settings for both axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub x: AxisSpec,
    pub y: AxisSpec,
}

impl GridConfig {
    pub fn new(x: AxisSpec, y: AxisSpec) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// Voronoi binning configuration
// =============================================================================

/// Settings for the Voronoi bin-accretion algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoronoiConfig {
    /// Pixel size in the working coordinates (1 on a normalised grid).
    pub pixel_size: f64,
    /// Refine the accreted bins with a centroidal Voronoi tessellation.
    pub cvt: bool,
    /// Use the weighted tessellation of Diehl & Statler (2006) in the
    /// refinement step.
    pub wvt: bool,
    /// Cap on refinement iterations; `None` means one per bin.
    pub max_cvt_iterations: Option<usize>,
}

impl Default for VoronoiConfig {
    fn default() -> Self {
        Self {
            pixel_size: 1.0,
            cvt: true,
            wvt: false,
            max_cvt_iterations: None,
        }
    }
}

impl VoronoiConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) {
        assert!(
            self.pixel_size > 0.0 && self.pixel_size.is_finite(),
            "pixel_size must be positive and finite, got {}",
            self.pixel_size
        );
        if let Some(n) = self.max_cvt_iterations {
            assert!(n > 0, "max_cvt_iterations must be at least 1");
        }
    }
}

/// Settings for [`into_vorbins`](super::into_vorbins).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VorbinConfig {
    /// Signal-to-noise each bin should reach.
    pub target_sn: f64,
    pub voronoi: VoronoiConfig,
}

impl Default for VorbinConfig {
    fn default() -> Self {
        Self {
            target_sn: 10.0,
            voronoi: VoronoiConfig::default(),
        }
    }
}

impl VorbinConfig {
    pub fn new(target_sn: f64) -> Self {
        let config = Self {
            target_sn,
            ..Default::default()
        };
        config.validate();
        config
    }

    /// Validate configuration parameters.
    pub fn validate(&self) {
        assert!(
            self.target_sn > 0.0 && self.target_sn.is_finite(),
            "target_sn must be positive and finite, got {}",
            self.target_sn
        );
        self.voronoi.validate();
    }
}
