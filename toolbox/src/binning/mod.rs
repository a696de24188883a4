//! Spatial binning of 2D point sets: regular pixel grids and adaptive
//! Voronoi bins built on top of them.

mod config;
mod pixels;
mod vorbins;
pub mod voronoi;


pub use config::{AxisSpec, GridConfig, VorbinConfig, VoronoiConfig};
pub use pixels::{into_pixels, GridAxis, Pixel, PixelGrid, PixelTable, GRID_TOLERANCE};
pub use vorbins::{into_vorbins, Bin, BinTable, ExplicitSignal, PoissonCounts, SignalModel};
pub use voronoi::{bin2d, VoronoiBins};
