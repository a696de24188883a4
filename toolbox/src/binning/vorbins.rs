//! Voronoi binning of a pixel table.
//!
//! Occupied pixels are handed to [`voronoi::bin2d`](super::voronoi::bin2d) on
//! the grid's normalised scale; the results are mapped back to real units,
//! aggregated per bin, and written back onto the pixel table.

use glam::DVec2;

use super::config::VorbinConfig;
use super::pixels::PixelTable;
use super::voronoi::bin2d;
use crate::error::{Error, Result};

/// Source of per-pixel signal and noise for binning.
pub trait SignalModel {
    /// Signal and noise of the pixels `ids` of `table`, in that order.
    fn signal_noise(&self, table: &PixelTable, ids: &[usize]) -> Result<(Vec<f64>, Vec<f64>)>;
}

/// Poisson statistics: signal is the data count, noise its square root.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoissonCounts;

impl SignalModel for PoissonCounts {
    fn signal_noise(&self, table: &PixelTable, ids: &[usize]) -> Result<(Vec<f64>, Vec<f64>)> {
        Ok(ids
            .iter()
            .map(|&id| {
                let count = table.pixels[id].count as f64;
                (count, count.sqrt())
            })
            .unzip())
    }
}

/// Caller-supplied signal and noise for every pixel of the table, by id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExplicitSignal {
    pub signal: Vec<f64>,
    pub noise: Vec<f64>,
}

impl ExplicitSignal {
    pub fn new(signal: Vec<f64>, noise: Vec<f64>) -> Self {
        Self { signal, noise }
    }
}

impl SignalModel for ExplicitSignal {
    fn signal_noise(&self, table: &PixelTable, ids: &[usize]) -> Result<(Vec<f64>, Vec<f64>)> {
        if self.signal.len() < table.len() {
            return Err(Error::MissingField { field: "signal" });
        }
        if self.noise.len() < table.len() {
            return Err(Error::MissingField { field: "noise" });
        }
        Ok(ids.iter().map(|&id| (self.signal[id], self.noise[id])).unzip())
    }
}

/// One Voronoi bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub id: usize,
    /// Signal-weighted centroid in real units.
    pub x: f64,
    pub y: f64,
    /// Number of data points in the bin.
    pub count: usize,
    /// Summed signal of the member pixels.
    pub signal: f64,
    /// Root-sum-square noise of the member pixels.
    pub noise: f64,
    pub sn: f64,
    /// Number of member pixels.
    pub npix: usize,
    /// Bin length scale in pixels.
    pub scale: f64,
}

/// Bins produced by [`into_vorbins`].
#[derive(Debug, Clone, PartialEq)]
pub struct BinTable {
    pub bins: Vec<Bin>,
    pub target_sn: f64,
}

impl BinTable {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Group the occupied pixels of `table` into Voronoi bins of `target_sn`.
///
/// `data_pix` is the per-point pixel assignment returned by
/// [`into_pixels`](super::into_pixels). Every pixel of `table` is annotated
/// with its bin (or cleared when unoccupied). Returns the bin table and the
/// bin of every data point.
pub fn into_vorbins<M: SignalModel + ?Sized>(
    table: &mut PixelTable,
    data_pix: &[Option<usize>],
    config: &VorbinConfig,
    model: &M,
) -> Result<(BinTable, Vec<Option<usize>>)> {
    config.validate();
    if let Some(&bad) = data_pix.iter().flatten().find(|&&id| id >= table.len()) {
        return Err(Error::InvalidParameter {
            name: "data_pix",
            reason: format!("pixel id {bad} out of range for {} pixels", table.len()),
        });
    }

    let good: Vec<usize> = table.occupied().map(|p| p.id).collect();
    if good.is_empty() {
        return Err(Error::EmptyInput {
            what: "occupied pixels",
        });
    }

    let (signal, noise) = model.signal_noise(table, &good)?;
    let grid = table.grid;
    let (xs, ys): (Vec<f64>, Vec<f64>) = good
        .iter()
        .map(|&id| {
            let p = &table.pixels[id];
            let u = grid.to_normalized(DVec2::new(p.x, p.y));
            (u.x, u.y)
        })
        .unzip();

    let voronoi = bin2d(&xs, &ys, &signal, &noise, config.target_sn, &config.voronoi)?;

    let mut bins: Vec<Bin> = (0..voronoi.len())
        .map(|k| {
            let centre = grid.from_normalized(DVec2::new(voronoi.x_bar[k], voronoi.y_bar[k]));
            Bin {
                id: k,
                x: centre.x,
                y: centre.y,
                count: 0,
                signal: 0.0,
                noise: 0.0,
                sn: voronoi.sn[k],
                npix: voronoi.npix[k],
                scale: voronoi.scale[k],
            }
        })
        .collect();

    for pixel in table.pixels.iter_mut() {
        pixel.clear_bin();
    }
    for (i, &id) in good.iter().enumerate() {
        let k = voronoi.class[i];
        table.pixels[id].bin = Some(k);
        bins[k].signal += signal[i];
        bins[k].noise += noise[i] * noise[i];
    }
    for bin in bins.iter_mut() {
        bin.noise = bin.noise.sqrt();
    }

    let data_bin: Vec<Option<usize>> = data_pix
        .iter()
        .map(|p| p.and_then(|id| table.pixels[id].bin))
        .collect();
    for k in data_bin.iter().flatten() {
        bins[*k].count += 1;
    }

    for pixel in table.pixels.iter_mut() {
        if let Some(k) = pixel.bin {
            pixel.bin_count = Some(bins[k].count);
            pixel.bin_signal = bins[k].signal;
            pixel.bin_noise = bins[k].noise;
        }
    }

    log_summary(&bins);

    Ok((
        BinTable {
            bins,
            target_sn: config.target_sn,
        },
        data_bin,
    ))
}

fn log_summary(bins: &[Bin]) {
    let counts = bins.iter().map(|b| b.count);
    let min = counts.clone().min().unwrap_or(0);
    let max = counts.clone().max().unwrap_or(0);
    let mean = counts.sum::<usize>() as f64 / bins.len().max(1) as f64;
    tracing::info!(
        "Voronoi binning of pixels: {} bins, points per bin min {}, max {}, mean {:.0}",
        bins.len(),
        min,
        max,
        mean
    );
}
