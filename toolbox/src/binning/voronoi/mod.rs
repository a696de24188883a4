//! Adaptive Voronoi binning of pixels to a target signal-to-noise.
//!
//! Implements the algorithm of Cappellari & Copin (2003, MNRAS 342, 345):
//!
//! 1. **Bin accretion**: starting from the highest-S/N pixel, a bin grows by
//!    repeatedly adding the unbinned pixel nearest to its centroid until
//!    adding more would move it away from the target, make it less round, or
//!    leave a gap of more than 1.2 pixels to the nearest member. The next bin starts at the
//!    unbinned pixel nearest to the signal-weighted centroid of everything
//!    binned so far.
//! 2. **Reassignment**: bins that end below 80% of the target are dissolved
//!    and their pixels join the nearest successful bin.
//! 3. **Centroidal Voronoi tessellation**: bin generators are moved to the
//!    `(S/N)⁴`-weighted centroids of their Voronoi regions until they settle,
//!    or with the weighted variant of Diehl & Statler (2006), to geometric
//!    centroids with per-bin length scales `sqrt(npix / SN)`.
//!
//! Coordinates are expected on a common scale where neighbouring pixels sit
//! `pixel_size` apart.


use glam::DVec2;
use rayon::prelude::*;

use super::config::VoronoiConfig;
use crate::error::{check_len, Error, Result};

/// Fraction of the target S/N an accreted bin must reach to survive.
const GOOD_BIN_FRACTION: f64 = 0.8;

/// Largest gap, in pixel sizes, between an accreted pixel and the nearest
/// pixel already in the bin.
const MAX_ACCRETION_DISTANCE: f64 = 1.2;

/// Largest tolerated deviation of a bin from a disc.
const MAX_ROUNDNESS: f64 = 0.3;

/// Generator movement, in pixel sizes, below which the tessellation has converged.
const CVT_TOLERANCE: f64 = 0.1;

/// Result of [`bin2d`]. Bin vectors are indexed by bin id.
#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiBins {
    /// Bin id of every input pixel.
    pub class: Vec<usize>,
    /// Signal-weighted centroid of each bin.
    pub x_bar: Vec<f64>,
    pub y_bar: Vec<f64>,
    pub sn: Vec<f64>,
    /// Number of pixels in each bin.
    pub npix: Vec<usize>,
    /// Length scale of each bin (1 unless the weighted tessellation is used).
    pub scale: Vec<f64>,
    /// Voronoi generators.
    pub x_node: Vec<f64>,
    pub y_node: Vec<f64>,
    /// Tessellation iterations performed.
    pub cvt_iterations: usize,
}

impl VoronoiBins {
    pub fn len(&self) -> usize {
        self.sn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sn.is_empty()
    }
}

/// Borrowed per-pixel inputs.
struct Pixels<'a> {
    x: &'a [f64],
    y: &'a [f64],
    signal: &'a [f64],
    noise: &'a [f64],
}

impl Pixels<'_> {
    fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    fn position(&self, i: usize) -> DVec2 {
        DVec2::new(self.x[i], self.y[i])
    }

    fn pixel_sn(&self, i: usize) -> f64 {
        self.signal[i] / self.noise[i]
    }

    /// Combined S/N of a set of pixels: `Σs / sqrt(Σn²)`.
    fn sn(&self, members: &[usize]) -> f64 {
        let signal: f64 = members.iter().map(|&i| self.signal[i]).sum();
        let noise2: f64 = members.iter().map(|&i| self.noise[i] * self.noise[i]).sum();
        signal / noise2.sqrt()
    }

    fn centroid(&self, members: &[usize]) -> DVec2 {
        members.iter().map(|&i| self.position(i)).sum::<DVec2>() / members.len() as f64
    }

    /// Weighted centroid, falling back to the geometric one for zero total weight.
    fn weighted_centroid(&self, members: &[usize], weight: impl Fn(usize) -> f64) -> DVec2 {
        let mass: f64 = members.iter().map(|&i| weight(i)).sum();
        if !(mass > 0.0 && mass.is_finite()) {
            return self.centroid(members);
        }
        members.iter().map(|&i| self.position(i) * weight(i)).sum::<DVec2>() / mass
    }

    /// `max distance from centroid / equivalent disc radius − 1`.
    fn roundness(&self, members: &[usize], pixel_size: f64) -> f64 {
        let equivalent_radius = (members.len() as f64 / std::f64::consts::PI).sqrt() * pixel_size;
        let center = self.centroid(members);
        let max_distance = members
            .iter()
            .map(|&i| self.position(i).distance_squared(center))
            .fold(0.0_f64, f64::max)
            .sqrt();
        max_distance / equivalent_radius - 1.0
    }
}

/// Bin pixels at `(x, y)` with the given signal and noise to `target_sn`.
///
/// # Errors
///
/// - `EmptyInput` / `LengthMismatch` for malformed inputs
/// - `InvalidParameter` for a non-positive target or noise
/// - `InsufficientSignal` if all pixels together stay below the target
pub fn bin2d(
    x: &[f64],
    y: &[f64],
    signal: &[f64],
    noise: &[f64],
    target_sn: f64,
    config: &VoronoiConfig,
) -> Result<VoronoiBins> {
    config.validate();
    if x.is_empty() {
        return Err(Error::EmptyInput { what: "voronoi pixels" });
    }
    check_len("y coordinates", x.len(), y.len())?;
    check_len("signal", x.len(), signal.len())?;
    check_len("noise", x.len(), noise.len())?;
    if !(target_sn > 0.0 && target_sn.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "target_sn",
            reason: format!("must be positive and finite, got {target_sn}"),
        });
    }
    if noise.iter().any(|n| !(*n > 0.0 && n.is_finite())) {
        return Err(Error::InvalidParameter {
            name: "noise",
            reason: "every pixel needs a positive, finite noise".to_string(),
        });
    }
    if x.iter().chain(y).chain(signal).any(|v| !v.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "pixels",
            reason: "coordinates and signal must be finite".to_string(),
        });
    }

    let pixels = Pixels { x, y, signal, noise };
    let all: Vec<usize> = (0..pixels.len()).collect();
    let total_sn = pixels.sn(&all);
    if !(total_sn >= target_sn) {
        return Err(Error::InsufficientSignal { total_sn, target_sn });
    }

    if (0..pixels.len()).all(|i| pixels.pixel_sn(i) >= target_sn) {
        tracing::warn!("All pixels already reach S/N {target_sn}, every pixel is its own bin");
        let scale = vec![1.0; pixels.len()];
        return Ok(summarize(&pixels, all, x.to_vec(), y.to_vec(), scale, 0));
    }

    let accreted = accrete(&pixels, target_sn, config.pixel_size);
    let (mut nodes, mut class) = reassign_bad_bins(&pixels, &accreted);
    tracing::debug!("{} bins after accretion and reassignment", nodes.len());

    let mut scale = vec![1.0; nodes.len()];
    let mut iterations = 0;
    if config.cvt {
        let max_iterations = config.max_cvt_iterations.unwrap_or(nodes.len());
        iterations = refine_tessellation(&pixels, &mut nodes, &mut scale, config.wvt, config.pixel_size, max_iterations);
        class = tessellate(&pixels, &nodes, &scale);
        tracing::debug!("{} tessellation iterations, {} bins", iterations, nodes.len());
    }

    let (x_node, y_node) = nodes.iter().map(|n| (n.x, n.y)).unzip();
    Ok(summarize(&pixels, class, x_node, y_node, scale, iterations))
}

/// Grow bins pixel by pixel. Returns the bin label of every pixel, `None` for
/// pixels left over or belonging to bins that fell short of the target.
fn accrete(pixels: &Pixels, target_sn: f64, pixel_size: f64) -> Vec<Option<usize>> {
    let n = pixels.len();
    let mut class: Vec<Option<usize>> = vec![None; n];
    let mut good_bins: Vec<bool> = Vec::new();
    let mut unbinned = n;

    let mut start = (0..n)
        .max_by(|&a, &b| pixels.pixel_sn(a).total_cmp(&pixels.pixel_sn(b)))
        .unwrap_or(0);

    loop {
        let label = good_bins.len();
        let mut members = vec![start];
        class[start] = Some(label);
        unbinned -= 1;

        let mut position_sum = pixels.position(start);
        let mut sn_old = pixels.pixel_sn(start);
        let mut signal_sum = pixels.signal[start];
        let mut noise2_sum = pixels.noise[start] * pixels.noise[start];

        let good = loop {
            let centroid = position_sum / members.len() as f64;
            let Some((next, _)) = nearest_unbinned(pixels, &class, centroid) else {
                break sn_old > GOOD_BIN_FRACTION * target_sn;
            };
            let candidate = pixels.position(next);
            let gap2 = members
                .iter()
                .map(|&m| pixels.position(m).distance_squared(candidate))
                .fold(f64::INFINITY, f64::min);

            members.push(next);
            let roundness = pixels.roundness(&members, pixel_size);
            let candidate_signal = signal_sum + pixels.signal[next];
            let candidate_noise2 = noise2_sum + pixels.noise[next] * pixels.noise[next];
            let sn = candidate_signal / candidate_noise2.sqrt();

            if gap2.sqrt() > MAX_ACCRETION_DISTANCE * pixel_size
                || roundness > MAX_ROUNDNESS
                || (sn - target_sn).abs() > (sn_old - target_sn).abs()
                || sn_old > sn
            {
                members.pop();
                break sn_old > GOOD_BIN_FRACTION * target_sn;
            }

            class[next] = Some(label);
            unbinned -= 1;
            position_sum += pixels.position(next);
            signal_sum = candidate_signal;
            noise2_sum = candidate_noise2;
            sn_old = sn;
        };
        good_bins.push(good);

        if unbinned == 0 {
            break;
        }

        let binned: Vec<usize> = (0..n).filter(|&i| class[i].is_some()).collect();
        let centroid = pixels.weighted_centroid(&binned, |i| pixels.signal[i]);
        match nearest_unbinned(pixels, &class, centroid) {
            Some((next, _)) => start = next,
            None => break,
        }
    }

    let kept = good_bins.iter().filter(|g| **g).count();
    tracing::debug!("bin accretion: {} bins, {} reached the target", good_bins.len(), kept);

    for c in class.iter_mut() {
        if matches!(*c, Some(label) if !good_bins[label]) {
            *c = None;
        }
    }
    class
}

fn nearest_unbinned(pixels: &Pixels, class: &[Option<usize>], point: DVec2) -> Option<(usize, f64)> {
    class
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_none())
        .map(|(i, _)| (i, pixels.position(i).distance_squared(point)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Turn the surviving accreted bins into generators and hand every other
/// pixel to the nearest of them.
fn reassign_bad_bins(pixels: &Pixels, accreted: &[Option<usize>]) -> (Vec<DVec2>, Vec<usize>) {
    let mut labels: Vec<usize> = accreted.iter().flatten().copied().collect();
    labels.sort_unstable();
    labels.dedup();

    if labels.is_empty() {
        tracing::warn!("No accreted bin reached the target S/N, merging all pixels into one bin");
        let all: Vec<usize> = (0..pixels.len()).collect();
        return (vec![pixels.centroid(&all)], vec![0; pixels.len()]);
    }

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); labels.len()];
    for (i, c) in accreted.iter().enumerate() {
        if let Some(label) = c {
            if let Ok(k) = labels.binary_search(label) {
                members[k].push(i);
            }
        }
    }
    let nodes: Vec<DVec2> = members.iter().map(|m| pixels.centroid(m)).collect();

    let unit_scale = vec![1.0; nodes.len()];
    let nearest = tessellate(pixels, &nodes, &unit_scale);
    let class: Vec<usize> = accreted
        .iter()
        .zip(&nearest)
        .map(|(c, &near)| match c {
            Some(label) => labels.binary_search(label).unwrap_or(near),
            None => near,
        })
        .collect();

    let nodes = group(&class, nodes.len())
        .iter()
        .zip(&nodes)
        .map(|(m, &node)| if m.is_empty() { node } else { pixels.centroid(m) })
        .collect();
    (nodes, class)
}

/// Assign every pixel to the generator with the smallest `distance² / scale²`.
fn tessellate(pixels: &Pixels, nodes: &[DVec2], scale: &[f64]) -> Vec<usize> {
    (0..pixels.len())
        .into_par_iter()
        .map(|i| {
            let p = pixels.position(i);
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (k, (node, s)) in nodes.iter().zip(scale).enumerate() {
                let d = p.distance_squared(*node) / (s * s);
                if d < best_distance {
                    best = k;
                    best_distance = d;
                }
            }
            best
        })
        .collect()
}

/// Pixel indices per bin.
fn group(class: &[usize], bins: usize) -> Vec<Vec<usize>> {
    let mut members = vec![Vec::new(); bins];
    for (i, &c) in class.iter().enumerate() {
        members[c].push(i);
    }
    members
}

/// Move generators to the centroids of their regions until they settle.
/// Generators that end up with no pixels are dropped. Returns the number of
/// iterations run.
fn refine_tessellation(
    pixels: &Pixels,
    nodes: &mut Vec<DVec2>,
    scale: &mut Vec<f64>,
    wvt: bool,
    pixel_size: f64,
    max_iterations: usize,
) -> usize {
    let density: Vec<f64> = if wvt {
        vec![1.0; pixels.len()]
    } else {
        (0..pixels.len()).map(|i| pixels.pixel_sn(i).powi(2)).collect()
    };

    let mut iterations = 0;
    for iteration in 1..=max_iterations.max(1) {
        iterations = iteration;
        let class = tessellate(pixels, nodes, scale);
        let members = group(&class, nodes.len());

        let mut new_nodes = Vec::with_capacity(nodes.len());
        let mut new_scale = Vec::with_capacity(nodes.len());
        let mut moved2 = 0.0;
        for ((m, &old), &old_scale) in members.iter().zip(nodes.iter()).zip(scale.iter()) {
            if m.is_empty() {
                continue;
            }
            let node = pixels.weighted_centroid(m, |i| density[i] * density[i]);
            let s = if wvt {
                let sn = pixels.sn(m);
                if sn > 0.0 {
                    (m.len() as f64 / sn).sqrt()
                } else {
                    old_scale
                }
            } else {
                old_scale
            };
            moved2 += node.distance_squared(old);
            new_nodes.push(node);
            new_scale.push(s);
        }

        *nodes = new_nodes;
        *scale = new_scale;

        if moved2.sqrt() / pixel_size < CVT_TOLERANCE {
            break;
        }
    }
    iterations
}

/// Drop empty bins, renumber, and compute per-bin outputs.
fn summarize(
    pixels: &Pixels,
    class: Vec<usize>,
    x_node: Vec<f64>,
    y_node: Vec<f64>,
    scale: Vec<f64>,
    cvt_iterations: usize,
) -> VoronoiBins {
    let members = group(&class, x_node.len());
    let mut remap = vec![0; x_node.len()];
    let mut out = VoronoiBins {
        class: Vec::new(),
        x_bar: Vec::new(),
        y_bar: Vec::new(),
        sn: Vec::new(),
        npix: Vec::new(),
        scale: Vec::new(),
        x_node: Vec::new(),
        y_node: Vec::new(),
        cvt_iterations,
    };

    for (k, m) in members.iter().enumerate() {
        if m.is_empty() {
            continue;
        }
        remap[k] = out.sn.len();
        let bar = pixels.weighted_centroid(m, |i| pixels.signal[i]);
        out.x_bar.push(bar.x);
        out.y_bar.push(bar.y);
        out.sn.push(pixels.sn(m));
        out.npix.push(m.len());
        out.scale.push(scale[k]);
        out.x_node.push(x_node[k]);
        out.y_node.push(y_node[k]);
    }
    out.class = class.iter().map(|&c| remap[c]).collect();
    out
}
