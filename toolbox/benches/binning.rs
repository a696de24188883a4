//! Benchmark for pixel gridding and Voronoi binning.
//! Run with: cargo bench -p toolbox --bench binning

use std::hint::black_box;

use common::log_setup::{setup_logging, LogConfig};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use toolbox::binning::bin2d;
use toolbox::{AxisSpec, GridConfig, PoissonCounts, VorbinConfig, VoronoiConfig, into_pixels, into_vorbins};

/// Points concentrated towards the centre of `[0, 10]²`.
fn centrally_concentrated(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let r = 5.0 * rng.random::<f64>().powf(1.5);
            let phi = 2.0 * std::f64::consts::PI * rng.random::<f64>();
            (5.0 + r * phi.cos(), 5.0 + r * phi.sin())
        })
        .unzip()
}

/// Library warnings (failed fits, merged bins) show up next to criterion's output.
fn init_logging() {
    if let Err(e) = setup_logging(&LogConfig::console_only("warn")) {
        eprintln!("{e}");
    }
}

fn grid_config(pixels: usize) -> GridConfig {
    GridConfig::new(
        AxisSpec::with_pixels(pixels).limits(0.0, 10.0),
        AxisSpec::with_pixels(pixels).limits(0.0, 10.0),
    )
}

fn benchmark_into_pixels(c: &mut Criterion) {
    init_logging();
    let mut group = c.benchmark_group("into_pixels");
    let (x, y) = centrally_concentrated(200_000, 3);
    group.throughput(Throughput::Elements(x.len() as u64));

    for pixels in [32, 128] {
        let config = grid_config(pixels);
        group.bench_function(BenchmarkId::new("grid", pixels), |b| {
            b.iter(|| black_box(into_pixels(black_box(x.as_slice()), black_box(y.as_slice()), &config)))
        });
    }

    group.finish();
}

fn benchmark_bin2d(c: &mut Criterion) {
    let mut group = c.benchmark_group("bin2d");
    group.sample_size(10);

    for side in [32usize, 64] {
        let (x, y): (Vec<f64>, Vec<f64>) = (0..side * side)
            .map(|i| ((i % side) as f64, (i / side) as f64))
            .unzip();
        let signal: Vec<f64> = x
            .iter()
            .zip(&y)
            .map(|(&x, &y)| {
                let c = side as f64 / 2.0;
                let r2 = (x - c).powi(2) + (y - c).powi(2);
                100.0 * (-r2 / (side * side) as f64 * 8.0).exp() + 1.0
            })
            .collect();
        let noise: Vec<f64> = signal.iter().map(|s| s.sqrt()).collect();

        for (name, wvt) in [("cvt", false), ("wvt", true)] {
            let config = VoronoiConfig {
                wvt,
                ..Default::default()
            };
            group.bench_function(BenchmarkId::new(name, side * side), |b| {
                b.iter(|| black_box(bin2d(&x, &y, &signal, &noise, 20.0, &config)))
            });
        }
    }

    group.finish();
}

fn benchmark_into_vorbins(c: &mut Criterion) {
    let mut group = c.benchmark_group("into_vorbins");
    group.sample_size(10);
    let (x, y) = centrally_concentrated(100_000, 5);
    let config = VorbinConfig::new(15.0);

    for pixels in [32, 64] {
        let Ok((table, data_pix)) = into_pixels(&x, &y, &grid_config(pixels)) else {
            continue;
        };
        group.bench_function(BenchmarkId::new("grid", pixels), |b| {
            b.iter(|| {
                let mut table = table.clone();
                black_box(into_vorbins(&mut table, &data_pix, &config, &PoissonCounts))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_into_pixels, benchmark_bin2d, benchmark_into_vorbins);
criterion_main!(benches);
