//! Benchmarks for region estimation over buffered gaze points

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gaze_session::{
    geometry::Point,
    region::{DensityClusterEstimator, HeatmapEstimator},
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Two fixation clusters plus scattered saccade points
fn gaze_points(count: usize) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(17);
    (0..count)
        .map(|i| match i % 5 {
            0..=2 => Point::new(400.0 + rng.gen_range(-40.0..40.0), 300.0 + rng.gen_range(-40.0..40.0)),
            3 => Point::new(1400.0 + rng.gen_range(-30.0..30.0), 800.0 + rng.gen_range(-30.0..30.0)),
            _ => Point::new(rng.gen_range(0.0..1920.0), rng.gen_range(0.0..1080.0)),
        })
        .collect()
}

fn benchmark_estimators(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimators");
    let density = DensityClusterEstimator::default();
    let heatmap = HeatmapEstimator::new();

    for size in [30, 120, 500] {
        let points = gaze_points(size);

        group.bench_with_input(BenchmarkId::new("density", size), &points, |b, points| {
            b.iter(|| black_box(density.estimate(black_box(points))));
        });

        group.bench_with_input(BenchmarkId::new("heatmap", size), &points, |b, points| {
            b.iter(|| black_box(heatmap.estimate(1920.0, 1080.0, black_box(points))));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_estimators);
criterion_main!(benches);
