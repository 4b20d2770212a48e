//! Benchmarks for gaze smoothing performance

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gaze_session::{
    filters::{exponential::GazeSmoother, GazeFilter, NoFilter},
    geometry::Point,
};

fn benchmark_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    // Test data - simulating a noisy gaze sweeping across the screen
    let test_data: Vec<Point> = (0..100)
        .map(|i| {
            let t = f64::from(i) * 0.1;
            let x = 960.0 + 600.0 * t.sin() + 15.0 * rand::random::<f64>();
            let y = 540.0 + 300.0 * t.cos() + 15.0 * rand::random::<f64>();
            Point::new(x, y)
        })
        .collect();

    let filter_configs = vec![
        ("no_filter", Box::new(NoFilter) as Box<dyn GazeFilter>),
        ("exponential_0.3", Box::new(GazeSmoother::new(0.3))),
        ("exponential_0.7", Box::new(GazeSmoother::new(0.7))),
    ];

    for (name, mut filter) in filter_configs {
        group.bench_with_input(BenchmarkId::new("single_update", name), &test_data[0], |b, &point| {
            b.iter(|| black_box(filter.apply(black_box(point))));
        });

        group.bench_with_input(BenchmarkId::new("sequence_100", name), &test_data, |b, data| {
            b.iter(|| {
                filter.reset();
                for &point in data {
                    black_box(filter.apply(black_box(point)));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_filters);
criterion_main!(benches);
