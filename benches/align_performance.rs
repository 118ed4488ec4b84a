use std::collections::BTreeMap;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use raceline::replay::{DriverSeries, RawSample, align};

fn create_driver_series(driver_offset: f64, samples: usize) -> DriverSeries {
    DriverSeries {
        samples: (0..samples)
            .map(|i| RawSample {
                // ~4Hz native rate, slightly shifted per driver
                timestamp_s: driver_offset + i as f64 * 0.25,
                x: Some(i as f64),
                y: Some(-(i as f64)),
                distance_m: Some(i as f64 * 15.0),
                speed_kmh: Some(250.0),
                lap: Some(1 + (i / 400) as u32),
            })
            .collect(),
    }
}

fn create_grid(drivers: usize, samples_per_driver: usize) -> BTreeMap<String, DriverSeries> {
    (0..drivers)
        .map(|d| {
            (
                format!("{}", d + 1),
                create_driver_series(d as f64 * 0.03, samples_per_driver),
            )
        })
        .collect()
}

fn bench_align(c: &mut Criterion) {
    let mut group = c.benchmark_group("aligner");

    let small_grid = create_grid(4, 1_000);
    group.bench_function("align_4_drivers_1k_samples", |b| {
        b.iter(|| align(black_box(&small_grid), 1.0, 2.0).unwrap());
    });

    let full_grid = create_grid(20, 6_000);
    group.bench_function("align_20_drivers_6k_samples", |b| {
        b.iter(|| align(black_box(&full_grid), 1.0, 2.0).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_align);
criterion_main!(benches);
