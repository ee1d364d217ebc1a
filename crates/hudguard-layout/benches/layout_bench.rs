//! Benchmarks for layout calculation.
//!
//! Run with: cargo bench -p hudguard-layout

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use hudguard_core::viewport::sanitize;
use hudguard_layout::{Breakpoints, LayoutConfig, calculate_layout};
use std::hint::black_box;

// =============================================================================
// Test Data
// =============================================================================

/// One viewport per device class, plus a pathological input.
const VIEWPORTS: &[(&str, f64, f64)] = &[
    ("mobile_portrait", 390.0, 844.0),
    ("mobile_landscape", 844.0 * 0.8, 390.0),
    ("desktop", 1280.0, 800.0),
    ("large_desktop", 3840.0, 2160.0),
    ("conservative", 5000.0, 250.0),
    ("nan", f64::NAN, -50.0),
];

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_calculate_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/calculate");
    for &(name, w, h) in VIEWPORTS {
        group.bench_with_input(BenchmarkId::from_parameter(name), &(w, h), |b, &(w, h)| {
            b.iter(|| calculate_layout(black_box(w), black_box(h)))
        });
    }
    group.finish();
}

fn bench_compute_presanitized(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/compute");
    for &(name, w, h) in VIEWPORTS {
        let sanitized = sanitize(w, h);
        group.bench_with_input(BenchmarkId::from_parameter(name), &sanitized, |b, s| {
            b.iter(|| LayoutConfig::compute(black_box(s), Breakpoints::DEFAULT))
        });
    }
    group.finish();
}

fn bench_resize_sweep(c: &mut Criterion) {
    c.bench_function("layout/sweep_320_to_3840", |b| {
        b.iter(|| {
            let mut w = 320.0;
            while w <= 3840.0 {
                black_box(calculate_layout(w, w * 0.5625));
                w += 40.0;
            }
        })
    });
}

fn bench_validate(c: &mut Criterion) {
    let layout = calculate_layout(1280.0, 800.0);
    c.bench_function("layout/validate", |b| b.iter(|| black_box(&layout).validate()));
}

criterion_group!(
    benches,
    bench_calculate_layout,
    bench_compute_presanitized,
    bench_resize_sweep,
    bench_validate,
);
criterion_main!(benches);
