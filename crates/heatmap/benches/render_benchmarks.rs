//! Benchmarks for the heatmap crate - stamping, normalization and presentation.
//!
//! Run with: cargo bench --package heatmap --bench render_benchmarks

use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput,
};
use heatmap::composite::{accumulate, point_alpha, HeatLayer, Region};
use heatmap::{
    build_stamp, png, Gradient, Heatmap, Point, PointerEvent, ViewportConfig,
};
use rand::Rng;

/// Uniform random points over a `width`×`height` surface.
fn generate_points(count: usize, width: f64, height: f64) -> Vec<Point> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| Point::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height)))
        .collect()
}

fn bench_build_stamp(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_stamp");

    for (radius, blur) in [(10.0, 15.0), (25.0, 35.0), (50.0, 70.0)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("r{radius}_b{blur}")),
            &(radius, blur),
            |b, &(radius, blur)| b.iter(|| build_stamp(black_box(radius), black_box(blur))),
        );
    }

    group.finish();
}

fn bench_accumulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulate");
    let stamp = build_stamp(25.0, 35.0);
    let region = Region::sized(640, 480);

    for count in [10usize, 100, 1000] {
        let points = generate_points(count, 640.0, 480.0);
        let alpha = point_alpha(count, 0.1);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &points, |b, points| {
            b.iter(|| accumulate(black_box(points), &stamp, alpha, &region))
        });
    }

    group.finish();
}

fn bench_normalize_colorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_colorize");
    let stamp = build_stamp(25.0, 35.0);
    let table = Gradient::default().build_table();

    for (width, height) in [(256u32, 256u32), (640, 480), (1920, 1080)] {
        let region = Region::sized(width, height);
        let points = generate_points(200, width as f64, height as f64);
        let acc = accumulate(&points, &stamp, point_alpha(points.len(), 0.1), &region);

        group.throughput(Throughput::Elements(region.pixel_count() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &acc,
            |b, acc| b.iter(|| HeatLayer::normalize(black_box(acc), region).colorize(&table)),
        );
    }

    group.finish();
}

fn bench_render_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_frame");
    group.sample_size(20);

    let mut fixed = Heatmap::new(640, 480);
    fixed.set_points(generate_points(500, 640.0, 480.0));
    group.bench_function("static_640x480", |b| b.iter(|| fixed.render(black_box(false))));

    let mut interactive = Heatmap::new(640, 480).with_viewport(ViewportConfig::default());
    interactive.set_points(generate_points(500, 640.0, 480.0));
    interactive.handle_pointer(PointerEvent::Wheel {
        pos: Point::new(320.0, 240.0),
        delta: 5.0,
    });
    group.bench_function("zoomed_640x480", |b| {
        b.iter(|| interactive.render(black_box(false)))
    });

    group.finish();
}

fn bench_png_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("png_encode");

    let mut heatmap = Heatmap::new(512, 512);
    heatmap.set_points(generate_points(300, 512.0, 512.0));
    heatmap.render(false);

    group.bench_function("frame_512", |b| b.iter(|| heatmap.encode_png()));
    group.bench_function("heat_layer_512", |b| b.iter(|| heatmap.encode_heat_png()));
    group.bench_function("rgba_512", |b| b.iter(|| png::encode_rgba(black_box(heatmap.frame()))));

    group.finish();
}

criterion_group!(
    benches,
    bench_build_stamp,
    bench_accumulate,
    bench_normalize_colorize,
    bench_render_frame,
    bench_png_encode,
);
criterion_main!(benches);
