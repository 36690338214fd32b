//! Benchmarks for the CPU-heavy conversion stages.
//!
//! Run with: cargo bench -p shrink-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use shrink_core::config::PreprocessConfig;
use shrink_core::pipeline::{ComplexityAnalyzer, DecodedImage, ImagePreprocessor};

fn gradient(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    DynamicImage::ImageRgb8(img)
}

fn benchmark_entropy(c: &mut Criterion) {
    let analyzer = ComplexityAnalyzer::new();
    let img = gradient(1920, 1080);

    c.bench_function("entropy_1080p", |b| {
        b.iter(|| {
            let _ = analyzer.analyze_image(black_box(&img));
        })
    });
}

fn benchmark_bound_dimensions(c: &mut Criterion) {
    let preprocessor = ImagePreprocessor::new(PreprocessConfig::default());
    let img = gradient(3000, 2000);

    c.bench_function("bound_dimensions_3000x2000", |b| {
        b.iter(|| {
            let decoded = DecodedImage::from_image(img.clone(), ImageFormat::Jpeg);
            let _ = preprocessor.bound_dimensions(black_box(decoded));
        })
    });
}

criterion_group!(benches, benchmark_entropy, benchmark_bound_dimensions);
criterion_main!(benches);
