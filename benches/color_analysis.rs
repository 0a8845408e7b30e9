use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageBuffer, Rgb as Px, RgbImage};

use soil_colorscan::calibration::MemoryStore;
use soil_colorscan::chart::REFERENCE_CHART;
use soil_colorscan::color::{ColorConverter, ColorSampler};
use soil_colorscan::detection::{Point, Polygon, Selection};
use soil_colorscan::exif::DeviceInfo;
use soil_colorscan::{CalibrationEngine, ColorClassifier, Rgb, ScanConfig};

fn chart() -> DynamicImage {
    let image: RgbImage = ImageBuffer::from_fn(1200, 800, |x, y| {
        let position = (y / 200) as usize * 6 + (x / 200) as usize;
        Px(ColorConverter::to_rgb8(REFERENCE_CHART[position].reference))
    });
    DynamicImage::ImageRgb8(image)
}

fn soil() -> DynamicImage {
    let image: RgbImage =
        ImageBuffer::from_fn(1024, 768, |x, y| Px([60 + (x % 8) as u8, 50 + (y % 6) as u8, 38]));
    DynamicImage::ImageRgb8(image)
}

fn benchmark_sampling(c: &mut Criterion) {
    let pixels = soil().to_rgb32f();
    let sampler = ColorSampler::default();
    let polygon = Selection::Polygon(Polygon::new(vec![
        Point::new(0.1, 0.1),
        Point::new(0.9, 0.2),
        Point::new(0.7, 0.9),
        Point::new(0.2, 0.8),
    ]));

    c.bench_function("sample_full_image", |b| {
        b.iter(|| sampler.sample_region(black_box(&pixels), &Selection::FullImage))
    });
    c.bench_function("sample_polygon", |b| {
        b.iter(|| sampler.sample_region(black_box(&pixels), &polygon))
    });
}

fn benchmark_calibration(c: &mut Criterion) {
    let image = chart();
    let engine = CalibrationEngine::new(
        ScanConfig::default(),
        Arc::new(MemoryStore::new()),
        DeviceInfo::default(),
    )
    .unwrap();

    c.bench_function("calibrate_chart", |b| {
        b.iter(|| {
            engine.start_calibration().ok();
            engine.process_calibration_image(black_box(&image)).unwrap();
            engine.recalibrate().ok();
        })
    });
}

fn benchmark_classification(c: &mut Criterion) {
    let classifier = ColorClassifier::default();
    c.bench_function("classify", |b| {
        b.iter(|| classifier.classify(black_box(Rgb::new(0.41, 0.33, 0.27))))
    });
}

criterion_group!(
    benches,
    benchmark_sampling,
    benchmark_calibration,
    benchmark_classification
);
criterion_main!(benches);
