use criterion::{criterion_group, criterion_main, Criterion};
use kws_rs::{KeywordDetector, PipelineConfig};
use std::path::PathBuf;

fn benchmark_frame(c: &mut Criterion) {
    let model_dir = PathBuf::from("models");
    let mut detector =
        KeywordDetector::new(&model_dir, PipelineConfig::default(), false).unwrap();

    // 80ms of silence (1280 samples at 16kHz)
    let frame = vec![0.0f32; kws_rs::FRAME_SIZE];

    c.bench_function("frame_80ms", |b| {
        b.iter(|| detector.process(&frame).unwrap())
    });
}

fn benchmark_frame_with_verifier(c: &mut Criterion) {
    let model_dir = PathBuf::from("models");
    let mut detector =
        KeywordDetector::new(&model_dir, PipelineConfig::default(), true).unwrap();

    let frame = vec![0.0f32; kws_rs::FRAME_SIZE];

    c.bench_function("frame_80ms_with_verifier", |b| {
        b.iter(|| detector.process(&frame).unwrap())
    });
}

criterion_group!(benches, benchmark_frame, benchmark_frame_with_verifier);
criterion_main!(benches);
