//! Benchmarks for the per-frame analysis path
//!
//! The per-frame budget is 100 ms; these benches confirm the weighted and
//! fallback paths sit far inside it for typical frame sizes.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use noisewatch::{AudioFrame, FrameAnalyzer, MonitorConfig, WeightingMode};

fn tone(amplitude: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| amplitude * (2.0 * std::f32::consts::PI * 100.0 * i as f32 / len as f32).sin())
        .collect()
}

fn bench_weighted(c: &mut Criterion) {
    let config = MonitorConfig::default();
    let mut analyzer = FrameAnalyzer::new();
    let samples = tone(0.3, 4800); // 100 ms at 48 kHz

    c.bench_function("analyze_weighted_100ms_48k", |b| {
        b.iter_batched(
            || AudioFrame::new(samples.clone(), 48000, 0),
            |frame| analyzer.analyze(frame, &config, WeightingMode::AWeighted),
            BatchSize::SmallInput,
        )
    });
}

fn bench_fallback(c: &mut Criterion) {
    let config = MonitorConfig::default();
    let mut analyzer = FrameAnalyzer::new();
    let samples = tone(0.3, 4800);

    c.bench_function("analyze_fallback_100ms_48k", |b| {
        b.iter_batched(
            || AudioFrame::new(samples.clone(), 48000, 0),
            |frame| analyzer.analyze(frame, &config, WeightingMode::Fallback),
            BatchSize::SmallInput,
        )
    });
}

fn bench_weighted_large_frame(c: &mut Criterion) {
    let config = MonitorConfig::default();
    let mut analyzer = FrameAnalyzer::new();
    let samples = tone(0.3, 9600); // 200 ms at 48 kHz (degraded frame size)

    c.bench_function("analyze_weighted_200ms_48k", |b| {
        b.iter_batched(
            || AudioFrame::new(samples.clone(), 48000, 0),
            |frame| analyzer.analyze(frame, &config, WeightingMode::AWeighted),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_weighted,
    bench_fallback,
    bench_weighted_large_frame
);
criterion_main!(benches);
