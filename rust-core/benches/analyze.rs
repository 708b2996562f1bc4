use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::f64::consts::PI;
use voice_stress::audio::pcm::decode_pcm16_le;
use voice_stress::{analyze, AnalyzerConfig, StressAnalyzer};

fn voice_like_block(len: usize, sample_rate: f64) -> Vec<f64> {
    (0..len)
        .map(|n| {
            let t = n as f64 / sample_rate;
            0.4 * (2.0 * PI * 180.0 * t).sin() + 0.2 * (2.0 * PI * 360.0 * t).sin()
        })
        .collect()
}

fn bench_analyze(c: &mut Criterion) {
    let block = voice_like_block(2048, 44100.0);
    let analyzer = StressAnalyzer::new(AnalyzerConfig::default()).unwrap();

    c.bench_function("analyzer_2048", |b| {
        b.iter(|| analyzer.analyze(black_box(&block)).unwrap())
    });

    c.bench_function("analyze_fn_2048", |b| {
        b.iter(|| analyze(black_box(&block), 44100).unwrap())
    });
}

fn bench_decode(c: &mut Criterion) {
    let bytes: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 251) as u8).collect();

    c.bench_function("decode_pcm16_2048", |b| {
        b.iter(|| decode_pcm16_le(black_box(&bytes)))
    });
}

criterion_group!(benches, bench_analyze, bench_decode);
criterion_main!(benches);
