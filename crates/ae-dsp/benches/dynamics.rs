//! Compressor and limiter benchmarks

use ae_core::MixItem;
use ae_dsp::{CompressorDsp, LimiterDsp, Processor};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_compressor(c: &mut Criterion) {
    let mut comp = CompressorDsp::new(48_000.0, 1024);
    comp.set_threshold_db(-12.0);
    comp.set_ratio(4.0);

    let mut item = MixItem::new(2, 1024);
    item.set(0.8);

    c.bench_function("compressor_1024", |b| {
        b.iter(|| {
            comp.process(black_box(&mut item), 1024);
        })
    });
}

fn bench_limiter(c: &mut Criterion) {
    let mut limiter = LimiterDsp::new(-3.0);

    let mut item = MixItem::new(2, 1024);
    item.set(0.95);

    c.bench_function("limiter_1024", |b| {
        b.iter(|| {
            limiter.process(black_box(&mut item), 1024);
        })
    });
}

criterion_group!(benches, bench_compressor, bench_limiter);
criterion_main!(benches);
