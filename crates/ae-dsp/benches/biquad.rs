//! Biquad filter benchmarks

use ae_core::MixItem;
use ae_dsp::{BiquadFilter, BiquadKind, Processor};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_biquad_lowpass(c: &mut Criterion) {
    let mut filter = BiquadFilter::new(BiquadKind::Lowpass, 48_000.0, 2);
    filter.set_cutoff(1000.0);

    let mut item = MixItem::new(2, 1024);
    item.set(0.5);

    c.bench_function("biquad_lowpass_1024", |b| {
        b.iter(|| {
            filter.process(black_box(&mut item), 1024);
        })
    });
}

fn bench_biquad_highpass(c: &mut Criterion) {
    let mut filter = BiquadFilter::new(BiquadKind::Highpass, 48_000.0, 2);
    filter.set_cutoff(200.0);

    let mut item = MixItem::new(2, 1024);
    item.set(0.5);

    c.bench_function("biquad_highpass_1024", |b| {
        b.iter(|| {
            filter.process(black_box(&mut item), 1024);
        })
    });
}

criterion_group!(benches, bench_biquad_lowpass, bench_biquad_highpass);
criterion_main!(benches);
