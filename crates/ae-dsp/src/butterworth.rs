use ae_core::MixItem;
use std::f32::consts::PI;

use crate::traits::Processor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOrder {
    First,
    Second,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Lowpass,
    Highpass,
}

/// Per-channel 2-sample delay line shared by first- and second-order
/// sections; first-order sections only use index 0.
#[derive(Debug, Clone, Copy, Default)]
struct DelayLine {
    x: [f32; 2],
    y: [f32; 2],
}

impl DelayLine {
    fn reset(&mut self) {
        *self = DelayLine::default();
    }
}

/// Butterworth low/high-pass filter, bilinear-transform coefficients, with
/// the cutoff frequency linearly ramped across the block so parameter
/// changes don't click. Resets its delay lines whenever the filter becomes
/// a no-op (cutoff pinned at the pass-everything extreme).
#[derive(Debug, Clone)]
pub struct ButterworthFilter {
    kind: Kind,
    order: FilterOrder,
    sample_rate: f32,
    current_cutoff: f32,
    target_cutoff: f32,
    channels: Vec<DelayLine>,
    bypass: bool,
}

impl ButterworthFilter {
    pub fn lowpass(order: FilterOrder, sample_rate: f32, num_channels: usize) -> Self {
        Self::new(Kind::Lowpass, order, sample_rate, num_channels, sample_rate / 2.0)
    }

    pub fn highpass(order: FilterOrder, sample_rate: f32, num_channels: usize) -> Self {
        Self::new(Kind::Highpass, order, sample_rate, num_channels, 0.0)
    }

    fn new(kind: Kind, order: FilterOrder, sample_rate: f32, num_channels: usize, initial_cutoff: f32) -> Self {
        ButterworthFilter {
            kind,
            order,
            sample_rate,
            current_cutoff: initial_cutoff,
            target_cutoff: initial_cutoff,
            channels: vec![DelayLine::default(); num_channels],
            bypass: false,
        }
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.target_cutoff = cutoff_hz.clamp(1.0, self.sample_rate / 2.0 - 1.0);
    }

    fn is_no_op(&self, cutoff: f32) -> bool {
        match self.kind {
            Kind::Lowpass => cutoff >= self.sample_rate / 2.0 - 1.0,
            Kind::Highpass => cutoff <= 1.0,
        }
    }

}

impl Processor for ButterworthFilter {
    fn process(&mut self, mix_item: &mut MixItem, block_size: usize) {
        if self.bypass {
            return;
        }

        if self.current_cutoff == self.target_cutoff && self.is_no_op(self.current_cutoff) {
            for line in &mut self.channels {
                line.reset();
            }
            return;
        }

        let start = self.current_cutoff;
        let end = self.target_cutoff;

        for (ch, line) in (0..mix_item.num_channels()).zip(self.channels.iter_mut()) {
            let buf = mix_item.channel_mut(ch);
            let samples = buf.as_mut_slice();
            for (i, sample) in samples.iter_mut().enumerate().take(block_size) {
                let t = i as f32 / block_size as f32;
                let cutoff = start + (end - start) * t;
                let x0 = *sample;
                let y0 = match self.order {
                    FilterOrder::First => {
                        let (b0, b1, a1) = match self.kind {
                            Kind::Lowpass => first_order_coeffs(self.sample_rate, cutoff, true),
                            Kind::Highpass => first_order_coeffs(self.sample_rate, cutoff, false),
                        };
                        b0 * x0 + b1 * line.x[0] - a1 * line.y[0]
                    }
                    FilterOrder::Second => {
                        let (b0, b1, b2, a1, a2) = second_order_coeffs(self.sample_rate, cutoff, self.kind);
                        b0 * x0 + b1 * line.x[0] + b2 * line.x[1] - a1 * line.y[0] - a2 * line.y[1]
                    }
                };
                line.x[1] = line.x[0];
                line.x[0] = x0;
                line.y[1] = line.y[0];
                line.y[0] = y0;
                *sample = y0;
            }
        }

        self.current_cutoff = end;
    }

    fn reset(&mut self) {
        for line in &mut self.channels {
            line.reset();
        }
    }

    fn set_bypass(&mut self, bypass: bool) {
        self.bypass = bypass;
    }

    fn is_bypassed(&self) -> bool {
        self.bypass
    }
}

fn first_order_coeffs(sample_rate: f32, cutoff: f32, lowpass: bool) -> (f32, f32, f32) {
    let wc = (PI * cutoff / sample_rate).tan();
    let a0 = 1.0 + wc;
    if lowpass {
        (wc / a0, wc / a0, (wc - 1.0) / a0)
    } else {
        (1.0 / a0, -1.0 / a0, (wc - 1.0) / a0)
    }
}

fn second_order_coeffs(sample_rate: f32, cutoff: f32, kind: Kind) -> (f32, f32, f32, f32, f32) {
    let q = std::f32::consts::FRAC_1_SQRT_2;
    let wc = (PI * cutoff / sample_rate).tan();
    let wc2 = wc * wc;
    let a0 = wc2 + wc / q + 1.0;
    match kind {
        Kind::Lowpass => (
            wc2 / a0,
            2.0 * wc2 / a0,
            wc2 / a0,
            (2.0 * (wc2 - 1.0)) / a0,
            (wc2 - wc / q + 1.0) / a0,
        ),
        Kind::Highpass => (
            1.0 / a0,
            -2.0 / a0,
            1.0 / a0,
            (2.0 * (wc2 - 1.0)) / a0,
            (wc2 - wc / q + 1.0) / a0,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowpass_resets_delay_lines_once_fully_open() {
        let mut lpf = ButterworthFilter::lowpass(FilterOrder::Second, 48_000.0, 1);
        lpf.set_cutoff(1000.0);
        let mut item = MixItem::new(1, 32);
        item.set(1.0);
        lpf.process(&mut item, 32);
        assert_ne!(lpf.channels[0].y[0], 0.0);

        lpf.set_cutoff(48_000.0 / 2.0 - 1.0);
        lpf.current_cutoff = lpf.target_cutoff;
        lpf.process(&mut item, 32);
        assert_eq!(lpf.channels[0].y[0], 0.0);
    }

    #[test]
    fn bypass_leaves_signal_untouched() {
        let mut hpf = ButterworthFilter::highpass(FilterOrder::First, 48_000.0, 1);
        hpf.set_bypass(true);
        let mut item = MixItem::new(1, 8);
        item.set(0.25);
        hpf.process(&mut item, 8);
        assert_eq!(item.channel(0).as_slice()[0], 0.25);
    }
}
