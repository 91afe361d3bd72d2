use ae_core::MixItem;
use std::f32::consts::PI;

use crate::traits::Processor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiquadKind {
    Lowpass,
    Highpass,
}

#[derive(Debug, Clone, Copy, Default)]
struct DirectFormI {
    x: [f32; 2],
    y: [f32; 2],
}

/// RBJ-cookbook biquad lowpass/highpass, direct form I, with cutoff and Q
/// both ramped per sample across the block so parameter automation doesn't
/// produce audible zipper noise from recomputing coefficients only once per
/// block.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    kind: BiquadKind,
    sample_rate: f32,
    current_cutoff: f32,
    target_cutoff: f32,
    current_q: f32,
    target_q: f32,
    channels: Vec<DirectFormI>,
    bypass: bool,
}

impl BiquadFilter {
    pub fn new(kind: BiquadKind, sample_rate: f32, num_channels: usize) -> Self {
        let initial_cutoff = match kind {
            BiquadKind::Lowpass => sample_rate / 2.0 - 1.0,
            BiquadKind::Highpass => 1.0,
        };
        BiquadFilter {
            kind,
            sample_rate,
            current_cutoff: initial_cutoff,
            target_cutoff: initial_cutoff,
            current_q: std::f32::consts::FRAC_1_SQRT_2,
            target_q: std::f32::consts::FRAC_1_SQRT_2,
            channels: vec![DirectFormI::default(); num_channels],
            bypass: false,
        }
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.target_cutoff = cutoff_hz.clamp(1.0, self.sample_rate / 2.0 - 1.0);
    }

    pub fn set_q(&mut self, q: f32) {
        self.target_q = q.max(0.1);
    }

    fn coeffs(&self, cutoff: f32, q: f32) -> (f32, f32, f32, f32, f32) {
        let w0 = 2.0 * PI * cutoff / self.sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * q);

        let (b0, b1, b2, a0, a1, a2) = match self.kind {
            BiquadKind::Lowpass => (
                (1.0 - cos_w0) / 2.0,
                1.0 - cos_w0,
                (1.0 - cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            BiquadKind::Highpass => (
                (1.0 + cos_w0) / 2.0,
                -(1.0 + cos_w0),
                (1.0 + cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
        };
        (b0 / a0, b1 / a0, b2 / a0, a1 / a0, a2 / a0)
    }
}

impl Processor for BiquadFilter {
    fn process(&mut self, mix_item: &mut MixItem, block_size: usize) {
        if self.bypass {
            return;
        }
        let start_cutoff = self.current_cutoff;
        let end_cutoff = self.target_cutoff;
        let start_q = self.current_q;
        let end_q = self.target_q;

        for (ch, line) in (0..mix_item.num_channels()).zip(self.channels.iter_mut()) {
            let buf = mix_item.channel_mut(ch);
            let samples = buf.as_mut_slice();
            for (i, sample) in samples.iter_mut().enumerate().take(block_size) {
                let t = i as f32 / block_size as f32;
                let cutoff = start_cutoff + (end_cutoff - start_cutoff) * t;
                let q = start_q + (end_q - start_q) * t;
                let (b0, b1, b2, a1, a2) = self.coeffs(cutoff, q);
                let x0 = *sample;
                let y0 = b0 * x0 + b1 * line.x[0] + b2 * line.x[1] - a1 * line.y[0] - a2 * line.y[1];
                line.x[1] = line.x[0];
                line.x[0] = x0;
                line.y[1] = line.y[0];
                line.y[0] = y0;
                *sample = y0;
            }
        }

        self.current_cutoff = end_cutoff;
        self.current_q = end_q;
    }

    fn reset(&mut self) {
        for line in &mut self.channels {
            *line = DirectFormI::default();
        }
    }

    fn set_bypass(&mut self, bypass: bool) {
        self.bypass = bypass;
    }

    fn is_bypassed(&self) -> bool {
        self.bypass
    }
}
