use ae_core::{MixItem, constants::MAX_CONVOLVER_IRS};
use realfft::RealFftPlanner;
use realfft::num_complex::Complex32;
use std::sync::Arc;

use crate::traits::Processor;

struct LoadedIr {
    /// Deep copy of the impulse response, independent of whatever asset it
    /// was loaded from, so an asset unload can't yank samples out from
    /// under a running convolution.
    samples: Vec<f32>,
    amplitude: f32,
}

/// Partitioned-FFT convolution reverb. Up to [`MAX_CONVOLVER_IRS`]
/// independently-scaled impulse responses are summed into one effective IR
/// before convolving, rather than convolving each separately and mixing —
/// cheaper, and matches how the engine this is ported from treats multiple
/// loaded IRs as one combined space.
pub struct ConvolverDsp {
    sample_rate: f32,
    block_size: usize,
    irs: Vec<LoadedIr>,
    partitions: Vec<Vec<Complex32>>,
    history: Vec<Vec<Complex32>>,
    history_pos: usize,
    overlap: Vec<Vec<f32>>,
    forward: Arc<dyn realfft::RealToComplex<f32>>,
    inverse: Arc<dyn realfft::ComplexToReal<f32>>,
    fft_len: usize,
    current_dry_wet: f32,
    target_dry_wet: f32,
    num_channels: usize,
    dirty: bool,
    bypass: bool,
}

impl ConvolverDsp {
    pub fn new(sample_rate: f32, block_size: usize, num_channels: usize) -> Self {
        let fft_len = (block_size * 2).next_power_of_two();
        let mut planner = RealFftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);
        ConvolverDsp {
            sample_rate,
            block_size,
            irs: Vec::with_capacity(MAX_CONVOLVER_IRS),
            partitions: Vec::new(),
            history: Vec::new(),
            history_pos: 0,
            overlap: vec![vec![0.0; block_size]; num_channels],
            forward,
            inverse,
            fft_len,
            current_dry_wet: 0.0,
            target_dry_wet: 0.5,
            num_channels,
            dirty: false,
            bypass: false,
        }
    }

    pub fn set_dry_wet(&mut self, dry_wet: f32) {
        self.target_dry_wet = dry_wet.clamp(0.0, 1.0);
    }

    /// Loads an impulse response into slot `index` (`< MAX_CONVOLVER_IRS`)
    /// with its own amplitude scale; pass an empty slice to clear the slot.
    pub fn set_ir(&mut self, index: usize, samples: &[f32], amplitude: f32) {
        assert!(index < MAX_CONVOLVER_IRS);
        while self.irs.len() <= index {
            self.irs.push(LoadedIr {
                samples: Vec::new(),
                amplitude: 1.0,
            });
        }
        self.irs[index] = LoadedIr {
            samples: samples.to_vec(),
            amplitude,
        };
        self.dirty = true;
    }

    fn has_any_ir(&self) -> bool {
        self.irs.iter().any(|ir| !ir.samples.is_empty())
    }

    fn rebuild_partitions(&mut self) {
        let max_len = self.irs.iter().map(|ir| ir.samples.len()).max().unwrap_or(0);
        let mut combined = vec![0.0_f32; max_len];
        for ir in &self.irs {
            for (i, s) in ir.samples.iter().enumerate() {
                combined[i] += s * ir.amplitude;
            }
        }

        let num_partitions = combined.len().div_ceil(self.block_size).max(1);
        self.partitions.clear();
        for p in 0..num_partitions {
            let start = p * self.block_size;
            let end = (start + self.block_size).min(combined.len());
            let mut time_domain = vec![0.0_f32; self.fft_len];
            time_domain[..(end - start)].copy_from_slice(&combined[start..end]);
            let mut spectrum = self.forward.make_output_vec();
            let mut scratch = self.forward.make_scratch_vec();
            let _ = self.forward.process_with_scratch(&mut time_domain, &mut spectrum, &mut scratch);
            self.partitions.push(spectrum);
        }

        self.history = (0..num_partitions)
            .map(|_| self.forward.make_output_vec())
            .collect();
        self.history_pos = 0;
        self.dirty = false;
    }

    fn convolve_channel(&mut self, channel: usize, input: &[f32], output: &mut [f32]) {
        let mut padded = vec![0.0_f32; self.fft_len];
        padded[..input.len()].copy_from_slice(input);
        let mut input_spectrum = self.forward.make_output_vec();
        let mut scratch = self.forward.make_scratch_vec();
        let _ = self.forward.process_with_scratch(&mut padded, &mut input_spectrum, &mut scratch);

        if !self.history.is_empty() {
            self.history[self.history_pos] = input_spectrum.clone();
        }

        let mut accumulator = vec![Complex32::new(0.0, 0.0); input_spectrum.len()];
        let num_partitions = self.partitions.len();
        for (p, partition) in self.partitions.iter().enumerate() {
            if num_partitions == 0 {
                break;
            }
            let hist_index = (self.history_pos + num_partitions - p) % num_partitions;
            let past_spectrum = &self.history[hist_index];
            for (acc, (h, x)) in accumulator.iter_mut().zip(partition.iter().zip(past_spectrum.iter())) {
                *acc += h * x;
            }
        }

        let mut time_domain = vec![0.0_f32; self.fft_len];
        let mut inverse_scratch = self.inverse.make_scratch_vec();
        let _ = self.inverse.process_with_scratch(&mut accumulator, &mut time_domain, &mut inverse_scratch);
        let norm = 1.0 / self.fft_len as f32;

        let tail = &mut self.overlap[channel];
        for (i, out) in output.iter_mut().enumerate() {
            let wet = time_domain[i] * norm + if i < tail.len() { tail[i] } else { 0.0 };
            *out = wet;
        }
        for (i, slot) in tail.iter_mut().enumerate() {
            let idx = self.block_size + i;
            *slot = if idx < time_domain.len() { time_domain[idx] * norm } else { 0.0 };
        }
    }
}

impl Processor for ConvolverDsp {
    fn process(&mut self, mix_item: &mut MixItem, block_size: usize) {
        if self.bypass || !self.has_any_ir() {
            return;
        }
        if self.dirty {
            self.rebuild_partitions();
        }

        let dry_wet_start = self.current_dry_wet;
        let dry_wet_end = self.target_dry_wet;

        for ch in 0..mix_item.num_channels().min(self.num_channels) {
            let dry: Vec<f32> = mix_item.channel(ch).as_slice()[..block_size].to_vec();
            let mut wet = vec![0.0_f32; block_size];
            self.convolve_channel(ch, &dry, &mut wet);

            let buf = mix_item.channel_mut(ch);
            let samples = buf.as_mut_slice();
            for i in 0..block_size {
                let t = i as f32 / block_size as f32;
                let dry_wet = dry_wet_start + (dry_wet_end - dry_wet_start) * t;
                samples[i] = dry[i] * (1.0 - dry_wet) + wet[i] * dry_wet;
            }
        }

        if !self.history.is_empty() {
            self.history_pos = (self.history_pos + 1) % self.history.len();
        }
        self.current_dry_wet = dry_wet_end;
    }

    fn reset(&mut self) {
        for tail in &mut self.overlap {
            tail.fill(0.0);
        }
        for spectrum in &mut self.history {
            spectrum.fill(Complex32::new(0.0, 0.0));
        }
        self.history_pos = 0;
    }

    fn set_bypass(&mut self, bypass: bool) {
        self.bypass = bypass;
    }

    fn is_bypassed(&self) -> bool {
        self.bypass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bypasses_when_no_ir_loaded() {
        let mut conv = ConvolverDsp::new(48_000.0, 16, 1);
        let mut item = MixItem::new(1, 16);
        item.set(1.0);
        conv.process(&mut item, 16);
        assert_eq!(item.channel(0).as_slice()[0], 1.0);
    }

    #[test]
    fn loading_an_ir_marks_partitions_dirty() {
        let mut conv = ConvolverDsp::new(48_000.0, 16, 1);
        assert!(!conv.dirty);
        conv.set_ir(0, &[1.0, 0.5, 0.25], 1.0);
        assert!(conv.dirty);
    }
}
