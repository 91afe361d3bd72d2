use ae_core::{MixItem, amp_to_db, db_to_amp};

use crate::fader::Fader;
use crate::traits::Processor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompressorState {
    Attack,
    Release,
    Steady,
}

/// Peak-detecting hard-knee compressor. Per block, it finds the maximum
/// sample across all channels, compares it to the threshold, and runs a
/// [`Fader`] towards the resulting gain reduction over the attack time (or
/// back to unity over the release time once the signal drops below
/// threshold). The release taper restarts fresh every time a new block
/// crosses the threshold again; like the engine this is ported from, a
/// signal that hovers right at the threshold across adjacent blocks can
/// produce a release curve that doesn't account for the previous block's
/// partially-completed taper. That's accepted behavior, not a bug to fix.
#[derive(Debug, Clone)]
pub struct CompressorDsp {
    sample_rate: f32,
    threshold_db: f32,
    ratio: f32,
    attack_ms: f32,
    release_ms: f32,
    makeup_gain_amplitude: f32,
    fader: Fader,
    state: CompressorState,
    bypass: bool,
}

impl CompressorDsp {
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        CompressorDsp {
            sample_rate,
            threshold_db: -12.0,
            ratio: 4.0,
            attack_ms: 10.0,
            release_ms: 100.0,
            makeup_gain_amplitude: 1.0,
            fader: Fader::new(block_size),
            state: CompressorState::Steady,
            bypass: false,
        }
    }

    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        self.threshold_db = threshold_db;
    }

    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio.max(1.0);
    }

    pub fn set_attack_ms(&mut self, attack_ms: f32) {
        self.attack_ms = attack_ms.max(0.0);
    }

    pub fn set_release_ms(&mut self, release_ms: f32) {
        self.release_ms = release_ms.max(0.0);
    }

    pub fn set_makeup_gain_amplitude(&mut self, amplitude: f32) {
        self.makeup_gain_amplitude = amplitude;
    }

    fn ms_to_samples(&self, ms: f32) -> i64 {
        ((ms / 1000.0) * self.sample_rate).round() as i64
    }
}

impl Processor for CompressorDsp {
    fn process(&mut self, mix_item: &mut MixItem, block_size: usize) {
        if self.bypass {
            return;
        }

        let peak_amplitude = mix_item.absolute_max();
        let peak_db = amp_to_db(peak_amplitude);
        let attack_samples = self.ms_to_samples(self.attack_ms);
        let release_samples = self.ms_to_samples(self.release_ms);

        if peak_db > self.threshold_db {
            self.state = CompressorState::Attack;
            let diff = peak_db - self.threshold_db;
            let ratioed_signal = diff / self.ratio;
            let total_signal = self.threshold_db + ratioed_signal;
            let reduction_db = peak_db - total_signal;
            let reduction_amplitude = db_to_amp(-reduction_db);
            self.fader.update(reduction_amplitude, 0, attack_samples);
        } else {
            match self.state {
                CompressorState::Attack => {
                    self.state = CompressorState::Release;
                    self.fader.update(1.0, 0, release_samples);
                }
                CompressorState::Release if self.fader.is_fade_complete() => {
                    self.state = CompressorState::Steady;
                }
                _ => {}
            }
        }

        self.fader.process(mix_item, block_size);
        if self.makeup_gain_amplitude != 1.0 {
            mix_item.scalar_multiply(self.makeup_gain_amplitude);
        }
    }

    fn reset(&mut self) {
        self.fader.reset();
        self.state = CompressorState::Steady;
    }

    fn set_bypass(&mut self, bypass: bool) {
        self.bypass = bypass;
    }

    fn is_bypassed(&self) -> bool {
        self.bypass
    }
}

/// Hard peak limiter: if the block's peak exceeds the threshold, the whole
/// block is scaled down so the peak lands exactly on threshold. No attack
/// or release ramp — this is a safety net, not a musical compressor.
#[derive(Debug, Clone)]
pub struct LimiterDsp {
    threshold_db: f32,
    bypass: bool,
}

impl LimiterDsp {
    pub fn new(threshold_db: f32) -> Self {
        LimiterDsp {
            threshold_db,
            bypass: false,
        }
    }

    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        self.threshold_db = threshold_db;
    }
}

impl Processor for LimiterDsp {
    fn process(&mut self, mix_item: &mut MixItem, _block_size: usize) {
        if self.bypass {
            return;
        }
        let peak_db = amp_to_db(mix_item.absolute_max());
        if peak_db > self.threshold_db {
            let scale = db_to_amp(self.threshold_db - peak_db);
            mix_item.scalar_multiply(scale);
        }
    }

    fn reset(&mut self) {}

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
    fn compressor_leaves_signal_below_threshold_untouched() {
        let mut comp = CompressorDsp::new(48_000.0, 64);
        comp.set_threshold_db(-6.0);
        let mut item = MixItem::new(1, 64);
        item.set(0.1); // well below -6dB
        comp.process(&mut item, 64);
        assert_eq!(item.channel(0).as_slice()[0], 0.1);
    }

    #[test]
    fn limiter_clamps_peak_to_threshold() {
        let mut limiter = LimiterDsp::new(-6.0);
        let mut item = MixItem::new(1, 32);
        item.set(1.0); // 0dB, above -6dB threshold
        limiter.process(&mut item, 32);
        let peak_db = amp_to_db(item.absolute_max());
        assert!((peak_db - (-6.0)).abs() < 0.01);
    }
}
