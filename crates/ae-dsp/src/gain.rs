use ae_core::{MixItem, constants::GAIN_INTERPOLATION_SAMPLES};

use crate::traits::Processor;

/// Linear-ramp gain. Ramps from the previous target to a new target over
/// [`GAIN_INTERPOLATION_SAMPLES`] samples, then stays constant; skips the
/// multiply entirely when both endpoints are unity, since that's the common
/// case for most voices most of the time.
#[derive(Debug, Clone)]
pub struct GainDsp {
    current_amplitude: f32,
    target_amplitude: f32,
    bypass: bool,
}

impl GainDsp {
    pub fn new() -> Self {
        GainDsp {
            current_amplitude: 1.0,
            target_amplitude: 1.0,
            bypass: false,
        }
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.target_amplitude = amplitude;
    }

    pub fn amplitude(&self) -> f32 {
        self.current_amplitude
    }

    /// Snaps the current amplitude to the target with no ramp, used when a
    /// voice is first started so it doesn't fade in from silence.
    pub fn snap(&mut self) {
        self.current_amplitude = self.target_amplitude;
    }
}

impl Default for GainDsp {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for GainDsp {
    fn process(&mut self, mix_item: &mut MixItem, block_size: usize) {
        if self.bypass {
            return;
        }
        if self.current_amplitude == self.target_amplitude {
            if self.target_amplitude != 1.0 {
                mix_item.scalar_multiply(self.target_amplitude);
            }
            return;
        }

        let ramp_len = GAIN_INTERPOLATION_SAMPLES.min(block_size);
        let start = self.current_amplitude;
        let end = self.target_amplitude;
        for ch in 0..mix_item.num_channels() {
            let buf = mix_item.channel_mut(ch);
            let samples = buf.as_mut_slice();
            for (i, sample) in samples.iter_mut().enumerate().take(block_size) {
                let amp = if i < ramp_len {
                    let t = i as f32 / ramp_len as f32;
                    start + (end - start) * t
                } else {
                    end
                };
                *sample *= amp;
            }
        }
        self.current_amplitude = end;
    }

    fn reset(&mut self) {
        self.current_amplitude = 1.0;
        self.target_amplitude = 1.0;
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
    fn unity_gain_is_a_no_op_skip() {
        let mut gain = GainDsp::new();
        let mut item = MixItem::new(1, 16);
        item.set(0.7);
        gain.process(&mut item, 16);
        assert_eq!(item.channel(0).as_slice()[0], 0.7);
    }

    #[test]
    fn ramps_over_interpolation_window() {
        let mut gain = GainDsp::new();
        gain.set_amplitude(0.0);
        let mut item = MixItem::new(1, 64);
        item.set(1.0);
        gain.process(&mut item, 64);
        let samples = item.channel(0).as_slice();
        assert_eq!(samples[0], 1.0);
        assert_eq!(samples[32], 0.0);
        assert_eq!(samples[63], 0.0);
        assert_eq!(gain.amplitude(), 0.0);
    }
}
