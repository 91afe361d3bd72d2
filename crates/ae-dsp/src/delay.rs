use ae_core::{MixItem, constants::MAX_DELAY_MS};

use crate::biquad::{BiquadFilter, BiquadKind};
use crate::traits::Processor;

/// Circular-buffer feedback delay, one line per channel, with optional
/// highpass/lowpass shaping inserted into the feedback path so repeats
/// darken (or thin) over time instead of looping unchanged forever.
#[derive(Debug, Clone)]
pub struct DelayDsp {
    sample_rate: f32,
    lines: Vec<Vec<f32>>,
    write_pos: usize,
    delay_samples: usize,
    max_delay_samples: usize,
    feedback: f32,
    dry_wet: f32,
    feedback_highpass: Option<BiquadFilter>,
    feedback_lowpass: Option<BiquadFilter>,
    bypass: bool,
}

impl DelayDsp {
    pub fn new(sample_rate: f32, num_channels: usize, max_delay_ms: f32) -> Self {
        let max_delay_ms = max_delay_ms.min(MAX_DELAY_MS);
        let max_delay_samples = ((max_delay_ms / 1000.0) * sample_rate).round() as usize + 1;
        DelayDsp {
            sample_rate,
            lines: vec![vec![0.0; max_delay_samples]; num_channels],
            write_pos: 0,
            delay_samples: max_delay_samples / 2,
            max_delay_samples,
            feedback: 0.3,
            dry_wet: 0.5,
            feedback_highpass: None,
            feedback_lowpass: None,
            bypass: false,
        }
    }

    pub fn set_delay_ms(&mut self, ms: f32) {
        let clamped = ms.clamp(0.0, MAX_DELAY_MS);
        self.delay_samples = (((clamped / 1000.0) * self.sample_rate).round() as usize).min(self.max_delay_samples - 1);
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 1.0);
    }

    pub fn set_dry_wet(&mut self, dry_wet: f32) {
        self.dry_wet = dry_wet.clamp(0.0, 1.0);
    }

    pub fn enable_feedback_filters(&mut self, num_channels: usize) {
        self.feedback_highpass = Some(BiquadFilter::new(BiquadKind::Highpass, self.sample_rate, num_channels));
        self.feedback_lowpass = Some(BiquadFilter::new(BiquadKind::Lowpass, self.sample_rate, num_channels));
    }

    fn read_delayed(&self, channel: usize, delay_samples: usize) -> f32 {
        let len = self.lines[channel].len();
        let read_pos = (self.write_pos + len - delay_samples) % len;
        self.lines[channel][read_pos]
    }
}

impl Processor for DelayDsp {
    fn process(&mut self, mix_item: &mut MixItem, block_size: usize) {
        if self.bypass {
            return;
        }

        for ch in 0..mix_item.num_channels().min(self.lines.len()) {
            let buf = mix_item.channel_mut(ch);
            let samples = buf.as_mut_slice();
            for sample in samples.iter_mut().take(block_size) {
                let dry = *sample;
                let wet = self.read_delayed(ch, self.delay_samples);
                let len = self.lines[ch].len();
                self.lines[ch][self.write_pos] = dry + wet * self.feedback;
                self.write_pos = (self.write_pos + 1) % len;
                *sample = dry * (1.0 - self.dry_wet) + wet * self.dry_wet;
            }
        }

        if let Some(hpf) = &mut self.feedback_highpass {
            hpf.process(mix_item, block_size);
        }
        if let Some(lpf) = &mut self.feedback_lowpass {
            lpf.process(mix_item, block_size);
        }
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.fill(0.0);
        }
        self.write_pos = 0;
        if let Some(hpf) = &mut self.feedback_highpass {
            hpf.reset();
        }
        if let Some(lpf) = &mut self.feedback_lowpass {
            lpf.reset();
        }
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
    fn feedback_is_clamped_to_unit_interval() {
        let mut delay = DelayDsp::new(48_000.0, 1, 100.0);
        delay.set_feedback(5.0);
        assert_eq!(delay.feedback, 1.0);
        delay.set_feedback(-5.0);
        assert_eq!(delay.feedback, 0.0);
    }

    #[test]
    fn silent_input_still_produces_a_tail_when_stateful() {
        let mut delay = DelayDsp::new(48_000.0, 1, 10.0);
        delay.set_delay_ms(5.0);
        delay.set_feedback(0.5);
        delay.set_dry_wet(1.0);
        let mut excite = MixItem::new(1, 8);
        excite.set(1.0);
        delay.process(&mut excite, 8);

        let mut silence = MixItem::new(1, 512);
        silence.set(0.0);
        delay.process(&mut silence, 512);
        assert!(silence.absolute_max() > 0.0, "delay tail should still be ringing");
    }
}
