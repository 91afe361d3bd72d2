use ae_core::MixItem;
use std::f32::consts::FRAC_PI_2;

use crate::traits::Processor;

/// Constant-power pan laws, selected by how many dB the pan center sits
/// below unity when the signal is panned hard to one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanLaw {
    MinusThree,
    MinusFourPointFive,
    MinusSix,
}


/// Stereo-only constant-power panner. `angle` runs `[-1, 1]` (hard left to
/// hard right) and maps onto `[0, pi/2]` radians; ramps linearly across the
/// block like the gain DSP.
#[derive(Debug, Clone)]
pub struct PanDsp {
    law: PanLaw,
    current_angle: f32,
    target_angle: f32,
    bypass: bool,
}

impl PanDsp {
    pub fn new(law: PanLaw) -> Self {
        PanDsp {
            law,
            current_angle: 0.0,
            target_angle: 0.0,
            bypass: false,
        }
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.target_angle = angle.clamp(-1.0, 1.0);
    }

    fn gains_at(&self, angle: f32) -> (f32, f32) {
        // angle in [-1, 1] -> t in [0, 1], 0 = hard left, 1 = hard right.
        let t = (angle.clamp(-1.0, 1.0) + 1.0) * 0.5;
        let (linear_left, linear_right) = (1.0 - t, t);
        let radians = t * FRAC_PI_2;
        let (power_left, power_right) = (radians.cos(), radians.sin());
        match self.law {
            PanLaw::MinusSix => (linear_left, linear_right),
            PanLaw::MinusThree => (power_left, power_right),
            // Geometric mean of the -6dB and -3dB laws: center sits at -4.5dB.
            PanLaw::MinusFourPointFive => ((linear_left * power_left).sqrt(), (linear_right * power_right).sqrt()),
        }
    }
}

impl Processor for PanDsp {
    fn process(&mut self, mix_item: &mut MixItem, block_size: usize) {
        if self.bypass || mix_item.num_channels() != 2 {
            return;
        }
        let start_angle = self.current_angle;
        let end_angle = self.target_angle;
        for i in 0..block_size {
            let t = i as f32 / block_size as f32;
            let angle = start_angle + (end_angle - start_angle) * t;
            let (left_gain, right_gain) = self.gains_at(angle);
            let left = mix_item.channel(0).as_slice()[i];
            let right = mix_item.channel(1).as_slice()[i];
            mix_item.channel_mut(0).as_mut_slice()[i] = left * left_gain;
            mix_item.channel_mut(1).as_mut_slice()[i] = right * right_gain;
        }
        self.current_angle = end_angle;
    }

    fn reset(&mut self) {
        self.current_angle = 0.0;
        self.target_angle = 0.0;
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
    use approx::assert_relative_eq;

    #[test]
    fn hard_left_silences_right_channel() {
        let mut pan = PanDsp::new(PanLaw::MinusThree);
        pan.set_angle(-1.0);
        pan.current_angle = -1.0; // avoid ramp for this assertion
        let mut item = MixItem::new(2, 4);
        item.set(1.0);
        pan.process(&mut item, 4);
        assert_relative_eq!(item.channel(1).as_slice()[3], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn center_is_equal_power() {
        let pan = PanDsp::new(PanLaw::MinusThree);
        let (l, r) = pan.gains_at(0.0);
        assert_relative_eq!(l, r, epsilon = 1e-5);
        assert_relative_eq!(l, std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-4);
    }
}
