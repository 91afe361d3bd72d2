use ae_core::MixItem;

use crate::butterworth::{ButterworthFilter, FilterOrder};
use crate::gain::GainDsp;
use crate::pan::{PanDsp, PanLaw};
use crate::traits::Processor;

/// How attenuation interpolates between the near and far distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttenuationCurve {
    Linear,
    EqualPower,
    Quadratic,
}

impl AttenuationCurve {
    fn apply(self, normalized_distance: f32) -> f32 {
        let d = normalized_distance.clamp(0.0, 1.0);
        match self {
            AttenuationCurve::Linear => d,
            AttenuationCurve::EqualPower => d.sqrt(),
            AttenuationCurve::Quadratic => d * d,
        }
    }
}

/// Distance/min/max and the per-parameter extremes a positioned voice
/// interpolates between as it moves from `min_distance` (full volume, no
/// filtering) to `max_distance` (attenuated, filtered, per the curve).
#[derive(Debug, Clone, Copy)]
pub struct PositioningParameters {
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_attenuation_db: f32,
    pub max_highpass_cutoff_hz: f32,
    pub max_lowpass_cutoff_hz: f32,
    pub curve: AttenuationCurve,
}

impl Default for PositioningParameters {
    fn default() -> Self {
        PositioningParameters {
            min_distance: 1.0,
            max_distance: 100.0,
            max_attenuation_db: -60.0,
            max_highpass_cutoff_hz: 2000.0,
            max_lowpass_cutoff_hz: 500.0,
            curve: AttenuationCurve::EqualPower,
        }
    }
}

/// Composite distance-based positioning DSP: gain + Butterworth HPF +
/// Butterworth LPF + pan, all driven off one normalized distance and a pan
/// angle. Near = full volume, filters wide open. Far = attenuated per
/// `max_attenuation_db`, HPF closing in from silence-side, LPF closing down.
pub struct PositioningDsp {
    params: PositioningParameters,
    gain: GainDsp,
    highpass: ButterworthFilter,
    lowpass: ButterworthFilter,
    pan: PanDsp,
    bypass: bool,
}

impl PositioningDsp {
    pub fn new(sample_rate: f32, num_channels: usize, params: PositioningParameters) -> Self {
        PositioningDsp {
            params,
            gain: GainDsp::new(),
            highpass: ButterworthFilter::highpass(FilterOrder::Second, sample_rate, num_channels),
            lowpass: ButterworthFilter::lowpass(FilterOrder::Second, sample_rate, num_channels),
            pan: PanDsp::new(PanLaw::MinusThree),
            bypass: false,
        }
    }

    /// `distance` is absolute (same units as `min_distance`/`max_distance`);
    /// `pan_angle` is passed straight through, unaffected by distance.
    pub fn update(&mut self, distance: f32, pan_angle: f32) {
        let span = (self.params.max_distance - self.params.min_distance).max(f32::EPSILON);
        let normalized = ((distance - self.params.min_distance) / span).clamp(0.0, 1.0);
        let t = self.params.curve.apply(normalized);

        let gain_db = t * self.params.max_attenuation_db;
        self.gain.set_amplitude(ae_core::db_to_amp(gain_db));

        let hpf_cutoff = 1.0 + t * (self.params.max_highpass_cutoff_hz - 1.0);
        self.highpass.set_cutoff(hpf_cutoff);

        let nyquist_margin = self.params.max_lowpass_cutoff_hz;
        let lpf_cutoff = 20_000.0 - t * (20_000.0 - nyquist_margin).max(0.0);
        self.lowpass.set_cutoff(lpf_cutoff);

        self.pan.set_angle(pan_angle);
    }
}

impl Processor for PositioningDsp {
    fn process(&mut self, mix_item: &mut MixItem, block_size: usize) {
        if self.bypass {
            return;
        }
        self.gain.process(mix_item, block_size);
        self.highpass.process(mix_item, block_size);
        self.lowpass.process(mix_item, block_size);
        self.pan.process(mix_item, block_size);
    }

    fn reset(&mut self) {
        self.gain.reset();
        self.highpass.reset();
        self.lowpass.reset();
        self.pan.reset();
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
    fn at_min_distance_gain_is_unattenuated() {
        let mut dsp = PositioningDsp::new(48_000.0, 2, PositioningParameters::default());
        dsp.update(1.0, 0.0);
        dsp.gain.snap();
        assert!((dsp.gain.amplitude() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn far_distance_clamps_to_max_attenuation() {
        let mut dsp = PositioningDsp::new(48_000.0, 2, PositioningParameters::default());
        dsp.update(1000.0, 0.0); // far beyond max_distance
        dsp.gain.snap();
        let expected = ae_core::db_to_amp(PositioningParameters::default().max_attenuation_db);
        assert!((dsp.gain.amplitude() - expected).abs() < 1e-5);
    }
}
