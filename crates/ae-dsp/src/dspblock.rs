use ae_core::MixItem;

use crate::biquad::BiquadFilter;
use crate::butterworth::ButterworthFilter;
use crate::convolver::ConvolverDsp;
use crate::delay::DelayDsp;
use crate::dynamics::{CompressorDsp, LimiterDsp};
use crate::gain::GainDsp;
use crate::pan::PanDsp;
use crate::positioning::PositioningDsp;
use crate::traits::Processor;

/// One slot in a mix group's plug-in chain: one of the built-in blocks, or
/// an opaque user plug-in reached through the `Processor` trait object. A
/// closed sum type plus one open variant, rather than dispatching every
/// block through a vtable.
///
/// `Send` on the `Plugin` variant matters beyond thread-safety pedantry:
/// every block is built on the control thread (construction allocates) and
/// then moved whole across the command queue, so the audio thread never
/// allocates to satisfy an "add plug-in" request.
pub enum DspBlock {
    Gain(GainDsp),
    Pan(PanDsp),
    Butterworth(ButterworthFilter),
    Biquad(BiquadFilter),
    Delay(DelayDsp),
    Compressor(CompressorDsp),
    Limiter(LimiterDsp),
    Convolver(ConvolverDsp),
    Positioning(PositioningDsp),
    Plugin(Box<dyn Processor + Send>),
}

impl Processor for DspBlock {
    fn process(&mut self, mix_item: &mut MixItem, block_size: usize) {
        match self {
            DspBlock::Gain(b) => b.process(mix_item, block_size),
            DspBlock::Pan(b) => b.process(mix_item, block_size),
            DspBlock::Butterworth(b) => b.process(mix_item, block_size),
            DspBlock::Biquad(b) => b.process(mix_item, block_size),
            DspBlock::Delay(b) => b.process(mix_item, block_size),
            DspBlock::Compressor(b) => b.process(mix_item, block_size),
            DspBlock::Limiter(b) => b.process(mix_item, block_size),
            DspBlock::Convolver(b) => b.process(mix_item, block_size),
            DspBlock::Positioning(b) => b.process(mix_item, block_size),
            DspBlock::Plugin(b) => b.process(mix_item, block_size),
        }
    }

    fn reset(&mut self) {
        match self {
            DspBlock::Gain(b) => b.reset(),
            DspBlock::Pan(b) => b.reset(),
            DspBlock::Butterworth(b) => b.reset(),
            DspBlock::Biquad(b) => b.reset(),
            DspBlock::Delay(b) => b.reset(),
            DspBlock::Compressor(b) => b.reset(),
            DspBlock::Limiter(b) => b.reset(),
            DspBlock::Convolver(b) => b.reset(),
            DspBlock::Positioning(b) => b.reset(),
            DspBlock::Plugin(b) => b.reset(),
        }
    }

    fn set_bypass(&mut self, bypass: bool) {
        match self {
            DspBlock::Gain(b) => b.set_bypass(bypass),
            DspBlock::Pan(b) => b.set_bypass(bypass),
            DspBlock::Butterworth(b) => b.set_bypass(bypass),
            DspBlock::Biquad(b) => b.set_bypass(bypass),
            DspBlock::Delay(b) => b.set_bypass(bypass),
            DspBlock::Compressor(b) => b.set_bypass(bypass),
            DspBlock::Limiter(b) => b.set_bypass(bypass),
            DspBlock::Convolver(b) => b.set_bypass(bypass),
            DspBlock::Positioning(b) => b.set_bypass(bypass),
            DspBlock::Plugin(b) => b.set_bypass(bypass),
        }
    }

    fn is_bypassed(&self) -> bool {
        match self {
            DspBlock::Gain(b) => b.is_bypassed(),
            DspBlock::Pan(b) => b.is_bypassed(),
            DspBlock::Butterworth(b) => b.is_bypassed(),
            DspBlock::Biquad(b) => b.is_bypassed(),
            DspBlock::Delay(b) => b.is_bypassed(),
            DspBlock::Compressor(b) => b.is_bypassed(),
            DspBlock::Limiter(b) => b.is_bypassed(),
            DspBlock::Convolver(b) => b.is_bypassed(),
            DspBlock::Positioning(b) => b.is_bypassed(),
            DspBlock::Plugin(b) => b.is_bypassed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_block_dispatches_through_the_processor_trait() {
        let mut block = DspBlock::Gain(GainDsp::new());
        let mut item = MixItem::new(1, 8);
        item.set(1.0);
        block.process(&mut item, 8);
        assert!(!block.is_bypassed());
    }
}
