use ae_core::{MixGroupHandle, MixItem, constants::{MAX_MIX_GROUP_PLUGINS, MAX_MIX_GROUP_SENDS}};
use ae_dsp::{DspBlock, Fader, GainDsp, Processor};

use crate::send::Send;

/// A named summing bus: an accumulator that every voice/layer/group mix
/// item destined for it is summed into, a volume fader, a user-facing fade
/// lane (driven by `fade_mix_groups`), up to [`MAX_MIX_GROUP_PLUGINS`]
/// plug-ins, and up to [`MAX_MIX_GROUP_SENDS`] sends into other groups.
pub struct MixGroup {
    pub handle: MixGroupHandle,
    pub output: MixGroupHandle,
    pub is_master: bool,
    pub priority: i32,
    volume: GainDsp,
    user_fader: Fader,
    plugins: Vec<DspBlock>,
    sends: Vec<Send>,
    accumulator: MixItem,
    peak: f32,
}

impl MixGroup {
    pub fn new(handle: MixGroupHandle, output: MixGroupHandle, is_master: bool, num_channels: usize, block_size: usize) -> Self {
        MixGroup {
            handle,
            output,
            is_master,
            priority: 0,
            volume: GainDsp::new(),
            user_fader: Fader::new(block_size),
            plugins: Vec::with_capacity(MAX_MIX_GROUP_PLUGINS),
            sends: Vec::with_capacity(MAX_MIX_GROUP_SENDS),
            accumulator: MixItem::new(num_channels, block_size),
            peak: 0.0,
        }
    }

    pub fn set_volume_db(&mut self, volume_db: f32) {
        self.volume.set_amplitude(ae_core::db_to_amp(volume_db));
    }

    pub fn fade(&mut self, amplitude: f32, start_time_samples: i64, duration_samples: i64) {
        self.user_fader.update(amplitude, start_time_samples, duration_samples);
    }

    pub fn is_fading(&self) -> bool {
        self.user_fader.is_fading()
    }

    pub fn fade_amplitude(&self) -> f32 {
        self.user_fader.amplitude()
    }

    pub fn add_plugin(&mut self, block: DspBlock) -> bool {
        if self.plugins.len() >= MAX_MIX_GROUP_PLUGINS {
            log::warn!("mix group {:?} plug-in chain full, dropping plug-in", self.handle);
            return false;
        }
        self.plugins.push(block);
        true
    }

    pub fn remove_plugin(&mut self, slot: usize) {
        if slot < self.plugins.len() {
            self.plugins.remove(slot);
        }
    }

    pub fn plugin(&self, slot: usize) -> Option<&DspBlock> {
        self.plugins.get(slot)
    }

    pub fn add_send(&mut self, target: MixGroupHandle, amplitude: f32) -> bool {
        if let Some(existing) = self.sends.iter_mut().find(|s| s.target == target) {
            existing.amplitude = amplitude;
            return true;
        }
        if self.sends.len() >= MAX_MIX_GROUP_SENDS {
            log::warn!("mix group {:?} send list full, dropping send", self.handle);
            return false;
        }
        self.sends.push(Send { target, amplitude });
        true
    }

    pub fn remove_send(&mut self, target: MixGroupHandle) {
        self.sends.retain(|s| s.target != target);
    }

    pub fn sends(&self) -> &[Send] {
        &self.sends
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn accumulator(&self) -> &MixItem {
        &self.accumulator
    }

    pub fn accumulator_mut(&mut self) -> &mut MixItem {
        &mut self.accumulator
    }

    /// Step 1: zero the accumulator and sum in every pending mix item
    /// destined for this group. Run for every group before any group's
    /// [`Self::apply_dsp`], since step 4/5 routing from an upstream group
    /// writes into a downstream group's accumulator and must land after
    /// this zeroing, not before it.
    pub fn clear_and_sum(&mut self, mix_items: &[MixItem]) {
        self.accumulator.zero();
        self.accumulator.destination = self.handle;
        for item in mix_items.iter().filter(|item| item.destination == self.handle) {
            self.accumulator.sum(item, 1.0);
        }
    }

    /// Steps 2-3: volume fader, user fade fader, plug-in chain, then the
    /// peak reading. Returns `true` when the user fade just completed this
    /// callback, so the caller can emit `MixGroupFadeComplete`. Sends (step
    /// 4) and output routing (step 5) are driven by
    /// [`crate::summingmixer::SummingMixer`], which alone sees every group.
    pub fn apply_dsp(&mut self, block_size: usize) -> bool {
        self.volume.process(&mut self.accumulator, block_size);
        let was_fading = self.user_fader.is_fading();
        self.user_fader.process(&mut self.accumulator, block_size);
        let fade_completed = was_fading && !self.user_fader.is_fading();

        for plugin in &mut self.plugins {
            plugin.process(&mut self.accumulator, block_size);
        }

        self.peak = self.accumulator.absolute_max();
        fade_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ae_core::MixGroupHandle;

    #[test]
    fn sums_only_mix_items_destined_for_this_group() {
        let mut group = MixGroup::new(MixGroupHandle::next(), MixGroupHandle::INVALID, true, 1, 4);
        let mut mine = MixItem::new(1, 4);
        mine.destination = group.handle;
        mine.set(1.0);
        let mut other = MixItem::new(1, 4);
        other.destination = MixGroupHandle::next();
        other.set(5.0);

        group.clear_and_sum(&[mine, other]);
        assert_eq!(group.accumulator().channel(0).as_slice(), &[1.0; 4]);
    }

    #[test]
    fn plugin_chain_capacity_is_enforced() {
        let mut group = MixGroup::new(MixGroupHandle::next(), MixGroupHandle::INVALID, false, 1, 4);
        for _ in 0..MAX_MIX_GROUP_PLUGINS {
            assert!(group.add_plugin(DspBlock::Gain(GainDsp::new())));
        }
        assert!(!group.add_plugin(DspBlock::Gain(GainDsp::new())));
    }
}
