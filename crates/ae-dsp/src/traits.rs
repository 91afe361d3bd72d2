use ae_core::MixItem;

/// Common contract every DSP block satisfies: same sample count in and out,
/// state preserved across calls, and a bypass bit that leaves the mix item
/// untouched when set. Blocks with internal state (delay, filters) must
/// still run on a silent block so tails are emitted correctly.
pub trait Processor {
    fn process(&mut self, mix_item: &mut MixItem, block_size: usize);

    fn reset(&mut self);

    fn set_bypass(&mut self, bypass: bool);

    fn is_bypassed(&self) -> bool;
}
