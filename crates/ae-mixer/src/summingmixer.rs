use ae_bridge::AudioMessage;
use ae_core::{AeError, AeResult, MixGroupHandle, MixItem, constants::MAX_MIX_GROUPS};

use crate::mixgroup::MixGroup;

/// The priority-ordered DAG of mix groups. Owns every group's DSP state and
/// the routing topology (output links and sends) between them, and runs the
/// per-callback summing pass that turns voice/layer mix items into the
/// interleaved device output buffer.
///
/// Groups are kept in a flat array sorted by descending priority rather than
/// an adjacency-list graph: with [`MAX_MIX_GROUPS`] capped low, a linear scan
/// per lookup and an `O(n log n)` resort per topology edit both stay cheap
/// and allocation-free after construction.
pub struct SummingMixer {
    groups: Vec<MixGroup>,
    master: MixGroupHandle,
    num_channels: usize,
    block_size: usize,
}

impl SummingMixer {
    pub fn new(num_channels: usize, block_size: usize) -> Self {
        let master = MixGroupHandle::next();
        let mut mixer = SummingMixer {
            groups: Vec::with_capacity(MAX_MIX_GROUPS),
            master,
            num_channels,
            block_size,
        };
        let mut group = MixGroup::new(master, master, true, num_channels, block_size);
        group.priority = 0;
        mixer.groups.push(group);
        mixer
    }

    pub fn master(&self) -> MixGroupHandle {
        self.master
    }

    fn index_of(&self, handle: MixGroupHandle) -> Option<usize> {
        self.groups.iter().position(|g| g.handle == handle)
    }

    fn priority_of(&self, handle: MixGroupHandle) -> i32 {
        self.index_of(handle).map_or(0, |i| self.groups[i].priority)
    }

    pub fn group(&self, handle: MixGroupHandle) -> Option<&MixGroup> {
        self.index_of(handle).map(|i| &self.groups[i])
    }

    fn group_mut(&mut self, handle: MixGroupHandle) -> Option<&mut MixGroup> {
        self.index_of(handle).map(move |i| &mut self.groups[i])
    }

    /// Sorts groups into descending-priority processing order. Every edge
    /// (output link or send) must point from a higher-priority group to a
    /// lower-priority one, so a descending pass visits sources strictly
    /// before the groups they feed.
    fn sort(&mut self) {
        self.groups.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Depth-first search over output links and sends: can `from` be reached
    /// starting at `start`? Used to reject an edge that would close a cycle
    /// before it's ever wired in, mirroring the reachability check the
    /// routing graph in the wider engine runs before accepting a new edge.
    fn reaches(&self, start: MixGroupHandle, target: MixGroupHandle, visited: &mut Vec<MixGroupHandle>) -> bool {
        if start == target {
            return true;
        }
        if visited.contains(&start) {
            return false;
        }
        visited.push(start);

        let Some(group) = self.group(start) else { return false };
        if !group.is_master && self.reaches(group.output, target, visited) {
            return true;
        }
        for send in group.sends().to_vec() {
            if self.reaches(send.target, target, visited) {
                return true;
            }
        }
        false
    }

    fn would_cycle(&self, from: MixGroupHandle, to: MixGroupHandle) -> bool {
        from == to || self.reaches(to, from, &mut Vec::with_capacity(self.groups.len()))
    }

    /// Assigns `handle` a priority one above the highest priority among its
    /// current output link and sends, so the invariant `priority(g) >
    /// priority(output(g))` (and the same for every send target) holds
    /// immediately after any edge changes. Only `handle`'s own priority is
    /// recomputed, not its upstream dependents' — a topology edit widens the
    /// gap for the edited group but never invalidates an edge that was
    /// already valid.
    fn recompute_priority(&mut self, handle: MixGroupHandle) {
        let Some(index) = self.index_of(handle) else { return };
        if self.groups[index].is_master {
            return;
        }
        let output = self.groups[index].output;
        let mut highest = self.priority_of(output);
        for send in self.groups[index].sends().to_vec() {
            highest = highest.max(self.priority_of(send.target));
        }
        self.groups[index].priority = highest + 1;
        self.sort();
    }

    pub fn create_group(&mut self, handle: MixGroupHandle) -> AeResult<()> {
        if self.groups.len() >= MAX_MIX_GROUPS {
            return Err(AeError::PoolExhausted("mix groups"));
        }
        let highest = self.groups.iter().map(|g| g.priority).max().unwrap_or(0);
        let mut group = MixGroup::new(handle, self.master, false, self.num_channels, self.block_size);
        group.priority = highest + 1;
        self.groups.push(group);
        self.sort();
        Ok(())
    }

    pub fn destroy_group(&mut self, handle: MixGroupHandle) {
        if let Some(index) = self.index_of(handle) {
            if !self.groups[index].is_master {
                self.groups.remove(index);
            }
        }
    }

    pub fn set_output(&mut self, handle: MixGroupHandle, output: MixGroupHandle) -> AeResult<()> {
        if self.would_cycle(handle, output) {
            return Err(AeError::RoutingCycle { from: handle, to: output });
        }
        if let Some(group) = self.group_mut(handle) {
            group.output = output;
        }
        self.recompute_priority(handle);
        Ok(())
    }

    pub fn create_send(&mut self, handle: MixGroupHandle, target: MixGroupHandle, amplitude: f32) -> AeResult<()> {
        if self.would_cycle(handle, target) {
            return Err(AeError::RoutingCycle { from: handle, to: target });
        }
        let added = self.group_mut(handle).map(|g| g.add_send(target, amplitude)).unwrap_or(false);
        if added {
            self.recompute_priority(handle);
        }
        Ok(())
    }

    pub fn destroy_send(&mut self, handle: MixGroupHandle, target: MixGroupHandle) {
        if let Some(group) = self.group_mut(handle) {
            group.remove_send(target);
        }
        self.recompute_priority(handle);
    }

    pub fn set_volume_db(&mut self, handle: MixGroupHandle, volume_db: f32) {
        if let Some(group) = self.group_mut(handle) {
            group.set_volume_db(volume_db);
        }
    }

    pub fn add_plugin(&mut self, handle: MixGroupHandle, block: ae_dsp::DspBlock) -> bool {
        self.group_mut(handle).map(|g| g.add_plugin(block)).unwrap_or(false)
    }

    pub fn remove_plugin(&mut self, handle: MixGroupHandle, slot: usize) {
        if let Some(group) = self.group_mut(handle) {
            group.remove_plugin(slot);
        }
    }

    pub fn fade(&mut self, handle: MixGroupHandle, amplitude: f32, start_time_samples: i64, duration_samples: i64) {
        if let Some(group) = self.group_mut(handle) {
            group.fade(amplitude, start_time_samples, duration_samples);
        }
    }

    pub fn peak(&self, handle: MixGroupHandle) -> f32 {
        self.group(handle).map_or(0.0, MixGroup::peak)
    }

    /// Runs one callback's worth of summing: zero and raw-sum every group
    /// (order-independent), then in descending-priority order apply each
    /// group's DSP chain and route its accumulator into its sends and its
    /// output group, before finally interleaving the master's accumulator
    /// into `output`.
    ///
    /// The zero/raw-sum pass must finish for every group before any routing
    /// begins: routing writes into a downstream group's accumulator, and a
    /// downstream group's own zero step would erase that contribution if it
    /// ran afterward.
    pub fn sum(&mut self, output: &mut [f32], mix_items: &[MixItem], messages: &mut impl FnMut(AudioMessage)) {
        for group in &mut self.groups {
            group.clear_and_sum(mix_items);
        }

        for index in 0..self.groups.len() {
            let fade_completed = self.groups[index].apply_dsp(self.block_size);
            let handle = self.groups[index].handle;
            let peak = self.groups[index].peak();
            messages(AudioMessage::MixGroupPeakAmplitude { mix_group: handle, amplitude: peak });
            if fade_completed {
                let amplitude = self.groups[index].fade_amplitude();
                messages(AudioMessage::MixGroupFadeComplete { mix_group: handle, amplitude });
            }

            let sends = self.groups[index].sends().to_vec();
            let accumulator = self.groups[index].accumulator().clone();
            for send in sends {
                if let Some(target) = self.group_mut(send.target) {
                    let acc = target.accumulator_mut();
                    acc.sum(&accumulator, send.amplitude);
                }
            }

            let is_master = self.groups[index].is_master;
            let output_handle = self.groups[index].output;
            if !is_master {
                if let Some(target) = self.group_mut(output_handle) {
                    target.accumulator_mut().sum(&accumulator, 1.0);
                }
            }
        }

        let master = self.group(self.master).expect("master mix group always exists");
        master.accumulator().to_interleaved(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ae_core::MixGroupHandle;

    fn silent_messages() -> impl FnMut(AudioMessage) {
        |_| {}
    }

    #[test]
    fn fresh_group_outputs_to_master_with_higher_priority() {
        let mut mixer = SummingMixer::new(1, 4);
        let group = MixGroupHandle::next();
        mixer.create_group(group).unwrap();
        assert!(mixer.group(group).unwrap().priority > mixer.group(mixer.master()).unwrap().priority);
    }

    #[test]
    fn direct_output_cycle_is_rejected() {
        let mut mixer = SummingMixer::new(1, 4);
        let a = MixGroupHandle::next();
        mixer.create_group(a).unwrap();
        let master = mixer.master();
        // a already outputs to master; pointing master back at a would cycle.
        assert!(matches!(mixer.set_output(master, a), Err(AeError::RoutingCycle { .. })));
    }

    #[test]
    fn send_cycle_is_rejected() {
        let mut mixer = SummingMixer::new(1, 4);
        let a = MixGroupHandle::next();
        let b = MixGroupHandle::next();
        mixer.create_group(a).unwrap();
        mixer.create_group(b).unwrap();
        mixer.create_send(a, b, 0.5).unwrap();
        assert!(matches!(mixer.create_send(b, a, 0.5), Err(AeError::RoutingCycle { .. })));
    }

    #[test]
    fn leaf_contribution_reaches_master_through_output_chain() {
        let mut mixer = SummingMixer::new(1, 4);
        let leaf = MixGroupHandle::next();
        mixer.create_group(leaf).unwrap();

        let mut item = MixItem::new(1, 4);
        item.destination = leaf;
        item.set(1.0);

        let mut out = [0.0; 4];
        mixer.sum(&mut out, &[item], &mut silent_messages());
        assert_eq!(out, [1.0; 4]);
    }

    #[test]
    fn send_routes_into_target_without_removing_from_output_chain() {
        let mut mixer = SummingMixer::new(1, 4);
        let leaf = MixGroupHandle::next();
        let aux = MixGroupHandle::next();
        mixer.create_group(leaf).unwrap();
        mixer.create_group(aux).unwrap();
        mixer.create_send(leaf, aux, 0.5).unwrap();

        let mut item = MixItem::new(1, 4);
        item.destination = leaf;
        item.set(1.0);

        let mut out = [0.0; 4];
        mixer.sum(&mut out, &[item], &mut silent_messages());
        // leaf's 1.0 reaches master via its output link (still 1.0), and aux
        // separately receives 0.5 via the send, routed on to master too.
        assert_eq!(out, [1.5; 4]);
    }

    #[test]
    fn peak_reflects_last_callback() {
        let mut mixer = SummingMixer::new(1, 4);
        let leaf = MixGroupHandle::next();
        mixer.create_group(leaf).unwrap();

        let mut item = MixItem::new(1, 4);
        item.destination = leaf;
        item.set(0.25);

        let mut out = [0.0; 4];
        mixer.sum(&mut out, &[item], &mut silent_messages());
        assert!((mixer.peak(leaf) - 0.25).abs() < 1e-6);
    }
}
