use std::collections::HashMap;

use ae_bridge::{AudioCommand, CommandSender};
use ae_core::{AeResult, MixGroupHandle};
use ae_dsp::DspBlock;
use ae_mixer::SummingMixer;

/// Control-side handle onto the mix-group routing graph. Borrowed from
/// [`crate::Engine::mixer`].
///
/// Keeps its own [`SummingMixer`] as a synchronous mirror of the topology:
/// priority assignment and cycle rejection are pure data-structure work with
/// no real-time constraint, so the same type the audio thread uses to route
/// summed audio is reused here to validate a routing edit and assign its
/// priority before the corresponding command is ever sent, instead of
/// re-deriving those rules a second time. Plug-in chains are not mirrored:
/// `DspBlock::Plugin` isn't `Clone`, so slot bookkeeping for them is kept as
/// a plain counter here instead.
pub struct Mixer<'a> {
    routing: &'a mut SummingMixer,
    commands: &'a mut CommandSender,
    plugin_slots: &'a mut HashMap<MixGroupHandle, usize>,
    peaks: &'a std::collections::HashMap<MixGroupHandle, f32>,
}

impl<'a> Mixer<'a> {
    pub(crate) fn new(
        routing: &'a mut SummingMixer,
        commands: &'a mut CommandSender,
        plugin_slots: &'a mut HashMap<MixGroupHandle, usize>,
        peaks: &'a std::collections::HashMap<MixGroupHandle, f32>,
    ) -> Self {
        Mixer { routing, commands, plugin_slots, peaks }
    }

    pub fn master(&self) -> MixGroupHandle {
        self.routing.master()
    }

    /// Creates a new mix group, initially routed straight to the master
    /// bus, and returns the handle voices/layers can target.
    pub fn create_mix_group(&mut self) -> AeResult<MixGroupHandle> {
        let handle = MixGroupHandle::next();
        self.routing.create_group(handle)?;
        let group = self.routing.group(handle).expect("just created");
        self.commands.send(AudioCommand::CreateMixGroup {
            handle,
            output: group.output,
            priority: group.priority,
            is_master: false,
        });
        Ok(handle)
    }

    pub fn destroy_mix_group(&mut self, handle: MixGroupHandle) {
        self.routing.destroy_group(handle);
        self.commands.send(AudioCommand::DestroyMixGroup { handle });
    }

    /// Re-routes `handle`'s output link. Rejected without sending any
    /// command if it would close a cycle in the routing graph.
    pub fn set_output(&mut self, handle: MixGroupHandle, output: MixGroupHandle) -> AeResult<()> {
        self.routing.set_output(handle, output)?;
        self.commands.send(AudioCommand::SetMixGroupOutput { handle, output });
        Ok(())
    }

    pub fn set_volume_db(&mut self, handle: MixGroupHandle, volume_db: f32) {
        self.routing.set_volume_db(handle, volume_db);
        self.commands.send(AudioCommand::SetMixGroupVolumeDb { handle, volume_db });
    }

    /// Adds or updates a send from `source` into `target`. Rejected without
    /// sending any command if it would close a cycle.
    pub fn create_send(&mut self, source: MixGroupHandle, target: MixGroupHandle, amplitude: f32) -> AeResult<()> {
        self.routing.create_send(source, target, amplitude)?;
        self.commands.send(AudioCommand::CreateSend { source, target, amplitude });
        Ok(())
    }

    pub fn destroy_send(&mut self, source: MixGroupHandle, target: MixGroupHandle) {
        self.routing.destroy_send(source, target);
        self.commands.send(AudioCommand::DestroySend { source, target });
    }

    /// Fades every group in `handles` to `target_db` over
    /// `duration_samples`, starting at `start_time` (a playhead position,
    /// not wall-clock time).
    pub fn fade_mix_groups(&mut self, handles: &[MixGroupHandle], target_db: f32, start_time: i64, duration_samples: i64) {
        self.commands.send(AudioCommand::FadeMixGroups {
            handles: handles.to_vec(),
            target_db,
            start_time,
            duration_samples,
        });
    }

    /// Inserts `block` at the end of `handle`'s plug-in chain and returns
    /// its slot, for later removal with [`Mixer::remove_plugin`]. Slot
    /// numbers are tracked here rather than mirrored in [`SummingMixer`]
    /// since `DspBlock::Plugin` isn't `Clone`. Removing anything but the
    /// highest-numbered live slot shifts every slot above it down by one on
    /// the audio side; remove from the end of a chain first if more than
    /// one plug-in needs to come out.
    pub fn add_plugin(&mut self, handle: MixGroupHandle, block: DspBlock) -> usize {
        let slot = self.plugin_slots.entry(handle).or_insert(0);
        let assigned = *slot;
        *slot += 1;
        self.commands.send(AudioCommand::AddMixGroupPlugin { handle, block });
        assigned
    }

    pub fn remove_plugin(&mut self, handle: MixGroupHandle, slot: usize) {
        self.commands.send(AudioCommand::RemoveMixGroupPlugin { handle, slot });
    }

    /// Last reported peak absolute sample value for `handle`, cached from
    /// `AudioMessage::MixGroupPeakAmplitude` by
    /// [`crate::Engine::process_messages`]. Zero until the first callback
    /// after creation has been processed and drained.
    pub fn peak(&self, handle: MixGroupHandle) -> f32 {
        self.peaks.get(&handle).copied().unwrap_or(0.0)
    }
}
