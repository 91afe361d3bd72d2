use ae_bridge::{AudioMessage, CommandReceiver, MessageSender};
use ae_core::{EngineSpec, MixItem};
use ae_data::AudioDataTable;
use ae_music::{MusicAuthoringReceiver, MusicManager};
use ae_mixer::SummingMixer;
use ae_voice::VoiceSet;

use crate::commands;

/// The four-state sequence a [`ae_bridge::AudioCommand::Shutdown`] drives the
/// audio thread through. One transition per callback, so the control thread
/// can block on [`AudioMessage::ContextShutdownComplete`] knowing at least
/// one full callback has already run with every voice stopped before the
/// buffers backing it are freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    Stop,
    Stopping,
    SendShutdownCompleteMessage,
    Complete,
}

/// Everything the audio thread owns, advanced one device period at a time by
/// [`AudioTimeline::process`]. Constructed once by [`crate::engine::Engine::new`]
/// and then never touched by the control thread again except through the
/// command queue.
pub struct AudioTimeline {
    spec: EngineSpec,
    audio_data: AudioDataTable,
    voice_set: VoiceSet,
    music_manager: MusicManager,
    summing_mixer: SummingMixer,
    command_rx: CommandReceiver,
    message_tx: MessageSender,
    playhead: i64,
    mix_items: Vec<MixItem>,
    pending_deletes: Vec<ae_core::AudioHandle>,
    shutdown: ShutdownState,
    shutdown_requested: bool,
}

impl AudioTimeline {
    pub(crate) fn new(
        spec: EngineSpec,
        command_rx: CommandReceiver,
        message_tx: MessageSender,
        music_authoring_rx: MusicAuthoringReceiver,
    ) -> Self {
        AudioTimeline {
            audio_data: AudioDataTable::new(),
            voice_set: VoiceSet::new(spec.channels, spec.block_size),
            music_manager: MusicManager::new(spec.sample_rate as f64, spec.block_size, spec.channels, music_authoring_rx),
            summing_mixer: SummingMixer::new(spec.channels, spec.block_size),
            command_rx,
            message_tx,
            playhead: 0,
            mix_items: Vec::with_capacity(ae_core::constants::MAX_VOICES),
            pending_deletes: Vec::new(),
            shutdown: ShutdownState::Running,
            shutdown_requested: false,
            spec,
        }
    }

    pub fn shutdown_state(&self) -> ShutdownState {
        self.shutdown
    }

    pub fn is_shutdown_complete(&self) -> bool {
        self.shutdown == ShutdownState::Complete
    }

    pub(crate) fn audio_data_mut(&mut self) -> &mut AudioDataTable {
        &mut self.audio_data
    }

    pub(crate) fn voice_set_mut(&mut self) -> &mut VoiceSet {
        &mut self.voice_set
    }

    pub(crate) fn music_manager_mut(&mut self) -> &mut MusicManager {
        &mut self.music_manager
    }

    pub(crate) fn summing_mixer_mut(&mut self) -> &mut SummingMixer {
        &mut self.summing_mixer
    }

    pub(crate) fn message_tx_mut(&mut self) -> &mut MessageSender {
        &mut self.message_tx
    }

    pub(crate) fn playhead(&self) -> i64 {
        self.playhead
    }

    pub(crate) fn queue_delete(&mut self, handle: ae_core::AudioHandle) {
        self.pending_deletes.push(handle);
    }

    pub(crate) fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
    }

    /// One device period's worth of work, per the host callback contract:
    /// zero the output, drain and apply every pending command, advance
    /// music and voices into scratch mix items, sum them into `out`,
    /// advance the playhead, flush delete acknowledgements, and step the
    /// shutdown state machine. `out.len()` must equal
    /// `block_size * channels`; the engine does not handle a mismatch.
    pub fn process(&mut self, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.spec.block_size * self.spec.channels);
        for sample in out.iter_mut() {
            *sample = 0.0;
        }

        while let Some(command) = self.command_rx.pop() {
            commands::apply(self, command);
        }

        self.mix_items.clear();
        self.music_manager.process(self.playhead, &mut self.mix_items, &mut self.message_tx);
        self.voice_set.process(self.playhead, &mut self.mix_items, &mut self.message_tx);

        let message_tx = &mut self.message_tx;
        self.summing_mixer.sum(out, &self.mix_items, &mut |message: AudioMessage| {
            message_tx.send(message);
        });

        self.playhead += self.spec.block_size as i64;

        for handle in self.pending_deletes.drain(..) {
            self.message_tx.send(AudioMessage::AssetDelete { audio_handle: handle });
        }

        self.shutdown = match self.shutdown {
            ShutdownState::Running if self.shutdown_requested => ShutdownState::Stop,
            ShutdownState::Running => ShutdownState::Running,
            ShutdownState::Stop => ShutdownState::Stopping,
            ShutdownState::Stopping => ShutdownState::SendShutdownCompleteMessage,
            ShutdownState::SendShutdownCompleteMessage => {
                self.message_tx.send(AudioMessage::ContextShutdownComplete);
                ShutdownState::Complete
            }
            ShutdownState::Complete => ShutdownState::Complete,
        };
    }
}
