use std::collections::{HashMap, VecDeque};

use ae_bridge::queue::CommandBridge;
use ae_bridge::{AudioCommand, AudioMessage, CommandSender, MessageReceiver};
use ae_core::constants::{MAX_CUES, MAX_STINGERS, MAX_TRANSITIONS};
use ae_core::{EngineConfig, EngineSpec, MixGroupHandle};
use ae_data::AssetCache;
use ae_mixer::SummingMixer;
use ae_music::{MusicAuthoringBridge, MusicAuthoringSender};

use crate::asset::Asset;
use crate::mixer::Mixer;
use crate::music::{Event, Music, MusicState};
use crate::soundeffect::{SoundEffect, SoundEffectBuilder};
use crate::timeline::AudioTimeline;

/// Control-thread owner of everything an embedding application talks to.
/// Paired 1:1 with the [`AudioTimeline`] handed back from [`Engine::new`];
/// the two communicate only through the command/message queues `new` wires
/// up between them.
pub struct Engine {
    spec: EngineSpec,
    commands: CommandSender,
    messages: MessageReceiver,
    assets: AssetCache,
    routing: SummingMixer,
    plugin_slots: HashMap<MixGroupHandle, usize>,
    mix_peaks: HashMap<MixGroupHandle, f32>,
    music_authoring: MusicAuthoringSender,
    music_state: MusicState,
    pending_events: VecDeque<AudioMessage>,
}

impl Engine {
    /// Builds the command/message queues and splits them into the control
    /// half (this `Engine`) and the audio half (the returned
    /// [`AudioTimeline`]). The host is responsible for calling
    /// `AudioTimeline::process` once per device period on its own
    /// real-time thread; this crate never spawns one itself.
    pub fn new(spec: EngineSpec, config: EngineConfig) -> (Engine, AudioTimeline) {
        let (commands, command_rx, message_tx, messages) =
            CommandBridge::build(config.command_capacity, config.message_capacity);
        let (music_authoring, music_authoring_rx) = MusicAuthoringBridge::build(MAX_CUES + MAX_TRANSITIONS + MAX_STINGERS);
        let timeline = AudioTimeline::new(spec, command_rx, message_tx, music_authoring_rx);
        let engine = Engine {
            spec,
            commands,
            messages,
            assets: AssetCache::new(),
            routing: SummingMixer::new(spec.channels, spec.block_size),
            plugin_slots: HashMap::new(),
            mix_peaks: HashMap::new(),
            music_authoring,
            music_state: MusicState::default(),
            pending_events: VecDeque::new(),
        };
        (engine, timeline)
    }

    pub fn spec(&self) -> EngineSpec {
        self.spec
    }

    pub fn asset(&mut self) -> Asset<'_> {
        Asset::new(&mut self.assets, &mut self.commands)
    }

    pub fn mixer(&mut self) -> Mixer<'_> {
        Mixer::new(&mut self.routing, &mut self.commands, &mut self.plugin_slots, &self.mix_peaks)
    }

    pub fn music(&mut self) -> Music<'_> {
        Music::new(&mut self.commands, &mut self.music_authoring, &mut self.music_state)
    }

    pub fn event(&mut self) -> Event<'_> {
        Event::new(&mut self.pending_events)
    }

    pub fn sound_effect(&mut self) -> SoundEffectBuilder<'_> {
        SoundEffectBuilder::new(&mut self.commands)
    }

    /// Selects `effect`'s next voice per its [`crate::PlaybackRule`] and
    /// plays it. `effect` is owned by the caller, not this `Engine`, since
    /// its selection state (shuffle deck, round-robin cursor, last play)
    /// needs to persist across many calls rather than being re-derived each
    /// time like every other facade here.
    pub fn play(&mut self, effect: &mut SoundEffect, start_time: i64) -> Option<ae_core::AudioHandle> {
        effect.play(&mut self.commands, start_time)
    }

    pub fn stop_effect(&mut self, effect: &SoundEffect, stop_time: i64) {
        effect.stop(&mut self.commands, stop_time);
    }

    pub fn fade_effect(&mut self, effect: &SoundEffect, start_time: i64, amplitude: f32, duration_samples: i64) {
        effect.fade(&mut self.commands, start_time, amplitude, duration_samples);
    }

    /// The single drain pass over the message queue: frees acknowledged
    /// asset deletes, updates the cached mix-group peaks and music
    /// transport state [`Music`] reads out of, and queues every message for
    /// [`Engine::event`] in emission order. Call once per control-thread
    /// tick, before reading any cached state.
    pub fn process_messages(&mut self) {
        let assets = &mut self.assets;
        let mix_peaks = &mut self.mix_peaks;
        let music_state = &mut self.music_state;
        let pending_events = &mut self.pending_events;

        self.messages.drain(|message| {
            match &message {
                AudioMessage::AssetDelete { .. } => assets.handle_message(&message),
                AudioMessage::MixGroupPeakAmplitude { mix_group, amplitude } => {
                    mix_peaks.insert(*mix_group, *amplitude);
                }
                AudioMessage::MusicTempo { tempo_bpm } => music_state.tempo_bpm = *tempo_bpm,
                AudioMessage::MusicMeter { top, bottom } => {
                    music_state.meter.top = *top;
                    music_state.meter.bottom = *bottom;
                }
                AudioMessage::MusicBarChanged { bar, beat } | AudioMessage::MusicBeatChanged { bar, beat } => {
                    music_state.bar = *bar;
                    music_state.beat = *beat;
                }
                AudioMessage::MusicTransitioned { to, .. } => music_state.current_cue = Some(*to),
                AudioMessage::MusicFinished => music_state.current_cue = None,
                _ => {}
            }
            pending_events.push_back(message);
        });
    }

    /// Requests the audio thread begin its shutdown sequence. The host
    /// should keep calling `AudioTimeline::process` and
    /// [`Engine::process_messages`] until
    /// [`crate::timeline::ShutdownState::Complete`] is observed before
    /// dropping either half.
    pub fn shutdown(&mut self) {
        self.commands.send(AudioCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_hands_back_a_working_pair() {
        let (mut engine, mut timeline) = Engine::new(EngineSpec::default(), EngineConfig::default());
        let handle = engine.asset().load(&[0.0; 64], 2, "silence");
        let mut out = vec![0.0; EngineSpec::default().block_size * EngineSpec::default().channels];
        timeline.process(&mut out);
        engine.asset().unload(handle);
        engine.process_messages();
    }

    #[test]
    fn mix_group_peak_is_cached_from_messages() {
        let (mut engine, mut timeline) = Engine::new(EngineSpec::default(), EngineConfig::default());
        let group = engine.mixer().create_mix_group().unwrap();
        let mut out = vec![0.0; EngineSpec::default().block_size * EngineSpec::default().channels];
        timeline.process(&mut out);
        engine.process_messages();
        assert_eq!(engine.mixer().peak(group), 0.0);
    }
}
