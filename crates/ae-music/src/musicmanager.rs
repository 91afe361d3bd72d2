use ae_bridge::MessageSender;
use ae_core::{CueHandle, MixItem, TransitionHandle};

use crate::authoring::{MusicAuthoringCommand, MusicAuthoringReceiver};
use crate::beatcalc::Meter;
use crate::conductor::Conductor;
use crate::cue::{Cue, MusicDatabase, Stinger, Transition};
use crate::metronome::Metronome;
use crate::sequencer::{Sequencer, SequencerResult};
use crate::sync::Sync;

/// Orchestrates the [`MusicDatabase`], [`Conductor`], [`Metronome`] and
/// [`Sequencer`] into the single entry point the audio callback calls once
/// per block.
pub struct MusicManager {
    database: MusicDatabase,
    conductor: Conductor,
    metronome: Metronome,
    sequencer: Sequencer,
    authoring_rx: MusicAuthoringReceiver,
}

impl MusicManager {
    pub fn new(sample_rate: f64, block_size: usize, num_channels: usize, authoring_rx: MusicAuthoringReceiver) -> Self {
        MusicManager {
            database: MusicDatabase::new(),
            conductor: Conductor::new(sample_rate),
            metronome: Metronome::new(sample_rate, block_size),
            sequencer: Sequencer::new(block_size, num_channels),
            authoring_rx,
        }
    }

    pub fn database(&self) -> &MusicDatabase {
        &self.database
    }

    pub fn database_mut(&mut self) -> &mut MusicDatabase {
        &mut self.database
    }

    pub fn add_cue(&mut self, cue: Cue) -> ae_core::AeResult<()> {
        self.database.add_cue(cue)
    }

    pub fn add_transition(&mut self, transition: Transition) -> ae_core::AeResult<()> {
        self.database.add_transition(transition)
    }

    pub fn add_stinger(&mut self, stinger: Stinger) -> ae_core::AeResult<()> {
        self.database.add_stinger(stinger)
    }

    /// Advances the whole music subsystem by one block: first applies any
    /// authoring commands queued since the last callback, then appends mix
    /// items for every active layer/stinger voice. A database-full rejection
    /// is only logged — the same silent-drop backpressure the command/
    /// message queues use.
    pub fn process(&mut self, playhead: i64, out_mix_items: &mut Vec<MixItem>, messages: &mut MessageSender) {
        while let Some(command) = self.authoring_rx.pop() {
            let result = match command {
                MusicAuthoringCommand::AddCue(cue) => self.database.add_cue(cue),
                MusicAuthoringCommand::AddTransition(transition) => self.database.add_transition(transition),
                MusicAuthoringCommand::AddStinger(stinger) => self.database.add_stinger(stinger),
            };
            if let Err(err) = result {
                log::warn!("dropped music authoring command: {err}");
            }
        }

        let result = self.sequencer.process(
            &mut self.conductor,
            &self.database,
            &mut self.metronome,
            playhead,
            out_mix_items,
            messages,
        );

        let is_playing = self.sequencer.is_playing();
        self.metronome.update(playhead, self.sequencer.current_start_time(), is_playing, messages);

        if result == SequencerResult::Stop {
            self.conductor.reset();
        }
    }

    pub fn play_transition(&mut self, transition: TransitionHandle) {
        self.sequencer.add_transition(transition);
    }

    pub fn stop(&mut self, stop_time: i64, playhead: i64) {
        self.sequencer.stop(stop_time, playhead);
    }

    pub fn fade(&mut self, start_time: i64, amplitude: f32, duration_samples: i64, playhead: i64, stop_on_done: bool) {
        self.sequencer.fade(start_time, amplitude, duration_samples, playhead, stop_on_done);
    }

    pub fn unload(&mut self, audio_handle: ae_core::AudioHandle) {
        self.sequencer.unload(audio_handle);
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    pub fn current_cue(&self) -> Option<CueHandle> {
        self.sequencer.current_cue()
    }

    pub fn calculate_start_time(&mut self, sync: &Sync, playhead: i64) -> i64 {
        let sync_to_music = self.sequencer.is_playing() || self.sequencer.is_processing_transition();
        self.conductor.calculate_start_time(sync, playhead, sync_to_music, &self.metronome)
    }

    /// Directly overrides tempo/meter rather than deriving them from a
    /// cue's authoring data, for a host-driven tempo change mid-playback.
    pub fn set_tempo(&mut self, tempo_bpm: f32, meter: Meter, messages: &mut MessageSender) {
        self.metronome.set(tempo_bpm, meter, messages);
    }

    pub fn tempo(&self) -> f32 {
        self.metronome.tempo()
    }

    pub fn meter(&self) -> Meter {
        self.metronome.meter()
    }

    pub fn bar(&self) -> i32 {
        self.metronome.bar_counter()
    }

    pub fn beat(&self) -> i32 {
        self.metronome.beat_counter()
    }

    /// Looks up the first transition whose [`crate::cue::TransitionCondition`]
    /// matches the engine's current playback position, if any.
    pub fn transition_matching(
        &self,
        user_data: &[u8; 16],
        current_cue: Option<CueHandle>,
    ) -> Option<TransitionHandle> {
        let bar = self.metronome.bar_counter();
        let beat = self.metronome.beat_counter();
        self.database.transitions_matching(user_data, current_cue, bar, beat).first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::{Cue, CueLayer, Transition};
    use crate::sync::SyncValue;
    use ae_bridge::queue::CommandBridge;
    use ae_core::{AudioData, MixGroupHandle};
    use std::sync::Arc;

    fn cue_with_frames(frames: usize, play_count: i32) -> (Cue, CueHandle) {
        let handle = CueHandle::next();
        (
            Cue {
                handle,
                name: "cue".into(),
                layers: vec![CueLayer {
                    audio_data: Arc::new(AudioData::from_interleaved(&vec![0.5; frames * 2], 2)),
                    amplitude: 1.0,
                }],
                tempo_bpm: 120.0,
                meter: Meter { top: 4, bottom: 4 },
                mix_group: MixGroupHandle::next(),
                play_count,
            },
            handle,
        )
    }

    #[test]
    fn cut_transition_with_nothing_playing_starts_at_the_playhead() {
        let (_authoring_tx, authoring_rx) = crate::authoring::MusicAuthoringBridge::build(4);
        let mut manager = MusicManager::new(48_000.0, 1024, 2, authoring_rx);
        let (cue, cue_handle) = cue_with_frames(96_000, 0);
        manager.add_cue(cue).unwrap();
        let transition_handle = TransitionHandle::next();
        manager
            .add_transition(Transition {
                handle: transition_handle,
                target_cue: cue_handle,
                sync: Sync::musical(SyncValue::Cut),
                stinger: None,
                follow_up: None,
                condition: None,
            })
            .unwrap();

        manager.play_transition(transition_handle);

        let (_tx, _rx, mut msg_tx, _msg_rx) = CommandBridge::build(64, 64);
        let mut mix_items = Vec::new();
        manager.process(1000, &mut mix_items, &mut msg_tx);

        assert!(manager.is_playing());
        assert!(!mix_items.is_empty());
    }

    #[test]
    fn queue_transition_starts_after_current_cue_finishes_one_playthrough() {
        let (_authoring_tx, authoring_rx) = crate::authoring::MusicAuthoringBridge::build(4);
        let mut manager = MusicManager::new(48_000.0, 1024, 2, authoring_rx);
        let (cue_x, cue_x_handle) = cue_with_frames(96_000, 1);
        let (cue_y, cue_y_handle) = cue_with_frames(48_000, 1);
        manager.add_cue(cue_x).unwrap();
        manager.add_cue(cue_y).unwrap();

        let transition_x = TransitionHandle::next();
        manager
            .add_transition(Transition {
                handle: transition_x,
                target_cue: cue_x_handle,
                sync: Sync::musical(SyncValue::Cut),
                stinger: None,
                follow_up: None,
                condition: None,
            })
            .unwrap();
        let transition_y = TransitionHandle::next();
        manager
            .add_transition(Transition {
                handle: transition_y,
                target_cue: cue_y_handle,
                sync: Sync::musical(SyncValue::Queue),
                stinger: None,
                follow_up: None,
                condition: None,
            })
            .unwrap();

        manager.play_transition(transition_x);
        let (_tx, _rx, mut msg_tx, _msg_rx) = CommandBridge::build(64, 64);
        let mut mix_items = Vec::new();
        manager.process(0, &mut mix_items, &mut msg_tx);
        assert!(manager.is_playing());

        manager.play_transition(transition_y);
        mix_items.clear();
        manager.process(1024, &mut mix_items, &mut msg_tx);

        let start_time = manager.calculate_start_time(&Sync::musical(SyncValue::Queue), 1024);
        assert_eq!(start_time, 96_000);
    }
}
