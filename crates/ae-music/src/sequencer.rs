use std::collections::VecDeque;

use ae_bridge::{AudioMessage, MessageSender};
use ae_core::{AudioHandle, CueHandle, MixItem, TransitionHandle, constants::MAX_TRANSITIONS};
use ae_dsp::Fader;

use crate::conductor::{Conductor, MusicTransitionRequest};
use crate::cue::MusicDatabase;
use crate::layerset::LayerSet;
use crate::metronome::Metronome;
use crate::stingerset::StingerSet;

fn in_first_window(playhead: i64, start_time: i64, block_size: usize) -> bool {
    start_time >= playhead && start_time < playhead + block_size as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    GetTransition,
    ProcessingTransition,
    FollowUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerResult {
    None,
    Stop,
}

/// Drives a [`LayerSet`] and [`StingerSet`] through a three-state machine
/// per active transition: `GetTransition` pulls the next queued transition
/// through the conductor; `ProcessingTransition` waits for the playhead to
/// enter its first window, then splices old layers out and new layers in;
/// `FollowUp` chains straight into a transition's follow-up once the
/// current layers report done.
pub struct Sequencer {
    block_size: usize,
    num_channels: usize,

    state: State,
    go_to_after_follow_up: State,

    pending_transitions: VecDeque<TransitionHandle>,
    pending_request: Option<MusicTransitionRequest>,
    current_request: MusicTransitionRequest,
    current_cue: Option<CueHandle>,

    layer_set: LayerSet,
    stinger_set: StingerSet,
    fader: Fader,
    is_stopping: bool,
    stop_on_done_fade: bool,
}

impl Sequencer {
    pub fn new(block_size: usize, num_channels: usize) -> Self {
        Sequencer {
            block_size,
            num_channels,
            state: State::GetTransition,
            go_to_after_follow_up: State::GetTransition,
            pending_transitions: VecDeque::with_capacity(MAX_TRANSITIONS),
            pending_request: None,
            current_request: MusicTransitionRequest::default(),
            current_cue: None,
            layer_set: LayerSet::new(),
            stinger_set: StingerSet::new(),
            fader: Fader::new(block_size),
            is_stopping: false,
            stop_on_done_fade: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.layer_set.is_playing()
    }

    pub fn is_processing_transition(&self) -> bool {
        self.state == State::ProcessingTransition
    }

    pub fn current_start_time(&self) -> i64 {
        self.current_request.start_time
    }

    pub fn current_cue(&self) -> Option<CueHandle> {
        self.current_cue
    }

    pub fn add_transition(&mut self, transition: TransitionHandle) {
        if self.pending_transitions.len() >= MAX_TRANSITIONS {
            log::warn!("music transition queue full, dropping request");
            return;
        }
        self.pending_transitions.push_back(transition);
    }

    pub fn stop(&mut self, stop_time: i64, playhead: i64) {
        self.is_stopping = true;
        self.fader.update(0.0, stop_time - playhead, ae_core::constants::STOP_FADE_SAMPLES as i64);
    }

    pub fn fade(&mut self, start_time: i64, amplitude: f32, duration_samples: i64, playhead: i64, stop_on_done: bool) {
        self.fader.update(amplitude, start_time - playhead, duration_samples);
        self.stop_on_done_fade = stop_on_done;
    }

    pub fn reset(&mut self, reset_stingers: bool) {
        self.pending_request = None;
        self.current_request = MusicTransitionRequest::default();
        self.current_cue = None;
        self.pending_transitions.clear();
        self.fader.reset();
        self.state = State::GetTransition;
        self.layer_set.reset();
        self.is_stopping = false;
        self.stop_on_done_fade = false;
        if reset_stingers {
            self.stinger_set.reset();
        }
    }

    pub fn unload(&mut self, audio_handle: AudioHandle) {
        self.stinger_set.reset_if_playing_audio_handle(audio_handle);
    }

    fn pull_transition(
        &mut self,
        playhead: i64,
        conductor: &mut Conductor,
        database: &MusicDatabase,
        metronome: &mut Metronome,
        messages: &mut MessageSender,
    ) -> bool {
        let is_playing = self.is_playing();
        while let Some(transition) = self.pending_transitions.pop_front() {
            if let Some(request) = conductor.create_request(transition, playhead, is_playing, database, metronome, messages) {
                if let Some(transition_data) = database.transition(transition) {
                    if let Some(stinger_handle) = transition_data.stinger {
                        if let (Some(stinger), Some(start)) = (database.stinger(stinger_handle), request.stinger_start_time) {
                            if let Some(cue) = database.cue(stinger.cue) {
                                let layers: Vec<_> =
                                    cue.layers.iter().map(|l| (l.audio_data.clone(), cue.mix_group)).collect();
                                let amplitude = ae_core::db_to_amp(stinger.amplitude);
                                self.stinger_set.play(start, &layers, amplitude);
                            }
                        }
                    }
                }
                self.pending_request = Some(request);
                return true;
            }
        }
        false
    }

    /// Advances the sequencer by one block, appending mix items for every
    /// active music layer and stinger voice. Returns [`SequencerResult::Stop`]
    /// the callback music finishes (naturally or by request).
    pub fn process(
        &mut self,
        conductor: &mut Conductor,
        database: &MusicDatabase,
        metronome: &mut Metronome,
        playhead: i64,
        out_mix_items: &mut Vec<MixItem>,
        messages: &mut MessageSender,
    ) -> SequencerResult {
        let block_size = self.block_size;
        let num_channels = self.num_channels;
        let mut info = crate::layerset::LayerSetInfo::default();

        loop {
            let mut nothing_to_do = false;
            let mut found_transition = false;

            match self.state {
                State::GetTransition => {
                    found_transition = self.pull_transition(playhead, conductor, database, metronome, messages);
                    if found_transition {
                        // A transition found this callback is processed in the
                        // same pass rather than waiting for the next one.
                        self.state = State::ProcessingTransition;
                        self.process_transition_window(
                            playhead,
                            conductor,
                            database,
                            out_mix_items,
                            messages,
                            &mut info,
                            &mut nothing_to_do,
                        );
                    }
                }
                State::ProcessingTransition => {
                    self.process_transition_window(
                        playhead,
                        conductor,
                        database,
                        out_mix_items,
                        messages,
                        &mut info,
                        &mut nothing_to_do,
                    );
                }
                State::FollowUp => {
                    self.enter_follow_up(playhead, conductor, database, info, messages);
                }
            }

            let starting_index = (info.last_filled_frame + 1).max(0) as usize;
            let fill_length = block_size - starting_index;
            info = self
                .layer_set
                .process(starting_index, fill_length, false, block_size, num_channels, out_mix_items);

            let mut follow_up = false;
            if info.done {
                let has_follow_up = self
                    .current_request
                    .transition
                    .and_then(|t| database.transition(t))
                    .and_then(|t| t.follow_up)
                    .is_some();
                if has_follow_up {
                    self.go_to_after_follow_up = self.state;
                    self.state = State::FollowUp;
                    follow_up = true;
                }
            }

            let mut process_again = false;
            if found_transition || follow_up {
                process_again = true;
            }
            if info.done && !follow_up {
                process_again = false;
            }
            if info.mix_item_fully_filled {
                process_again = false;
            }
            if nothing_to_do {
                process_again = false;
            }

            if !process_again {
                break;
            }
        }

        self.stinger_set.process(playhead, block_size, num_channels, out_mix_items);

        if info.looped {
            self.current_request.start_time += self.current_request.music_length;
            conductor.update_last_created_request(self.current_request);
        }

        let fade_result = self.update_fade(out_mix_items, num_channels, block_size);

        let more_music_to_play = self.state == State::FollowUp
            || self.state == State::ProcessingTransition
            || !self.pending_transitions.is_empty();
        let natural_stop = fade_result != SequencerResult::Stop && info.done && !more_music_to_play;
        let stop = fade_result == SequencerResult::Stop || natural_stop;

        if stop {
            messages.send(AudioMessage::MusicFinished);
            conductor.reset();
            self.reset(!natural_stop);
            return SequencerResult::Stop;
        }

        SequencerResult::None
    }

    fn process_transition_window(
        &mut self,
        playhead: i64,
        conductor: &mut Conductor,
        database: &MusicDatabase,
        out_mix_items: &mut Vec<MixItem>,
        messages: &mut MessageSender,
        info: &mut crate::layerset::LayerSetInfo,
        nothing_to_do: &mut bool,
    ) {
        let Some(pending) = self.pending_request else {
            *nothing_to_do = true;
            return;
        };

        if !in_first_window(playhead, pending.start_time, self.block_size) {
            *nothing_to_do = true;
            return;
        }

        let previous_music_was_interrupted = self.current_request.transition.is_some();
        let last_cue_handle = self.current_cue;

        self.current_request = pending;
        self.pending_request = None;
        self.state = State::GetTransition;

        let Some(transition) = self.current_request.transition.and_then(|t| database.transition(t)) else {
            return;
        };
        let Some(cue) = database.cue(transition.target_cue) else {
            return;
        };
        let current_cue_handle = cue.handle;

        let difference = (self.current_request.start_time - playhead).max(0) as usize;
        *info = self.layer_set.process(0, difference, previous_music_was_interrupted, self.block_size, self.num_channels, out_mix_items);

        let layers: Vec<_> = cue.layers.iter().map(|l| (l.audio_data.clone(), cue.mix_group, l.amplitude)).collect();
        self.layer_set.play(&layers, cue.play_count);
        conductor.update_last_created_request(self.current_request);
        self.current_cue = Some(current_cue_handle);

        messages.send(AudioMessage::MusicTransitioned {
            from: last_cue_handle.unwrap_or(CueHandle::INVALID),
            to: current_cue_handle,
        });
    }

    fn enter_follow_up(
        &mut self,
        playhead: i64,
        conductor: &mut Conductor,
        database: &MusicDatabase,
        info: crate::layerset::LayerSetInfo,
        messages: &mut MessageSender,
    ) {
        self.state = self.go_to_after_follow_up;

        let last_cue_handle = self.current_cue;
        let Some(follow_up_handle) = self
            .current_request
            .transition
            .and_then(|t| database.transition(t))
            .and_then(|t| t.follow_up)
        else {
            return;
        };
        let Some(follow_up_transition) = database.transition(follow_up_handle) else {
            return;
        };
        let Some(cue) = database.cue(follow_up_transition.target_cue) else {
            return;
        };

        let start_time = playhead + info.last_filled_frame + 1;
        self.current_request = MusicTransitionRequest {
            transition: Some(follow_up_handle),
            start_time,
            music_length: cue.layers[0].audio_data.frame_count() as i64,
            stinger_start_time: None,
        };
        let layers: Vec<_> = cue.layers.iter().map(|l| (l.audio_data.clone(), cue.mix_group, l.amplitude)).collect();
        self.layer_set.play(&layers, cue.play_count);
        conductor.update_last_created_request(self.current_request);
        self.current_cue = Some(cue.handle);

        messages.send(AudioMessage::MusicTransitioned {
            from: last_cue_handle.unwrap_or(CueHandle::INVALID),
            to: cue.handle,
        });
    }

    fn update_fade(&mut self, out_mix_items: &mut [MixItem], num_channels: usize, block_size: usize) -> SequencerResult {
        if out_mix_items.is_empty() && !self.fader.is_fading() {
            return SequencerResult::None;
        }

        let mut scratch = MixItem::new(num_channels, block_size);
        scratch.set(1.0);
        self.fader.process(&mut scratch, block_size);
        for item in out_mix_items.iter_mut() {
            item.multiply(&scratch);
        }

        if self.is_stopping && !self.fader.is_fading() {
            return SequencerResult::Stop;
        }
        if self.stop_on_done_fade && !self.fader.is_fading() {
            return SequencerResult::Stop;
        }
        SequencerResult::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::{Cue, CueLayer, MusicDatabase, Transition};
    use crate::sync::SyncValue;
    use ae_bridge::queue::CommandBridge;
    use ae_core::{AudioData, MixGroupHandle};

    fn cue_with_frames(frames: usize, play_count: i32) -> (Cue, CueHandle) {
        let handle = CueHandle::next();
        (
            Cue {
                handle,
                name: "cue".into(),
                layers: vec![CueLayer {
                    audio_data: std::sync::Arc::new(AudioData::from_interleaved(&vec![0.5; frames * 2], 2)),
                    amplitude: 1.0,
                }],
                tempo_bpm: 120.0,
                meter: crate::beatcalc::Meter { top: 4, bottom: 4 },
                mix_group: MixGroupHandle::next(),
                play_count,
            },
            handle,
        )
    }

    fn cut_transition(target_cue: CueHandle, follow_up: Option<TransitionHandle>) -> Transition {
        Transition {
            handle: TransitionHandle::next(),
            target_cue,
            sync: crate::sync::Sync::musical(SyncValue::Cut),
            stinger: None,
            follow_up,
            condition: None,
        }
    }

    #[test]
    fn cut_transition_starts_immediately_and_plays() {
        let mut sequencer = Sequencer::new(1024, 2);
        let mut conductor = Conductor::new(48_000.0);
        let mut metronome = Metronome::new(48_000.0, 1024);
        let mut database = MusicDatabase::new();
        let (cue, cue_handle) = cue_with_frames(96_000, 0);
        database.add_cue(cue).unwrap();
        let transition = cut_transition(cue_handle, None);
        let transition_handle = transition.handle;
        database.add_transition(transition).unwrap();

        let (_tx, _rx, mut msg_tx, _msg_rx) = CommandBridge::build(64, 64);
        sequencer.add_transition(transition_handle);

        let mut mix_items = Vec::new();
        let result = sequencer.process(&mut conductor, &database, &mut metronome, 0, &mut mix_items, &mut msg_tx);

        assert_eq!(result, SequencerResult::None);
        assert!(sequencer.is_playing());
        assert!(!mix_items.is_empty());
        assert!(mix_items[0].channel(0).as_slice()[0] != 0.0);
    }

    /// Regression test: a block with no pending transition must still pull
    /// the layer set forward. An earlier version of this loop exited before
    /// reaching the shared tail whenever no transition was found, which
    /// silently stopped already-playing music from ever rendering again.
    #[test]
    fn continuous_playback_with_no_pending_transition_still_renders() {
        let mut sequencer = Sequencer::new(1024, 2);
        let mut conductor = Conductor::new(48_000.0);
        let mut metronome = Metronome::new(48_000.0, 1024);
        let mut database = MusicDatabase::new();
        let (cue, cue_handle) = cue_with_frames(96_000, 0);
        database.add_cue(cue).unwrap();
        let transition = cut_transition(cue_handle, None);
        let transition_handle = transition.handle;
        database.add_transition(transition).unwrap();

        let (_tx, _rx, mut msg_tx, _msg_rx) = CommandBridge::build(64, 64);
        sequencer.add_transition(transition_handle);

        let mut mix_items = Vec::new();
        sequencer.process(&mut conductor, &database, &mut metronome, 0, &mut mix_items, &mut msg_tx);
        assert!(sequencer.is_playing());

        // No new transition queued for this block: the layer set must still
        // advance and produce non-silent audio.
        mix_items.clear();
        sequencer.process(&mut conductor, &database, &mut metronome, 1024, &mut mix_items, &mut msg_tx);

        assert!(sequencer.is_playing());
        assert!(!mix_items.is_empty());
        let channel = mix_items[0].channel(0).as_slice();
        assert!(channel.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn follow_up_transition_chains_after_cue_finishes() {
        let mut sequencer = Sequencer::new(1024, 2);
        let mut conductor = Conductor::new(48_000.0);
        let mut metronome = Metronome::new(48_000.0, 1024);
        let mut database = MusicDatabase::new();

        let (cue_x, cue_x_handle) = cue_with_frames(500, 1);
        let (cue_y, cue_y_handle) = cue_with_frames(1000, 0);
        database.add_cue(cue_x).unwrap();
        database.add_cue(cue_y).unwrap();

        let transition_y = cut_transition(cue_y_handle, None);
        let transition_y_handle = transition_y.handle;
        database.add_transition(transition_y).unwrap();
        let transition_x = cut_transition(cue_x_handle, Some(transition_y_handle));
        let transition_x_handle = transition_x.handle;
        database.add_transition(transition_x).unwrap();

        let (_tx, _rx, mut msg_tx, mut msg_rx) = CommandBridge::build(64, 64);
        sequencer.add_transition(transition_x_handle);

        let mut mix_items = Vec::new();
        sequencer.process(&mut conductor, &database, &mut metronome, 0, &mut mix_items, &mut msg_tx);

        let mut transitioned_to = Vec::new();
        let mut saw_finished = false;
        msg_rx.drain(|m| match m {
            AudioMessage::MusicTransitioned { to, .. } => transitioned_to.push(to),
            AudioMessage::MusicFinished => saw_finished = true,
            _ => {}
        });

        assert!(!saw_finished);
        assert!(transitioned_to.contains(&cue_y_handle));
        assert!(sequencer.is_playing());
    }

    #[test]
    fn cue_without_follow_up_finishes_naturally() {
        let mut sequencer = Sequencer::new(1024, 2);
        let mut conductor = Conductor::new(48_000.0);
        let mut metronome = Metronome::new(48_000.0, 1024);
        let mut database = MusicDatabase::new();
        let (cue, cue_handle) = cue_with_frames(10, 1);
        database.add_cue(cue).unwrap();
        let transition = cut_transition(cue_handle, None);
        let transition_handle = transition.handle;
        database.add_transition(transition).unwrap();

        let (_tx, _rx, mut msg_tx, mut msg_rx) = CommandBridge::build(64, 64);
        sequencer.add_transition(transition_handle);

        let mut mix_items = Vec::new();
        let result = sequencer.process(&mut conductor, &database, &mut metronome, 0, &mut mix_items, &mut msg_tx);

        assert_eq!(result, SequencerResult::Stop);
        assert!(!sequencer.is_playing());

        let mut saw_finished = false;
        msg_rx.drain(|m| {
            if matches!(m, AudioMessage::MusicFinished) {
                saw_finished = true;
            }
        });
        assert!(saw_finished);
    }
}
