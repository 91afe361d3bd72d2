use ae_core::{CueHandle, TransitionHandle};

use crate::beatcalc::Meter;
use crate::cue::MusicDatabase;
use crate::metronome::Metronome;
use crate::sync::{ReferencePoint, Sync, SyncMode, SyncValue};

/// A scheduled move to a new cue: when it starts, how long the target cue's
/// natural loop length is, and (if a stinger precedes it) when the stinger
/// should start.
#[derive(Debug, Clone, Copy)]
pub struct MusicTransitionRequest {
    pub transition: Option<TransitionHandle>,
    pub start_time: i64,
    pub music_length: i64,
    pub stinger_start_time: Option<i64>,
}

impl Default for MusicTransitionRequest {
    fn default() -> Self {
        MusicTransitionRequest {
            transition: None,
            start_time: -1,
            music_length: -1,
            stinger_start_time: None,
        }
    }
}

/// Resolves scheduling decisions: given a transition's [`Sync`] and the
/// current playhead, computes the absolute sample the transition should
/// start at, accounting for a preceding stinger that must have room to
/// play out first.
pub struct Conductor {
    sample_rate: f64,
    last_created_request: MusicTransitionRequest,
}

impl Conductor {
    pub fn new(sample_rate: f64) -> Self {
        Conductor {
            sample_rate,
            last_created_request: MusicTransitionRequest::default(),
        }
    }

    pub fn reset(&mut self) {
        self.last_created_request = MusicTransitionRequest::default();
    }

    pub fn update_last_created_request(&mut self, request: MusicTransitionRequest) {
        self.last_created_request = request;
    }

    /// Builds a [`MusicTransitionRequest`] for `transition`, extending the
    /// start time as needed to leave room for a preceding stinger.
    pub fn create_request(
        &mut self,
        transition: TransitionHandle,
        playhead: i64,
        is_playing: bool,
        database: &MusicDatabase,
        metronome: &mut Metronome,
        messages: &mut ae_bridge::MessageSender,
    ) -> Option<MusicTransitionRequest> {
        let transition_data = database.transition(transition)?;
        let cue = database.cue(transition_data.target_cue)?;

        if !is_playing {
            metronome.set(cue.tempo_bpm, cue.meter, messages);
        }

        let music_length = cue.layers[0].audio_data.frame_count() as i64;

        let mut start_time = self.calculate_start_time(&transition_data.sync, playhead, is_playing, metronome);

        let mut stinger_start_time = None;
        if let Some(stinger_handle) = transition_data.stinger {
            let stinger = database.stinger(stinger_handle)?;
            let stinger_cue = database.cue(stinger.cue)?;
            let stinger_duration =
                Metronome::sync_samples(self.sample_rate, &stinger.sync, stinger_cue.tempo_bpm, stinger_cue.meter);

            if start_time - stinger_duration < playhead {
                let extension = if transition_data.sync.value == SyncValue::Queue {
                    music_length
                } else {
                    Metronome::sync_samples(self.sample_rate, &transition_data.sync, metronome.tempo(), metronome.meter())
                };
                let extension = extension.max(1);
                while start_time - stinger_duration < playhead {
                    start_time += extension;
                }
            }

            stinger_start_time = Some(start_time - stinger_duration);
        }

        let request = MusicTransitionRequest {
            transition: Some(transition),
            start_time,
            music_length,
            stinger_start_time,
        };

        if !is_playing {
            self.update_last_created_request(request);
        }

        Some(request)
    }

    /// Resolves a sync point to an absolute start sample: immediate for
    /// Cut/Queue, otherwise a bar-by-bar search forward from the current
    /// measure for anything else.
    pub fn calculate_start_time(&self, sync: &Sync, playhead: i64, is_playing: bool, metronome: &Metronome) -> i64 {
        match sync.mode {
            SyncMode::Musical => {
                if !is_playing {
                    return playhead;
                }

                if sync.value == SyncValue::Queue {
                    return self.last_created_request.start_time + self.last_created_request.music_length;
                }
                if sync.value == SyncValue::Cut {
                    return playhead;
                }

                let sync_value = metronome.precise_beat_switch(sync) as i64;

                if sync.reference_point == ReferencePoint::CueStart {
                    let start_time = self.last_created_request.start_time + sync_value;
                    if start_time >= playhead {
                        return start_time;
                    }
                    // Falls through to the bar-relative search below: recovers
                    // a misauthored CueStart-relative transition that would
                    // otherwise land before the playhead.
                }

                let num_full_bars_played = metronome.bar_counter() - 1;
                let bar_value = metronome.precise_beat_switch(&Sync::musical(SyncValue::Bar)) as i64;
                let current_measure_start_time =
                    self.last_created_request.start_time + num_full_bars_played as i64 * bar_value;

                let mut start_time = -1i64;
                let mut reference_point = current_measure_start_time;
                let mut next_measure = current_measure_start_time + bar_value;
                let mut counter = 0;

                while start_time < playhead {
                    if counter >= 1000 {
                        break;
                    }
                    start_time = reference_point + sync_value;
                    reference_point += sync_value;
                    if reference_point >= next_measure {
                        reference_point = next_measure;
                        next_measure += bar_value;
                    }
                    counter += 1;
                }
                start_time
            }
            SyncMode::Time => playhead + (self.sample_rate * sync.time_seconds as f64).round() as i64,
        }
    }
}

pub fn meter_eq(a: Meter, b: Meter) -> bool {
    a == b
}

pub fn current_cue_for(database: &MusicDatabase, transition: Option<TransitionHandle>) -> Option<CueHandle> {
    transition.and_then(|t| database.cue_for_transition(t)).map(|c| c.handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::{Cue, CueLayer, Transition};
    use ae_bridge::queue::CommandBridge;
    use ae_core::{AudioData, MixGroupHandle};
    use std::sync::Arc;

    fn make_database() -> (MusicDatabase, CueHandle, TransitionHandle) {
        let mut db = MusicDatabase::new();
        let cue_handle = CueHandle::next();
        db.add_cue(Cue {
            handle: cue_handle,
            name: "a".into(),
            layers: vec![CueLayer {
                audio_data: Arc::new(AudioData::from_interleaved(&[0.0; 96_000 * 2], 2)),
                amplitude: 1.0,
            }],
            tempo_bpm: 120.0,
            meter: Meter { top: 4, bottom: 4 },
            mix_group: MixGroupHandle::next(),
            play_count: 0,
        })
        .unwrap();

        let transition_handle = TransitionHandle::next();
        db.add_transition(Transition {
            handle: transition_handle,
            target_cue: cue_handle,
            sync: Sync::musical(SyncValue::Cut),
            stinger: None,
            follow_up: None,
            condition: None,
        })
        .unwrap();

        (db, cue_handle, transition_handle)
    }

    #[test]
    fn cut_transition_starts_at_the_playhead_when_nothing_is_playing() {
        let (db, _cue, transition) = make_database();
        let mut conductor = Conductor::new(48_000.0);
        let mut metronome = Metronome::new(48_000.0, 1024);
        let (_tx, _rx, mut msg_tx, _msg_rx) = CommandBridge::build(16, 16);

        let request = conductor
            .create_request(transition, 1000, false, &db, &mut metronome, &mut msg_tx)
            .unwrap();
        assert_eq!(request.start_time, 1000);
    }

    #[test]
    fn cut_transition_while_playing_also_starts_at_the_playhead() {
        let (db, _cue, transition) = make_database();
        let mut conductor = Conductor::new(48_000.0);
        let mut metronome = Metronome::new(48_000.0, 1024);
        let (_tx, _rx, mut msg_tx, _msg_rx) = CommandBridge::build(16, 16);
        metronome.set(120.0, Meter { top: 4, bottom: 4 }, &mut msg_tx);

        let request = conductor
            .create_request(transition, 2000, true, &db, &mut metronome, &mut msg_tx)
            .unwrap();
        assert_eq!(request.start_time, 2000);
    }
}
