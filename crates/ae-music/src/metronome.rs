use ae_bridge::{AudioMessage, MessageSender};

use crate::beatcalc::{BeatCalculator, Meter};
use crate::sync::Sync;

/// Tracks tempo, meter, and the current bar/beat counters derived from a
/// playing cue's start time and the playhead. Also the sole source of truth
/// for translating a [`Sync`] into samples, since that conversion depends on
/// the currently set tempo and meter.
pub struct Metronome {
    sample_rate: f64,
    block_size: usize,
    beat_calculator: BeatCalculator,
    meter: Meter,
    tempo_bpm: f32,
    samples_per_beat: f64,
    bar_counter: i32,
    beat_counter: i32,
}

impl Metronome {
    pub fn new(sample_rate: f64, block_size: usize) -> Self {
        Metronome {
            sample_rate,
            block_size,
            beat_calculator: BeatCalculator::default(),
            meter: Meter::default(),
            tempo_bpm: -1.0,
            samples_per_beat: 0.0,
            bar_counter: 0,
            beat_counter: 0,
        }
    }

    pub fn tempo(&self) -> f32 {
        self.tempo_bpm
    }

    pub fn meter(&self) -> Meter {
        self.meter
    }

    pub fn bar_counter(&self) -> i32 {
        self.bar_counter
    }

    pub fn beat_counter(&self) -> i32 {
        self.beat_counter
    }

    pub fn set(&mut self, tempo_bpm: f32, meter: Meter, messages: &mut MessageSender) {
        self.tempo_bpm = tempo_bpm;
        self.meter = meter;
        self.beat_calculator = BeatCalculator::calculate(tempo_bpm, meter, self.sample_rate);
        self.samples_per_beat = self.beat_calculator.samples_per_beat() as f64;

        messages.send(AudioMessage::MusicTempo { tempo_bpm });
        messages.send(AudioMessage::MusicMeter { top: meter.top, bottom: meter.bottom });
    }

    /// Updates the bar/beat counters from `playhead` relative to
    /// `music_start_time`, emitting change messages. A no-op while nothing
    /// is playing.
    pub fn update(&mut self, playhead: i64, music_start_time: i64, is_playing: bool, messages: &mut MessageSender) {
        if !is_playing || self.samples_per_beat <= 0.0 {
            return;
        }

        let total_music_playtime = ((playhead + self.block_size as i64) - music_start_time).max(0) as f64;

        let current_beat_in_terms_of_total_beats = (total_music_playtime / self.samples_per_beat).floor();
        let bars = (current_beat_in_terms_of_total_beats / self.meter.top as f64).floor();
        let beats = current_beat_in_terms_of_total_beats - bars * self.meter.top as f64;

        let last_bar = self.bar_counter;
        let last_beat = self.beat_counter;
        self.bar_counter = 1 + bars as i32;
        self.beat_counter = 1 + beats as i32;

        if self.bar_counter != last_bar {
            messages.send(AudioMessage::MusicBarChanged { bar: self.bar_counter, beat: self.beat_counter });
        }
        if self.beat_counter != last_beat {
            messages.send(AudioMessage::MusicBeatChanged { bar: self.bar_counter, beat: self.beat_counter });
        }
    }

    pub fn reset(&mut self) {
        self.beat_calculator = BeatCalculator::default();
        self.meter = Meter::default();
        self.tempo_bpm = -1.0;
        self.samples_per_beat = 0.0;
        self.bar_counter = 0;
        self.beat_counter = 0;
    }

    pub fn precise_beat_switch(&self, sync: &Sync) -> f64 {
        self.beat_calculator.precise_beat_switch(sync)
    }

    pub fn sync_samples(sample_rate: f64, sync: &Sync, tempo_bpm: f32, meter: Meter) -> i64 {
        BeatCalculator::calculate(tempo_bpm, meter, sample_rate).beat_switch(sync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ae_bridge::queue::CommandBridge;
    use crate::sync::SyncValue;

    #[test]
    fn setting_tempo_emits_tempo_and_meter_messages() {
        let mut metronome = Metronome::new(48_000.0, 1024);
        let (_tx, _rx, mut msg_tx, mut msg_rx) = CommandBridge::build(16, 16);
        metronome.set(120.0, Meter { top: 4, bottom: 4 }, &mut msg_tx);

        let mut saw_tempo = false;
        let mut saw_meter = false;
        msg_rx.drain(|m| match m {
            AudioMessage::MusicTempo { tempo_bpm } => {
                saw_tempo = true;
                assert_eq!(tempo_bpm, 120.0);
            }
            AudioMessage::MusicMeter { top, bottom } => {
                saw_meter = true;
                assert_eq!((top, bottom), (4, 4));
            }
            _ => {}
        });
        assert!(saw_tempo && saw_meter);
    }

    #[test]
    fn bar_counter_advances_after_one_bar_elapses() {
        let mut metronome = Metronome::new(48_000.0, 1024);
        let (_tx, _rx, mut msg_tx, _msg_rx) = CommandBridge::build(16, 16);
        metronome.set(120.0, Meter { top: 4, bottom: 4 }, &mut msg_tx);
        metronome.update(0, 0, true, &mut msg_tx);
        assert_eq!(metronome.bar_counter(), 1);

        metronome.update(96_000, 0, true, &mut msg_tx);
        assert_eq!(metronome.bar_counter(), 2);
    }

    #[test]
    fn idle_metronome_ignores_update() {
        let mut metronome = Metronome::new(48_000.0, 1024);
        let (_tx, _rx, mut msg_tx, _msg_rx) = CommandBridge::build(16, 16);
        metronome.update(1000, 0, false, &mut msg_tx);
        assert_eq!(metronome.bar_counter(), 0);
        let _ = SyncValue::Bar;
    }
}
