use ae_bridge::{AudioCommand, CommandSender};
use ae_core::{AudioHandle, MixGroupHandle, SoundEffectHandle, StingerHandle};
use rand::Rng;

/// Per-variation pitch/volume randomization, applied on every play. Pitch is
/// expressed in semitones here and converted to the playback-rate ratio
/// `PlayVoice` actually wants; volume is expressed in dB and converted to
/// linear amplitude the same way the rest of this crate does it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Variation {
    pub pitch_semitones: (f32, f32),
    pub volume_db: (f32, f32),
}

impl Variation {
    pub fn new(pitch_semitones: (f32, f32), volume_db: (f32, f32)) -> Self {
        Variation { pitch_semitones, volume_db }
    }

    fn roll(&self, rng: &mut impl Rng) -> (f32, f32) {
        let (pitch_lo, pitch_hi) = self.pitch_semitones;
        let (vol_lo, vol_hi) = self.volume_db;
        let semitones = if pitch_hi > pitch_lo { rng.random_range(pitch_lo..pitch_hi) } else { pitch_lo };
        let db = if vol_hi > vol_lo { rng.random_range(vol_lo..vol_hi) } else { vol_lo };
        (2.0_f32.powf(semitones / 12.0), ae_core::db_to_amp(db))
    }
}

/// One candidate sound in a [`SoundEffect`]: the audio data to play, its base
/// amplitude, and its own variation on top of whatever the effect as a whole
/// applies.
#[derive(Debug, Clone, Copy)]
pub struct SoundEffectVoice {
    pub audio_handle: AudioHandle,
    pub amplitude: f32,
    pub variation: Variation,
}

impl SoundEffectVoice {
    pub fn new(audio_handle: AudioHandle) -> Self {
        SoundEffectVoice { audio_handle, amplitude: 1.0, variation: Variation::default() }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_variation(mut self, variation: Variation) -> Self {
        self.variation = variation;
        self
    }
}

/// How a [`SoundEffect`] with more than one voice picks which one to play
/// next. Mirrors the three selection modes a random/shuffle sound container
/// supports: pure weighted random, play-all-before-repeating, and strict
/// sequential order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackRule {
    #[default]
    Random,
    SmartShuffle,
    RoundRobin,
}

/// A persistent, named collection of candidate voices played through one
/// [`PlaybackRule`], plus the selection state that rule needs to carry
/// between plays (the shuffle deck, the round-robin cursor, last play
/// avoidance). Built with [`SoundEffectBuilder`]; played with
/// [`crate::Engine::play`].
///
/// Owned independently of any borrow on [`crate::Engine`] so a caller can
/// hold one across many separate play calls instead of re-authoring it every
/// tick, unlike every other facade in this crate.
pub struct SoundEffect {
    handle: SoundEffectHandle,
    mix_group: MixGroupHandle,
    voices: Vec<SoundEffectVoice>,
    rule: PlaybackRule,
    avoid_repeat: bool,
    last_played: Option<usize>,
    shuffle_deck: Vec<usize>,
    round_robin_next: usize,
}

impl SoundEffect {
    pub fn handle(&self) -> SoundEffectHandle {
        self.handle
    }

    fn select(&mut self, rng: &mut impl Rng) -> Option<usize> {
        if self.voices.is_empty() {
            return None;
        }
        if self.voices.len() == 1 {
            return Some(0);
        }
        let index = match self.rule {
            PlaybackRule::Random => self.select_random(rng),
            PlaybackRule::SmartShuffle => self.select_shuffle(rng),
            PlaybackRule::RoundRobin => self.select_round_robin(),
        };
        self.last_played = Some(index);
        Some(index)
    }

    fn select_random(&mut self, rng: &mut impl Rng) -> usize {
        loop {
            let index = rng.random_range(0..self.voices.len());
            if !self.avoid_repeat || Some(index) != self.last_played {
                return index;
            }
        }
    }

    /// Plays every voice once before any repeats, reshuffling once the deck
    /// empties. Matches the container pattern this is grounded on: the last
    /// card dealt from the previous deck is never left adjacent to the first
    /// card of the next one.
    fn select_shuffle(&mut self, rng: &mut impl Rng) -> usize {
        if self.shuffle_deck.is_empty() {
            self.shuffle_deck = (0..self.voices.len()).collect();
            for i in (1..self.shuffle_deck.len()).rev() {
                let j = rng.random_range(0..=i);
                self.shuffle_deck.swap(i, j);
            }
            if let Some(last) = self.last_played {
                if self.shuffle_deck.len() > 1 && self.shuffle_deck[0] == last {
                    self.shuffle_deck.swap(0, 1);
                }
            }
        }
        self.shuffle_deck.pop().expect("just refilled if empty")
    }

    fn select_round_robin(&mut self) -> usize {
        let index = self.round_robin_next;
        self.round_robin_next = (self.round_robin_next + 1) % self.voices.len();
        index
    }

    /// Selects the next voice per [`PlaybackRule`] and sends `PlayVoice` for
    /// it. Returns `None` without sending anything if there are no voices.
    pub fn play(&mut self, commands: &mut CommandSender, start_time: i64) -> Option<AudioHandle> {
        self.play_with_rng(commands, start_time, &mut rand::rng())
    }

    fn play_with_rng(&mut self, commands: &mut CommandSender, start_time: i64, rng: &mut impl Rng) -> Option<AudioHandle> {
        let index = self.select(rng)?;
        let voice = self.voices[index];
        let (pitch_mult, amp_mult) = voice.variation.roll(rng);
        commands.send(AudioCommand::PlayVoice {
            sound_effect: self.handle,
            audio_handle: voice.audio_handle,
            mix_group: self.mix_group,
            start_time,
            pitch: pitch_mult,
            play_count: 1,
            amplitude: voice.amplitude * amp_mult,
        });
        Some(voice.audio_handle)
    }

    pub fn stop(&self, commands: &mut CommandSender, stop_time: i64) {
        commands.send(AudioCommand::StopVoicesBySoundEffect { sound_effect: self.handle, stop_time });
    }

    pub fn fade(&self, commands: &mut CommandSender, start_time: i64, amplitude: f32, duration_samples: i64) {
        commands.send(AudioCommand::SetVoiceAmplitude { sound_effect: self.handle, amplitude, start_time, duration_samples });
    }

    pub fn stop_stinger(&self, commands: &mut CommandSender, stinger: StingerHandle, stop_time: i64) {
        commands.send(AudioCommand::StopVoicesByStinger { stinger, stop_time });
    }
}

/// Builds a [`SoundEffect`]. Borrowed from [`crate::Engine::sound_effect`];
/// the builder itself only ever reads the shared `CommandSender` type to
/// match the rest of this crate's facades, but sends nothing until
/// [`SoundEffectBuilder::build`] hands back the owned, persistent effect.
pub struct SoundEffectBuilder<'a> {
    _commands: &'a mut CommandSender,
    mix_group: MixGroupHandle,
    voices: Vec<SoundEffectVoice>,
    rule: PlaybackRule,
    avoid_repeat: bool,
}

impl<'a> SoundEffectBuilder<'a> {
    pub(crate) fn new(commands: &'a mut CommandSender) -> Self {
        SoundEffectBuilder {
            _commands: commands,
            mix_group: MixGroupHandle::INVALID,
            voices: Vec::new(),
            rule: PlaybackRule::default(),
            avoid_repeat: true,
        }
    }

    pub fn mix_group(mut self, mix_group: MixGroupHandle) -> Self {
        self.mix_group = mix_group;
        self
    }

    pub fn rule(mut self, rule: PlaybackRule) -> Self {
        self.rule = rule;
        self
    }

    /// Whether `Random`/`SmartShuffle` selection refuses to repeat the
    /// previous play when more than one voice is available. Has no effect on
    /// `RoundRobin`, which never repeats by construction.
    pub fn avoid_repeat(mut self, avoid_repeat: bool) -> Self {
        self.avoid_repeat = avoid_repeat;
        self
    }

    pub fn voice(mut self, voice: SoundEffectVoice) -> Self {
        self.voices.push(voice);
        self
    }

    pub fn build(self) -> SoundEffect {
        SoundEffect {
            handle: SoundEffectHandle::next(),
            mix_group: self.mix_group,
            voices: self.voices,
            rule: self.rule,
            avoid_repeat: self.avoid_repeat,
            last_played: None,
            shuffle_deck: Vec::new(),
            round_robin_next: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ae_bridge::queue::CommandBridge;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn effect(rule: PlaybackRule, voice_count: usize) -> SoundEffect {
        SoundEffect {
            handle: SoundEffectHandle::next(),
            mix_group: MixGroupHandle::INVALID,
            voices: (0..voice_count).map(|i| SoundEffectVoice::new(AudioHandle(i as u32 + 1))).collect(),
            rule,
            avoid_repeat: true,
            last_played: None,
            shuffle_deck: Vec::new(),
            round_robin_next: 0,
        }
    }

    #[test]
    fn round_robin_cycles_in_order() {
        let mut sfx = effect(PlaybackRule::RoundRobin, 3);
        let mut rng = StdRng::seed_from_u64(1);
        let picked: Vec<_> = (0..6).map(|_| sfx.select(&mut rng).unwrap()).collect();
        assert_eq!(picked, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn smart_shuffle_plays_every_voice_once_per_cycle() {
        let mut sfx = effect(PlaybackRule::SmartShuffle, 4);
        let mut rng = StdRng::seed_from_u64(7);
        let mut first_cycle: Vec<_> = (0..4).map(|_| sfx.select(&mut rng).unwrap()).collect();
        first_cycle.sort_unstable();
        assert_eq!(first_cycle, vec![0, 1, 2, 3]);
    }

    #[test]
    fn random_avoids_immediate_repeat_with_multiple_voices() {
        let mut sfx = effect(PlaybackRule::Random, 2);
        let mut rng = StdRng::seed_from_u64(3);
        let mut previous = sfx.select(&mut rng).unwrap();
        for _ in 0..20 {
            let next = sfx.select(&mut rng).unwrap();
            assert_ne!(next, previous);
            previous = next;
        }
    }

    #[test]
    fn play_sends_a_play_voice_command() {
        let (mut tx, mut rx, _msg_tx, _msg_rx) = CommandBridge::build(8, 8);
        let mut sfx = effect(PlaybackRule::RoundRobin, 1);
        let played = sfx.play(&mut tx, 0);
        assert!(played.is_some());
        assert!(matches!(rx.pop(), Some(AudioCommand::PlayVoice { .. })));
    }

    #[test]
    fn builder_assembles_voices_in_order() {
        let (mut tx, _rx, _msg_tx, _msg_rx) = CommandBridge::build(8, 8);
        let sfx = SoundEffectBuilder::new(&mut tx)
            .rule(PlaybackRule::SmartShuffle)
            .voice(SoundEffectVoice::new(AudioHandle(1)))
            .voice(SoundEffectVoice::new(AudioHandle(2)))
            .build();
        assert_eq!(sfx.voices.len(), 2);
    }
}
