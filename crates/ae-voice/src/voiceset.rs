use ae_bridge::{AudioMessage, MessageSender};
use ae_core::{AudioHandle, MixItem, SoundEffectHandle, StingerHandle, constants::MAX_VOICES};

use crate::voice::{PlayParams, Voice};

/// Fixed pool of up to [`MAX_VOICES`] concurrently playing voices. Creation
/// beyond capacity is a silent drop, matching the command/message bridge's
/// own backpressure behavior.
pub struct VoiceSet {
    voices: Vec<Voice>,
    scratch: Vec<MixItem>,
    block_size: usize,
}

impl VoiceSet {
    pub fn new(num_channels: usize, block_size: usize) -> Self {
        VoiceSet {
            voices: Vec::with_capacity(MAX_VOICES),
            scratch: (0..MAX_VOICES).map(|_| MixItem::new(num_channels, block_size)).collect(),
            block_size,
        }
    }

    pub fn create_voice(&mut self, params: PlayParams) -> bool {
        if self.voices.len() >= MAX_VOICES {
            log::warn!("voice pool exhausted, dropping play request");
            return false;
        }
        self.voices.push(Voice::new(params));
        true
    }

    pub fn stop_all(&mut self) {
        self.voices.clear();
    }

    pub fn stop_by_sound_effect_handle(&mut self, handle: SoundEffectHandle) {
        self.voices.retain(|v| v.sound_effect != handle);
    }

    pub fn stop_by_stinger_handle(&mut self, handle: StingerHandle) {
        self.voices.retain(|v| v.stinger != Some(handle));
    }

    pub fn stop_by_audio_handle(&mut self, handle: AudioHandle) {
        self.voices.retain(|v| v.audio_handle() != handle);
    }

    /// Schedules an amplitude fade on every live voice belonging to
    /// `handle`, used by `SoundEffect::fade`/`fade_out_and_stop`.
    pub fn fade_by_sound_effect_handle(
        &mut self,
        handle: SoundEffectHandle,
        amplitude: f32,
        start_time_samples: i64,
        duration_samples: i64,
    ) {
        for voice in self.voices.iter_mut().filter(|v| v.sound_effect == handle) {
            voice.schedule_fade(amplitude, start_time_samples, duration_samples, self.block_size);
        }
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Advances every active voice by one block, appending a populated
    /// [`MixItem`] into `out_mix_items` per voice that has started, and
    /// emitting start/stop/count messages.
    pub fn process(&mut self, playhead: i64, out_mix_items: &mut Vec<MixItem>, messages: &mut MessageSender) {
        let mut i = 0;
        while i < self.voices.len() {
            let info = self.voices[i].fill_mix_item(playhead, &mut self.scratch[i], self.block_size);

            if info.started {
                if info.last_filled_frame < 0 {
                    // Started this call but hasn't written a sample yet (the
                    // window opened exactly at the end of the block).
                } else {
                    out_mix_items.push(self.scratch[i].clone());
                }
            }

            if info.done {
                messages.send(AudioMessage::ContextVoiceStop {
                    audio_handle: info.audio_handle,
                });
                self.voices.swap_remove(i);
                self.scratch.swap(i, self.voices.len());
                continue;
            }

            i += 1;
        }

        messages.send(AudioMessage::ContextNumVoices {
            num_voices: self.voices.len() as i32,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ae_bridge::queue::CommandBridge;
    use ae_core::{AudioData, MixGroupHandle};
    use std::sync::Arc;

    fn play_params(start_time: i64) -> PlayParams {
        PlayParams {
            audio_data: Arc::new(AudioData::from_interleaved(&[1.0; 200], 2)),
            audio_handle: AudioHandle::next(),
            sound_effect: SoundEffectHandle::next(),
            stinger: None,
            mix_group: MixGroupHandle::next(),
            start_time,
            pitch: 1.0,
            play_count: 1,
            amplitude: 1.0,
        }
    }

    #[test]
    fn finished_voices_are_removed_and_reported() {
        let mut set = VoiceSet::new(2, 1024);
        set.create_voice(play_params(0));
        assert_eq!(set.len(), 1);

        let (_tx, _rx, mut msg_tx, mut msg_rx) = CommandBridge::build(16, 16);
        let mut mix_items = Vec::new();
        set.process(0, &mut mix_items, &mut msg_tx);
        assert!(set.is_empty());

        let mut saw_stop = false;
        let mut saw_count = false;
        msg_rx.drain(|m| match m {
            AudioMessage::ContextVoiceStop { .. } => saw_stop = true,
            AudioMessage::ContextNumVoices { num_voices } => {
                saw_count = true;
                assert_eq!(num_voices, 0);
            }
            _ => {}
        });
        assert!(saw_stop && saw_count);
    }

    #[test]
    fn pool_exhaustion_is_a_silent_drop() {
        let mut set = VoiceSet::new(2, 1024);
        for _ in 0..MAX_VOICES {
            assert!(set.create_voice(play_params(0)));
        }
        assert!(!set.create_voice(play_params(0)));
        assert_eq!(set.len(), MAX_VOICES);
    }
}
