use std::sync::Arc;

use ae_core::{AudioData, AudioHandle, MixGroupHandle, MixItem, constants::{MAX_CUE_LAYERS, MAX_STINGERS}};

const MAX_STINGER_VOICES: usize = MAX_CUE_LAYERS * MAX_STINGERS;

fn in_first_window(playhead: i64, start_time: i64, block_size: usize) -> bool {
    start_time >= playhead && start_time < playhead + block_size as i64
}

struct StingerVoice {
    audio_handle: AudioHandle,
    audio_data: Arc<AudioData>,
    mix_group: MixGroupHandle,
    amplitude: f32,
    start_time: i64,
    read_position: f64,
}

impl StingerVoice {
    fn fill(&mut self, mix_item: &mut MixItem, start_index: usize, fill_size: usize) -> (i64, bool) {
        mix_item.zero();
        mix_item.destination = self.mix_group;

        let frame_count = self.audio_data.frame_count() as f64;
        let num_channels = mix_item.num_channels().min(self.audio_data.num_channels());

        let end_index = start_index + fill_size;
        let mut write_index = start_index;
        let mut last_filled_frame = start_index as i64 - 1;
        let mut done = false;

        while write_index < end_index {
            let source_index = self.read_position as usize;
            if source_index >= frame_count as usize {
                done = true;
                break;
            }
            for ch in 0..num_channels {
                mix_item.channel_mut(ch).as_mut_slice()[write_index] = self.audio_data.channel(ch)[source_index] * self.amplitude;
            }
            self.read_position += 1.0;
            last_filled_frame = write_index as i64;
            write_index += 1;
        }

        (last_filled_frame, done)
    }
}

/// Independent one-shot overlays that play during a transition: up to
/// `MAX_CUE_LAYERS` x `MAX_STINGERS` voices, unaffected by the currently
/// playing cue's loop state. Stingers ring out across a natural music stop
/// but are cut short by a manual one.
#[derive(Default)]
pub struct StingerSet {
    voices: Vec<StingerVoice>,
}

impl StingerSet {
    pub fn new() -> Self {
        StingerSet::default()
    }

    pub fn play(
        &mut self,
        start_time: i64,
        layers: &[(Arc<AudioData>, MixGroupHandle)],
        gain_amplitude: f32,
    ) {
        for (audio_data, mix_group) in layers {
            if self.voices.len() >= MAX_STINGER_VOICES {
                log::warn!("stinger voice pool exhausted, dropping layer");
                break;
            }
            self.voices.push(StingerVoice {
                audio_handle: AudioHandle::next(),
                audio_data: audio_data.clone(),
                mix_group: *mix_group,
                amplitude: gain_amplitude,
                start_time,
                read_position: 0.0,
            });
        }
    }

    pub fn reset(&mut self) {
        self.voices.clear();
    }

    pub fn reset_if_playing_audio_handle(&mut self, audio_handle: AudioHandle) {
        if self.voices.iter().any(|v| v.audio_handle == audio_handle) {
            self.reset();
        }
    }

    pub fn process(&mut self, playhead: i64, block_size: usize, num_channels: usize, out_mix_items: &mut Vec<MixItem>) {
        let mut i = 0;
        while i < self.voices.len() {
            let first_window = in_first_window(playhead, self.voices[i].start_time, block_size);
            let already_playing = self.voices[i].read_position > 0.0;
            if !already_playing && !first_window {
                i += 1;
                continue;
            }

            let (start_index, fill_size) = if first_window {
                let difference = (self.voices[i].start_time - playhead) as usize;
                (difference, block_size - difference)
            } else {
                (0, block_size)
            };

            let mut item = MixItem::new(num_channels, block_size);
            let (_, done) = self.voices[i].fill(&mut item, start_index, fill_size);
            out_mix_items.push(item);

            if done {
                self.voices.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(frames: usize) -> (Arc<AudioData>, MixGroupHandle) {
        (Arc::new(AudioData::from_interleaved(&vec![1.0; frames * 2], 2)), MixGroupHandle::next())
    }

    #[test]
    fn stinger_starts_mid_block_and_eventually_finishes() {
        let mut set = StingerSet::new();
        set.play(10, &[layer(20)], 1.0);
        let mut out = Vec::new();
        set.process(0, 64, 2, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].channel(0).as_slice()[9], 0.0);
        assert_eq!(out[0].channel(0).as_slice()[10], 1.0);

        out.clear();
        set.process(64, 64, 2, &mut out);
        assert!(out.is_empty() || set.voices.is_empty());
    }

    #[test]
    fn reset_if_playing_audio_handle_clears_all_voices() {
        let mut set = StingerSet::new();
        set.play(0, &[layer(1000)], 1.0);
        let handle = set.voices[0].audio_handle;
        set.reset_if_playing_audio_handle(handle);
        assert!(set.voices.is_empty());
    }
}
