use std::sync::Arc;

use ae_core::{AudioData, MixGroupHandle, MixItem};

/// Outcome of filling one window of a [`LayerSet`], mirrored across every
/// layer (they are always in lockstep, since they share a start time and
/// play count).
#[derive(Debug, Clone, Copy)]
pub struct LayerSetInfo {
    pub last_filled_frame: i64,
    pub mix_item_fully_filled: bool,
    pub done: bool,
    pub looped: bool,
}

impl Default for LayerSetInfo {
    fn default() -> Self {
        LayerSetInfo {
            last_filled_frame: -1,
            mix_item_fully_filled: false,
            done: false,
            looped: false,
        }
    }
}

struct MusicVoice {
    audio_data: Arc<AudioData>,
    mix_group: MixGroupHandle,
    amplitude: f32,
    read_position: f64,
}

impl MusicVoice {
    /// Fills `[start_index, start_index + fill_size)` of `mix_item`,
    /// leaving every other sample at the zero this function starts from.
    /// `play_count` and `local_play_count` are owned by the [`LayerSet`]
    /// since every layer must loop in lockstep.
    fn fill(
        &mut self,
        mix_item: &mut MixItem,
        start_index: usize,
        fill_size: usize,
        play_count: i32,
        local_play_count: &mut i32,
    ) -> (i64, bool, bool) {
        mix_item.zero();
        mix_item.destination = self.mix_group;

        let frame_count = self.audio_data.frame_count() as f64;
        let num_channels = mix_item.num_channels().min(self.audio_data.num_channels());

        let end_index = start_index + fill_size;
        let mut write_index = start_index;
        let mut last_filled_frame = start_index as i64 - 1;
        let mut looped = false;
        let mut done = false;

        while write_index < end_index {
            let frames_remaining = (frame_count - self.read_position).max(0.0);
            if frames_remaining <= 0.0 {
                *local_play_count += 1;
                if play_count == 0 || *local_play_count < play_count {
                    self.read_position = 0.0;
                    looped = true;
                    continue;
                } else {
                    done = true;
                    break;
                }
            }

            let source_index = self.read_position as usize;
            if source_index >= self.audio_data.frame_count() {
                break;
            }
            for ch in 0..num_channels {
                mix_item.channel_mut(ch).as_mut_slice()[write_index] = self.audio_data.channel(ch)[source_index];
            }
            if self.amplitude != 1.0 {
                for ch in 0..num_channels {
                    let slice = mix_item.channel_mut(ch).as_mut_slice();
                    slice[write_index] *= self.amplitude;
                }
            }
            self.read_position += 1.0;
            last_filled_frame = write_index as i64;
            write_index += 1;
        }

        (last_filled_frame, looped, done)
    }
}

/// Plays up to `MAX_CUE_LAYERS` synchronized tracks of one cue: every layer
/// shares a start time and play count, and is expected to report identical
/// [`LayerSetInfo`] (modulo per-layer content).
#[derive(Default)]
pub struct LayerSet {
    voices: Vec<MusicVoice>,
    play_count: i32,
    local_play_count: i32,
}

impl LayerSet {
    pub fn new() -> Self {
        LayerSet::default()
    }

    pub fn is_playing(&self) -> bool {
        !self.voices.is_empty()
    }

    pub fn play(&mut self, layers: &[(Arc<AudioData>, MixGroupHandle, f32)], play_count: i32) {
        self.voices = layers
            .iter()
            .map(|(audio_data, mix_group, amplitude)| MusicVoice {
                audio_data: audio_data.clone(),
                mix_group: *mix_group,
                amplitude: *amplitude,
                read_position: 0.0,
            })
            .collect();
        self.play_count = play_count;
        self.local_play_count = 0;
    }

    pub fn reset(&mut self) {
        self.voices.clear();
        self.play_count = 0;
        self.local_play_count = 0;
    }

    /// Fills `[start_index, start_index + fill_size)` of one freshly
    /// appended [`MixItem`] per layer into `out_mix_items`. `force_done`
    /// marks that the previous music was interrupted: even if the layers
    /// have frames left, treat this window as their last.
    pub fn process(
        &mut self,
        start_index: usize,
        fill_size: usize,
        force_done: bool,
        block_size: usize,
        num_channels: usize,
        out_mix_items: &mut Vec<MixItem>,
    ) -> LayerSetInfo {
        if fill_size == 0 || self.voices.is_empty() {
            return LayerSetInfo::default();
        }

        let mut info = LayerSetInfo::default();
        let mut local_play_count = self.local_play_count;

        for voice in &mut self.voices {
            let mut item = MixItem::new(num_channels, block_size);
            let (last_filled_frame, looped, done) =
                voice.fill(&mut item, start_index, fill_size, self.play_count, &mut local_play_count);
            out_mix_items.push(item);

            info.last_filled_frame = last_filled_frame;
            info.looped = looped;
            info.done = done || force_done;
            info.mix_item_fully_filled = last_filled_frame as usize + 1 >= block_size;
        }

        self.local_play_count = local_play_count;

        if info.done {
            self.reset();
        }

        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(frames: usize) -> (Arc<AudioData>, MixGroupHandle, f32) {
        (Arc::new(AudioData::from_interleaved(&vec![1.0; frames * 2], 2)), MixGroupHandle::next(), 1.0)
    }

    #[test]
    fn fills_only_the_requested_window() {
        let mut set = LayerSet::new();
        set.play(&[layer(1000)], 1);
        let mut out = Vec::new();
        set.process(10, 20, false, 64, 2, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].channel(0).as_slice()[9], 0.0);
        assert_eq!(out[0].channel(0).as_slice()[10], 1.0);
        assert_eq!(out[0].channel(0).as_slice()[30], 0.0);
    }

    #[test]
    fn one_shot_layer_set_reports_done_and_resets() {
        let mut set = LayerSet::new();
        set.play(&[layer(10)], 1);
        let mut out = Vec::new();
        let info = set.process(0, 64, false, 64, 2, &mut out);
        assert!(info.done);
        assert!(!set.is_playing());
    }

    #[test]
    fn looping_layer_set_never_reports_done() {
        let mut set = LayerSet::new();
        set.play(&[layer(10)], 0);
        let mut out = Vec::new();
        let info = set.process(0, 64, false, 64, 2, &mut out);
        assert!(!info.done);
        assert!(info.looped);
        assert!(set.is_playing());
    }

    #[test]
    fn force_done_reports_done_even_with_frames_remaining() {
        let mut set = LayerSet::new();
        set.play(&[layer(1000)], 1);
        let mut out = Vec::new();
        let info = set.process(0, 16, true, 64, 2, &mut out);
        assert!(info.done);
    }
}
