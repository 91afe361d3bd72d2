use std::sync::Arc;

use ae_core::{AudioData, AudioHandle, MixGroupHandle, MixItem, SoundEffectHandle, StingerHandle};
use ae_dsp::{Fader, GainDsp, Processor};

/// What `VoiceSet::create_voice` needs to start a new playback.
#[derive(Clone)]
pub struct PlayParams {
    pub audio_data: Arc<AudioData>,
    pub audio_handle: AudioHandle,
    pub sound_effect: SoundEffectHandle,
    pub stinger: Option<StingerHandle>,
    pub mix_group: MixGroupHandle,
    /// Absolute sample at which the first frame should be emitted.
    pub start_time: i64,
    pub pitch: f32,
    /// 0 means loop forever.
    pub play_count: i32,
    pub amplitude: f32,
}

/// What a voice reports back after filling one mix item, so the owning
/// [`crate::voiceset::VoiceSet`] can decide whether to swap-remove it and
/// what messages to emit.
#[derive(Debug, Clone, Copy)]
pub struct VoiceInfo {
    pub last_filled_frame: i64,
    pub fully_filled: bool,
    pub done: bool,
    pub looped: bool,
    pub started: bool,
    pub stopped: bool,
    pub audio_handle: AudioHandle,
}

impl VoiceInfo {
    fn not_started(audio_handle: AudioHandle) -> Self {
        VoiceInfo {
            last_filled_frame: -1,
            fully_filled: false,
            done: false,
            looped: false,
            started: false,
            stopped: false,
            audio_handle,
        }
    }
}

/// A single active playback of an [`AudioData`]: read position, pitch,
/// play-count, destination, and the per-voice DSP (gain always, fader and
/// positioning optionally) applied before the mix item is handed to the
/// mixer.
pub struct Voice {
    audio_data: Arc<AudioData>,
    audio_handle: AudioHandle,
    pub sound_effect: SoundEffectHandle,
    pub stinger: Option<StingerHandle>,
    pub mix_group: MixGroupHandle,
    read_position: f64,
    pitch: f32,
    play_count: i32,
    local_play_count: i32,
    start_time: i64,
    started: bool,
    gain: GainDsp,
    fader: Option<Fader>,
}

impl Voice {
    pub fn new(params: PlayParams) -> Self {
        let mut gain = GainDsp::new();
        gain.set_amplitude(params.amplitude);
        gain.snap();
        Voice {
            audio_data: params.audio_data,
            audio_handle: params.audio_handle,
            sound_effect: params.sound_effect,
            stinger: params.stinger,
            mix_group: params.mix_group,
            read_position: 0.0,
            pitch: params.pitch,
            play_count: params.play_count,
            local_play_count: 0,
            start_time: params.start_time,
            started: false,
            gain,
            fader: None,
        }
    }

    pub fn audio_handle(&self) -> AudioHandle {
        self.audio_handle
    }

    pub fn schedule_fade(&mut self, amplitude: f32, start_time_samples: i64, duration_samples: i64, block_size: usize) {
        let fader = self.fader.get_or_insert_with(|| Fader::new(block_size));
        fader.update(amplitude, start_time_samples, duration_samples);
    }

    /// The heart of polyphony: renders up to `block_size` frames into
    /// `mix_item`, handling the not-yet-started case, nearest-neighbour
    /// pitch resampling, looping, and source exhaustion, then applies gain
    /// (and an optional scheduled fade) to the result.
    pub fn fill_mix_item(&mut self, playhead: i64, mix_item: &mut MixItem, block_size: usize) -> VoiceInfo {
        mix_item.zero();
        mix_item.destination = self.mix_group;

        let mut start_index = 0usize;
        if !self.started {
            if self.start_time >= playhead && self.start_time < playhead + block_size as i64 {
                start_index = (self.start_time - playhead) as usize;
                self.started = true;
            } else {
                return VoiceInfo::not_started(self.audio_handle);
            }
        }

        let frame_count = self.audio_data.frame_count() as f64;
        let num_channels = mix_item.num_channels().min(self.audio_data.num_channels());

        let mut write_index = start_index;
        let mut last_filled_frame = start_index as i64 - 1;
        let mut looped = false;
        let mut done = false;

        'fill: while write_index < block_size {
            let frames_remaining = (frame_count - self.read_position).max(0.0);
            if frames_remaining <= 0.0 {
                self.local_play_count += 1;
                if self.play_count == 0 || self.local_play_count < self.play_count {
                    self.read_position = 0.0;
                    looped = true;
                    continue 'fill;
                } else {
                    done = true;
                    break 'fill;
                }
            }

            let remaining_output = block_size - write_index;
            let frames_this_pass = (frames_remaining / self.pitch.max(f32::EPSILON) as f64)
                .floor()
                .min(remaining_output as f64) as usize;
            let frames_this_pass = frames_this_pass.max(1).min(remaining_output);

            for i in 0..frames_this_pass {
                let source_index = self.read_position as usize;
                if source_index >= self.audio_data.frame_count() {
                    break;
                }
                for ch in 0..num_channels {
                    mix_item.channel_mut(ch).as_mut_slice()[write_index] = self.audio_data.channel(ch)[source_index];
                }
                self.read_position += self.pitch as f64;
                last_filled_frame = write_index as i64;
                write_index += 1;
                let _ = i;
            }
        }

        let fully_filled = write_index >= block_size;

        if let Some(fader) = &mut self.fader {
            fader.process(mix_item, block_size);
        }
        self.gain.process(mix_item, block_size);

        VoiceInfo {
            last_filled_frame,
            fully_filled,
            done,
            looped,
            started: true,
            stopped: false,
            audio_handle: self.audio_handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ae_core::SoundEffectHandle;

    fn make_voice(frames: usize, play_count: i32, start_time: i64) -> Voice {
        let data = Arc::new(AudioData::from_interleaved(&vec![1.0; frames * 2], 2));
        Voice::new(PlayParams {
            audio_data: data,
            audio_handle: AudioHandle::next(),
            sound_effect: SoundEffectHandle::next(),
            stinger: None,
            mix_group: MixGroupHandle::next(),
            start_time,
            pitch: 1.0,
            play_count,
            amplitude: 1.0,
        })
    }

    #[test]
    fn does_not_start_before_its_window() {
        let mut voice = make_voice(1024, 1, 5000);
        let mut item = MixItem::new(2, 1024);
        let info = voice.fill_mix_item(0, &mut item, 1024);
        assert!(!info.started);
    }

    #[test]
    fn starts_mid_block_when_its_window_arrives() {
        let mut voice = make_voice(1024, 1, 10);
        let mut item = MixItem::new(2, 1024);
        let info = voice.fill_mix_item(0, &mut item, 1024);
        assert!(info.started);
        assert_eq!(item.channel(0).as_slice()[9], 0.0);
        assert_eq!(item.channel(0).as_slice()[10], 1.0);
    }

    #[test]
    fn one_shot_reports_done_when_source_exhausted() {
        let mut voice = make_voice(100, 1, 0);
        let mut item = MixItem::new(2, 1024);
        let info = voice.fill_mix_item(0, &mut item, 1024);
        assert!(info.done);
        assert!(!info.looped);
    }

    #[test]
    fn infinite_loop_never_reports_done() {
        let mut voice = make_voice(50, 0, 0);
        let mut item = MixItem::new(2, 1024);
        let info = voice.fill_mix_item(0, &mut item, 1024);
        assert!(!info.done);
        assert!(info.looped);
    }
}
