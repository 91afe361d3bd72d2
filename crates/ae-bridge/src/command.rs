use std::fmt;
use std::sync::Arc;

use ae_core::{AudioData, AudioHandle, MixGroupHandle, SoundEffectHandle, StingerHandle, TransitionHandle};
use ae_dsp::DspBlock;

/// Everything the control thread can ask the audio thread to do.
///
/// Modeled as a closed enum rather than a tagged byte-buffer-plus-function-
/// pointer: the compiler enforces payload layout and exhaustive dispatch
/// instead of a hand-rolled 80-byte union, with the same "no allocation, no
/// indirection" cost profile. Plug-in construction (which allocates) happens
/// on the control thread; only the finished [`DspBlock`] crosses the queue,
/// by value, so the audio thread never allocates to satisfy a command. That
/// one variant isn't `Clone`, so the enum forgoes a blanket derive and
/// implements `Debug` by hand instead.
pub enum AudioCommand {
    LoadAudioData {
        handle: AudioHandle,
        data: Arc<AudioData>,
    },
    ClearAudioDataReference {
        handle: AudioHandle,
    },

    PlayVoice {
        sound_effect: SoundEffectHandle,
        audio_handle: AudioHandle,
        mix_group: MixGroupHandle,
        start_time: i64,
        pitch: f32,
        play_count: i32,
        amplitude: f32,
    },
    StopVoicesBySoundEffect {
        sound_effect: SoundEffectHandle,
        stop_time: i64,
    },
    StopVoicesByStinger {
        stinger: StingerHandle,
        stop_time: i64,
    },
    SetVoiceAmplitude {
        sound_effect: SoundEffectHandle,
        amplitude: f32,
        start_time: i64,
        duration_samples: i64,
    },
    StopAllVoices {
        stop_time: i64,
    },

    CreateMixGroup {
        handle: MixGroupHandle,
        output: MixGroupHandle,
        priority: i32,
        is_master: bool,
    },
    DestroyMixGroup {
        handle: MixGroupHandle,
    },
    SetMixGroupOutput {
        handle: MixGroupHandle,
        output: MixGroupHandle,
    },
    SetMixGroupVolumeDb {
        handle: MixGroupHandle,
        volume_db: f32,
    },
    CreateSend {
        source: MixGroupHandle,
        target: MixGroupHandle,
        amplitude: f32,
    },
    DestroySend {
        source: MixGroupHandle,
        target: MixGroupHandle,
    },
    FadeMixGroups {
        handles: Vec<MixGroupHandle>,
        target_db: f32,
        start_time: i64,
        duration_samples: i64,
    },
    AddMixGroupPlugin {
        handle: MixGroupHandle,
        block: DspBlock,
    },
    RemoveMixGroupPlugin {
        handle: MixGroupHandle,
        slot: usize,
    },

    PlayTransition {
        transition: TransitionHandle,
        playhead_at_request: i64,
    },
    StopMusic {
        stop_time: i64,
    },
    FadeMusic {
        start_time: i64,
        amplitude: f32,
        duration_samples: i64,
        stop_on_done: bool,
    },
    SetTempo {
        tempo_bpm: f32,
        meter_top: i32,
        meter_bottom: i32,
    },

    Shutdown,
}

impl fmt::Debug for AudioCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioCommand::LoadAudioData { handle, .. } => {
                f.debug_struct("LoadAudioData").field("handle", handle).finish_non_exhaustive()
            }
            AudioCommand::ClearAudioDataReference { handle } => {
                f.debug_struct("ClearAudioDataReference").field("handle", handle).finish()
            }
            AudioCommand::PlayVoice { sound_effect, audio_handle, mix_group, start_time, pitch, play_count, amplitude } => f
                .debug_struct("PlayVoice")
                .field("sound_effect", sound_effect)
                .field("audio_handle", audio_handle)
                .field("mix_group", mix_group)
                .field("start_time", start_time)
                .field("pitch", pitch)
                .field("play_count", play_count)
                .field("amplitude", amplitude)
                .finish(),
            AudioCommand::StopVoicesBySoundEffect { sound_effect, stop_time } => f
                .debug_struct("StopVoicesBySoundEffect")
                .field("sound_effect", sound_effect)
                .field("stop_time", stop_time)
                .finish(),
            AudioCommand::StopVoicesByStinger { stinger, stop_time } => f
                .debug_struct("StopVoicesByStinger")
                .field("stinger", stinger)
                .field("stop_time", stop_time)
                .finish(),
            AudioCommand::SetVoiceAmplitude { sound_effect, amplitude, start_time, duration_samples } => f
                .debug_struct("SetVoiceAmplitude")
                .field("sound_effect", sound_effect)
                .field("amplitude", amplitude)
                .field("start_time", start_time)
                .field("duration_samples", duration_samples)
                .finish(),
            AudioCommand::StopAllVoices { stop_time } => {
                f.debug_struct("StopAllVoices").field("stop_time", stop_time).finish()
            }
            AudioCommand::CreateMixGroup { handle, output, priority, is_master } => f
                .debug_struct("CreateMixGroup")
                .field("handle", handle)
                .field("output", output)
                .field("priority", priority)
                .field("is_master", is_master)
                .finish(),
            AudioCommand::DestroyMixGroup { handle } => {
                f.debug_struct("DestroyMixGroup").field("handle", handle).finish()
            }
            AudioCommand::SetMixGroupOutput { handle, output } => {
                f.debug_struct("SetMixGroupOutput").field("handle", handle).field("output", output).finish()
            }
            AudioCommand::SetMixGroupVolumeDb { handle, volume_db } => f
                .debug_struct("SetMixGroupVolumeDb")
                .field("handle", handle)
                .field("volume_db", volume_db)
                .finish(),
            AudioCommand::CreateSend { source, target, amplitude } => f
                .debug_struct("CreateSend")
                .field("source", source)
                .field("target", target)
                .field("amplitude", amplitude)
                .finish(),
            AudioCommand::DestroySend { source, target } => {
                f.debug_struct("DestroySend").field("source", source).field("target", target).finish()
            }
            AudioCommand::FadeMixGroups { handles, target_db, start_time, duration_samples } => f
                .debug_struct("FadeMixGroups")
                .field("handles", handles)
                .field("target_db", target_db)
                .field("start_time", start_time)
                .field("duration_samples", duration_samples)
                .finish(),
            AudioCommand::AddMixGroupPlugin { handle, .. } => {
                f.debug_struct("AddMixGroupPlugin").field("handle", handle).finish_non_exhaustive()
            }
            AudioCommand::RemoveMixGroupPlugin { handle, slot } => {
                f.debug_struct("RemoveMixGroupPlugin").field("handle", handle).field("slot", slot).finish()
            }
            AudioCommand::PlayTransition { transition, playhead_at_request } => f
                .debug_struct("PlayTransition")
                .field("transition", transition)
                .field("playhead_at_request", playhead_at_request)
                .finish(),
            AudioCommand::StopMusic { stop_time } => f.debug_struct("StopMusic").field("stop_time", stop_time).finish(),
            AudioCommand::FadeMusic { start_time, amplitude, duration_samples, stop_on_done } => f
                .debug_struct("FadeMusic")
                .field("start_time", start_time)
                .field("amplitude", amplitude)
                .field("duration_samples", duration_samples)
                .field("stop_on_done", stop_on_done)
                .finish(),
            AudioCommand::SetTempo { tempo_bpm, meter_top, meter_bottom } => f
                .debug_struct("SetTempo")
                .field("tempo_bpm", tempo_bpm)
                .field("meter_top", meter_top)
                .field("meter_bottom", meter_bottom)
                .finish(),
            AudioCommand::Shutdown => write!(f, "Shutdown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_formats_for_diagnostics() {
        let cmd = AudioCommand::StopAllVoices { stop_time: 0 };
        assert_eq!(format!("{cmd:?}"), "StopAllVoices { stop_time: 0 }");
    }
}
