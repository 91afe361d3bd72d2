use ae_core::{AudioHandle, CueHandle, MixGroupHandle};

/// Everything the audio thread can tell the control thread, emitted during
/// or at the end of a callback and drained opportunistically.
#[derive(Debug, Clone)]
pub enum AudioMessage {
    AssetDelete { audio_handle: AudioHandle },

    ContextNumVoices { num_voices: i32 },
    ContextVoiceStart { audio_handle: AudioHandle },
    ContextVoiceStop { audio_handle: AudioHandle },
    ContextShutdownComplete,

    MixGroupFadeComplete { mix_group: MixGroupHandle, amplitude: f32 },
    MixGroupPeakAmplitude { mix_group: MixGroupHandle, amplitude: f32 },

    MusicBarChanged { bar: i32, beat: i32 },
    MusicBeatChanged { bar: i32, beat: i32 },
    MusicTempo { tempo_bpm: f32 },
    MusicMeter { top: i32, bottom: i32 },
    MusicTransitioned { from: CueHandle, to: CueHandle },
    MusicFinished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_cheap_to_clone() {
        let msg = AudioMessage::MusicFinished;
        let _ = msg.clone();
    }
}
