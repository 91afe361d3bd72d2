use ae_bridge::AudioCommand;
use ae_voice::PlayParams;

use crate::timeline::{AudioTimeline, ShutdownState};

/// Applies one drained command to the audio thread's owned state. Called
/// only from [`AudioTimeline::process`], with every subsystem it touches
/// already exclusively owned by the audio thread.
pub(crate) fn apply(timeline: &mut AudioTimeline, command: AudioCommand) {
    match command {
        AudioCommand::LoadAudioData { handle, data } => {
            timeline.audio_data_mut().insert(handle, data);
        }
        AudioCommand::ClearAudioDataReference { handle } => {
            // No voice may outlive the data it reads from past an unload,
            // so the pool entry is removed and any reader stopped in the
            // same callback the reference drops, before the acknowledgement
            // is flushed back to the control thread at the end of it.
            timeline.voice_set_mut().stop_by_audio_handle(handle);
            timeline.audio_data_mut().remove(handle);
            timeline.queue_delete(handle);
        }

        AudioCommand::PlayVoice { sound_effect, audio_handle, mix_group, start_time, pitch, play_count, amplitude } => {
            let Some(data) = timeline.audio_data_mut().get(audio_handle).cloned() else {
                return;
            };
            timeline.voice_set_mut().create_voice(PlayParams {
                audio_data: data,
                audio_handle,
                sound_effect,
                stinger: None,
                mix_group,
                start_time,
                pitch,
                play_count,
                amplitude,
            });
        }
        AudioCommand::StopVoicesBySoundEffect { sound_effect, stop_time: _ } => {
            timeline.voice_set_mut().stop_by_sound_effect_handle(sound_effect);
        }
        AudioCommand::StopVoicesByStinger { stinger, stop_time: _ } => {
            timeline.voice_set_mut().stop_by_stinger_handle(stinger);
        }
        AudioCommand::SetVoiceAmplitude { sound_effect, amplitude, start_time, duration_samples } => {
            timeline.voice_set_mut().fade_by_sound_effect_handle(sound_effect, amplitude, start_time, duration_samples);
        }
        AudioCommand::StopAllVoices { stop_time: _ } => {
            timeline.voice_set_mut().stop_all();
        }

        AudioCommand::CreateMixGroup { handle, output, priority: _, is_master } => {
            // `priority` is informational here: this side recomputes its
            // own priority from the topology it already has, the same way
            // the control-side mirror in `Mixer` does, so the two never
            // drift even if a command is dropped under backpressure.
            if is_master {
                return;
            }
            match timeline.summing_mixer_mut().create_group(handle) {
                Ok(()) => {
                    if output != timeline.summing_mixer_mut().master() {
                        let _ = timeline.summing_mixer_mut().set_output(handle, output);
                    }
                }
                Err(err) => log::warn!("dropped CreateMixGroup: {err}"),
            }
        }
        AudioCommand::DestroyMixGroup { handle } => {
            timeline.summing_mixer_mut().destroy_group(handle);
        }
        AudioCommand::SetMixGroupOutput { handle, output } => {
            if let Err(err) = timeline.summing_mixer_mut().set_output(handle, output) {
                log::warn!("dropped SetMixGroupOutput: {err}");
            }
        }
        AudioCommand::SetMixGroupVolumeDb { handle, volume_db } => {
            timeline.summing_mixer_mut().set_volume_db(handle, volume_db);
        }
        AudioCommand::CreateSend { source, target, amplitude } => {
            if let Err(err) = timeline.summing_mixer_mut().create_send(source, target, amplitude) {
                log::warn!("dropped CreateSend: {err}");
            }
        }
        AudioCommand::DestroySend { source, target } => {
            timeline.summing_mixer_mut().destroy_send(source, target);
        }
        AudioCommand::FadeMixGroups { handles, target_db, start_time, duration_samples } => {
            let amplitude = ae_core::db_to_amp(target_db);
            for handle in handles {
                timeline.summing_mixer_mut().fade(handle, amplitude, start_time, duration_samples);
            }
        }
        AudioCommand::AddMixGroupPlugin { handle, block } => {
            timeline.summing_mixer_mut().add_plugin(handle, block);
        }
        AudioCommand::RemoveMixGroupPlugin { handle, slot } => {
            timeline.summing_mixer_mut().remove_plugin(handle, slot);
        }

        AudioCommand::PlayTransition { transition, playhead_at_request: _ } => {
            timeline.music_manager_mut().play_transition(transition);
        }
        AudioCommand::StopMusic { stop_time } => {
            let playhead = timeline.playhead();
            timeline.music_manager_mut().stop(stop_time, playhead);
        }
        AudioCommand::FadeMusic { start_time, amplitude, duration_samples, stop_on_done } => {
            let playhead = timeline.playhead();
            timeline.music_manager_mut().fade(start_time, amplitude, duration_samples, playhead, stop_on_done);
        }
        AudioCommand::SetTempo { tempo_bpm, meter_top, meter_bottom } => {
            let meter = ae_music::Meter { top: meter_top, bottom: meter_bottom };
            let messages = timeline.message_tx_mut();
            timeline.music_manager_mut().set_tempo(tempo_bpm, meter, messages);
        }

        AudioCommand::Shutdown => {
            timeline.request_shutdown();
            let _ = ShutdownState::Running;
        }
    }
}
