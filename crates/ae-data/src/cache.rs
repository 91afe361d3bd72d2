use std::collections::HashMap;
use std::sync::Arc;

use ae_bridge::{AudioCommand, AudioMessage, CommandSender, MessageReceiver};
use ae_core::{AudioData, AudioHandle, constants::MAX_AUDIO_DATA};

struct Entry {
    handle: AudioHandle,
    data: Arc<AudioData>,
    ref_count: u32,
}

/// Control-thread owner of decoded audio. Voices never touch this directly;
/// they only ever see the [`AudioHandle`] handed back from `load`.
///
/// Deletion is deferred: the audio thread may still have a voice reading
/// from a loaded `AudioData` when `unload` drops the ref count to zero, so
/// the actual `Vec` drop only happens once the audio thread acknowledges
/// with an [`AudioMessage::AssetDelete`].
pub struct AssetCache {
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
    pending_delete: Vec<AudioHandle>,
}

impl AssetCache {
    pub fn new() -> Self {
        AssetCache {
            entries: Vec::new(),
            by_name: HashMap::new(),
            pending_delete: Vec::new(),
        }
    }

    /// Loads `interleaved` PCM under `name`, enqueuing a command so the
    /// audio thread picks up the new data on its next callback. A second
    /// `load` of the same name reuses the existing entry and just bumps
    /// the ref count.
    pub fn load(&mut self, interleaved: &[f32], num_channels: usize, name: &str, commands: &mut CommandSender) -> AudioHandle {
        if let Some(&index) = self.by_name.get(name) {
            self.entries[index].ref_count += 1;
            return self.entries[index].handle;
        }

        assert!(self.entries.len() < MAX_AUDIO_DATA, "audio data pool exhausted");

        let handle = AudioHandle::next();
        let data = Arc::new(AudioData::from_interleaved(interleaved, num_channels));
        self.entries.push(Entry {
            handle,
            data: data.clone(),
            ref_count: 1,
        });
        self.by_name.insert(name.to_string(), self.entries.len() - 1);

        commands.send(AudioCommand::LoadAudioData { handle, data });
        handle
    }

    /// Decrements the ref count and, once it reaches zero, asks the audio
    /// thread to drop any voices referencing this handle. The slot is not
    /// freed here — see [`AssetCache::process_messages`].
    pub fn unload(&mut self, handle: AudioHandle, commands: &mut CommandSender) {
        let Some(index) = self.entries.iter().position(|e| e.handle == handle) else {
            return;
        };
        self.entries[index].ref_count -= 1;
        if self.entries[index].ref_count == 0 {
            commands.send(AudioCommand::ClearAudioDataReference { handle });
            self.pending_delete.push(handle);
        }
    }

    /// Applies one message if it's a delete acknowledgement, freeing the
    /// corresponding slot. Ignores every other message kind. Exposed
    /// separately from [`AssetCache::process_messages`] so a single
    /// top-level message pump (see `ae-engine`'s `Engine::process_messages`)
    /// can fan one drain pass out to several subsystems instead of each
    /// subsystem draining the single-consumer queue on its own.
    pub fn handle_message(&mut self, message: &AudioMessage) {
        if let AudioMessage::AssetDelete { audio_handle } = message {
            let audio_handle = *audio_handle;
            if let Some(pos) = self.pending_delete.iter().position(|h| *h == audio_handle) {
                self.pending_delete.remove(pos);
            }
            if let Some(index) = self.entries.iter().position(|e| e.handle == audio_handle) {
                self.by_name.retain(|_, idx| *idx != index);
                self.entries.remove(index);
            }
        }
    }

    /// Drains delete-acknowledgement messages and frees the corresponding
    /// slots. Call once per control-thread tick.
    pub fn process_messages(&mut self, messages: &mut MessageReceiver) {
        messages.drain(|message| self.handle_message(&message));
    }
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ae_bridge::queue::CommandBridge;

    #[test]
    fn loading_same_name_twice_reuses_the_handle() {
        let mut cache = AssetCache::new();
        let (mut tx, _rx, _mtx, _mrx) = CommandBridge::build(8, 8);
        let a = cache.load(&[0.0; 4], 2, "click", &mut tx);
        let b = cache.load(&[0.0; 4], 2, "click", &mut tx);
        assert_eq!(a, b);
        assert_eq!(cache.entries[0].ref_count, 2);
    }

    #[test]
    fn unload_defers_actual_removal_until_acknowledged() {
        let mut cache = AssetCache::new();
        let (mut tx, _rx, mut msg_tx, mut msg_rx) = CommandBridge::build(8, 8);
        let handle = cache.load(&[0.0; 4], 2, "click", &mut tx);
        cache.unload(handle, &mut tx);
        assert_eq!(cache.entries.len(), 1, "slot stays until the delete message arrives");

        msg_tx.send(AudioMessage::AssetDelete { audio_handle: handle });
        cache.process_messages(&mut msg_rx);
        assert!(cache.entries.is_empty());
    }
}
