use std::sync::Arc;

use ae_core::{AudioData, AudioHandle, constants::MAX_AUDIO_DATA};

/// Audio-thread-side mirror of the [`crate::cache::AssetCache`]: a fixed
/// array of `Arc<AudioData>` slots populated and cleared only by commands,
/// never mutated any other way from inside the callback.
pub struct AudioDataTable {
    handles: Vec<AudioHandle>,
    data: Vec<Arc<AudioData>>,
}

impl AudioDataTable {
    pub fn new() -> Self {
        AudioDataTable {
            handles: Vec::with_capacity(MAX_AUDIO_DATA),
            data: Vec::with_capacity(MAX_AUDIO_DATA),
        }
    }

    pub fn insert(&mut self, handle: AudioHandle, data: Arc<AudioData>) {
        if let Some(index) = self.handles.iter().position(|h| *h == handle) {
            self.data[index] = data;
            return;
        }
        assert!(self.handles.len() < MAX_AUDIO_DATA, "audio data pool exhausted");
        self.handles.push(handle);
        self.data.push(data);
    }

    pub fn remove(&mut self, handle: AudioHandle) {
        if let Some(index) = self.handles.iter().position(|h| *h == handle) {
            self.handles.remove(index);
            self.data.remove(index);
        }
    }

    pub fn get(&self, handle: AudioHandle) -> Option<&Arc<AudioData>> {
        self.handles
            .iter()
            .position(|h| *h == handle)
            .map(|index| &self.data[index])
    }
}

impl Default for AudioDataTable {
    fn default() -> Self {
        Self::new()
    }
}
