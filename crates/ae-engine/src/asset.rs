use ae_bridge::CommandSender;
use ae_core::AudioHandle;
use ae_data::AssetCache;

/// Control-side handle onto the audio-data cache. Borrowed from
/// [`crate::Engine::asset`]; every call enqueues at most one command.
pub struct Asset<'a> {
    cache: &'a mut AssetCache,
    commands: &'a mut CommandSender,
}

impl<'a> Asset<'a> {
    pub(crate) fn new(cache: &'a mut AssetCache, commands: &'a mut CommandSender) -> Self {
        Asset { cache, commands }
    }

    /// Loads interleaved PCM under `name`, returning the handle voices are
    /// played against. Loading the same name twice reuses the entry and
    /// bumps its reference count rather than decoding twice.
    pub fn load(&mut self, interleaved: &[f32], num_channels: usize, name: &str) -> AudioHandle {
        self.cache.load(interleaved, num_channels, name, self.commands)
    }

    /// Drops a reference. Once the last reference is gone the audio thread
    /// is told to stop any voice still reading it; the underlying buffer is
    /// only freed once that's acknowledged (see `Engine::process_messages`).
    pub fn unload(&mut self, handle: AudioHandle) {
        self.cache.unload(handle, self.commands);
    }
}
