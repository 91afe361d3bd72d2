//! Fixed capacities shared by every audio-thread pool.
//!
//! These are compile-time limits, not configuration: the audio thread never
//! grows a collection after construction, so every pool that could be touched
//! from the callback is sized from one of these.

pub const MAX_VOICES: usize = 256;
pub const MAX_AUDIO_DATA: usize = 256;
pub const MAX_NAME_SIZE: usize = 128;

pub const MAX_MIX_GROUPS: usize = 64;
pub const MAX_MIX_GROUP_SENDS: usize = 5;
pub const MAX_MIX_GROUP_PLUGINS: usize = 5;

pub const MAX_CUE_LAYERS: usize = 4;
pub const MAX_CUES: usize = 64;
pub const MAX_STINGERS: usize = 64;
pub const MAX_TRANSITIONS: usize = 64;

pub const MAX_CONVOLVER_IRS: usize = 3;
pub const MAX_DELAY_MS: f32 = 5000.0;

pub const MIN_DECIBELS: f32 = -60.0;
pub const MAX_DECIBELS: f32 = 12.0;

/// Samples over which a stop-triggered fade runs.
pub const STOP_FADE_SAMPLES: usize = 32;
/// Samples over which a gain DSP ramps to a new target amplitude.
pub const GAIN_INTERPOLATION_SAMPLES: usize = 32;

pub const MAX_AUDIO_COMMANDS: usize = 1024;
pub const MAX_AUDIO_MESSAGES: usize = 1024;
