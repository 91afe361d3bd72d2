//! Polyphonic sample playback: a single voice's fill-one-block algorithm
//! and the fixed-size pool that owns all of them.

pub mod voice;
pub mod voiceset;

pub use voice::{PlayParams, Voice, VoiceInfo};
pub use voiceset::VoiceSet;
