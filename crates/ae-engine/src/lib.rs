//! Wires the audio-data cache, voice pool, music sequencer and summing
//! mixer into the one audio-thread entry point ([`AudioTimeline`]) and the
//! control-thread facades ([`Engine`], [`Asset`], [`Mixer`], [`Music`],
//! [`Event`], [`SoundEffect`]) an embedding application talks to.
//!
//! `Engine::new` hands back both halves; everything past construction is up
//! to the host: it owns the real-time thread that calls
//! `AudioTimeline::process` once per device period, and the thread (or
//! threads) that call the facades. This crate never spawns a thread or
//! touches a device itself.

pub mod asset;
pub mod commands;
pub mod engine;
pub mod mixer;
pub mod music;
pub mod soundeffect;
pub mod timeline;

pub use asset::Asset;
pub use engine::Engine;
pub use mixer::Mixer;
pub use music::{Event, Music, MusicState};
pub use soundeffect::{PlaybackRule, SoundEffect, SoundEffectBuilder, Variation};
pub use timeline::{AudioTimeline, ShutdownState};
