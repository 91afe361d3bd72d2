//! Shared types for the audio engine workspace: handles, buffers, mix items,
//! decibel conversions, and the `EngineSpec`/`EngineConfig` configuration
//! values every other `ae-*` crate is constructed from.

pub mod audiodata;
pub mod buffer;
pub mod constants;
pub mod decibels;
pub mod error;
pub mod handles;
pub mod mixitem;
pub mod spec;

pub use audiodata::AudioData;
pub use buffer::{Buffer, Sample};
pub use decibels::{Decibels, amp_to_db, db_to_amp};
pub use error::{AeError, AeResult};
pub use handles::{AudioHandle, CueHandle, MixGroupHandle, SoundEffectHandle, StingerHandle, TransitionHandle};
pub use mixitem::MixItem;
pub use spec::{EngineConfig, EngineSpec};
