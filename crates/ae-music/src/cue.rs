use std::collections::HashMap;
use std::sync::Arc;

use ae_core::{AeError, AeResult, AudioData, CueHandle, MixGroupHandle, StingerHandle, TransitionHandle, constants::{MAX_CUES, MAX_CUE_LAYERS, MAX_STINGERS, MAX_TRANSITIONS}};

use crate::beatcalc::Meter;
use crate::sync::Sync;

/// One synchronized layer inside a [`Cue`]: a decoded asset plus the
/// per-layer gain it should be mixed at.
#[derive(Clone)]
pub struct CueLayer {
    pub audio_data: Arc<AudioData>,
    pub amplitude: f32,
}

/// An authored piece of music: up to [`MAX_CUE_LAYERS`] layers that start
/// and loop in lockstep, at a fixed tempo and meter.
#[derive(Clone)]
pub struct Cue {
    pub handle: CueHandle,
    pub name: String,
    pub layers: Vec<CueLayer>,
    pub tempo_bpm: f32,
    pub meter: Meter,
    pub mix_group: MixGroupHandle,
    /// 0 loops forever.
    pub play_count: i32,
}

/// Bitflags controlling which of [`TransitionCondition`]'s bar/beat
/// comparisons are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConditionFlags(pub u32);

impl ConditionFlags {
    pub const NONE: u32 = 0;
    pub const ODD_BARS: u32 = 1 << 0;
    pub const EVEN_BARS: u32 = 1 << 1;
    pub const LESS_THAN_BARS: u32 = 1 << 2;
    pub const LESS_THAN_EQUAL_BARS: u32 = 1 << 3;
    pub const GREATER_THAN_BARS: u32 = 1 << 4;
    pub const GREATER_THAN_EQUAL_BARS: u32 = 1 << 5;
    pub const EQUAL_BARS: u32 = 1 << 6;
    pub const LESS_THAN_BEATS: u32 = 1 << 7;
    pub const LESS_THAN_EQUAL_BEATS: u32 = 1 << 8;
    pub const GREATER_THAN_BEATS: u32 = 1 << 9;
    pub const GREATER_THAN_EQUAL_BEATS: u32 = 1 << 10;
    pub const EQUAL_BEATS: u32 = 1 << 11;

    fn has(self, flag: u32) -> bool {
        self.0 & flag != 0
    }
}

/// A gate on whether a [`Transition`] is eligible to fire: an optional
/// required current cue, plus bar/beat comparisons against the transition
/// request's own `bar`/`beat` fields.
#[derive(Debug, Clone, Copy)]
pub struct TransitionCondition {
    pub user_data: [u8; 16],
    pub required_cue: Option<CueHandle>,
    pub bar: i32,
    pub beat: i32,
    pub flags: ConditionFlags,
}

impl Default for TransitionCondition {
    fn default() -> Self {
        TransitionCondition {
            user_data: [0; 16],
            required_cue: None,
            bar: -1,
            beat: -1,
            flags: ConditionFlags::default(),
        }
    }
}

impl TransitionCondition {
    pub fn matches(&self, user_data: &[u8; 16], current_cue: Option<CueHandle>, current_bar: i32, current_beat: i32) -> bool {
        if let Some(required) = self.required_cue {
            if current_cue != Some(required) {
                return false;
            }
        }

        if user_data != &self.user_data {
            return false;
        }

        let even_bar = current_bar % 2 == 0;
        let flags = self.flags;

        if flags.has(ConditionFlags::ODD_BARS) && (current_bar <= 0 || even_bar) {
            return false;
        }
        if flags.has(ConditionFlags::EVEN_BARS) && (current_bar <= 0 || !even_bar) {
            return false;
        }
        if flags.has(ConditionFlags::LESS_THAN_BARS) && !(current_bar > 0 && current_bar < self.bar) {
            return false;
        }
        if flags.has(ConditionFlags::LESS_THAN_EQUAL_BARS) && !(current_bar > 0 && current_bar <= self.bar) {
            return false;
        }
        if flags.has(ConditionFlags::GREATER_THAN_BARS) && !(current_bar > 0 && current_bar > self.bar) {
            return false;
        }
        if flags.has(ConditionFlags::GREATER_THAN_EQUAL_BARS) && !(current_bar > 0 && current_bar >= self.bar) {
            return false;
        }
        if flags.has(ConditionFlags::EQUAL_BARS) && !(current_bar > 0 && current_bar == self.bar) {
            return false;
        }

        if flags.has(ConditionFlags::LESS_THAN_BEATS) && !(current_beat > 0 && current_beat < self.beat) {
            return false;
        }
        if flags.has(ConditionFlags::LESS_THAN_EQUAL_BEATS) && !(current_beat > 0 && current_beat <= self.beat) {
            return false;
        }
        if flags.has(ConditionFlags::GREATER_THAN_BEATS) && !(current_beat > 0 && current_beat > self.beat) {
            return false;
        }
        if flags.has(ConditionFlags::GREATER_THAN_EQUAL_BEATS) && !(current_beat > 0 && current_beat >= self.beat) {
            return false;
        }
        if flags.has(ConditionFlags::EQUAL_BEATS) && !(current_beat > 0 && current_beat == self.beat) {
            return false;
        }

        true
    }
}

/// An authored move from whatever is currently playing to `target_cue`,
/// scheduled by `sync`, optionally preceded by a [`Stinger`] and optionally
/// chained into a follow-up transition once `target_cue` finishes.
#[derive(Clone)]
pub struct Transition {
    pub handle: TransitionHandle,
    pub target_cue: CueHandle,
    pub sync: Sync,
    pub stinger: Option<StingerHandle>,
    pub follow_up: Option<TransitionHandle>,
    pub condition: Option<TransitionCondition>,
}

/// A short one-shot music sting, independent of the layer set's loop state.
#[derive(Clone)]
pub struct Stinger {
    pub handle: StingerHandle,
    pub cue: CueHandle,
    pub sync: Sync,
    pub amplitude: f32,
}

/// Fixed-capacity authoring store for every [`Cue`], [`Transition`] and
/// [`Stinger`] the music system knows about, looked up by handle.
#[derive(Default)]
pub struct MusicDatabase {
    cues: Vec<Cue>,
    cue_index: HashMap<CueHandle, usize>,
    transitions: Vec<Transition>,
    transition_index: HashMap<TransitionHandle, usize>,
    stingers: Vec<Stinger>,
    stinger_index: HashMap<StingerHandle, usize>,
}

impl MusicDatabase {
    pub fn new() -> Self {
        MusicDatabase::default()
    }

    pub fn add_cue(&mut self, cue: Cue) -> AeResult<()> {
        if self.cues.len() >= MAX_CUES {
            return Err(AeError::PoolExhausted("MusicDatabase cues"));
        }
        if cue.layers.is_empty() || cue.layers.len() > MAX_CUE_LAYERS {
            return Err(AeError::InvalidParam("cue layer count"));
        }
        self.cue_index.insert(cue.handle, self.cues.len());
        self.cues.push(cue);
        Ok(())
    }

    pub fn add_transition(&mut self, transition: Transition) -> AeResult<()> {
        if self.transitions.len() >= MAX_TRANSITIONS {
            return Err(AeError::PoolExhausted("MusicDatabase transitions"));
        }
        self.transition_index.insert(transition.handle, self.transitions.len());
        self.transitions.push(transition);
        Ok(())
    }

    pub fn add_stinger(&mut self, stinger: Stinger) -> AeResult<()> {
        if self.stingers.len() >= MAX_STINGERS {
            return Err(AeError::PoolExhausted("MusicDatabase stingers"));
        }
        self.stinger_index.insert(stinger.handle, self.stingers.len());
        self.stingers.push(stinger);
        Ok(())
    }

    pub fn cue(&self, handle: CueHandle) -> Option<&Cue> {
        self.cue_index.get(&handle).map(|&i| &self.cues[i])
    }

    pub fn transition(&self, handle: TransitionHandle) -> Option<&Transition> {
        self.transition_index.get(&handle).map(|&i| &self.transitions[i])
    }

    pub fn stinger(&self, handle: StingerHandle) -> Option<&Stinger> {
        self.stinger_index.get(&handle).map(|&i| &self.stingers[i])
    }

    pub fn cue_for_transition(&self, transition: TransitionHandle) -> Option<&Cue> {
        self.transition(transition).and_then(|t| self.cue(t.target_cue))
    }

    pub fn cue_for_stinger(&self, stinger: StingerHandle) -> Option<&Cue> {
        self.stinger(stinger).and_then(|s| self.cue(s.cue))
    }

    /// Every transition whose condition matches the given user payload and
    /// current playback position, in authoring order.
    pub fn transitions_matching(
        &self,
        user_data: &[u8; 16],
        current_cue: Option<CueHandle>,
        current_bar: i32,
        current_beat: i32,
    ) -> Vec<TransitionHandle> {
        self.transitions
            .iter()
            .filter(|t| match &t.condition {
                Some(condition) => condition.matches(user_data, current_cue, current_bar, current_beat),
                None => false,
            })
            .map(|t| t.handle)
            .collect()
    }
}
