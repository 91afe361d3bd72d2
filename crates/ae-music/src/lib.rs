//! Cue/transition/stinger authoring records, bar/beat timing math, and the
//! sequencer state machine that turns scheduled transitions into layered
//! music playback.

pub mod authoring;
pub mod beatcalc;
pub mod conductor;
pub mod cue;
pub mod layerset;
pub mod metronome;
pub mod musicmanager;
pub mod sequencer;
pub mod stingerset;
pub mod sync;

pub use authoring::{MusicAuthoringBridge, MusicAuthoringCommand, MusicAuthoringReceiver, MusicAuthoringSender};
pub use beatcalc::{BeatCalculator, Meter};
pub use conductor::{Conductor, MusicTransitionRequest};
pub use cue::{ConditionFlags, Cue, CueLayer, MusicDatabase, Stinger, Transition, TransitionCondition};
pub use layerset::{LayerSet, LayerSetInfo};
pub use metronome::Metronome;
pub use musicmanager::MusicManager;
pub use sequencer::{Sequencer, SequencerResult};
pub use stingerset::StingerSet;
pub use sync::{ReferencePoint, Sync, SyncMode, SyncValue};
