use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    Time,
    Musical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferencePoint {
    Bar,
    CueStart,
}

/// Musical note division (and its dotted/triplet variants) a [`Sync`] can
/// be expressed in, plus the two scheduling special cases `Cut` (start
/// immediately) and `Queue` (start when the current cue's layers end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncValue {
    Cut,
    Queue,
    Bar,
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
    OneTwentyEighth,
    HalfDotted,
    QuarterDotted,
    EighthDotted,
    SixteenthDotted,
    ThirtySecondDotted,
    SixtyFourthDotted,
    HalfTriplet,
    QuarterTriplet,
    EighthTriplet,
    SixteenthTriplet,
    ThirtySecondTriplet,
    SixtyFourthTriplet,
}

/// A scheduling expression: either a fixed time in seconds, or a musical
/// division with a reference point and an integer multiplicative factor
/// (e.g. 3 quarter notes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sync {
    pub mode: SyncMode,
    pub reference_point: ReferencePoint,
    pub value: SyncValue,
    pub factor: i32,
    pub time_seconds: f32,
}

impl Sync {
    pub fn musical(value: SyncValue) -> Self {
        Sync {
            mode: SyncMode::Musical,
            reference_point: ReferencePoint::Bar,
            value,
            factor: 1,
            time_seconds: 0.0,
        }
    }

    pub fn musical_with_factor(value: SyncValue, factor: i32) -> Self {
        Sync {
            factor,
            ..Self::musical(value)
        }
    }

    pub fn time(seconds: f32) -> Self {
        Sync {
            mode: SyncMode::Time,
            reference_point: ReferencePoint::Bar,
            value: SyncValue::Cut,
            factor: 1,
            time_seconds: seconds,
        }
    }

    pub fn with_reference_point(mut self, reference_point: ReferencePoint) -> Self {
        self.reference_point = reference_point;
        self
    }
}

impl Default for Sync {
    fn default() -> Self {
        Sync::musical(SyncValue::Cut)
    }
}
