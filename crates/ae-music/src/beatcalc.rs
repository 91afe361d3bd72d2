use crate::sync::{Sync, SyncValue};

/// Time signature as top/bottom (e.g. 4/4 is `{ top: 4, bottom: 4 }`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meter {
    pub top: i32,
    pub bottom: i32,
}

impl Default for Meter {
    fn default() -> Self {
        Meter { top: 4, bottom: 4 }
    }
}

/// A single note division's precomputed sample length, both as an exact
/// double-precision value (used for triplet rounding) and the rounded
/// integer sample count actually used for scheduling.
#[derive(Debug, Clone, Copy, Default)]
struct Division {
    precise: f64,
    samples: i64,
}

/// Precomputes, for one tempo/meter/sample-rate combination, how many
/// samples each note division (down to 128th notes) occupies, along with
/// dotted and triplet variants. Dotted = note + half of that note; triplet
/// = `round(precise * 2 / 3)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeatCalculator {
    one_twenty_eighth: Division,
    sixty_fourth: Division,
    thirty_second: Division,
    sixteenth: Division,
    eighth: Division,
    quarter: Division,
    half: Division,
    whole: Division,
    bar: Division,

    sixty_fourth_dotted: Division,
    thirty_second_dotted: Division,
    sixteenth_dotted: Division,
    eighth_dotted: Division,
    quarter_dotted: Division,
    half_dotted: Division,

    sixty_fourth_triplet: Division,
    thirty_second_triplet: Division,
    sixteenth_triplet: Division,
    eighth_triplet: Division,
    quarter_triplet: Division,
    half_triplet: Division,

    samples_per_beat: i64,
}

impl BeatCalculator {
    /// Recomputes every division for `tempo` BPM / `meter` / `sample_rate`.
    /// Returns the default (all-zero) calculator for an invalid tempo or
    /// meter rather than dividing by zero.
    pub fn calculate(tempo_bpm: f32, meter: Meter, sample_rate: f64) -> Self {
        if tempo_bpm <= 0.0 || meter.top <= 0 || meter.bottom <= 0 {
            return BeatCalculator::default();
        }

        let quarter_per_bar = match meter.bottom.cmp(&4) {
            std::cmp::Ordering::Less => meter.top as f64 / (4 / meter.bottom) as f64,
            std::cmp::Ordering::Greater => meter.top as f64 * (meter.bottom / 4) as f64,
            std::cmp::Ordering::Equal => meter.top as f64,
        };

        let raw_bar_samples = (quarter_per_bar / tempo_bpm as f64) * 60.0 * sample_rate;
        let constant_scale = 0.25 * meter.bottom as f64;

        let division = |note_constant: f64| -> Division {
            let precise = raw_bar_samples / meter.top as f64 * constant_scale * note_constant;
            Division {
                precise,
                samples: precise.round() as i64,
            }
        };

        let one_twenty_eighth = division(0.031_25);
        let sixty_fourth = division(0.0625);
        let thirty_second = division(0.125);
        let sixteenth = division(0.25);
        let eighth = division(0.5);
        let quarter = division(1.0);
        let half = division(2.0);
        let whole = division(4.0);
        let bar = Division {
            precise: raw_bar_samples,
            samples: raw_bar_samples.round() as i64,
        };

        let dotted = |note: Division, half_of_previous: Division| Division {
            precise: note.precise + half_of_previous.precise,
            samples: note.samples + half_of_previous.samples,
        };
        let sixty_fourth_dotted = dotted(sixty_fourth, one_twenty_eighth);
        let thirty_second_dotted = dotted(thirty_second, sixty_fourth);
        let sixteenth_dotted = dotted(sixteenth, thirty_second);
        let eighth_dotted = dotted(eighth, sixteenth);
        let quarter_dotted = dotted(quarter, eighth);
        let half_dotted = dotted(half, quarter);

        let triplet = |note: Division| Division {
            precise: note.precise * 2.0 / 3.0,
            samples: (note.precise * 2.0 / 3.0).round() as i64,
        };
        let sixty_fourth_triplet = triplet(sixty_fourth);
        let thirty_second_triplet = triplet(thirty_second);
        let sixteenth_triplet = triplet(sixteenth);
        let eighth_triplet = triplet(eighth);
        let quarter_triplet = triplet(quarter);
        let half_triplet = triplet(half);

        let samples_per_beat = match meter.bottom {
            1 => whole.samples,
            2 => half.samples,
            4 => quarter.samples,
            8 => eighth.samples,
            16 => sixteenth.samples,
            32 => thirty_second.samples,
            64 => sixty_fourth.samples,
            _ => quarter.samples,
        };

        BeatCalculator {
            one_twenty_eighth,
            sixty_fourth,
            thirty_second,
            sixteenth,
            eighth,
            quarter,
            half,
            whole,
            bar,
            sixty_fourth_dotted,
            thirty_second_dotted,
            sixteenth_dotted,
            eighth_dotted,
            quarter_dotted,
            half_dotted,
            sixty_fourth_triplet,
            thirty_second_triplet,
            sixteenth_triplet,
            eighth_triplet,
            quarter_triplet,
            half_triplet,
            samples_per_beat,
        }
    }

    pub fn samples_per_beat(&self) -> i64 {
        self.samples_per_beat
    }

    pub fn bar_samples(&self) -> i64 {
        self.bar.samples
    }

    fn division_for(&self, value: SyncValue) -> Division {
        match value {
            SyncValue::Cut | SyncValue::Queue => Division {
                precise: 1.0,
                samples: 1,
            },
            SyncValue::Bar => self.bar,
            SyncValue::Whole => self.whole,
            SyncValue::Half => self.half,
            SyncValue::Quarter => self.quarter,
            SyncValue::Eighth => self.eighth,
            SyncValue::Sixteenth => self.sixteenth,
            SyncValue::ThirtySecond => self.thirty_second,
            SyncValue::SixtyFourth => self.sixty_fourth,
            SyncValue::OneTwentyEighth => self.one_twenty_eighth,
            SyncValue::HalfDotted => self.half_dotted,
            SyncValue::QuarterDotted => self.quarter_dotted,
            SyncValue::EighthDotted => self.eighth_dotted,
            SyncValue::SixteenthDotted => self.sixteenth_dotted,
            SyncValue::ThirtySecondDotted => self.thirty_second_dotted,
            SyncValue::SixtyFourthDotted => self.sixty_fourth_dotted,
            SyncValue::HalfTriplet => self.half_triplet,
            SyncValue::QuarterTriplet => self.quarter_triplet,
            SyncValue::EighthTriplet => self.eighth_triplet,
            SyncValue::SixteenthTriplet => self.sixteenth_triplet,
            SyncValue::ThirtySecondTriplet => self.thirty_second_triplet,
            SyncValue::SixtyFourthTriplet => self.sixty_fourth_triplet,
        }
    }

    /// Rounded sample count for one `sync`, scaled by its integer factor.
    pub fn beat_switch(&self, sync: &Sync) -> i64 {
        self.division_for(sync.value).samples * sync.factor as i64
    }

    /// Exact (unrounded) sample count for one `sync`, scaled by its factor.
    pub fn precise_beat_switch(&self, sync: &Sync) -> f64 {
        self.division_for(sync.value).precise * sync.factor as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Sync;

    #[test]
    fn quarter_and_bar_match_seed_scenario() {
        let calc = BeatCalculator::calculate(120.0, Meter { top: 4, bottom: 4 }, 48_000.0);
        assert_eq!(calc.beat_switch(&Sync::musical(SyncValue::Quarter)), 24_000);
        assert_eq!(calc.bar_samples(), 96_000);
    }

    #[test]
    fn eighth_triplet_matches_seed_scenario() {
        let calc = BeatCalculator::calculate(120.0, Meter { top: 4, bottom: 4 }, 48_000.0);
        assert_eq!(calc.beat_switch(&Sync::musical(SyncValue::EighthTriplet)), 16_000);
    }

    #[test]
    fn invalid_tempo_yields_zeroed_calculator() {
        let calc = BeatCalculator::calculate(0.0, Meter::default(), 48_000.0);
        assert_eq!(calc.bar_samples(), 0);
    }

    #[test]
    fn four_quarters_equal_one_whole_in_four_four() {
        let calc = BeatCalculator::calculate(95.0, Meter { top: 4, bottom: 4 }, 44_100.0);
        let quarter = calc.beat_switch(&Sync::musical(SyncValue::Quarter));
        let whole = calc.beat_switch(&Sync::musical(SyncValue::Whole));
        assert!((quarter * 4 - whole).abs() <= 1);
    }
}
