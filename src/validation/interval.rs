use serde::Serialize;

use crate::error::{CounterpointError, Result};

pub const MIN_PITCH: i32 = 0;
pub const MAX_PITCH: i32 = 127;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub fn midi_to_name(midi: i32) -> String {
    let name = NOTE_NAMES[midi.rem_euclid(12) as usize];
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", name, octave)
}

pub fn check_pitch(pitch: i32) -> Result<i32> {
    if (MIN_PITCH..=MAX_PITCH).contains(&pitch) {
        Ok(pitch)
    } else {
        Err(CounterpointError::InvalidPitch(pitch))
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Consonance {
    Perfect,
    Imperfect,
    Dissonant,
}

/// The twelve simple interval classes. Unison and octave share a class;
/// `Interval::is_unison` tells them apart.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IntervalQuality {
    Unison,
    MinorSecond,
    MajorSecond,
    MinorThird,
    MajorThird,
    PerfectFourth,
    Tritone,
    PerfectFifth,
    MinorSixth,
    MajorSixth,
    MinorSeventh,
    MajorSeventh,
}

impl IntervalQuality {
    const ALL: [IntervalQuality; 12] = [
        IntervalQuality::Unison,
        IntervalQuality::MinorSecond,
        IntervalQuality::MajorSecond,
        IntervalQuality::MinorThird,
        IntervalQuality::MajorThird,
        IntervalQuality::PerfectFourth,
        IntervalQuality::Tritone,
        IntervalQuality::PerfectFifth,
        IntervalQuality::MinorSixth,
        IntervalQuality::MajorSixth,
        IntervalQuality::MinorSeventh,
        IntervalQuality::MajorSeventh,
    ];

    pub fn from_simple(simple: u8) -> Self {
        Self::ALL[(simple % 12) as usize]
    }

    pub fn consonance(self) -> Consonance {
        match self {
            IntervalQuality::Unison | IntervalQuality::PerfectFifth => Consonance::Perfect,
            IntervalQuality::MinorThird
            | IntervalQuality::MajorThird
            | IntervalQuality::MinorSixth
            | IntervalQuality::MajorSixth => Consonance::Imperfect,
            _ => Consonance::Dissonant,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntervalQuality::Unison => "unison",
            IntervalQuality::MinorSecond => "minor second",
            IntervalQuality::MajorSecond => "major second",
            IntervalQuality::MinorThird => "minor third",
            IntervalQuality::MajorThird => "major third",
            IntervalQuality::PerfectFourth => "perfect fourth",
            IntervalQuality::Tritone => "tritone",
            IntervalQuality::PerfectFifth => "perfect fifth",
            IntervalQuality::MinorSixth => "minor sixth",
            IntervalQuality::MajorSixth => "major sixth",
            IntervalQuality::MinorSeventh => "minor seventh",
            IntervalQuality::MajorSeventh => "major seventh",
        }
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    /// Raw signed distance, `upper - lower`.
    pub semitones: i32,
    /// Distance reduced into 0..12.
    pub simple: u8,
    pub quality: IntervalQuality,
    pub consonance: Consonance,
    /// The voice passed as `upper` actually sits below `lower`.
    pub crossed: bool,
}

impl Interval {
    pub fn is_perfect(&self) -> bool {
        self.consonance == Consonance::Perfect
    }

    pub fn is_consonant(&self) -> bool {
        self.consonance != Consonance::Dissonant
    }

    pub fn is_dissonant(&self) -> bool {
        self.consonance == Consonance::Dissonant
    }

    pub fn is_unison(&self) -> bool {
        self.semitones == 0
    }

    /// Unison or any octave.
    pub fn is_octave_class(&self) -> bool {
        self.simple == 0
    }

    pub fn octaves(&self) -> i32 {
        self.semitones.abs() / 12
    }

    pub fn describe(&self) -> String {
        if self.is_unison() {
            "unison".to_string()
        } else if self.simple == 0 {
            "octave".to_string()
        } else if self.octaves() > 0 {
            format!("compound {}", self.quality.name())
        } else {
            self.quality.name().to_string()
        }
    }
}

/// Classify the harmonic interval between two simultaneous pitches.
///
/// The simple class is `(upper - lower)` reduced with euclidean modulo, so
/// transposing `lower` by an octave never changes the class. Callers that
/// want the musical interval of crossed voices pass the pitches low to high.
pub fn classify_interval(lower: i32, upper: i32) -> Result<Interval> {
    check_pitch(lower)?;
    check_pitch(upper)?;

    let semitones = upper - lower;
    let simple = semitones.rem_euclid(12) as u8;
    let quality = IntervalQuality::from_simple(simple);

    Ok(Interval {
        semitones,
        simple,
        quality,
        consonance: quality.consonance(),
        crossed: semitones < 0,
    })
}

/// Classify two sounding pitches in whatever order they arrive, measuring
/// upward from the lower one.
pub fn classify_sounding(a: i32, b: i32) -> Result<Interval> {
    classify_interval(a.min(b), a.max(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consonance_table() {
        let expected = [
            Consonance::Perfect,
            Consonance::Dissonant,
            Consonance::Dissonant,
            Consonance::Imperfect,
            Consonance::Imperfect,
            Consonance::Dissonant,
            Consonance::Dissonant,
            Consonance::Perfect,
            Consonance::Imperfect,
            Consonance::Imperfect,
            Consonance::Dissonant,
            Consonance::Dissonant,
        ];
        for (offset, consonance) in expected.iter().enumerate() {
            let interval = classify_interval(60, 60 + offset as i32).unwrap();
            assert_eq!(interval.consonance, *consonance, "offset {}", offset);
            assert_eq!(interval.simple as usize, offset);
        }
    }

    #[test]
    fn test_compound_intervals_reduce() {
        let twelfth = classify_interval(48, 67).unwrap();
        assert_eq!(twelfth.quality, IntervalQuality::PerfectFifth);
        assert_eq!(twelfth.semitones, 19);
        assert_eq!(twelfth.describe(), "compound perfect fifth");

        let tenth = classify_interval(48, 64).unwrap();
        assert_eq!(tenth.consonance, Consonance::Imperfect);
    }

    #[test]
    fn test_unison_vs_octave() {
        let unison = classify_interval(60, 60).unwrap();
        let octave = classify_interval(60, 72).unwrap();
        assert!(unison.is_unison());
        assert!(!octave.is_unison());
        assert!(octave.is_octave_class());
        assert_eq!(unison.describe(), "unison");
        assert_eq!(octave.describe(), "octave");
        assert_eq!(classify_interval(36, 72).unwrap().describe(), "octave");
    }

    #[test]
    fn test_octave_transposition_keeps_class() {
        for a in 0..=115 {
            for b in 0..=127 {
                let base = classify_interval(a, b).unwrap();
                let shifted = classify_interval(a + 12, b).unwrap();
                assert_eq!(base.consonance, shifted.consonance, "({}, {})", a, b);
                assert_eq!(base.simple, shifted.simple);
            }
        }
    }

    #[test]
    fn test_crossed_voices() {
        let crossed = classify_interval(67, 60).unwrap();
        assert!(crossed.crossed);
        assert_eq!(crossed.semitones, -7);

        let sounding = classify_sounding(67, 60).unwrap();
        assert!(!sounding.crossed);
        assert_eq!(sounding.quality, IntervalQuality::PerfectFifth);
    }

    #[test]
    fn test_invalid_pitch() {
        assert_eq!(
            classify_interval(-1, 60),
            Err(CounterpointError::InvalidPitch(-1))
        );
        assert_eq!(
            classify_interval(60, 128),
            Err(CounterpointError::InvalidPitch(128))
        );
    }

    #[test]
    fn test_midi_to_name() {
        assert_eq!(midi_to_name(60), "C4");
        assert_eq!(midi_to_name(69), "A4");
        assert_eq!(midi_to_name(61), "C#4");
        assert_eq!(midi_to_name(0), "C-1");
    }
}
