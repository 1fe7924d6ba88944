use serde::{Deserialize, Serialize};

use crate::error::CounterpointError;

/// The five species of two-voice counterpoint.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(into = "u8", try_from = "i64")]
pub enum Species {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
}

/// Offsets within a cantus firmus note where a dissonance may fall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WeakBeats {
    None,
    /// Fractions of the cantus firmus note, measured from its onset.
    At(&'static [f64]),
    AnyOffbeat,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeciesConfig {
    /// Counterpoint notes per cantus firmus note; `None` for free rhythm.
    pub ratio: Option<u32>,
    pub weak_beats: WeakBeats,
    /// Notes enter on the second half of the cantus firmus note and tie over.
    pub syncopated: bool,
    pub suspensions: bool,
    pub max_repeats: usize,
}

const FIRST: SpeciesConfig = SpeciesConfig {
    ratio: Some(1),
    weak_beats: WeakBeats::None,
    syncopated: false,
    suspensions: false,
    max_repeats: 2,
};

const SECOND: SpeciesConfig = SpeciesConfig {
    ratio: Some(2),
    weak_beats: WeakBeats::At(&[0.5]),
    syncopated: false,
    suspensions: false,
    max_repeats: 1,
};

const THIRD: SpeciesConfig = SpeciesConfig {
    ratio: Some(4),
    weak_beats: WeakBeats::At(&[0.25, 0.5, 0.75]),
    syncopated: false,
    suspensions: false,
    max_repeats: 1,
};

const FOURTH: SpeciesConfig = SpeciesConfig {
    ratio: Some(2),
    weak_beats: WeakBeats::None,
    syncopated: true,
    suspensions: true,
    max_repeats: 2,
};

const FIFTH: SpeciesConfig = SpeciesConfig {
    ratio: None,
    weak_beats: WeakBeats::AnyOffbeat,
    syncopated: false,
    suspensions: false,
    max_repeats: 2,
};

pub const POSITION_EPSILON: f64 = 1e-6;

impl Species {
    pub const ALL: [Species; 5] = [
        Species::First,
        Species::Second,
        Species::Third,
        Species::Fourth,
        Species::Fifth,
    ];

    pub fn number(self) -> u8 {
        match self {
            Species::First => 1,
            Species::Second => 2,
            Species::Third => 3,
            Species::Fourth => 4,
            Species::Fifth => 5,
        }
    }

    pub fn config(self) -> &'static SpeciesConfig {
        match self {
            Species::First => &FIRST,
            Species::Second => &SECOND,
            Species::Third => &THIRD,
            Species::Fourth => &FOURTH,
            Species::Fifth => &FIFTH,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::First => "first species (note against note)",
            Species::Second => "second species (two against one)",
            Species::Third => "third species (four against one)",
            Species::Fourth => "fourth species (syncopation)",
            Species::Fifth => "fifth species (florid)",
        }
    }
}

impl SpeciesConfig {
    /// Is `fraction` (offset into the cantus firmus note, 0..1) a position
    /// where a passing or neighbour dissonance is tolerated?
    pub fn is_weak(&self, fraction: f64) -> bool {
        match self.weak_beats {
            WeakBeats::None => false,
            WeakBeats::At(positions) => positions
                .iter()
                .any(|p| (p - fraction).abs() < POSITION_EPSILON),
            WeakBeats::AnyOffbeat => fraction > POSITION_EPSILON,
        }
    }
}

impl From<Species> for u8 {
    fn from(species: Species) -> u8 {
        species.number()
    }
}

impl TryFrom<i64> for Species {
    type Error = CounterpointError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Species::First),
            2 => Ok(Species::Second),
            3 => Ok(Species::Third),
            4 => Ok(Species::Fourth),
            5 => Ok(Species::Fifth),
            _ => Err(CounterpointError::InvalidSpecies(value)),
        }
    }
}

impl TryFrom<u8> for Species {
    type Error = CounterpointError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Species::try_from(value as i64)
    }
}

/// A species number as it arrives from JavaScript, where every number is a double.
impl TryFrom<f64> for Species {
    type Error = CounterpointError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(CounterpointError::InvalidInput(format!(
                "species must be a whole number, got {}",
                value
            )));
        }
        Species::try_from(value as i64)
    }
}
