use serde::Serialize;

use crate::error::{CounterpointError, Result};
use crate::parser::musicxml::midi_from_pitch;
use crate::validation::interval::{MAX_PITCH, MIN_PITCH};
use crate::validation::species::Species;
use crate::validation::types::{Exercise, Note};

/// Beats per cantus firmus note (a whole note in 4/4).
pub const CANTUS_NOTE_BEATS: f64 = 4.0;

struct StockCantus {
    id: &'static str,
    name: &'static str,
    mode: &'static str,
    pitches: &'static [i32],
}

// Fux, Gradus ad Parnassum
const STOCK: &[StockCantus] = &[
    StockCantus {
        id: "fux_dorian",
        name: "Fux: Dorian",
        mode: "dorian",
        pitches: &[62, 65, 64, 62, 67, 65, 69, 67, 65, 64, 62],
    },
    StockCantus {
        id: "fux_phrygian",
        name: "Fux: Phrygian",
        mode: "phrygian",
        pitches: &[64, 60, 62, 60, 57, 69, 67, 64, 65, 64],
    },
    StockCantus {
        id: "fux_lydian",
        name: "Fux: Lydian",
        mode: "lydian",
        pitches: &[65, 67, 69, 65, 62, 64, 65, 72, 69, 65, 67, 65],
    },
    StockCantus {
        id: "fux_mixolydian",
        name: "Fux: Mixolydian",
        mode: "mixolydian",
        pitches: &[55, 60, 59, 55, 60, 64, 62, 67, 64, 60, 62, 59, 57, 55],
    },
    StockCantus {
        id: "fux_aeolian",
        name: "Fux: Aeolian",
        mode: "aeolian",
        pitches: &[57, 60, 59, 62, 60, 64, 65, 64, 62, 60, 59, 57],
    },
    StockCantus {
        id: "fux_ionian",
        name: "Fux: Ionian",
        mode: "ionian",
        pitches: &[60, 64, 65, 67, 64, 69, 67, 64, 65, 64, 62, 60],
    },
];

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CantusSummary {
    pub id: String,
    pub name: String,
    pub mode: String,
    pub length: usize,
    pub first_pitch: i32,
}

pub fn list_cantus_firmi() -> Vec<CantusSummary> {
    STOCK
        .iter()
        .map(|c| CantusSummary {
            id: c.id.to_string(),
            name: c.name.to_string(),
            mode: c.mode.to_string(),
            length: c.pitches.len(),
            first_pitch: c.pitches[0],
        })
        .collect()
}

/// Parse a key like "C4", "F#3" or "Bb" (octave 4 by default) to a MIDI note.
pub fn key_to_midi(key: &str) -> Result<i32> {
    let key = key.trim();
    let mut chars = key.chars();
    let Some(step) = chars.next() else {
        return Err(CounterpointError::InvalidKey("empty key".to_string()));
    };
    let step = step.to_ascii_uppercase();
    if !('A'..='G').contains(&step) {
        return Err(CounterpointError::InvalidKey(key.to_string()));
    }
    let rest: String = chars.collect();

    let (alter, octave_str) = if let Some(stripped) = rest.strip_prefix('#') {
        (1, stripped)
    } else if let Some(stripped) = rest.strip_prefix('b') {
        (-1, stripped)
    } else {
        (0, rest.as_str())
    };

    let octave: i32 = if octave_str.is_empty() {
        4
    } else {
        octave_str
            .parse()
            .map_err(|_| CounterpointError::InvalidKey(key.to_string()))?
    };

    Ok(midi_from_pitch(step, alter, octave))
}

fn find(id: &str) -> Result<&'static StockCantus> {
    STOCK
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| CounterpointError::UnknownCantus(id.to_string()))
}

/// A stock cantus firmus in whole notes, moved so it starts on `key`.
pub fn transpose_cantus(id: &str, key: &str) -> Result<Vec<Note>> {
    let cantus = find(id)?;
    let shift = key_to_midi(key)? - cantus.pitches[0];

    cantus
        .pitches
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let pitch = p + shift;
            if !(MIN_PITCH..=MAX_PITCH).contains(&pitch) {
                return Err(CounterpointError::InvalidKey(format!(
                    "{} puts {} out of MIDI range",
                    key, id
                )));
            }
            Ok(Note::new(pitch, i as f64 * CANTUS_NOTE_BEATS, CANTUS_NOTE_BEATS))
        })
        .collect()
}

pub fn generate_exercise(id: &str, key: &str, species: Species) -> Result<Exercise> {
    Ok(Exercise {
        cantus_firmus: transpose_cantus(id, key)?,
        species,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_to_midi() {
        assert_eq!(key_to_midi("C4").unwrap(), 60);
        assert_eq!(key_to_midi("A4").unwrap(), 69);
        assert_eq!(key_to_midi("Bb3").unwrap(), 58);
        assert_eq!(key_to_midi("F#4").unwrap(), 66);
        assert_eq!(key_to_midi("C").unwrap(), 60); // default octave 4
        assert_eq!(key_to_midi("d3").unwrap(), 50);
    }

    #[test]
    fn test_bad_keys() {
        assert!(matches!(key_to_midi(""), Err(CounterpointError::InvalidKey(_))));
        assert!(matches!(key_to_midi("H4"), Err(CounterpointError::InvalidKey(_))));
        assert!(matches!(key_to_midi("Cx"), Err(CounterpointError::InvalidKey(_))));
    }

    #[test]
    fn test_transpose_dorian() {
        let notes = transpose_cantus("fux_dorian", "D4").unwrap();
        assert_eq!(notes[0].pitch, 62);
        assert_eq!(notes.len(), 11);

        let up = transpose_cantus("fux_dorian", "E4").unwrap();
        assert_eq!(up[0].pitch, 64);
        assert_eq!(up[1].pitch, 67);
        assert_eq!(up[1].beat, 4.0);
        assert_eq!(up[1].duration, 4.0);
    }

    #[test]
    fn test_transpose_out_of_range() {
        assert!(transpose_cantus("fux_lydian", "G9").is_err());
    }

    #[test]
    fn test_unknown_cantus() {
        assert_eq!(
            transpose_cantus("nonexistent", "C4"),
            Err(CounterpointError::UnknownCantus("nonexistent".to_string()))
        );
    }

    #[test]
    fn test_every_cantus_ends_on_its_final() {
        for summary in list_cantus_firmi() {
            let notes = transpose_cantus(&summary.id, "C4").unwrap();
            assert_eq!(notes.first().unwrap().pitch, 60, "{}", summary.id);
            let last = notes.last().unwrap().pitch;
            assert_eq!((last - 60).rem_euclid(12), 0, "{}", summary.id);
        }
    }

    #[test]
    fn test_generate_exercise() {
        let exercise = generate_exercise("fux_aeolian", "A3", Species::Third).unwrap();
        assert_eq!(exercise.species, Species::Third);
        assert_eq!(exercise.cantus_firmus[0].pitch, 57);
    }
}
