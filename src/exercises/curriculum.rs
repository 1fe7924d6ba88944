use serde::Serialize;

use crate::validation::species::Species;

#[derive(Serialize, Clone, Debug)]
pub struct CurriculumExercise {
    pub cantus_id: String,
    pub name: String,
    pub description: String,
    pub difficulty: u8,
    pub keys: Vec<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct CurriculumStage {
    pub stage: u8,
    pub species: Species,
    pub name: String,
    pub description: String,
    pub rules: Vec<String>,
    pub exercises: Vec<CurriculumExercise>,
}

fn exercise(
    cantus_id: &str,
    name: &str,
    description: &str,
    difficulty: u8,
    keys: &[&str],
) -> CurriculumExercise {
    CurriculumExercise {
        cantus_id: cantus_id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        difficulty,
        keys: keys.iter().map(|k| k.to_string()).collect(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn get_curriculum() -> Vec<CurriculumStage> {
    vec![
        CurriculumStage {
            stage: 1,
            species: Species::First,
            name: "Note Against Note".to_string(),
            description: "One whole note of counterpoint for each note of the cantus firmus"
                .to_string(),
            rules: strings(&[
                "Every interval must be consonant",
                "Begin and end on a perfect consonance",
                "No parallel fifths or octaves",
                "Approach the final by contrary motion",
            ]),
            exercises: vec![
                exercise("fux_dorian", "Dorian Cantus", "Fux's first exercise", 1, &["D4"]),
                exercise(
                    "fux_ionian",
                    "Ionian Cantus",
                    "Counterpoint above a major-mode cantus",
                    1,
                    &["C4", "F4"],
                ),
            ],
        },
        CurriculumStage {
            stage: 2,
            species: Species::Second,
            name: "Two Against One".to_string(),
            description: "Two half notes against each note of the cantus firmus".to_string(),
            rules: strings(&[
                "Downbeats must be consonant",
                "Weak halves may be dissonant passing or neighbour tones",
                "Avoid repeating a note",
            ]),
            exercises: vec![
                exercise(
                    "fux_dorian",
                    "Dorian in Halves",
                    "Passing tones over the Dorian cantus",
                    2,
                    &["D4"],
                ),
                exercise(
                    "fux_aeolian",
                    "Aeolian in Halves",
                    "Fill thirds with passing tones",
                    2,
                    &["A3", "D4"],
                ),
            ],
        },
        CurriculumStage {
            stage: 3,
            species: Species::Third,
            name: "Four Against One".to_string(),
            description: "Four quarter notes against each note of the cantus firmus".to_string(),
            rules: strings(&[
                "The first quarter of each bar must be consonant",
                "Other quarters may be dissonant when approached and left by step",
            ]),
            exercises: vec![
                exercise(
                    "fux_phrygian",
                    "Phrygian in Quarters",
                    "Running quarters over the Phrygian cantus",
                    3,
                    &["E4"],
                ),
                exercise(
                    "fux_mixolydian",
                    "Mixolydian in Quarters",
                    "Neighbour tones and passing tones",
                    3,
                    &["G3", "C4"],
                ),
            ],
        },
        CurriculumStage {
            stage: 4,
            species: Species::Fourth,
            name: "Syncopation".to_string(),
            description: "Half notes tied across the barline, forming suspensions".to_string(),
            rules: strings(&[
                "Each note enters on the weak half as a consonance",
                "A dissonant suspension must resolve down by step",
            ]),
            exercises: vec![
                exercise(
                    "fux_lydian",
                    "Lydian Suspensions",
                    "Chains of 7-6 suspensions",
                    4,
                    &["F4"],
                ),
                exercise(
                    "fux_dorian",
                    "Dorian Suspensions",
                    "Suspensions over the Dorian cantus",
                    4,
                    &["D4"],
                ),
            ],
        },
        CurriculumStage {
            stage: 5,
            species: Species::Fifth,
            name: "Florid Counterpoint".to_string(),
            description: "A free mixture of the first four species".to_string(),
            rules: strings(&[
                "Downbeats must be consonant",
                "Dissonance only as passing or neighbour tones off the beat",
                "Shape the line with a single climax",
            ]),
            exercises: vec![
                exercise(
                    "fux_ionian",
                    "Florid Ionian",
                    "Combine every species over a major cantus",
                    5,
                    &["C4"],
                ),
                exercise(
                    "fux_aeolian",
                    "Florid Aeolian",
                    "Combine every species over a minor cantus",
                    5,
                    &["A3"],
                ),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::cantus::transpose_cantus;

    #[test]
    fn test_one_stage_per_species() {
        let curriculum = get_curriculum();
        assert_eq!(curriculum.len(), 5);
        for (stage, species) in curriculum.iter().zip(Species::ALL) {
            assert_eq!(stage.species, species);
            assert_eq!(stage.stage, species.number());
            assert!(!stage.exercises.is_empty());
        }
    }

    #[test]
    fn test_exercises_reference_real_cantus() {
        for stage in get_curriculum() {
            for exercise in &stage.exercises {
                for key in &exercise.keys {
                    assert!(
                        transpose_cantus(&exercise.cantus_id, key).is_ok(),
                        "{} in {}",
                        exercise.cantus_id,
                        key
                    );
                }
            }
        }
    }
}
