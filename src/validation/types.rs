use serde::{Deserialize, Serialize};

use crate::error::CounterpointError;
use crate::validation::species::Species;

/// One musical event. Beats and durations are in quarter notes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Note {
    #[serde(rename = "note", alias = "pitch")]
    pub pitch: i32,
    pub beat: f64,
    pub duration: f64,
}

impl Note {
    pub fn new(pitch: i32, beat: f64, duration: f64) -> Self {
        Note {
            pitch,
            beat,
            duration,
        }
    }

    pub fn end(&self) -> f64 {
        self.beat + self.duration
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub cantus_firmus: Vec<Note>,
    #[serde(rename = "speciesType")]
    pub species: Species,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    Boundary,
    Cadence,
    VerticalConsonance,
    Suspension,
    ParallelPerfect,
    HiddenPerfect,
    VoiceCrossing,
    VoiceOverlap,
    LargeLeap,
    Repetition,
    Rhythm,
    Unaligned,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleViolation {
    pub beat_index: usize,
    pub rule_id: RuleId,
    pub severity: Severity,
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub violations: Vec<RuleViolation>,
    pub is_valid: bool, // no error-severity violations
    pub passed: bool,   // no violations at all
}

impl ValidationResult {
    pub fn from_violations(violations: Vec<RuleViolation>) -> Self {
        let is_valid = !violations.iter().any(|v| v.severity == Severity::Error);
        let passed = violations.is_empty();
        ValidationResult {
            violations,
            is_valid,
            passed,
        }
    }

    pub fn has_rule_at(&self, rule_id: RuleId, beat_index: usize) -> bool {
        self.violations
            .iter()
            .any(|v| v.rule_id == rule_id && v.beat_index == beat_index)
    }
}

/// Which voice the cantus firmus is written in.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CantusPosition {
    /// Counterpoint is written above the cantus firmus.
    #[default]
    Lower,
    Upper,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorOptions {
    pub cantus_position: CantusPosition,
    /// Largest melodic leap in semitones before a large-leap warning.
    pub max_leap: i32,
    /// Upper-voice motion above this many semitones counts as a leap for hidden perfects.
    pub hidden_leap: i32,
    /// Overrides the species limit on consecutive repeated pitches.
    pub max_repeats: Option<usize>,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        ValidatorOptions {
            cantus_position: CantusPosition::Lower,
            max_leap: 12,
            hidden_leap: 2,
            max_repeats: None,
        }
    }
}

// Wire types

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub cantus_firmus: Vec<Note>,
    pub user_notes: Vec<Note>,
    pub species_type: i64,
    #[serde(default)]
    pub options: ValidatorOptions,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub success: bool,
    pub violations: Vec<RuleViolation>,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl ValidationResponse {
    pub fn from_outcome(outcome: Result<ValidationResult, CounterpointError>) -> Self {
        match outcome {
            Ok(result) => ValidationResponse {
                success: true,
                violations: result.violations,
                is_valid: result.is_valid,
                error: None,
            },
            Err(e) => ValidationResponse {
                success: false,
                violations: Vec::new(),
                is_valid: false,
                error: Some(e.to_string()),
            },
        }
    }
}
