use wasm_bindgen::prelude::*;

pub mod error;
pub mod exercises;
pub mod parser;
pub mod validation;

pub use error::CounterpointError;
pub use validation::engine::{validate, validate_request, validate_with_options};
pub use validation::species::Species;
pub use validation::types::{
    CantusPosition, Exercise, Note, RuleId, RuleViolation, Severity, ValidationRequest,
    ValidationResponse, ValidationResult, ValidatorOptions,
};

use tracing::debug;

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Validate `{cantusFirmus, userNotes, speciesType, options?}` and return
/// `{success, violations, isValid, error?}`.
///
/// Invalid notes or species come back as `success: false`; only a request
/// that cannot be deserialized at all is thrown to JS.
#[wasm_bindgen]
pub fn validate_counterpoint(request_js: JsValue) -> Result<JsValue, JsValue> {
    let request: ValidationRequest = serde_wasm_bindgen::from_value(request_js)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let outcome = validate_request(&request);
    if let Err(e) = &outcome {
        debug!(error = %e, "rejected counterpoint request");
    }
    to_js(&ValidationResponse::from_outcome(outcome))
}

/// Classify the harmonic interval between two MIDI pitches.
#[wasm_bindgen]
pub fn classify_interval(lower: i32, upper: i32) -> Result<JsValue, JsValue> {
    let interval = validation::interval::classify_interval(lower, upper)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&interval)
}

/// Classify the motion between two beats: "parallel", "similar", "oblique" or "contrary".
#[wasm_bindgen]
pub fn classify_motion(cf_prev: i32, cf_curr: i32, cp_prev: i32, cp_curr: i32) -> String {
    validation::motion::classify_motion(cf_prev, cf_curr, cp_prev, cp_curr)
        .name()
        .to_string()
}

/// Read a cantus firmus from the first part of a MusicXML document.
#[wasm_bindgen]
pub fn parse_cantus_firmus(xml: &str) -> Result<JsValue, JsValue> {
    let notes = parser::musicxml::parse_cantus_firmus(xml)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&notes)
}

/// Build an exercise from a stock cantus firmus transposed to `key`.
#[wasm_bindgen]
pub fn generate_exercise(
    cantus_id: &str,
    key: &str,
    species: f64,
) -> Result<JsValue, JsValue> {
    let species = Species::try_from(species).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let exercise = exercises::cantus::generate_exercise(cantus_id, key, species)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&exercise)
}

#[wasm_bindgen]
pub fn list_cantus_firmi() -> Result<JsValue, JsValue> {
    to_js(&exercises::cantus::list_cantus_firmi())
}

/// Get the five-stage species curriculum.
#[wasm_bindgen]
pub fn get_curriculum() -> Result<JsValue, JsValue> {
    to_js(&exercises::curriculum::get_curriculum())
}
