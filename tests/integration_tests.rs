//! Integration tests for the counterpoint validator
//!
//! Drives the JSON request/response shapes the web client exchanges with the
//! validator, plus the exercise library and MusicXML reader feeding it.

use counterpoint_rs::exercises::cantus::generate_exercise;
use counterpoint_rs::parser::musicxml::parse_cantus_firmus;
use counterpoint_rs::{
    validate, validate_request, Note, RuleId, Species, ValidationRequest, ValidationResponse,
};
use serde_json::{json, Value};

fn respond(request: Value) -> Value {
    let request: ValidationRequest = serde_json::from_value(request).unwrap();
    let response = ValidationResponse::from_outcome(validate_request(&request));
    serde_json::to_value(&response).unwrap()
}

fn has_violation(response: &Value, rule_id: &str, beat_index: u64) -> bool {
    response["violations"]
        .as_array()
        .unwrap()
        .iter()
        .any(|v| v["ruleId"] == rule_id && v["beatIndex"] == beat_index)
}

#[test]
fn test_parallel_fifths_regression() {
    let response = respond(json!({
        "cantusFirmus": [
            { "note": 60, "beat": 0, "duration": 1 },
            { "note": 62, "beat": 1, "duration": 1 }
        ],
        "userNotes": [
            { "note": 67, "beat": 0, "duration": 1 },
            { "note": 69, "beat": 1, "duration": 1 }
        ],
        "speciesType": 1
    }));
    assert_eq!(response["success"], true);
    assert_eq!(response["isValid"], false);
    assert!(has_violation(&response, "parallel-perfect", 1));
    let parallel = response["violations"]
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["ruleId"] == "parallel-perfect")
        .unwrap();
    assert_eq!(parallel["severity"], "error");
}

#[test]
fn test_first_species_dissonance() {
    let response = respond(json!({
        "cantusFirmus": [
            { "note": 60, "beat": 0, "duration": 4 },
            { "note": 60, "beat": 4, "duration": 4 }
        ],
        "userNotes": [
            { "note": 61, "beat": 0, "duration": 4 },
            { "note": 60, "beat": 4, "duration": 4 }
        ],
        "speciesType": 1
    }));
    assert!(has_violation(&response, "vertical-consonance", 0));
}

#[test]
fn test_second_species_passing_tone() {
    let response = respond(json!({
        "cantusFirmus": [
            { "note": 60, "beat": 0, "duration": 4 },
            { "note": 62, "beat": 4, "duration": 4 }
        ],
        "userNotes": [
            { "note": 64, "beat": 0, "duration": 2 },
            { "note": 63, "beat": 2, "duration": 2 },
            { "note": 65, "beat": 4, "duration": 2 },
            { "note": 67, "beat": 6, "duration": 2 }
        ],
        "speciesType": 2
    }));
    assert_eq!(response["success"], true);
    assert!(!has_violation(&response, "vertical-consonance", 1));
}

#[test]
fn test_final_major_third() {
    let response = respond(json!({
        "cantusFirmus": [
            { "note": 62, "beat": 0, "duration": 4 },
            { "note": 60, "beat": 4, "duration": 4 }
        ],
        "userNotes": [
            { "note": 69, "beat": 0, "duration": 4 },
            { "note": 64, "beat": 4, "duration": 4 }
        ],
        "speciesType": 1
    }));
    assert!(has_violation(&response, "boundary", 1));
}

#[test]
fn test_identical_requests_serialize_identically() {
    let request = json!({
        "cantusFirmus": [
            { "note": 60, "beat": 0, "duration": 4 },
            { "note": 62, "beat": 4, "duration": 4 },
            { "note": 60, "beat": 8, "duration": 4 }
        ],
        "userNotes": [
            { "note": 67, "beat": 0, "duration": 2 },
            { "note": 66, "beat": 2, "duration": 2 },
            { "note": 65, "beat": 4, "duration": 2 },
            { "note": 71, "beat": 6, "duration": 2 },
            { "note": 72, "beat": 8, "duration": 4 }
        ],
        "speciesType": 2
    });
    let first = serde_json::to_string(&respond(request.clone())).unwrap();
    let second = serde_json::to_string(&respond(request)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_empty_user_notes_is_invalid_input() {
    let response = respond(json!({
        "cantusFirmus": [{ "note": 60, "beat": 0, "duration": 4 }],
        "userNotes": [],
        "speciesType": 1
    }));
    assert_eq!(response["success"], false);
    assert_eq!(response["isValid"], false);
    assert!(response["violations"].as_array().unwrap().is_empty());
    assert!(response["error"].as_str().unwrap().starts_with("Invalid input"));
}

#[test]
fn test_out_of_range_pitch_is_invalid_input() {
    let response = respond(json!({
        "cantusFirmus": [{ "note": 60, "beat": 0, "duration": 4 }],
        "userNotes": [{ "note": 140, "beat": 0, "duration": 4 }],
        "speciesType": 1
    }));
    assert_eq!(response["success"], false);
}

#[test]
fn test_unknown_species() {
    let response = respond(json!({
        "cantusFirmus": [{ "note": 60, "beat": 0, "duration": 4 }],
        "userNotes": [{ "note": 72, "beat": 0, "duration": 4 }],
        "speciesType": 6
    }));
    assert_eq!(response["success"], false);
    assert!(response["error"].as_str().unwrap().contains("species 6"));
}

#[test]
fn test_options_are_optional_and_honoured() {
    let mut request = json!({
        "cantusFirmus": [
            { "note": 62, "beat": 0, "duration": 4 },
            { "note": 65, "beat": 4, "duration": 4 },
            { "note": 64, "beat": 8, "duration": 4 },
            { "note": 62, "beat": 12, "duration": 4 }
        ],
        "userNotes": [
            { "note": 50, "beat": 0, "duration": 4 },
            { "note": 50, "beat": 4, "duration": 4 },
            { "note": 52, "beat": 8, "duration": 4 },
            { "note": 50, "beat": 12, "duration": 4 }
        ],
        "speciesType": 1
    });
    let default = respond(request.clone());
    assert!(has_violation(&default, "voice-crossing", 0));

    request["options"] = json!({ "cantusPosition": "upper" });
    let upper = respond(request);
    assert!(!upper["violations"]
        .as_array()
        .unwrap()
        .iter()
        .any(|v| v["ruleId"] == "voice-crossing"));
}

#[test]
fn test_fux_dorian_solution_passes() {
    let exercise = generate_exercise("fux_dorian", "D4", Species::First).unwrap();
    let counterpoint: Vec<Note> = [69, 69, 67, 69, 71, 72, 72, 71, 74, 73, 74]
        .iter()
        .enumerate()
        .map(|(i, &p)| Note::new(p, i as f64 * 4.0, 4.0))
        .collect();

    let result = validate(&exercise, &counterpoint).unwrap();
    assert!(result.passed, "{:?}", result.violations);
    assert!(result.is_valid);
}

#[test]
fn test_musicxml_cantus_feeds_validator() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<score-partwise version="3.1">
  <part id="P1">
    <measure number="1">
      <attributes><divisions>1</divisions></attributes>
      <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration></note>
    </measure>
    <measure number="2">
      <note><pitch><step>D</step><octave>4</octave></pitch><duration>4</duration></note>
    </measure>
  </part>
</score-partwise>"#;
    let cantus = parse_cantus_firmus(xml).unwrap();
    let exercise = counterpoint_rs::Exercise {
        cantus_firmus: cantus,
        species: Species::First,
    };
    let counterpoint = vec![Note::new(67, 0.0, 4.0), Note::new(69, 4.0, 4.0)];
    let result = validate(&exercise, &counterpoint).unwrap();
    assert!(result.has_rule_at(RuleId::ParallelPerfect, 1));
}

#[test]
fn test_pitch_alias_on_the_wire() {
    let response = respond(json!({
        "cantusFirmus": [{ "pitch": 60, "beat": 0, "duration": 4 }],
        "userNotes": [{ "pitch": 72, "beat": 0, "duration": 4 }],
        "speciesType": 1
    }));
    assert_eq!(response["success"], true);
    assert_eq!(response["isValid"], true);
}
