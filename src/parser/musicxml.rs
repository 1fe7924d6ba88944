use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::error::{CounterpointError, Result};
use crate::validation::types::Note;

pub fn midi_from_pitch(step: char, alter: i32, octave: i32) -> i32 {
    let base = match step {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => 0,
    };
    (octave + 1) * 12 + base + alter
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| std::str::from_utf8(&a.value).ok().map(str::to_string))
}

#[derive(Default)]
struct PendingNote {
    is_rest: bool,
    is_chord: bool,
    is_grace: bool,
    tie_stop: bool,
    duration_divs: Option<f64>,
    step: Option<char>,
    alter: i32,
    octave: Option<i32>,
}

/// Read the first part of a partwise MusicXML document as a cantus firmus.
///
/// Rests advance time without producing notes, chord tones and grace notes
/// are skipped, and tied notes are merged into one.
pub fn parse_cantus_firmus(xml: &str) -> Result<Vec<Note>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();

    let mut divisions: f64 = 1.0;
    let mut current_beat: f64 = 0.0;
    let mut notes: Vec<Note> = Vec::new();

    let mut current_tag: Option<&'static str> = None;
    let mut note: Option<PendingNote> = None;
    // Direction and length of a pending <backup> or <forward>.
    let mut cursor_shift: Option<(f64, f64)> = None;
    let mut in_part = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"part" => in_part = true,
                b"note" if in_part => note = Some(PendingNote::default()),
                b"backup" => cursor_shift = Some((-1.0, 0.0)),
                b"forward" => cursor_shift = Some((1.0, 0.0)),
                b"rest" => {
                    if let Some(n) = note.as_mut() {
                        n.is_rest = true;
                    }
                }
                b"divisions" => current_tag = Some("divisions"),
                b"duration" => current_tag = Some("duration"),
                b"step" => current_tag = Some("step"),
                b"alter" => current_tag = Some("alter"),
                b"octave" => current_tag = Some("octave"),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if let Some(n) = note.as_mut() {
                    match e.name().as_ref() {
                        b"rest" => n.is_rest = true,
                        b"chord" => n.is_chord = true,
                        b"grace" => n.is_grace = true,
                        b"tie" => {
                            if attr_value(e, b"type").as_deref() == Some("stop") {
                                n.tie_stop = true;
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(tag) = current_tag.take() {
                    let text = e
                        .unescape()
                        .map_err(|e| CounterpointError::Parse(e.to_string()))?;
                    match tag {
                        "divisions" => {
                            if let Ok(v) = text.parse::<f64>() {
                                if v > 0.0 {
                                    divisions = v;
                                }
                            }
                        }
                        "duration" => {
                            if let Ok(v) = text.parse::<f64>() {
                                if let Some(n) = note.as_mut() {
                                    n.duration_divs = Some(v);
                                } else if let Some((_, divs)) = cursor_shift.as_mut() {
                                    *divs = v;
                                }
                            }
                        }
                        "step" => {
                            if let Some(n) = note.as_mut() {
                                n.step = text.chars().next();
                            }
                        }
                        "alter" => {
                            if let (Some(n), Ok(v)) = (note.as_mut(), text.parse::<f64>()) {
                                n.alter = v.round() as i32;
                            }
                        }
                        "octave" => {
                            if let (Some(n), Ok(v)) = (note.as_mut(), text.parse::<i32>()) {
                                n.octave = Some(v);
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"note" => {
                    if let Some(n) = note.take() {
                        finish_note(n, divisions, &mut current_beat, &mut notes)?;
                    }
                }
                b"backup" | b"forward" => {
                    if let Some((direction, divs)) = cursor_shift.take() {
                        current_beat = (current_beat + direction * divs / divisions).max(0.0);
                    }
                }
                // The cantus firmus lives in the first part only.
                b"part" => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(CounterpointError::Parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if notes.is_empty() {
        return Err(CounterpointError::Parse(
            "no pitched notes found in the first part".to_string(),
        ));
    }

    debug!(notes = notes.len(), total_beats = current_beat, "parsed cantus firmus");
    Ok(notes)
}

fn finish_note(
    n: PendingNote,
    divisions: f64,
    current_beat: &mut f64,
    notes: &mut Vec<Note>,
) -> Result<()> {
    if n.is_grace || n.is_chord {
        return Ok(());
    }
    let duration = n.duration_divs.unwrap_or(0.0) / divisions;
    let start = *current_beat;
    *current_beat += duration;

    if n.is_rest || duration <= 0.0 {
        return Ok(());
    }

    let step = n
        .step
        .ok_or_else(|| CounterpointError::Parse("Missing pitch step".to_string()))?;
    let octave = n
        .octave
        .ok_or_else(|| CounterpointError::Parse("Missing pitch octave".to_string()))?;
    let pitch = midi_from_pitch(step, n.alter, octave);

    if n.tie_stop {
        if let Some(last) = notes.last_mut() {
            if last.pitch == pitch && (last.end() - start).abs() < 1e-9 {
                last.duration += duration;
                return Ok(());
            }
        }
    }

    notes.push(Note::new(pitch, start, duration));
    Ok(())
}
