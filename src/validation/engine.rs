use tracing::{debug, trace};

use crate::error::{CounterpointError, Result};
use crate::validation::interval::{check_pitch, classify_sounding, midi_to_name, Interval};
use crate::validation::motion::{classify_motion, Motion};
use crate::validation::species::{Species, SpeciesConfig, POSITION_EPSILON};
use crate::validation::types::*;

/// A time point where both voices sound and at least one of them attacks.
#[derive(Clone, Copy, Debug)]
struct Simultaneity {
    time: f64,
    cf_index: usize,
    cp_index: usize,
    cf_attack: bool,
    cp_attack: bool,
    cf_pitch: i32,
    cp_pitch: i32,
    interval: Interval,
    motion: Option<Motion>,
}

impl Simultaneity {
    fn upper_is_counterpoint(&self) -> bool {
        self.cp_pitch >= self.cf_pitch
    }
}

/// Validate a counterpoint voice against an exercise with default options.
pub fn validate(exercise: &Exercise, candidate: &[Note]) -> Result<ValidationResult> {
    validate_with_options(exercise, candidate, &ValidatorOptions::default())
}

pub fn validate_with_options(
    exercise: &Exercise,
    candidate: &[Note],
    options: &ValidatorOptions,
) -> Result<ValidationResult> {
    check_rules(&exercise.cantus_firmus, candidate, exercise.species, options)
}

/// Validate a deserialized request from the web client.
pub fn validate_request(request: &ValidationRequest) -> Result<ValidationResult> {
    let species = Species::try_from(request.species_type)?;
    check_rules(
        &request.cantus_firmus,
        &request.user_notes,
        species,
        &request.options,
    )
}

fn check_rules(
    cantus: &[Note],
    counterpoint: &[Note],
    species: Species,
    options: &ValidatorOptions,
) -> Result<ValidationResult> {
    check_voice("cantusFirmus", cantus)?;
    check_voice("userNotes", counterpoint)?;

    let config = species.config();
    debug!(
        species = species.number(),
        cantus_notes = cantus.len(),
        counterpoint_notes = counterpoint.len(),
        "validating counterpoint"
    );

    let sims = build_simultaneities(cantus, counterpoint)?;
    let checker = RuleChecker {
        cantus,
        counterpoint,
        species,
        config,
        options,
        sims: &sims,
        runs: repeat_runs(counterpoint),
    };

    let mut violations = Vec::new();
    for (i, note) in counterpoint.iter().enumerate() {
        if !sims.iter().any(|sim| sim.cp_index == i) {
            violations.push(RuleViolation {
                beat_index: i,
                rule_id: RuleId::Unaligned,
                severity: Severity::Warning,
                message: format!(
                    "{} at beat {} does not sound against the cantus firmus",
                    midi_to_name(note.pitch),
                    note.beat
                ),
            });
        }
    }

    if sims.is_empty() {
        violations.push(RuleViolation {
            beat_index: 0,
            rule_id: RuleId::Boundary,
            severity: Severity::Error,
            message: "The counterpoint never sounds against the cantus firmus".to_string(),
        });
    }

    for pos in 0..sims.len() {
        trace!(
            time = sims[pos].time,
            cp_index = sims[pos].cp_index,
            interval = sims[pos].interval.simple,
            motion = ?sims[pos].motion,
            "simultaneity"
        );
        checker.check(pos, &mut violations);
    }

    // Unaligned notes are reported before the beat they belong to.
    violations.sort_by_key(|v| v.beat_index);

    let result = ValidationResult::from_violations(violations);
    debug!(
        violations = result.violations.len(),
        is_valid = result.is_valid,
        "validation finished"
    );
    Ok(result)
}

fn check_voice(name: &str, notes: &[Note]) -> Result<()> {
    if notes.is_empty() {
        return Err(CounterpointError::InvalidInput(format!("{} is empty", name)));
    }
    for (i, note) in notes.iter().enumerate() {
        if check_pitch(note.pitch).is_err() {
            return Err(CounterpointError::InvalidInput(format!(
                "{} note {} has pitch {} outside 0-127",
                name, i, note.pitch
            )));
        }
        if !note.beat.is_finite() || note.beat < 0.0 {
            return Err(CounterpointError::InvalidInput(format!(
                "{} note {} has invalid beat {}",
                name, i, note.beat
            )));
        }
        if !note.duration.is_finite() || note.duration <= 0.0 {
            return Err(CounterpointError::InvalidInput(format!(
                "{} note {} has invalid duration {}",
                name, i, note.duration
            )));
        }
        if i > 0 && note.beat <= notes[i - 1].beat + POSITION_EPSILON {
            return Err(CounterpointError::InvalidInput(format!(
                "{} notes must be in increasing beat order (note {} at beat {})",
                name, i, note.beat
            )));
        }
    }
    Ok(())
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < POSITION_EPSILON
}

/// Index of the note sounding at `time`, if any.
fn sounding_at(notes: &[Note], time: f64) -> Option<usize> {
    let idx = notes.partition_point(|n| n.beat <= time + POSITION_EPSILON);
    if idx == 0 {
        return None;
    }
    let i = idx - 1;
    if notes[i].end() > time + POSITION_EPSILON {
        Some(i)
    } else {
        None
    }
}

fn build_simultaneities(cantus: &[Note], counterpoint: &[Note]) -> Result<Vec<Simultaneity>> {
    let mut times: Vec<f64> = cantus
        .iter()
        .chain(counterpoint.iter())
        .map(|n| n.beat)
        .collect();
    times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    times.dedup_by(|a, b| approx_eq(*a, *b));

    let mut sims: Vec<Simultaneity> = Vec::new();
    for time in times {
        let (Some(cf_index), Some(cp_index)) =
            (sounding_at(cantus, time), sounding_at(counterpoint, time))
        else {
            continue;
        };
        let cf = &cantus[cf_index];
        let cp = &counterpoint[cp_index];
        let motion = sims
            .last()
            .map(|prev| classify_motion(prev.cf_pitch, cf.pitch, prev.cp_pitch, cp.pitch));

        sims.push(Simultaneity {
            time,
            cf_index,
            cp_index,
            cf_attack: approx_eq(cf.beat, time),
            cp_attack: approx_eq(cp.beat, time),
            cf_pitch: cf.pitch,
            cp_pitch: cp.pitch,
            interval: classify_sounding(cf.pitch, cp.pitch)?,
            motion,
        });
    }
    Ok(sims)
}

/// Length of the run of identical pitches ending at each note.
fn repeat_runs(notes: &[Note]) -> Vec<usize> {
    let mut runs = Vec::with_capacity(notes.len());
    for (i, note) in notes.iter().enumerate() {
        let run = if i > 0 && notes[i - 1].pitch == note.pitch {
            runs[i - 1] + 1
        } else {
            1
        };
        runs.push(run);
    }
    runs
}

fn is_step(from: i32, to: i32) -> bool {
    matches!((to - from).abs(), 1 | 2)
}

struct RuleChecker<'a> {
    cantus: &'a [Note],
    counterpoint: &'a [Note],
    species: Species,
    config: &'a SpeciesConfig,
    options: &'a ValidatorOptions,
    sims: &'a [Simultaneity],
    runs: Vec<usize>,
}

impl<'a> RuleChecker<'a> {
    fn check(&self, pos: usize, out: &mut Vec<RuleViolation>) {
        let sim = &self.sims[pos];
        let prev = if pos > 0 { Some(&self.sims[pos - 1]) } else { None };

        self.check_boundary(pos, sim, out);
        self.check_vertical(sim, out);
        if let Some(prev) = prev {
            self.check_parallel_perfect(prev, sim, out);
            self.check_hidden_perfect(prev, sim, out);
        }
        self.check_voice_position(prev, sim, out);
        if sim.cp_attack {
            self.check_repetition(sim, out);
            self.check_rhythm(sim, out);
        }
    }

    fn push(
        &self,
        out: &mut Vec<RuleViolation>,
        sim: &Simultaneity,
        rule_id: RuleId,
        severity: Severity,
        message: String,
    ) {
        out.push(RuleViolation {
            beat_index: sim.cp_index,
            rule_id,
            severity,
            message,
        });
    }

    fn fraction_in_cantus(&self, sim: &Simultaneity) -> f64 {
        let cf = &self.cantus[sim.cf_index];
        (sim.time - cf.beat) / cf.duration
    }

    /// The counterpoint note continues a tied note rather than striking anew.
    fn is_held(&self, sim: &Simultaneity) -> bool {
        if !sim.cp_attack {
            return true;
        }
        if !self.config.syncopated || sim.cp_index == 0 {
            return false;
        }
        let prev = &self.counterpoint[sim.cp_index - 1];
        let curr = &self.counterpoint[sim.cp_index];
        prev.pitch == curr.pitch && approx_eq(prev.end(), curr.beat)
    }

    // 1. Boundary rules

    fn check_boundary(&self, pos: usize, sim: &Simultaneity, out: &mut Vec<RuleViolation>) {
        let last = self.sims.len() - 1;

        if pos == 0 {
            let opening_ok = sim.interval.is_octave_class()
                || (sim.interval.is_perfect() && sim.upper_is_counterpoint());
            if !opening_ok {
                let message = if sim.interval.is_perfect() {
                    format!(
                        "Opening {} below the cantus firmus; begin on a unison or octave",
                        sim.interval.describe()
                    )
                } else {
                    format!(
                        "Opening interval must be a perfect consonance, found {}",
                        sim.interval.describe()
                    )
                };
                self.push(out, sim, RuleId::Boundary, Severity::Error, message);
            }
        }

        if pos == last {
            if !sim.interval.is_octave_class() {
                self.push(
                    out,
                    sim,
                    RuleId::Boundary,
                    Severity::Error,
                    format!(
                        "Final interval must be a unison or octave, found {}",
                        sim.interval.describe()
                    ),
                );
            }
            if let Some(motion) = sim.motion {
                if motion != Motion::Contrary {
                    self.push(
                        out,
                        sim,
                        RuleId::Cadence,
                        Severity::Error,
                        format!(
                            "The final must be approached by contrary motion, found {} motion",
                            motion.name()
                        ),
                    );
                }
            }
            if self.species != Species::First && sim.cp_index > 0 {
                let from = self.counterpoint[sim.cp_index - 1].pitch;
                if !is_step(from, sim.cp_pitch) {
                    self.push(
                        out,
                        sim,
                        RuleId::Cadence,
                        Severity::Error,
                        format!(
                            "The counterpoint must approach the final by step, not {} to {}",
                            midi_to_name(from),
                            midi_to_name(sim.cp_pitch)
                        ),
                    );
                }
            }
        }
    }

    // 2. Vertical consonance and suspensions

    fn check_vertical(&self, sim: &Simultaneity, out: &mut Vec<RuleViolation>) {
        if !sim.interval.is_dissonant() {
            return;
        }
        let described = sim.interval.describe();

        if self.config.suspensions && sim.cf_attack && self.is_held(sim) {
            self.check_suspension(sim, out);
            return;
        }

        if self.species == Species::First {
            self.push(
                out,
                sim,
                RuleId::VerticalConsonance,
                Severity::Error,
                format!(
                    "Dissonant {} between {} and {}; first species allows only consonances",
                    described,
                    midi_to_name(sim.cf_pitch),
                    midi_to_name(sim.cp_pitch)
                ),
            );
            return;
        }

        let weak = sim.cp_attack && self.config.is_weak(self.fraction_in_cantus(sim));
        if !weak {
            let message = if self.config.suspensions {
                format!("Dissonant {} is not a prepared suspension", described)
            } else {
                format!("Dissonant {} on a strong beat", described)
            };
            self.push(out, sim, RuleId::VerticalConsonance, Severity::Error, message);
            return;
        }

        if !self.is_step_figure(sim.cp_index) {
            self.push(
                out,
                sim,
                RuleId::VerticalConsonance,
                Severity::Error,
                format!("Dissonant {} must be approached and left by step", described),
            );
        }
    }

    /// Passing or neighbour tone: a step from both neighbours in the voice.
    fn is_step_figure(&self, index: usize) -> bool {
        if index == 0 || index + 1 >= self.counterpoint.len() {
            return false;
        }
        let pitch = self.counterpoint[index].pitch;
        is_step(self.counterpoint[index - 1].pitch, pitch)
            && is_step(pitch, self.counterpoint[index + 1].pitch)
    }

    fn check_suspension(&self, sim: &Simultaneity, out: &mut Vec<RuleViolation>) {
        let resolution = self.counterpoint.get(sim.cp_index + 1);
        let resolved = resolution.is_some_and(|next| {
            let drop = sim.cp_pitch - next.pitch;
            let consonant = sounding_at(self.cantus, next.beat)
                .and_then(|cf| classify_sounding(self.cantus[cf].pitch, next.pitch).ok())
                .is_some_and(|iv| iv.is_consonant());
            (1..=2).contains(&drop) && consonant
        });

        if !resolved {
            self.push(
                out,
                sim,
                RuleId::Suspension,
                Severity::Error,
                format!(
                    "Suspended {} on {} must resolve down by step to a consonance",
                    sim.interval.describe(),
                    midi_to_name(sim.cp_pitch)
                ),
            );
        }
    }

    // 3. Parallel perfect consonances

    fn check_parallel_perfect(
        &self,
        prev: &Simultaneity,
        sim: &Simultaneity,
        out: &mut Vec<RuleViolation>,
    ) {
        if sim.motion != Some(Motion::Parallel)
            || !prev.interval.is_perfect()
            || !sim.interval.is_perfect()
            || prev.interval.simple != sim.interval.simple
        {
            return;
        }
        let kind = if sim.interval.simple == 7 {
            "fifths"
        } else if prev.interval.is_unison() && sim.interval.is_unison() {
            "unisons"
        } else {
            "octaves"
        };
        self.push(
            out,
            sim,
            RuleId::ParallelPerfect,
            Severity::Error,
            format!(
                "Parallel {} from {}/{} to {}/{}",
                kind,
                midi_to_name(prev.cf_pitch),
                midi_to_name(prev.cp_pitch),
                midi_to_name(sim.cf_pitch),
                midi_to_name(sim.cp_pitch)
            ),
        );
    }

    // 4. Direct (hidden) perfect consonances

    fn check_hidden_perfect(
        &self,
        prev: &Simultaneity,
        sim: &Simultaneity,
        out: &mut Vec<RuleViolation>,
    ) {
        if sim.motion != Some(Motion::Similar) || !sim.interval.is_perfect() {
            return;
        }
        let upper_move = if sim.upper_is_counterpoint() {
            sim.cp_pitch - prev.cp_pitch
        } else {
            sim.cf_pitch - prev.cf_pitch
        };
        if upper_move.abs() > self.options.hidden_leap {
            self.push(
                out,
                sim,
                RuleId::HiddenPerfect,
                Severity::Warning,
                format!(
                    "Hidden {} approached by similar motion with a leap in the upper voice",
                    sim.interval.describe()
                ),
            );
        }
    }

    // 5. Crossing, overlap and leaps

    fn check_voice_position(
        &self,
        prev: Option<&Simultaneity>,
        sim: &Simultaneity,
        out: &mut Vec<RuleViolation>,
    ) {
        let cp_above = self.options.cantus_position == CantusPosition::Lower;
        let crossed = if cp_above {
            sim.cp_pitch < sim.cf_pitch
        } else {
            sim.cp_pitch > sim.cf_pitch
        };

        if crossed {
            self.push(
                out,
                sim,
                RuleId::VoiceCrossing,
                Severity::Warning,
                format!(
                    "Counterpoint {} crosses {} the cantus firmus {}",
                    midi_to_name(sim.cp_pitch),
                    if cp_above { "below" } else { "above" },
                    midi_to_name(sim.cf_pitch)
                ),
            );
        } else if let Some(prev) = prev {
            let overlapped = if cp_above {
                sim.cp_pitch < prev.cf_pitch
            } else {
                sim.cp_pitch > prev.cf_pitch
            };
            if overlapped && sim.cp_index != prev.cp_index {
                self.push(
                    out,
                    sim,
                    RuleId::VoiceOverlap,
                    Severity::Warning,
                    format!(
                        "Counterpoint {} overlaps the previous cantus firmus note {}",
                        midi_to_name(sim.cp_pitch),
                        midi_to_name(prev.cf_pitch)
                    ),
                );
            }
        }

        if sim.cp_attack && sim.cp_index > 0 {
            let from = self.counterpoint[sim.cp_index - 1].pitch;
            let leap = (sim.cp_pitch - from).abs();
            if leap > self.options.max_leap {
                self.push(
                    out,
                    sim,
                    RuleId::LargeLeap,
                    Severity::Warning,
                    format!(
                        "Leap of {} semitones from {} to {} exceeds the limit of {}",
                        leap,
                        midi_to_name(from),
                        midi_to_name(sim.cp_pitch),
                        self.options.max_leap
                    ),
                );
            }
        }
    }

    // 6. Repetition

    fn check_repetition(&self, sim: &Simultaneity, out: &mut Vec<RuleViolation>) {
        let max = self.options.max_repeats.unwrap_or(self.config.max_repeats);
        if self.runs[sim.cp_index] == max + 1 {
            self.push(
                out,
                sim,
                RuleId::Repetition,
                Severity::Warning,
                format!(
                    "{} is struck more than {} time{} in a row",
                    midi_to_name(sim.cp_pitch),
                    max,
                    if max == 1 { "" } else { "s" }
                ),
            );
        }
    }

    // 7. Note values against the species ratio

    fn check_rhythm(&self, sim: &Simultaneity, out: &mut Vec<RuleViolation>) {
        let Some(ratio) = self.config.ratio else {
            return;
        };
        let note = &self.counterpoint[sim.cp_index];
        let cf = &self.cantus[sim.cf_index];
        let fraction = self.fraction_in_cantus(sim);
        let is_final = sim.cp_index + 1 == self.counterpoint.len();

        let message = if is_final {
            let on_last = sim.cf_index + 1 == self.cantus.len() && approx_eq(fraction, 0.0);
            (!on_last).then(|| {
                "The final note should begin with the last cantus firmus note".to_string()
            })
        } else if self.config.syncopated {
            let on_grid = approx_eq(fraction, 0.0) || approx_eq(fraction, 0.5);
            (!on_grid).then(|| {
                "Fourth species notes should enter on the downbeat or the half".to_string()
            })
        } else {
            let unit = cf.duration / ratio as f64;
            let steps = fraction * ratio as f64;
            let aligned = approx_eq(steps, steps.round());
            (!aligned || !approx_eq(note.duration, unit)).then(|| {
                format!(
                    "Expected notes of {} beat{} for {}",
                    unit,
                    if approx_eq(unit, 1.0) { "" } else { "s" },
                    self.species.name()
                )
            })
        };

        if let Some(message) = message {
            self.push(out, sim, RuleId::Rhythm, Severity::Warning, message);
        }
    }
}
