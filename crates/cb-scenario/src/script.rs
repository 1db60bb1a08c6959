//! Deterministic code-blue script.
//!
//! Phase timing and arrhythmia choice come from an [`Lcg`] seeded by the
//! diagnosis id, so a given diagnosis always replays the same schedule.
//! Every query builds a *fresh* generator: asking for the same duration or
//! roll twice returns the same answer.

use crate::diagnosis::Diagnosis;
use cb_core::Lcg;
use cb_physio::Rhythm;
use serde::{Deserialize, Serialize};
use std::fmt;

const PREBRIEF_MS: f64 = 30_000.0;
const DETERIORATION_BASE_MS: f64 = 120_000.0;
const DETERIORATION_SPREAD_MS: f64 = 120_000.0;
const ARREST_WINDOW_MS: f64 = 60_000.0;
const CODE_BLUE_MS: f64 = 120_000.0;
const ROSC_MS: f64 = 120_000.0;

const FIRST_CHECK_BASE_MS: f64 = 90_000.0;
const FIRST_CHECK_SPREAD_MS: f64 = 45_000.0;

/// Interval between follow-up arrhythmia checks.
pub const ARRHYTHMIA_RECHECK_MS: f64 = 90_000.0;

const EARLY_ARREST_RISK: f64 = 0.2;
const EARLY_ARREST_MS: f64 = 110_000.0;
const LATE_ARREST_MS: f64 = 150_000.0;

/// Stages of the scripted timeline. Strictly linear; ROSC is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodeBluePhase {
    Prebrief,
    Deterioration,
    ArrestWindow,
    CodeBlue,
    Rosc,
}

impl CodeBluePhase {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Prebrief => Some(Self::Deterioration),
            Self::Deterioration => Some(Self::ArrestWindow),
            Self::ArrestWindow => Some(Self::CodeBlue),
            Self::CodeBlue => Some(Self::Rosc),
            Self::Rosc => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prebrief => "PREBRIEF",
            Self::Deterioration => "DETERIORATION",
            Self::ArrestWindow => "ARREST_WINDOW",
            Self::CodeBlue => "CODE_BLUE",
            Self::Rosc => "ROSC",
        }
    }
}

impl fmt::Display for CodeBluePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptState {
    pub phase: CodeBluePhase,
    pub phase_started_ms: f64,
    pub arrest_triggered: bool,
    pub next_arrhythmia_check_ms: f64,
    pub target_arrhythmia: Rhythm,
}

impl ScriptState {
    /// Fresh script for `diagnosis_id`: PREBRIEF at t=0, first arrhythmia
    /// check 90-135 s in, target drawn from VF/VT/PEA.
    pub fn initial(diagnosis_id: &str) -> Self {
        let mut rng = Lcg::from_key(diagnosis_id);
        let pool = [Rhythm::Vf, Rhythm::Vt, Rhythm::Pea];
        let next_check = FIRST_CHECK_BASE_MS + rng.next_f64() * FIRST_CHECK_SPREAD_MS;
        let index = ((rng.next_f64() * pool.len() as f64) as usize).min(pool.len() - 1);
        Self {
            phase: CodeBluePhase::Prebrief,
            phase_started_ms: 0.0,
            arrest_triggered: false,
            next_arrhythmia_check_ms: next_check,
            target_arrhythmia: pool[index],
        }
    }
}

/// How long `phase` lasts for `diagnosis_id`, in milliseconds.
pub fn phase_duration_ms(phase: CodeBluePhase, diagnosis_id: &str) -> f64 {
    match phase {
        CodeBluePhase::Prebrief => PREBRIEF_MS,
        CodeBluePhase::Deterioration => {
            let mut rng = Lcg::from_key(diagnosis_id);
            DETERIORATION_BASE_MS + rng.next_f64() * DETERIORATION_SPREAD_MS
        }
        CodeBluePhase::ArrestWindow => ARREST_WINDOW_MS,
        CodeBluePhase::CodeBlue => CODE_BLUE_MS,
        CodeBluePhase::Rosc => ROSC_MS,
    }
}

/// Move to the next phase once the current one has run its course.
///
/// Advances at most one phase per call. ROSC never advances.
pub fn advance_phase(state: &ScriptState, now_ms: f64, diagnosis_id: &str) -> ScriptState {
    let duration = phase_duration_ms(state.phase, diagnosis_id);
    if now_ms - state.phase_started_ms < duration {
        return *state;
    }
    match state.phase.next() {
        Some(phase) => ScriptState {
            phase,
            phase_started_ms: now_ms,
            ..*state
        },
        None => *state,
    }
}

/// True once elapsed time passes 110 s (arrhythmia risk >= 0.2) or 150 s.
pub fn should_trigger_arrest(dx: &Diagnosis, now_ms: f64) -> bool {
    if dx.progression.arrhythmia_risk < EARLY_ARREST_RISK {
        now_ms > LATE_ARREST_MS
    } else {
        now_ms > EARLY_ARREST_MS
    }
}

/// One draw from a fresh generator: VF below 0.4, VT below 0.7, else PEA.
pub fn roll_arrhythmia(diagnosis_id: &str) -> Rhythm {
    let roll = Lcg::from_key(diagnosis_id).next_f64();
    if roll < 0.4 {
        Rhythm::Vf
    } else if roll < 0.7 {
        Rhythm::Vt
    } else {
        Rhythm::Pea
    }
}
