//! Code-blue simulation engine.
//!
//! Owns vitals, interventions, labs, imaging, simulation state and the action
//! log for one run, and drives them from the deterministic script and the
//! staged physiology step. Everything is replaced wholesale on [`SimEngine::reset`].

use crate::action::{Action, ActionEvent, ActionLog, push_newest_first};
use crate::engine::ScenarioEngine;
use cb_core::{IdSequence, clamp, decay_linear};
use cb_physio::{Interventions, Rhythm, StepContext, Vitals, apply_defib, clamp_vitals, step_vitals};
use cb_scenario::{
    ARRHYTHMIA_RECHECK_MS, ActionKind, CodeBluePhase, Diagnosis, DiagnosisCatalog, Imaging, Labs,
    ScriptState, advance_phase, roll_arrhythmia, should_trigger_arrest,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const INITIAL_SCORE: i32 = 50;
pub const SCORE_RANGE: (i32, i32) = (0, 100);
pub const NOTE_CAPACITY: usize = 20;
pub const ALERT_CAPACITY: usize = 6;
pub const RECENT_ACTIONS: usize = 8;

const FIO2_STEP: f64 = 0.05;
const PEEP_STEP: f64 = 1.0;
const PEEP_RANGE: (f64, f64) = (4.0, 18.0);
const O2_FLOW_RANGE: (f64, f64) = (0.0, 15.0);

/// Linear decay spans for the residual drug effects.
const EPI_DECAY_MS: f64 = 30_000.0;
const FLUID_DECAY_MS: f64 = 45_000.0;
/// Effect added on top of epinephrine while pressors run.
const PRESSOR_EFFECT: f64 = 0.4;
const PRESSOR_SHOCK_FACTOR: f64 = 0.5;
const ANTIBIOTIC_HYPOXIA_FACTOR: f64 = 0.7;

const WIN_GAIN: i32 = 2;
const OVERLOAD_BOLUS_PENALTY: i32 = 2;
const VOLUME_OVERLOAD_ID: &str = "dx_volume_overload";
const SCORE_SPO2_FLOOR: f64 = 85.0;
const SCORE_MAP_FLOOR: f64 = 55.0;

/// Loss conditions crossed so far in this run. Reported only; the run continues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossFlags {
    pub prolonged_asystole: bool,
    pub sustained_hypoxia: bool,
    pub sustained_hypotension: bool,
}

impl LossFlags {
    pub fn any(&self) -> bool {
        self.prolonged_asystole || self.sustained_hypoxia || self.sustained_hypotension
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimState {
    pub time_ms: f64,
    pub phase: CodeBluePhase,
    pub diagnosis_id: String,
    /// Always within [`SCORE_RANGE`].
    pub score: i32,
    /// Newest first, at most [`NOTE_CAPACITY`].
    pub notes: Vec<String>,
    /// Newest first, at most [`ALERT_CAPACITY`], each prefixed `t=<sec>s`.
    pub alerts: Vec<String>,
    /// Kinds of the newest [`RECENT_ACTIONS`] log entries, oldest first.
    pub last_actions: Vec<ActionKind>,
    pub losses: LossFlags,
}

impl SimState {
    fn initial(diagnosis_id: &str) -> Self {
        Self {
            time_ms: 0.0,
            phase: CodeBluePhase::Prebrief,
            diagnosis_id: diagnosis_id.to_string(),
            score: INITIAL_SCORE,
            notes: Vec::new(),
            alerts: Vec::new(),
            last_actions: Vec::new(),
            losses: LossFlags::default(),
        }
    }
}

/// Everything a renderer needs, copied out of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlueSnapshot {
    pub vitals: Vitals,
    pub state: SimState,
    pub interventions: Interventions,
    pub labs: Labs,
    pub imaging: Imaging,
    pub log: Vec<ActionEvent>,
}

/// Start time of each continuous below-threshold excursion.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ExcursionTimers {
    arrest_start_ms: Option<f64>,
    spo2_low_since_ms: Option<f64>,
    map_low_since_ms: Option<f64>,
    spo2_reported: bool,
    map_reported: bool,
    asystole_reported: bool,
}

#[derive(Debug, Clone)]
pub struct SimEngine {
    catalog: Arc<DiagnosisCatalog>,
    vitals: Vitals,
    state: SimState,
    labs: Labs,
    imaging: Imaging,
    interventions: Interventions,
    script: ScriptState,
    log: ActionLog,
    ids: IdSequence,
    epi_effect: f64,
    fluid_effect: f64,
    timers: ExcursionTimers,
}

fn initial_vitals(dx: &Diagnosis) -> Vitals {
    clamp_vitals(dx.baseline_vitals.with_derived_map())
}

impl SimEngine {
    /// Start a run of `diagnosis_id` (unknown ids use the catalog default).
    pub fn new(catalog: Arc<DiagnosisCatalog>, diagnosis_id: &str) -> Self {
        let dx = catalog.get(diagnosis_id);
        let (vitals, state, labs, imaging, script) = (
            initial_vitals(dx),
            SimState::initial(&dx.id),
            dx.labs,
            dx.imaging.clone(),
            ScriptState::initial(&dx.id),
        );
        Self {
            vitals,
            state,
            labs,
            imaging,
            interventions: Interventions::default(),
            script,
            log: ActionLog::default(),
            ids: IdSequence::new(),
            epi_effect: 0.0,
            fluid_effect: 0.0,
            timers: ExcursionTimers::default(),
            catalog,
        }
    }

    /// Engine over the built-in catalog.
    pub fn with_builtin_catalog(diagnosis_id: &str) -> Self {
        Self::new(Arc::new(DiagnosisCatalog::builtin()), diagnosis_id)
    }

    pub fn catalog(&self) -> &Arc<DiagnosisCatalog> {
        &self.catalog
    }

    pub fn diagnosis(&self) -> &Diagnosis {
        self.catalog.get(&self.state.diagnosis_id)
    }

    pub fn vitals(&self) -> Vitals {
        self.vitals
    }

    pub fn state(&self) -> SimState {
        self.state.clone()
    }

    pub fn labs(&self) -> Labs {
        self.labs
    }

    pub fn imaging(&self) -> Imaging {
        self.imaging.clone()
    }

    pub fn interventions(&self) -> Interventions {
        self.interventions
    }

    pub fn script(&self) -> ScriptState {
        self.script
    }

    /// Recorded actions, oldest first.
    pub fn log(&self) -> Vec<ActionEvent> {
        self.log.to_vec()
    }

    pub fn epi_effect(&self) -> f64 {
        self.epi_effect
    }

    pub fn fluid_effect(&self) -> f64 {
        self.fluid_effect
    }

    /// Start of the current continuous asystole/PEA episode, if any.
    pub fn arrest_start_ms(&self) -> Option<f64> {
        self.timers.arrest_start_ms
    }

    /// Shorthand for dispatching a bare action kind.
    pub fn dispatch_kind(&mut self, kind: ActionKind) {
        self.dispatch_action(Action::new(kind));
    }

    /// Record `action`, apply its immediate effect and score it.
    pub fn dispatch_action(&mut self, action: Action) {
        let event = ActionEvent {
            id: self.ids.next_id(),
            t_ms: self.state.time_ms,
            kind: action.kind.clone(),
            payload: action.payload.clone(),
            source_hotspot: action.source_hotspot.clone(),
        };
        debug!(
            kind = %event.kind,
            id = %event.id,
            t_ms = event.t_ms,
            hotspot = ?event.source_hotspot,
            "dispatch"
        );
        self.log.push(event);
        self.state.last_actions = self
            .log
            .tail(RECENT_ACTIONS)
            .map(|entry| entry.kind.clone())
            .collect();

        self.apply(&action);
        self.score(&action.kind);
    }

    fn apply(&mut self, action: &Action) {
        use ActionKind::*;
        match &action.kind {
            VentToggle => {
                let on = action.payload_bool("ventOn").unwrap_or(!self.vitals.vent_on);
                self.vitals.vent_on = on;
                self.note(format!("Vent {}", if on { "ON" } else { "OFF" }));
            }
            VentFio2Up => self.set_fio2(self.vitals.fio2 + FIO2_STEP),
            VentFio2Down => self.set_fio2(self.vitals.fio2 - FIO2_STEP),
            VentPeepUp => self.set_peep(self.vitals.peep + PEEP_STEP),
            VentPeepDown => self.set_peep(self.vitals.peep - PEEP_STEP),
            AirwayBagValve => {
                self.interventions.bagging = true;
                self.note("Bag-valve support applied");
            }
            AirwayIntubate => {
                self.interventions.intubated = true;
                self.note("Airway intubated");
            }
            AirwaySuction => {
                self.interventions.suction = true;
                self.note("Airway suction performed");
            }
            AirwayO2Flow => {
                let flow = action
                    .payload_f64("flow")
                    .unwrap_or(self.interventions.o2_flow);
                self.interventions.o2_flow = clamp(flow, O2_FLOW_RANGE.0, O2_FLOW_RANGE.1);
                self.note(format!("O2 flow -> {} L/min", self.interventions.o2_flow));
            }
            MonitorCheckRhythm => self.alert(format!("RHYTHM: {}", self.vitals.rhythm)),
            DefibCharge => {
                self.interventions.defib = true;
                self.note("Defibrillator charged");
            }
            DefibShock => {
                self.interventions.defib = false;
                let before = self.vitals.rhythm;
                self.vitals = apply_defib(self.vitals);
                if before != self.vitals.rhythm {
                    info!(from = %before, to = %self.vitals.rhythm, "defibrillation converted rhythm");
                }
                self.note("Defibrillation delivered");
            }
            CprStart => {
                self.interventions.cpr = true;
                self.note("CPR started");
            }
            CprStop => {
                self.interventions.cpr = false;
                self.note("CPR stopped");
            }
            MedEpi => {
                self.interventions.epi = true;
                self.epi_effect = 1.0;
                self.note("Epinephrine administered");
            }
            MedAmio => {
                self.interventions.amio = true;
                self.note("Amiodarone administered");
            }
            MedAntibiotics => {
                self.interventions.antibiotics = true;
                self.note("Antibiotics started");
            }
            MedDiuretic => self.note("Diuretic given"),
            MedAntiplatelet => self.note("Aspirin and heparin administered"),
            MedThrombolytic => {
                self.interventions.thrombolysis = true;
                self.note("Thrombolytic administered");
            }
            IvFluidBolus => {
                self.interventions.fluids = true;
                self.fluid_effect = 1.0;
                self.note("IV fluid bolus given");
            }
            PressorStart => {
                self.interventions.pressors = true;
                self.note("Vasopressors started");
            }
            PressorTitrateUp => {
                self.interventions.pressors = true;
                self.note("Pressors titrated up");
            }
            BloodTransfuse => {
                self.interventions.blood = true;
                self.note("Blood transfusion initiated");
            }
            LabsAbg => {
                self.note("ABG ordered");
                let abg = self.labs.abg;
                self.alert(format!(
                    "ABG RESULT: pH {:.2} / PaO2 {} / PaCO2 {}",
                    abg.ph,
                    abg.po2.round(),
                    abg.pco2.round()
                ));
            }
            LabsCbcBmpTrop => {
                self.note("CBC/BMP/Troponin ordered");
                let labs = self.labs;
                self.alert(format!(
                    "LABS: Hgb {:.1} WBC {:.1} Trop {:.2}",
                    labs.cbc.hgb, labs.cbc.wbc, labs.trop
                ));
            }
            ImagingCxr => {
                self.imaging.cxr_ordered = true;
                let result = self
                    .imaging
                    .cxr_result
                    .get_or_insert_with(|| "Pending".to_string())
                    .clone();
                self.alert(format!("CXR RESULT: {result}"));
            }
            ImagingFast => {
                self.imaging.us_fast_ordered = true;
                let result = self
                    .imaging
                    .us_fast_result
                    .get_or_insert_with(|| "Pending".to_string())
                    .clone();
                self.alert(format!("FAST RESULT: {result}"));
            }
            CallRrt => self.note("RRT paged"),
            CallCathlab => {
                self.interventions.cath_lab = true;
                self.note("Cath lab notified");
                self.note("Aspirin/heparin ordered");
            }
            CallOr => self.note("OR consult requested"),
            CallNeuro => {
                self.note("Neuro consult requested");
                self.note("CT head ordered");
            }
            CheckGlucose => self.note("POC glucose checked: 112 mg/dL"),
            CheckTemp => self.note(format!("Temp checked: {:.1}°C", self.vitals.temp_c)),
            ProcNeedleDecomp => {
                self.interventions.needle_decomp = true;
                self.note("Needle decompression performed");
            }
            ProcChestTube => {
                self.interventions.chest_tube = true;
                self.note("Chest tube placed");
            }
            Unknown(name) => debug!(kind = %name, "unrecognised action recorded without effect"),
        }
    }

    fn set_fio2(&mut self, fio2: f64) {
        self.vitals.fio2 = clamp(fio2, 0.21, 1.0);
        self.note(format!("FiO2 -> {}%", (self.vitals.fio2 * 100.0).round()));
    }

    fn set_peep(&mut self, peep: f64) {
        self.vitals.peep = clamp(peep, PEEP_RANGE.0, PEEP_RANGE.1);
        self.note(format!("PEEP -> {}", self.vitals.peep));
    }

    fn score(&mut self, kind: &ActionKind) {
        let dx = self.catalog.get(&self.state.diagnosis_id);
        let mut delta = 0;
        if dx.is_win_action(kind) {
            delta += WIN_GAIN;
        }
        if *kind == ActionKind::IvFluidBolus && dx.id == VOLUME_OVERLOAD_ID {
            delta -= OVERLOAD_BOLUS_PENALTY;
        }
        let current = clamp_vitals(self.vitals);
        if current.spo2 < SCORE_SPO2_FLOOR {
            delta -= 1;
        }
        if current.map < SCORE_MAP_FLOOR {
            delta -= 1;
        }
        let before = self.state.score;
        self.state.score = (before + delta).clamp(SCORE_RANGE.0, SCORE_RANGE.1);
        if self.state.score != before {
            debug!(%kind, before, after = self.state.score, "score changed");
        }
    }

    fn note(&mut self, message: impl Into<String>) {
        push_newest_first(&mut self.state.notes, message.into(), NOTE_CAPACITY);
    }

    fn alert(&mut self, message: impl AsRef<str>) {
        let stamped = format!("t={:.1}s {}", self.state.time_ms / 1000.0, message.as_ref());
        push_newest_first(&mut self.state.alerts, stamped, ALERT_CAPACITY);
    }

    fn set_rhythm(&mut self, rhythm: Rhythm, reason: &'static str) {
        info!(
            diagnosis = %self.state.diagnosis_id,
            t_ms = self.state.time_ms,
            rhythm = %rhythm,
            reason,
            "arrhythmia onset"
        );
        self.vitals.rhythm = rhythm;
        self.alert(format!("RHYTHM: {rhythm}"));
    }

    /// Advance the run by `dt_ms`.
    pub fn advance(&mut self, dt_ms: f64) {
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return;
        }
        self.state.time_ms += dt_ms;
        let now = self.state.time_ms;
        let catalog = Arc::clone(&self.catalog);
        let dx = catalog.get(&self.state.diagnosis_id);

        let next = advance_phase(&self.script, now, &dx.id);
        if next.phase != self.script.phase {
            info!(diagnosis = %dx.id, phase = ?next.phase, t_ms = now, "phase transition");
        }
        self.script = next;
        self.state.phase = self.script.phase;

        if !self.script.arrest_triggered && should_trigger_arrest(dx, now) {
            self.script.arrest_triggered = true;
            info!(diagnosis = %dx.id, t_ms = now, "arrest triggered");
            self.set_rhythm(roll_arrhythmia(&dx.id), "arrest trigger");
        }

        if now >= self.script.next_arrhythmia_check_ms && self.vitals.rhythm == Rhythm::Nsr {
            self.set_rhythm(roll_arrhythmia(&dx.id), "scheduled check");
            self.script.next_arrhythmia_check_ms = now + ARRHYTHMIA_RECHECK_MS;
        }

        if self.vitals.rhythm.is_arrest() {
            self.timers.arrest_start_ms.get_or_insert(now);
        } else {
            self.timers.arrest_start_ms = None;
            self.timers.asystole_reported = false;
        }

        let pressors = self.interventions.pressors;
        let shock_rate =
            dx.progression.shock_rate * if pressors { PRESSOR_SHOCK_FACTOR } else { 1.0 };
        let hypoxia_rate = dx.progression.hypoxia_rate
            * if self.interventions.antibiotics {
                ANTIBIOTIC_HYPOXIA_FACTOR
            } else {
                1.0
            };

        self.epi_effect = decay_linear(self.epi_effect, dt_ms, EPI_DECAY_MS);
        self.fluid_effect = decay_linear(self.fluid_effect, dt_ms, FLUID_DECAY_MS);

        let ctx = StepContext {
            baseline: &dx.baseline_vitals,
            interventions: &self.interventions,
            hypoxia_rate,
            shock_rate,
            arrhythmia_risk: dx.progression.arrhythmia_risk,
            epi_effect: self.epi_effect + if pressors { PRESSOR_EFFECT } else { 0.0 },
            fluid_effect: self.fluid_effect,
        };
        self.vitals = clamp_vitals(step_vitals(&self.vitals, dt_ms, &ctx));

        self.check_losses(dx);
    }

    fn check_losses(&mut self, dx: &Diagnosis) {
        let now = self.state.time_ms;
        let loss = dx.loss_conditions;

        let arrest_sec = self
            .timers
            .arrest_start_ms
            .map_or(0.0, |start| (now - start) / 1000.0);
        if self.timers.arrest_start_ms.is_some() && arrest_sec > loss.asystole_sec {
            self.alert("Loss: prolonged asystole");
            self.state.losses.prolonged_asystole = true;
            if self.timers.asystole_reported {
                debug!(diagnosis = %dx.id, t_ms = now, arrest_sec, "prolonged asystole persists");
            } else {
                self.timers.asystole_reported = true;
                warn!(diagnosis = %dx.id, t_ms = now, "loss: prolonged asystole");
            }
        }

        if self.vitals.spo2 < loss.spo2_below.threshold {
            self.alert("Warning: SpO2 critically low");
            let since = *self.timers.spo2_low_since_ms.get_or_insert(now);
            if !self.timers.spo2_reported && (now - since) / 1000.0 > loss.spo2_below.duration_sec {
                self.timers.spo2_reported = true;
                self.state.losses.sustained_hypoxia = true;
                self.alert("Loss: sustained hypoxia");
                warn!(diagnosis = %dx.id, t_ms = now, spo2 = self.vitals.spo2, "loss: sustained hypoxia");
            } else {
                debug!(diagnosis = %dx.id, t_ms = now, spo2 = self.vitals.spo2, "spo2 below loss threshold");
            }
        } else {
            self.timers.spo2_low_since_ms = None;
            self.timers.spo2_reported = false;
        }

        if self.vitals.map < loss.map_below.threshold {
            self.alert("Warning: MAP critically low");
            let since = *self.timers.map_low_since_ms.get_or_insert(now);
            if !self.timers.map_reported && (now - since) / 1000.0 > loss.map_below.duration_sec {
                self.timers.map_reported = true;
                self.state.losses.sustained_hypotension = true;
                self.alert("Loss: sustained hypotension");
                warn!(diagnosis = %dx.id, t_ms = now, map = self.vitals.map, "loss: sustained hypotension");
            } else {
                debug!(diagnosis = %dx.id, t_ms = now, map = self.vitals.map, "map below loss threshold");
            }
        } else {
            self.timers.map_low_since_ms = None;
            self.timers.map_reported = false;
        }
    }

    /// Replace every piece of run state with a fresh run of `diagnosis_id`.
    pub fn restart(&mut self, diagnosis_id: &str) {
        *self = Self::new(Arc::clone(&self.catalog), diagnosis_id);
        info!(diagnosis = %self.state.diagnosis_id, "engine reset");
    }

    pub fn snapshot(&self) -> CodeBlueSnapshot {
        CodeBlueSnapshot {
            vitals: self.vitals,
            state: self.state.clone(),
            interventions: self.interventions,
            labs: self.labs,
            imaging: self.imaging.clone(),
            log: self.log(),
        }
    }
}

impl ScenarioEngine for SimEngine {
    type Action = Action;
    type Snapshot = CodeBlueSnapshot;

    fn dispatch(&mut self, action: Action) {
        self.dispatch_action(action);
    }

    fn tick(&mut self, dt_ms: f64) {
        self.advance(dt_ms);
    }

    fn reset(&mut self, scenario_id: &str) {
        self.restart(scenario_id);
    }

    fn snapshot(&self) -> CodeBlueSnapshot {
        SimEngine::snapshot(self)
    }

    fn scenario_id(&self) -> &str {
        &self.state.diagnosis_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine(id: &str) -> SimEngine {
        SimEngine::with_builtin_catalog(id)
    }

    #[test]
    fn fresh_engine_matches_diagnosis() {
        let e = engine("dx_postop_hemorrhage");
        assert_eq!(e.vitals().hr, 118.0);
        assert!((e.vitals().map - 66.0).abs() < 1e-9);
        let s = e.state();
        assert_eq!(s.score, INITIAL_SCORE);
        assert_eq!(s.phase, CodeBluePhase::Prebrief);
        assert!(s.notes.is_empty() && s.alerts.is_empty() && s.last_actions.is_empty());
        assert!(e.log().is_empty());
    }

    #[test]
    fn unknown_diagnosis_uses_default() {
        assert_eq!(engine("dx_bogus").state().diagnosis_id, "dx_legionella");
    }

    #[test]
    fn vent_toggle_honours_payload() {
        let mut e = engine("dx_stroke");
        e.dispatch_kind(ActionKind::VentToggle);
        assert!(!e.vitals().vent_on);
        e.dispatch_action(Action::new(ActionKind::VentToggle).with_payload(json!({ "ventOn": false })));
        assert!(!e.vitals().vent_on);
        assert_eq!(e.state().notes[0], "Vent OFF");
    }

    #[test]
    fn fio2_and_peep_steps_are_bounded() {
        let mut e = engine("dx_stroke");
        for _ in 0..30 {
            e.dispatch_kind(ActionKind::VentFio2Up);
            e.dispatch_kind(ActionKind::VentPeepUp);
        }
        assert_eq!(e.vitals().fio2, 1.0);
        assert_eq!(e.vitals().peep, 18.0);
        assert!(e.state().notes.iter().any(|n| n == "FiO2 -> 100%"));
        for _ in 0..30 {
            e.dispatch_kind(ActionKind::VentFio2Down);
            e.dispatch_kind(ActionKind::VentPeepDown);
        }
        assert_eq!(e.vitals().fio2, 0.21);
        assert_eq!(e.vitals().peep, 4.0);
        assert_eq!(e.state().notes[0], "PEEP -> 4");
    }

    #[test]
    fn notes_are_newest_first_and_capped() {
        let mut e = engine("dx_stroke");
        for _ in 0..25 {
            e.dispatch_kind(ActionKind::CallRrt);
        }
        e.dispatch_kind(ActionKind::CheckGlucose);
        let notes = e.state().notes;
        assert_eq!(notes.len(), NOTE_CAPACITY);
        assert_eq!(notes[0], "POC glucose checked: 112 mg/dL");
    }

    #[test]
    fn lab_and_imaging_alerts_are_stamped() {
        let mut e = engine("dx_postop_hemorrhage");
        e.advance(1_500.0);
        e.dispatch_kind(ActionKind::LabsCbcBmpTrop);
        e.dispatch_kind(ActionKind::ImagingCxr);
        e.dispatch_kind(ActionKind::ImagingFast);
        let alerts = e.state().alerts;
        assert_eq!(alerts[0], "t=1.5s FAST RESULT: Free fluid in RUQ");
        assert_eq!(alerts[1], "t=1.5s CXR RESULT: Pending");
        assert_eq!(alerts[2], "t=1.5s LABS: Hgb 7.4 WBC 9.4 Trop 0.02");
        let imaging = e.imaging();
        assert!(imaging.cxr_ordered && imaging.us_fast_ordered);
        assert_eq!(imaging.cxr_result.as_deref(), Some("Pending"));
    }

    #[test]
    fn abg_alert_format() {
        let mut e = engine("dx_legionella");
        e.dispatch_kind(ActionKind::LabsAbg);
        assert_eq!(
            e.state().alerts[0],
            "t=0.0s ABG RESULT: pH 7.31 / PaO2 52 / PaCO2 48"
        );
    }

    #[test]
    fn win_action_scores_and_overload_bolus_penalised() {
        let mut e = engine("dx_legionella");
        e.dispatch_kind(ActionKind::MedAntibiotics);
        assert_eq!(e.state().score, 52);
        e.dispatch_kind(ActionKind::CallRrt);
        assert_eq!(e.state().score, 52);

        let mut overload = engine("dx_volume_overload");
        overload.dispatch_kind(ActionKind::IvFluidBolus);
        assert_eq!(overload.state().score, 48);
    }

    #[test]
    fn unknown_action_is_logged_without_effect() {
        let mut e = engine("dx_acute_mi");
        let before = e.snapshot();
        e.dispatch_kind(ActionKind::from_name("JUGGLE"));
        let after = e.snapshot();
        assert_eq!(after.vitals, before.vitals);
        assert_eq!(after.interventions, before.interventions);
        assert_eq!(after.state.score, before.state.score);
        assert_eq!(after.log.len(), 1);
        assert_eq!(after.state.last_actions, vec![ActionKind::from_name("JUGGLE")]);
    }

    #[test]
    fn o2_flow_payload_is_clamped() {
        let mut e = engine("dx_stroke");
        e.dispatch_action(Action::new(ActionKind::AirwayO2Flow).with_payload(json!({ "flow": 40 })));
        assert_eq!(e.interventions().o2_flow, 15.0);
        e.dispatch_action(Action::new(ActionKind::AirwayO2Flow).with_payload(json!({ "flow": -3 })));
        assert_eq!(e.interventions().o2_flow, 0.0);
    }

    #[test]
    fn supplemental_procedures_set_flags() {
        let mut e = engine("dx_stroke");
        e.dispatch_kind(ActionKind::MedThrombolytic);
        e.dispatch_kind(ActionKind::ProcNeedleDecomp);
        e.dispatch_kind(ActionKind::ProcChestTube);
        let iv = e.interventions();
        assert!(iv.thrombolysis && iv.needle_decomp && iv.chest_tube);
    }

    #[test]
    fn action_ids_increase() {
        let mut e = engine("dx_stroke");
        for _ in 0..3 {
            e.dispatch_kind(ActionKind::CheckTemp);
        }
        let ids: Vec<_> = e.log().iter().map(|a| a.id.index()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn bad_dt_is_ignored() {
        let mut e = engine("dx_stroke");
        let before = e.snapshot();
        for dt in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            e.advance(dt);
        }
        assert_eq!(e.snapshot(), before);
    }

    #[test]
    fn effects_decay_linearly() {
        let mut e = engine("dx_stroke");
        e.dispatch_kind(ActionKind::MedEpi);
        e.dispatch_kind(ActionKind::IvFluidBolus);
        e.advance(15_000.0);
        assert!((e.epi_effect() - 0.5).abs() < 1e-9);
        assert!((e.fluid_effect() - 2.0 / 3.0).abs() < 1e-9);
        e.advance(40_000.0);
        assert_eq!(e.epi_effect(), 0.0);
        assert_eq!(e.fluid_effect(), 0.0);
    }

    #[test]
    fn arrest_triggers_once_with_alert() {
        let mut e = engine("dx_acute_mi");
        for _ in 0..1_100 {
            e.advance(100.0);
        }
        assert!(!e.script().arrest_triggered);
        e.advance(100.0);
        assert!(e.script().arrest_triggered);
        assert!(e.state().alerts.iter().any(|a| a.contains("RHYTHM:")));
    }

    #[test]
    fn defib_converts_shockable_rhythm() {
        let mut e = engine("dx_acute_mi");
        e.vitals.rhythm = Rhythm::Vf;
        e.dispatch_kind(ActionKind::DefibCharge);
        assert!(e.interventions().defib);
        e.dispatch_kind(ActionKind::DefibShock);
        assert!(!e.interventions().defib);
        assert_eq!(e.vitals().rhythm, Rhythm::Nsr);
        assert!(e.vitals().hr >= 90.0);
    }

    #[test]
    fn asystole_tracks_arrest_and_reports_loss() {
        let mut e = engine("dx_acute_mi");
        e.vitals.rhythm = Rhythm::Asystole;
        e.advance(100.0);
        assert_eq!(e.arrest_start_ms(), Some(100.0));
        for _ in 0..150 {
            e.advance(100.0);
        }
        assert!(e.state().losses.prolonged_asystole);
        assert!(e.state().alerts.iter().any(|a| a.ends_with("Loss: prolonged asystole")));
        e.vitals.rhythm = Rhythm::Nsr;
        e.advance(100.0);
        assert_eq!(e.arrest_start_ms(), None);
    }

    #[test]
    fn sustained_hypotension_is_flagged_once() {
        let mut e = engine("dx_postop_hemorrhage");
        e.vitals.sbp = 45.0;
        e.vitals.dbp = 25.0;
        e.vitals = e.vitals.with_derived_map();
        for _ in 0..200 {
            e.advance(100.0);
        }
        let s = e.state();
        assert!(s.losses.sustained_hypotension);
        assert!(s.alerts.iter().any(|a| a.contains("MAP critically low")));
    }
}
