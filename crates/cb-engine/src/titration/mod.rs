//! Ventilator / FiO2 titration engine with a continuous pressor dose.
//!
//! Same [`ScenarioEngine`] surface as the code-blue engine, parameterised by a
//! [`TitrationConfig`] instead of a diagnosis.

pub mod monitor;
pub mod physiology;

pub use monitor::{
    Alert, AlertSeverity, Objective, ObjectiveKind, Trend, TrendTracker, VitalTrends,
    derive_alerts, initial_objectives, update_objectives,
};
pub use physiology::{BloodPressure, InterventionState, PatientState, blood_pressure, update_patient};

use crate::action::BoundedLog;
use crate::engine::ScenarioEngine;
use cb_core::clamp;
use cb_scenario::TitrationConfig;
use cb_scenario::titration::TitrationVitals;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const SIM_CHECK_STEPS: usize = 600;
const SIM_CHECK_DT_SEC: f64 = 0.1;
const FIO2_EPSILON: f64 = 0.001;
const PRESSOR_LOG_STEP: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TitrationAction {
    SetVent { on: bool },
    SetFio2 { fio2: f64 },
    Bag,
    Bolus,
    SetPressor { dose: f64 },
    SilenceAlarms { duration_sec: f64 },
    RunSimCheck,
}

/// One logged titration event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub id: String,
    pub label: String,
    pub t_sec: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitrationSnapshot {
    pub scenario_id: String,
    pub t_sec: f64,
    pub vitals: TitrationVitals,
    pub blood_pressure: BloodPressure,
    pub vent_on: bool,
    pub interventions: InterventionState,
    pub shock_suspected: bool,
    pub alarms_silenced: bool,
    pub alerts: Vec<Alert>,
    pub objectives: Vec<Objective>,
    pub trends: VitalTrends,
    /// Oldest first.
    pub events: Vec<EngineEvent>,
}

#[derive(Debug, Clone)]
pub struct TitrationEngine {
    config: TitrationConfig,
    state: PatientState,
    alerts: Vec<Alert>,
    objectives: Vec<Objective>,
    trends: TrendTracker,
    events: BoundedLog<EngineEvent>,
}

impl TitrationEngine {
    pub fn new(config: TitrationConfig) -> Self {
        let state = PatientState::initial(&config);
        let mut objectives = initial_objectives(&config);
        update_objectives(&mut objectives, &state, &config, 0.0);
        let mut trends = TrendTracker::default();
        trends.record(state.t_sec, state.vitals, config.trend.window_sec);
        Self {
            alerts: derive_alerts(&state, &config),
            events: BoundedLog::with_capacity(config.debug.event_log_size),
            objectives,
            trends,
            state,
            config,
        }
    }

    /// Engine for a built-in scenario; unknown ids fall back to `resp_failure`.
    pub fn builtin(id: &str) -> Self {
        Self::new(TitrationConfig::builtin(id))
    }

    pub fn config(&self) -> &TitrationConfig {
        &self.config
    }

    pub fn state(&self) -> &PatientState {
        &self.state
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.to_vec()
    }

    fn log_event(&mut self, id: &str, label: String) {
        debug!(scenario = %self.config.id, t_sec = self.state.t_sec, %label, "titration event");
        self.events.push(EngineEvent {
            id: id.to_string(),
            label,
            t_sec: self.state.t_sec,
        });
    }

    fn apply(&mut self, action: TitrationAction) {
        let params = self.config.interventions;
        match action {
            TitrationAction::SetVent { on } => {
                if self.state.vent_on == on {
                    return;
                }
                self.state.vent_on = on;
                self.log_event("vent", if on { "VENT ON" } else { "VENT OFF" }.to_string());
            }
            TitrationAction::SetFio2 { fio2 } => {
                if !fio2.is_finite() {
                    return;
                }
                let fio2 = clamp(fio2, self.config.fio2.min, self.config.fio2.max);
                if (self.state.interventions.fio2 - fio2).abs() < FIO2_EPSILON {
                    return;
                }
                self.state.interventions.fio2 = fio2;
                self.log_event("fio2", format!("FIO2={fio2:.2}"));
            }
            TitrationAction::Bag => {
                let iv = &mut self.state.interventions;
                iv.bag_effect = params.bag.boost;
                iv.bag_remaining_sec = params.bag.duration_sec;
                self.state.vitals.spo2_pct =
                    clamp(self.state.vitals.spo2_pct + params.bag.boost, 50.0, 100.0);
                self.log_event("bag", "BAG".to_string());
            }
            TitrationAction::Bolus => {
                if self.state.interventions.bolus_cooldown_sec > 0.0 {
                    return;
                }
                let fluids = params.fluids;
                let iv = &mut self.state.interventions;
                iv.bolus_effect += fluids.map_boost * (1.0 - fluids.residual_fraction);
                iv.bolus_residual += fluids.map_boost * fluids.residual_fraction;
                iv.bolus_cooldown_sec = fluids.cooldown_sec;
                self.log_event("bolus", "BOLUS 500 mL".to_string());
            }
            TitrationAction::SetPressor { dose } => {
                let dose = clamp(dose, 0.0, 1.0);
                let iv = &mut self.state.interventions;
                iv.pressor_dose = dose;
                if (iv.last_pressor_logged - dose).abs() >= PRESSOR_LOG_STEP {
                    iv.last_pressor_logged = dose;
                    self.log_event("pressor", format!("NOREPI {}%", (dose * 100.0).round()));
                }
            }
            TitrationAction::SilenceAlarms { duration_sec } => {
                let duration = if duration_sec.is_finite() && duration_sec > 0.0 {
                    duration_sec
                } else {
                    self.config.alarms.silence_duration_sec
                };
                self.state.silence_until_sec = Some(self.state.t_sec + duration);
                self.log_event("silence", format!("Silence {duration}s"));
            }
            TitrationAction::RunSimCheck => {
                let (off, on) = sim_check(&self.config);
                info!(scenario = %self.config.id, spo2_off = off, spo2_on = on, "sim check");
                self.log_event("sim", format!("SIM_CHECK SpO2 off {off:.1} -> on {on:.1}"));
            }
        }
    }

    fn refresh(&mut self, dt_sec: f64) {
        update_objectives(&mut self.objectives, &self.state, &self.config, dt_sec);
        self.alerts = derive_alerts(&self.state, &self.config);
    }

    pub fn snapshot(&self) -> TitrationSnapshot {
        TitrationSnapshot {
            scenario_id: self.config.id.clone(),
            t_sec: self.state.t_sec,
            vitals: self.state.vitals,
            blood_pressure: blood_pressure(self.state.vitals.map_mmhg, self.config.pulse_pressure),
            vent_on: self.state.vent_on,
            interventions: self.state.interventions,
            shock_suspected: self.state.shock_suspected,
            alarms_silenced: self.state.alarms_silenced(),
            alerts: self.alerts.clone(),
            objectives: self.objectives.clone(),
            trends: self.trends.trends(&self.config),
            events: self.events(),
        }
    }
}

/// SpO2 after 60 s off the ventilator, then after a further 60 s back on,
/// starting from a fresh baseline.
pub fn sim_check(config: &TitrationConfig) -> (f64, f64) {
    let mut state = PatientState::initial(config);
    state.vent_on = false;
    for _ in 0..SIM_CHECK_STEPS {
        state = update_patient(&state, config, SIM_CHECK_DT_SEC);
    }
    let off = state.vitals.spo2_pct;
    state.vent_on = true;
    for _ in 0..SIM_CHECK_STEPS {
        state = update_patient(&state, config, SIM_CHECK_DT_SEC);
    }
    (off, state.vitals.spo2_pct)
}

impl ScenarioEngine for TitrationEngine {
    type Action = TitrationAction;
    type Snapshot = TitrationSnapshot;

    fn dispatch(&mut self, action: TitrationAction) {
        self.apply(action);
        self.refresh(0.0);
    }

    fn tick(&mut self, dt_ms: f64) {
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return;
        }
        let dt_sec = dt_ms / 1000.0;
        let was_shock = self.state.shock_suspected;
        self.state = update_patient(&self.state, &self.config, dt_sec);
        if self.state.shock_suspected && !was_shock {
            info!(scenario = %self.config.id, t_sec = self.state.t_sec, "shock suspected");
        }
        self.trends
            .record(self.state.t_sec, self.state.vitals, self.config.trend.window_sec);
        self.refresh(dt_sec);
    }

    /// Keeps the loaded config when `scenario_id` matches it, otherwise loads a built-in.
    fn reset(&mut self, scenario_id: &str) {
        let config = if scenario_id == self.config.id {
            self.config.clone()
        } else {
            TitrationConfig::builtin(scenario_id)
        };
        *self = Self::new(config);
        info!(scenario = %self.config.id, "titration engine reset");
    }

    fn snapshot(&self) -> TitrationSnapshot {
        TitrationEngine::snapshot(self)
    }

    fn scenario_id(&self) -> &str {
        &self.config.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> TitrationEngine {
        let mut config = TitrationConfig::resp_failure();
        config.noise.enabled = false;
        TitrationEngine::new(config)
    }

    fn labels(e: &TitrationEngine) -> Vec<String> {
        e.events().into_iter().map(|ev| ev.label).collect()
    }

    #[test]
    fn set_vent_is_noop_when_unchanged() {
        let mut e = engine();
        e.dispatch(TitrationAction::SetVent { on: true });
        assert!(e.events().is_empty());
        e.dispatch(TitrationAction::SetVent { on: false });
        assert_eq!(labels(&e), vec!["VENT OFF"]);
        assert!(e.alerts().iter().any(|a| a.id == "vent-off"));
    }

    #[test]
    fn fio2_is_clamped_and_deduplicated() {
        let mut e = engine();
        e.dispatch(TitrationAction::SetFio2 { fio2: 3.0 });
        e.dispatch(TitrationAction::SetFio2 { fio2: 0.9995 });
        assert_eq!(e.state().interventions.fio2, 1.0);
        assert_eq!(labels(&e), vec!["FIO2=1.00"]);
    }

    #[test]
    fn bag_boosts_spo2_immediately() {
        let mut e = engine();
        let before = e.state().vitals.spo2_pct;
        e.dispatch(TitrationAction::Bag);
        assert_eq!(e.state().vitals.spo2_pct, (before + 4.0).min(100.0));
        assert_eq!(e.state().interventions.bag_remaining_sec, 10.0);
    }

    #[test]
    fn bolus_respects_cooldown() {
        let mut e = engine();
        e.dispatch(TitrationAction::Bolus);
        e.dispatch(TitrationAction::Bolus);
        assert_eq!(labels(&e), vec!["BOLUS 500 mL"]);
        assert_eq!(e.state().interventions.bolus_residual, 2.0);
        for _ in 0..310 {
            e.tick(100.0);
        }
        e.dispatch(TitrationAction::Bolus);
        assert_eq!(e.events().len(), 2);
    }

    #[test]
    fn pressor_logs_only_meaningful_changes() {
        let mut e = engine();
        e.dispatch(TitrationAction::SetPressor { dose: 0.02 });
        e.dispatch(TitrationAction::SetPressor { dose: 0.1 });
        e.dispatch(TitrationAction::SetPressor { dose: 7.0 });
        assert_eq!(labels(&e), vec!["NOREPI 10%", "NOREPI 100%"]);
        assert_eq!(e.state().interventions.pressor_dose, 1.0);
    }

    #[test]
    fn silence_window_expires() {
        let mut e = engine();
        e.dispatch(TitrationAction::SilenceAlarms { duration_sec: 5.0 });
        assert!(e.snapshot().alarms_silenced);
        assert_eq!(labels(&e), vec!["Silence 5s"]);
        for _ in 0..60 {
            e.tick(100.0);
        }
        assert!(!e.snapshot().alarms_silenced);
    }

    #[test]
    fn sim_check_reports_recovery() {
        let mut e = engine();
        e.dispatch(TitrationAction::RunSimCheck);
        let (off, on) = sim_check(e.config());
        assert!(off < on);
        assert_eq!(
            labels(&e),
            vec![format!("SIM_CHECK SpO2 off {off:.1} -> on {on:.1}")]
        );
    }

    #[test]
    fn event_log_is_bounded() {
        let mut e = engine();
        for i in 0..100 {
            e.dispatch(TitrationAction::SetVent { on: i % 2 == 1 });
        }
        assert_eq!(e.events().len(), e.config().debug.event_log_size);
    }

    #[test]
    fn reset_restores_baseline_and_keeps_config() {
        let mut e = engine();
        e.dispatch(TitrationAction::SetVent { on: false });
        for _ in 0..100 {
            e.tick(100.0);
        }
        e.reset("resp_failure");
        assert_eq!(e.snapshot(), engine().snapshot());
        e.reset("shock");
        assert_eq!(e.scenario_id(), "shock");
        e.reset("missing");
        assert_eq!(e.scenario_id(), "resp_failure");
    }
}
