//! Bedside monitor outputs derived from the titration state: alerts,
//! objectives and vital-sign trends.

use super::physiology::PatientState;
use cb_scenario::TitrationConfig;
use cb_scenario::titration::TitrationVitals;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub label: String,
    pub severity: AlertSeverity,
}

fn alert(id: &str, label: &str, severity: AlertSeverity) -> Alert {
    Alert {
        id: id.to_string(),
        label: label.to_string(),
        severity,
    }
}

/// Active alerts, or a single INFO "No active alerts" entry.
pub fn derive_alerts(state: &PatientState, config: &TitrationConfig) -> Vec<Alert> {
    use AlertSeverity::*;
    let v = &state.vitals;
    let t = &config.thresholds;
    let mut alerts = Vec::new();

    if !state.vent_on {
        alerts.push(alert("vent-off", "Ventilator off", Warning));
    }
    if v.spo2_pct <= t.spo2.critical {
        alerts.push(alert("spo2-critical", "SpO₂ critical", Critical));
    } else if v.spo2_pct <= t.spo2.low {
        alerts.push(alert("spo2-low", "SpO₂ low", Warning));
    }
    if v.map_mmhg <= t.map.critical {
        alerts.push(alert("map-critical", "MAP critical", Critical));
    } else if v.map_mmhg <= t.map.low {
        alerts.push(alert("map-low", "MAP low", Warning));
    }
    if v.hr_bpm >= t.hr.high {
        alerts.push(alert("hr-high", "HR elevated", Warning));
    }
    if v.resp_rpm >= t.rr.high {
        alerts.push(alert("rr-high", "RR elevated", Warning));
    }
    if state.shock_suspected {
        alerts.push(alert("shock", "Shock suspected", Warning));
    }
    if alerts.is_empty() {
        alerts.push(alert("stable", "No active alerts", Info));
    }
    alerts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// Ventilator running at any point.
    Vent,
    /// SpO2 at or above the low threshold for the hold time.
    Spo2,
    /// MAP at or above the low threshold for the hold time.
    Map,
    /// HR inside the objective range for the hold time.
    Hr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub kind: ObjectiveKind,
    pub label: String,
    pub done: bool,
    pub progress_sec: f64,
    pub target_sec: f64,
}

pub fn initial_objectives(config: &TitrationConfig) -> Vec<Objective> {
    let o = &config.objectives;
    let t = &config.thresholds;
    let make = |kind, label: String, target_sec| Objective {
        kind,
        label,
        done: false,
        progress_sec: 0.0,
        target_sec,
    };
    vec![
        make(ObjectiveKind::Vent, "Ventilator running".to_string(), 0.0),
        make(
            ObjectiveKind::Spo2,
            format!("Maintain SpO₂ ≥ {}% for {}s", t.spo2.low, o.maintain_spo2_sec),
            o.maintain_spo2_sec,
        ),
        make(
            ObjectiveKind::Map,
            format!("Maintain MAP ≥ {} for {}s", t.map.low, o.maintain_map_sec),
            o.maintain_map_sec,
        ),
        make(
            ObjectiveKind::Hr,
            format!(
                "Stabilize HR {}–{} for {}s",
                o.hr_range.min, o.hr_range.max, o.maintain_hr_sec
            ),
            o.maintain_hr_sec,
        ),
    ]
}

/// Advance objective timers by `dt_sec`. Completed objectives stay done.
pub fn update_objectives(
    objectives: &mut [Objective],
    state: &PatientState,
    config: &TitrationConfig,
    dt_sec: f64,
) {
    let v = &state.vitals;
    let range = &config.objectives.hr_range;
    for objective in objectives.iter_mut().filter(|o| !o.done) {
        let holding = match objective.kind {
            ObjectiveKind::Vent => {
                objective.done = state.vent_on;
                continue;
            }
            ObjectiveKind::Spo2 => v.spo2_pct >= config.thresholds.spo2.low,
            ObjectiveKind::Map => v.map_mmhg >= config.thresholds.map.low,
            ObjectiveKind::Hr => v.hr_bpm >= range.min && v.hr_bpm <= range.max,
        };
        objective.progress_sec = if holding {
            objective.progress_sec + dt_sec.max(0.0)
        } else {
            0.0
        };
        objective.done = holding && objective.progress_sec >= objective.target_sec;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Steady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalTrends {
    pub hr: Trend,
    pub spo2: Trend,
    pub rr: Trend,
    pub map: Trend,
}

impl Default for VitalTrends {
    fn default() -> Self {
        Self {
            hr: Trend::Steady,
            spo2: Trend::Steady,
            rr: Trend::Steady,
            map: Trend::Steady,
        }
    }
}

fn classify(slope: f64, threshold: f64) -> Trend {
    if slope > threshold {
        Trend::Rising
    } else if slope < -threshold {
        Trend::Falling
    } else {
        Trend::Steady
    }
}

/// Rolling window of vital samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendTracker {
    samples: VecDeque<(f64, TitrationVitals)>,
}

impl TrendTracker {
    pub fn record(&mut self, t_sec: f64, vitals: TitrationVitals, window_sec: f64) {
        self.samples.push_back((t_sec, vitals));
        while let Some(&(oldest, _)) = self.samples.front() {
            if t_sec - oldest > window_sec && self.samples.len() > 1 {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Slope of each vital across the window, classified against the
    /// configured thresholds. Steady until the window spans some time.
    pub fn trends(&self, config: &TitrationConfig) -> VitalTrends {
        let (Some((t0, first)), Some((t1, last))) = (self.samples.front(), self.samples.back())
        else {
            return VitalTrends::default();
        };
        let span = t1 - t0;
        if span <= 0.0 {
            return VitalTrends::default();
        }
        let th = &config.trend.slope_thresholds;
        VitalTrends {
            hr: classify((last.hr_bpm - first.hr_bpm) / span, th.hr_bpm),
            spo2: classify((last.spo2_pct - first.spo2_pct) / span, th.spo2_pct),
            rr: classify((last.resp_rpm - first.resp_rpm) / span, th.resp_rpm),
            map: classify((last.map_mmhg - first.map_mmhg) / span, th.map_mmhg),
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> (PatientState, TitrationConfig) {
        let config = TitrationConfig::resp_failure();
        (PatientState::initial(&config), config)
    }

    #[test]
    fn stable_patient_reports_info_only() {
        let (mut s, config) = state();
        s.vitals.spo2_pct = 96.0;
        let alerts = derive_alerts(&s, &config);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "stable");
        assert_eq!(alerts[0].severity, AlertSeverity::Info);
    }

    #[test]
    fn critical_supersedes_low() {
        let (mut s, config) = state();
        s.vent_on = false;
        s.vitals.spo2_pct = 84.0;
        s.vitals.map_mmhg = 60.0;
        let ids: Vec<_> = derive_alerts(&s, &config).into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["vent-off", "spo2-critical", "map-low"]);
    }

    #[test]
    fn objective_timer_resets_when_out_of_range() {
        let (mut s, config) = state();
        let mut objectives = initial_objectives(&config);
        s.vitals.spo2_pct = 95.0;
        update_objectives(&mut objectives, &s, &config, 30.0);
        assert_eq!(objectives[1].progress_sec, 30.0);
        assert!(objectives[0].done);
        s.vitals.spo2_pct = 85.0;
        update_objectives(&mut objectives, &s, &config, 1.0);
        assert_eq!(objectives[1].progress_sec, 0.0);
        assert!(!objectives[1].done);
    }

    #[test]
    fn objective_latches_when_complete() {
        let (mut s, config) = state();
        let mut objectives = initial_objectives(&config);
        s.vitals.map_mmhg = 80.0;
        update_objectives(&mut objectives, &s, &config, 61.0);
        assert!(objectives[2].done);
        s.vitals.map_mmhg = 40.0;
        update_objectives(&mut objectives, &s, &config, 1.0);
        assert!(objectives[2].done);
        assert_eq!(objectives[2].progress_sec, 61.0);
    }

    #[test]
    fn trend_classifies_slopes() {
        let (s, config) = state();
        let mut tracker = TrendTracker::default();
        assert_eq!(tracker.trends(&config), VitalTrends::default());
        for i in 0..=40 {
            let mut v = s.vitals;
            v.spo2_pct = 95.0 - i as f64 * 0.5;
            v.hr_bpm = 90.0 + i as f64;
            tracker.record(i as f64, v, config.trend.window_sec);
        }
        let trends = tracker.trends(&config);
        assert_eq!(trends.spo2, Trend::Falling);
        assert_eq!(trends.hr, Trend::Rising);
        assert_eq!(trends.map, Trend::Steady);
        assert_eq!(tracker.len(), 31);
    }
}
