//! Continuous titration physiology: first-order approach toward targets built
//! from ventilator state, FiO2, bagging, shock drift, hypoxia, pressor dose
//! and fluid boluses.

use cb_core::{Lcg, clamp, smooth_towards};
use cb_scenario::TitrationConfig;
use cb_scenario::titration::{TitrationTargets, TitrationVitals};
use serde::{Deserialize, Serialize};

pub const SPO2_LIMITS: (f64, f64) = (50.0, 100.0);
pub const HR_LIMITS: (f64, f64) = (20.0, 220.0);
pub const RR_LIMITS: (f64, f64) = (4.0, 60.0);
pub const MAP_LIMITS: (f64, f64) = (30.0, 140.0);

/// Running intervention effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterventionState {
    pub fio2: f64,
    /// Current SpO2 bonus from bagging; decays while `bag_remaining_sec > 0`.
    pub bag_effect: f64,
    pub bag_remaining_sec: f64,
    /// Decaying part of the fluid MAP boost.
    pub bolus_effect: f64,
    /// Retained part of all boluses given so far.
    pub bolus_residual: f64,
    pub bolus_cooldown_sec: f64,
    /// Norepinephrine dose in [0, 1].
    pub pressor_dose: f64,
    pub last_pressor_logged: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatientState {
    pub t_sec: f64,
    pub vitals: TitrationVitals,
    pub vent_on: bool,
    pub interventions: InterventionState,
    /// Time MAP-low and HR-high have held together.
    pub shock_timer_sec: f64,
    pub shock_suspected: bool,
    pub silence_until_sec: Option<f64>,
    noise: Lcg,
}

impl PatientState {
    /// Baseline state for `config` at t = 0.
    pub fn initial(config: &TitrationConfig) -> Self {
        let dose = clamp(config.baseline.pressor_dose.unwrap_or(0.0), 0.0, 1.0);
        Self {
            t_sec: 0.0,
            vitals: config.baseline.vitals,
            vent_on: config.baseline.devices.vent_on,
            interventions: InterventionState {
                fio2: clamp(config.baseline.fio2, config.fio2.min, config.fio2.max),
                bag_effect: 0.0,
                bag_remaining_sec: 0.0,
                bolus_effect: 0.0,
                bolus_residual: 0.0,
                bolus_cooldown_sec: 0.0,
                pressor_dose: dose,
                last_pressor_logged: dose,
            },
            shock_timer_sec: 0.0,
            shock_suspected: false,
            silence_until_sec: None,
            noise: Lcg::from_key(&config.id),
        }
    }

    pub fn alarms_silenced(&self) -> bool {
        self.silence_until_sec
            .is_some_and(|until| self.t_sec < until)
    }

    fn jitter(&mut self, amplitude: f64) -> f64 {
        amplitude * (self.noise.next_f64() * 2.0 - 1.0)
    }
}

/// SpO2 bonus for FiO2 above the configured minimum.
pub fn fio2_bonus(config: &TitrationConfig, fio2: f64) -> f64 {
    let points = (fio2 - config.fio2.min).max(0.0) * 100.0;
    (points * config.fio2.spo2_boost_per_point).min(config.fio2.spo2_max_bonus)
}

/// Steady-state targets for the current state, before noise.
pub fn targets(state: &PatientState, config: &TitrationConfig) -> TitrationTargets {
    let base = if state.vent_on {
        config.targets.vent_on
    } else {
        config.targets.vent_off
    };
    let iv = &state.interventions;

    let mut spo2 = base.spo2_pct + fio2_bonus(config, iv.fio2) + iv.bag_effect;
    let mut hr = base.hr_bpm;
    let mut map = base.map_mmhg;

    if let Some(shock) = &config.shock {
        map = shock.map_drift_target;
        hr = shock.hr_drift_target;
        if let Some(cap) = shock.spo2_drift_target {
            spo2 = spo2.min(cap);
        }
    }

    let deficit = (config.baseline.vitals.spo2_pct - state.vitals.spo2_pct).max(0.0);
    hr += deficit * config.targets.hypoxia_hr_gain;
    let rr = base.resp_rpm + deficit * config.targets.hypoxia_rr_gain;

    let pressor = &config.interventions.pressor;
    map += iv.pressor_dose * pressor.map_boost + iv.bolus_effect + iv.bolus_residual;
    hr += iv.pressor_dose * pressor.hr_delta;

    TitrationTargets {
        hr_bpm: hr,
        spo2_pct: spo2,
        resp_rpm: rr,
        map_mmhg: map,
    }
}

/// Advance `state` by `dt_sec`. Non-finite or non-positive steps return it unchanged.
pub fn update_patient(state: &PatientState, config: &TitrationConfig, dt_sec: f64) -> PatientState {
    if !dt_sec.is_finite() || dt_sec <= 0.0 {
        return state.clone();
    }
    let mut next = state.clone();
    next.t_sec += dt_sec;
    next.interventions.fio2 = clamp(next.interventions.fio2, config.fio2.min, config.fio2.max);

    let mut target = targets(&next, config);
    if config.noise.enabled {
        let amp = config.noise.amplitude;
        target.hr_bpm += next.jitter(amp.hr_bpm);
        target.spo2_pct += next.jitter(amp.spo2_pct);
        target.resp_rpm += next.jitter(amp.resp_rpm);
        target.map_mmhg += next.jitter(amp.map_mmhg);
    }

    let tc = &config.time_constants;
    let spo2_tau = tc.spo2_sec * config.fio2.min / next.interventions.fio2;
    let v = &mut next.vitals;
    v.spo2_pct = clamp(
        smooth_towards(v.spo2_pct, target.spo2_pct, spo2_tau, dt_sec),
        SPO2_LIMITS.0,
        SPO2_LIMITS.1,
    );
    v.hr_bpm = clamp(
        smooth_towards(v.hr_bpm, target.hr_bpm, tc.hr_sec, dt_sec),
        HR_LIMITS.0,
        HR_LIMITS.1,
    );
    v.resp_rpm = clamp(
        smooth_towards(v.resp_rpm, target.resp_rpm, tc.rr_sec, dt_sec),
        RR_LIMITS.0,
        RR_LIMITS.1,
    );
    v.map_mmhg = clamp(
        smooth_towards(v.map_mmhg, target.map_mmhg, tc.map_sec, dt_sec),
        MAP_LIMITS.0,
        MAP_LIMITS.1,
    );

    decay_interventions(&mut next.interventions, config, dt_sec);

    if let Some(shock) = &config.shock {
        let d = shock.detection;
        if next.vitals.map_mmhg < d.map_low && next.vitals.hr_bpm > d.hr_high {
            next.shock_timer_sec += dt_sec;
        } else {
            next.shock_timer_sec = 0.0;
        }
        next.shock_suspected = next.shock_timer_sec >= d.duration_sec;
    }
    next
}

fn decay_interventions(iv: &mut InterventionState, config: &TitrationConfig, dt_sec: f64) {
    let params = &config.interventions;

    if iv.bag_remaining_sec > 0.0 {
        iv.bag_remaining_sec = (iv.bag_remaining_sec - dt_sec).max(0.0);
        iv.bag_effect = if iv.bag_remaining_sec > 0.0 && params.bag.decay_sec > 0.0 {
            iv.bag_effect * (-dt_sec / params.bag.decay_sec).exp()
        } else {
            0.0
        };
    }

    iv.bolus_effect = if params.fluids.decay_sec > 0.0 {
        iv.bolus_effect * (-dt_sec / params.fluids.decay_sec).exp()
    } else {
        0.0
    };
    iv.bolus_cooldown_sec = (iv.bolus_cooldown_sec - dt_sec).max(0.0);
}

/// Systolic and diastolic pressures consistent with a MAP and pulse pressure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub sbp: f64,
    pub dbp: f64,
}

pub fn blood_pressure(map: f64, pulse_pressure: f64) -> BloodPressure {
    BloodPressure {
        sbp: map + 2.0 * pulse_pressure / 3.0,
        dbp: map - pulse_pressure / 3.0,
    }
}
