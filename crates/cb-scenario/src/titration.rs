//! Ventilator / FiO2 titration scenarios with a continuous pressor dose.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TitrationVitals {
    pub hr_bpm: f64,
    pub spo2_pct: f64,
    pub resp_rpm: f64,
    pub map_mmhg: f64,
    pub temp_c: f64,
}

/// Steady-state targets for one ventilator setting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TitrationTargets {
    pub hr_bpm: f64,
    pub spo2_pct: f64,
    pub resp_rpm: f64,
    pub map_mmhg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Devices {
    pub vent_on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub vitals: TitrationVitals,
    pub devices: Devices,
    pub fio2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressor_dose: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fio2Effect {
    pub min: f64,
    pub max: f64,
    /// SpO2 points gained per FiO2 percentage point above `min`.
    pub spo2_boost_per_point: f64,
    pub spo2_max_bonus: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetSet {
    pub vent_on: TitrationTargets,
    pub vent_off: TitrationTargets,
    /// HR target rise per SpO2 point below baseline.
    pub hypoxia_hr_gain: f64,
    /// RR target rise per SpO2 point below baseline.
    pub hypoxia_rr_gain: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeConstants {
    pub spo2_sec: f64,
    pub hr_sec: f64,
    pub rr_sec: f64,
    pub map_sec: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Noise {
    pub enabled: bool,
    pub amplitude: TitrationTargets,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LowCritical {
    pub low: f64,
    pub critical: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct High {
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub spo2: LowCritical,
    pub map: LowCritical,
    pub hr: High,
    pub rr: High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BagParams {
    pub boost: f64,
    pub decay_sec: f64,
    pub duration_sec: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluidParams {
    pub map_boost: f64,
    pub decay_sec: f64,
    pub cooldown_sec: f64,
    /// Share of the MAP boost that persists after the transient decays.
    pub residual_fraction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressorParams {
    /// MAP gain at full dose.
    pub map_boost: f64,
    /// HR change at full dose.
    pub hr_delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterventionParams {
    pub bag: BagParams,
    pub fluids: FluidParams,
    pub pressor: PressorParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShockDetection {
    pub map_low: f64,
    pub hr_high: f64,
    pub duration_sec: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShockDrift {
    pub map_drift_target: f64,
    pub hr_drift_target: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spo2_drift_target: Option<f64>,
    pub detection: ShockDetection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveParams {
    pub maintain_spo2_sec: f64,
    pub maintain_map_sec: f64,
    pub maintain_hr_sec: f64,
    pub hr_range: HrRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlarmParams {
    pub silence_duration_sec: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendParams {
    pub window_sec: f64,
    /// Slope magnitude (units per second) above which a vital counts as moving.
    pub slope_thresholds: TitrationTargets,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebugParams {
    pub event_log_size: usize,
}

/// Complete parameter set for one titration scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitrationConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    /// SBP - DBP used to derive display pressures from MAP.
    pub pulse_pressure: f64,
    pub baseline: Baseline,
    pub fio2: Fio2Effect,
    pub targets: TargetSet,
    pub time_constants: TimeConstants,
    pub noise: Noise,
    pub thresholds: Thresholds,
    pub interventions: InterventionParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shock: Option<ShockDrift>,
    pub objectives: ObjectiveParams,
    pub alarms: AlarmParams,
    pub trend: TrendParams,
    pub debug: DebugParams,
}

/// Id of the scenario used when a requested id is unknown.
pub const DEFAULT_TITRATION_ID: &str = "resp_failure";

impl TitrationConfig {
    /// Hypoxemic respiratory failure: ventilator dependent, hemodynamically stable.
    pub fn resp_failure() -> Self {
        Self {
            id: "resp_failure".to_string(),
            name: "Acute Respiratory Failure".to_string(),
            description: "Ventilated patient who desaturates quickly off the vent; titrate FiO2."
                .to_string(),
            pulse_pressure: 42.0,
            baseline: Baseline {
                vitals: TitrationVitals {
                    hr_bpm: 96.0,
                    spo2_pct: 93.0,
                    resp_rpm: 22.0,
                    map_mmhg: 82.0,
                    temp_c: 37.4,
                },
                devices: Devices { vent_on: true },
                fio2: 0.3,
                pressor_dose: None,
            },
            fio2: Fio2Effect {
                min: 0.21,
                max: 1.0,
                spo2_boost_per_point: 0.12,
                spo2_max_bonus: 6.0,
            },
            targets: TargetSet {
                vent_on: TitrationTargets {
                    hr_bpm: 88.0,
                    spo2_pct: 94.0,
                    resp_rpm: 16.0,
                    map_mmhg: 82.0,
                },
                vent_off: TitrationTargets {
                    hr_bpm: 112.0,
                    spo2_pct: 80.0,
                    resp_rpm: 30.0,
                    map_mmhg: 78.0,
                },
                hypoxia_hr_gain: 1.2,
                hypoxia_rr_gain: 0.6,
            },
            time_constants: TimeConstants {
                spo2_sec: 14.0,
                hr_sec: 18.0,
                rr_sec: 22.0,
                map_sec: 28.0,
            },
            noise: Noise {
                enabled: true,
                amplitude: TitrationTargets {
                    hr_bpm: 1.0,
                    spo2_pct: 0.3,
                    resp_rpm: 0.5,
                    map_mmhg: 1.0,
                },
            },
            thresholds: Thresholds {
                spo2: LowCritical {
                    low: 90.0,
                    critical: 85.0,
                },
                map: LowCritical {
                    low: 65.0,
                    critical: 55.0,
                },
                hr: High { high: 120.0 },
                rr: High { high: 28.0 },
            },
            interventions: InterventionParams {
                bag: BagParams {
                    boost: 4.0,
                    decay_sec: 8.0,
                    duration_sec: 10.0,
                },
                fluids: FluidParams {
                    map_boost: 8.0,
                    decay_sec: 60.0,
                    cooldown_sec: 30.0,
                    residual_fraction: 0.25,
                },
                pressor: PressorParams {
                    map_boost: 18.0,
                    hr_delta: 10.0,
                },
            },
            shock: None,
            objectives: ObjectiveParams {
                maintain_spo2_sec: 60.0,
                maintain_map_sec: 60.0,
                maintain_hr_sec: 45.0,
                hr_range: HrRange {
                    min: 60.0,
                    max: 110.0,
                },
            },
            alarms: AlarmParams {
                silence_duration_sec: 60.0,
            },
            trend: TrendParams {
                window_sec: 30.0,
                slope_thresholds: TitrationTargets {
                    hr_bpm: 0.5,
                    spo2_pct: 0.2,
                    resp_rpm: 0.3,
                    map_mmhg: 0.5,
                },
            },
            debug: DebugParams { event_log_size: 40 },
        }
    }

    /// Distributive shock: MAP and HR drift toward decompensation until treated.
    pub fn shock() -> Self {
        let base = Self::resp_failure();
        Self {
            id: "shock".to_string(),
            name: "Septic Shock".to_string(),
            description: "Hypotension with compensatory tachycardia; bolus and titrate pressors."
                .to_string(),
            pulse_pressure: 38.0,
            baseline: Baseline {
                vitals: TitrationVitals {
                    hr_bpm: 124.0,
                    spo2_pct: 95.0,
                    resp_rpm: 24.0,
                    map_mmhg: 58.0,
                    temp_c: 38.9,
                },
                devices: Devices { vent_on: true },
                fio2: 0.3,
                pressor_dose: Some(0.0),
            },
            targets: TargetSet {
                vent_on: TitrationTargets {
                    hr_bpm: 110.0,
                    spo2_pct: 95.0,
                    resp_rpm: 20.0,
                    map_mmhg: 60.0,
                },
                vent_off: TitrationTargets {
                    hr_bpm: 126.0,
                    spo2_pct: 84.0,
                    resp_rpm: 30.0,
                    map_mmhg: 56.0,
                },
                ..base.targets
            },
            shock: Some(ShockDrift {
                map_drift_target: 48.0,
                hr_drift_target: 135.0,
                spo2_drift_target: Some(90.0),
                detection: ShockDetection {
                    map_low: 60.0,
                    hr_high: 110.0,
                    duration_sec: 10.0,
                },
            }),
            ..base
        }
    }

    pub fn builtins() -> Vec<Self> {
        vec![Self::resp_failure(), Self::shock()]
    }

    /// Built-in scenario by id, falling back to [`DEFAULT_TITRATION_ID`].
    pub fn builtin(id: &str) -> Self {
        Self::builtins()
            .into_iter()
            .find(|config| config.id == id)
            .unwrap_or_else(Self::resp_failure)
    }
}
