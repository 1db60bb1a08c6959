//! Vital-sign snapshot, rhythm classification and bounds.

use cb_core::clamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physiological bounds applied after every step.
pub mod limits {
    pub const HR: (f64, f64) = (0.0, 220.0);
    pub const RR: (f64, f64) = (0.0, 60.0);
    pub const SPO2: (f64, f64) = (50.0, 100.0);
    pub const SBP: (f64, f64) = (40.0, 200.0);
    pub const DBP: (f64, f64) = (20.0, 120.0);
    pub const MAP: (f64, f64) = (30.0, 140.0);
    pub const TEMP_C: (f64, f64) = (30.0, 41.0);
    pub const ETCO2: (f64, f64) = (0.0, 80.0);
    pub const FIO2: (f64, f64) = (0.21, 1.0);
    pub const PEEP: (f64, f64) = (0.0, 20.0);
}

/// Cardiac electrical rhythm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rhythm {
    /// Normal sinus rhythm.
    #[default]
    #[serde(rename = "NSR")]
    Nsr,
    /// Ventricular fibrillation.
    #[serde(rename = "VF")]
    Vf,
    /// Ventricular tachycardia.
    #[serde(rename = "VT")]
    Vt,
    /// Pulseless electrical activity.
    #[serde(rename = "PEA")]
    Pea,
    /// Flatline.
    #[serde(rename = "ASYSTOLE")]
    Asystole,
}

impl Rhythm {
    /// Rhythms that respond to defibrillation.
    pub fn is_shockable(self) -> bool {
        matches!(self, Rhythm::Vf | Rhythm::Vt)
    }

    /// Non-perfusing rhythms for which compressions raise pressure and the
    /// arrest timer runs.
    pub fn is_arrest(self) -> bool {
        matches!(self, Rhythm::Asystole | Rhythm::Pea)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rhythm::Nsr => "NSR",
            Rhythm::Vf => "VF",
            Rhythm::Vt => "VT",
            Rhythm::Pea => "PEA",
            Rhythm::Asystole => "ASYSTOLE",
        }
    }
}

impl fmt::Display for Rhythm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One vital-sign snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Heart rate (bpm)
    pub hr: f64,
    /// Respiratory rate (breaths/min)
    pub rr: f64,
    /// Peripheral oxygen saturation (%)
    pub spo2: f64,
    /// Systolic blood pressure (mmHg)
    pub sbp: f64,
    /// Diastolic blood pressure (mmHg)
    pub dbp: f64,
    /// Mean arterial pressure (mmHg), derived from SBP/DBP
    pub map: f64,
    /// Core temperature (°C)
    pub temp_c: f64,
    /// End-tidal CO2 (mmHg)
    pub etco2: f64,
    /// Inspired oxygen fraction [0.21, 1.0]
    pub fio2: f64,
    /// Positive end-expiratory pressure (cmH2O)
    pub peep: f64,
    pub vent_on: bool,
    pub rhythm: Rhythm,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            hr: 88.0,
            rr: 18.0,
            spo2: 94.0,
            sbp: 118.0,
            dbp: 70.0,
            map: compute_map(118.0, 70.0),
            temp_c: 37.2,
            etco2: 34.0,
            fio2: 0.3,
            peep: 6.0,
            vent_on: true,
            rhythm: Rhythm::Nsr,
        }
    }
}

impl Vitals {
    /// Copy with MAP recomputed from the current SBP/DBP.
    pub fn with_derived_map(mut self) -> Self {
        self.map = compute_map(self.sbp, self.dbp);
        self
    }
}

/// `MAP = (SBP + 2·DBP) / 3`.
pub fn compute_map(sbp: f64, dbp: f64) -> f64 {
    (sbp + 2.0 * dbp) / 3.0
}

fn bounded(value: f64, range: (f64, f64)) -> f64 {
    clamp(value, range.0, range.1)
}

/// Clamp every field to its bounds and recompute MAP from the clamped pressures.
///
/// MAP is itself clamped to [`limits::MAP`]. At the pressure floor (40/20) the
/// derived value is 26.7 and at the ceiling (200/120) it is 146.7, so the MAP
/// bounds win at both ends.
pub fn clamp_vitals(v: Vitals) -> Vitals {
    let sbp = bounded(v.sbp, limits::SBP);
    let dbp = bounded(v.dbp, limits::DBP);
    Vitals {
        hr: bounded(v.hr, limits::HR),
        rr: bounded(v.rr, limits::RR),
        spo2: bounded(v.spo2, limits::SPO2),
        sbp,
        dbp,
        map: bounded(compute_map(sbp, dbp), limits::MAP),
        temp_c: bounded(v.temp_c, limits::TEMP_C),
        etco2: bounded(v.etco2, limits::ETCO2),
        fio2: bounded(v.fio2, limits::FIO2),
        peep: bounded(v.peep, limits::PEEP),
        ..v
    }
}
