//! Staged vitals model.
//!
//! One step runs, in this order:
//! baseline approach -> ventilator -> hypoxia -> shock -> CPR -> epinephrine
//! -> fluids -> rhythm overrides -> clamp.
//!
//! Later stages deliberately see (and may override) the output of earlier ones,
//! so the order must not change.

use crate::interventions::Interventions;
use crate::vitals::{Rhythm, Vitals, clamp_vitals, compute_map, limits};
use cb_core::{clamp, smooth_towards};

/// Time constants (seconds) for the approach toward baseline.
const TAU_HR_S: f64 = 18.0;
const TAU_RR_S: f64 = 22.0;
const TAU_BP_S: f64 = 28.0;
const TAU_TEMP_S: f64 = 80.0;
const TAU_ETCO2_S: f64 = 18.0;

const SPO2_TARGET_VENT_ON: f64 = 96.0;
const SPO2_TARGET_VENT_OFF: f64 = 82.0;
const SPO2_FIO2_MAX_BONUS: f64 = 6.0;
const SPO2_BAGGING_BONUS: f64 = 3.0;
const SPO2_TAU_VENT_ON_S: f64 = 22.0;
const SPO2_TAU_VENT_OFF_S: f64 = 14.0;

const TAU_CPR_S: f64 = 1.8;

/// Compression quality used while CPR is running.
pub const CPR_QUALITY: f64 = 0.65;

/// Everything the step needs besides the previous snapshot.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// Targets the scalar vitals relax toward.
    pub baseline: &'a Vitals,
    pub interventions: &'a Interventions,
    /// Hypoxia severity in [0, 1].
    pub hypoxia_rate: f64,
    /// Shock severity in [0, 1].
    pub shock_rate: f64,
    pub arrhythmia_risk: f64,
    /// Residual epinephrine (and pressor) effect in [0, 1].
    pub epi_effect: f64,
    /// Residual fluid-bolus effect in [0, 1].
    pub fluid_effect: f64,
}

/// Oxygenation toward a ventilator- and FiO2-dependent SpO2 target.
///
/// Higher FiO2 both raises the target (up to +6 points) and shortens the time
/// constant: `tau = base_tau * 0.21 / fio2`.
pub fn apply_vent_physics(v: Vitals, dt_s: f64, vent_on: bool, fio2: f64, bagging: bool) -> Vitals {
    let (fio2_min, fio2_max) = limits::FIO2;
    let fio2 = clamp(fio2, fio2_min, fio2_max);
    let fio2_ratio = clamp((fio2 - fio2_min) / (fio2_max - fio2_min), 0.0, 1.0);
    let base_target = if vent_on {
        SPO2_TARGET_VENT_ON
    } else {
        SPO2_TARGET_VENT_OFF
    };
    let bag_bonus = if bagging { SPO2_BAGGING_BONUS } else { 0.0 };
    let target = base_target + fio2_ratio * SPO2_FIO2_MAX_BONUS + bag_bonus;

    let base_tau = if vent_on {
        SPO2_TAU_VENT_ON_S
    } else {
        SPO2_TAU_VENT_OFF_S
    };
    let tau = base_tau * (fio2_min / fio2);

    Vitals {
        vent_on,
        fio2,
        spo2: smooth_towards(v.spo2, target, tau, dt_s),
        ..v
    }
}

/// Monotonic desaturation: SpO2 falls 2.4/s and EtCO2 1.2/s at full severity.
pub fn apply_hypoxia(v: Vitals, dt_s: f64, severity: f64) -> Vitals {
    let s = clamp(severity, 0.0, 1.0);
    Vitals {
        spo2: v.spo2 - s * dt_s * 2.4,
        etco2: v.etco2 - s * dt_s * 1.2,
        ..v
    }
}

/// Pressure drift: SBP falls 6/s and DBP 4/s at full severity.
pub fn apply_shock(v: Vitals, dt_s: f64, severity: f64) -> Vitals {
    let s = clamp(severity, 0.0, 1.0);
    Vitals {
        sbp: v.sbp - s * dt_s * 6.0,
        dbp: v.dbp - s * dt_s * 4.0,
        ..v
    }
    .with_derived_map()
}

/// Chest compressions; only perfuse in asystole or PEA.
pub fn apply_cpr(v: Vitals, dt_s: f64, quality: f64) -> Vitals {
    if !v.rhythm.is_arrest() {
        return v;
    }
    let boost = 10.0 * clamp(quality, 0.0, 1.0);
    Vitals {
        sbp: smooth_towards(v.sbp, v.sbp + boost, TAU_CPR_S, dt_s),
        dbp: smooth_towards(v.dbp, v.dbp + boost * 0.6, TAU_CPR_S, dt_s),
        ..v
    }
    .with_derived_map()
}

/// Instantaneous shock. Converts VF/VT to sinus with HR >= 90 and BP >= 90/55;
/// any other rhythm is returned unchanged.
pub fn apply_defib(v: Vitals) -> Vitals {
    if !v.rhythm.is_shockable() {
        return v;
    }
    Vitals {
        rhythm: Rhythm::Nsr,
        hr: v.hr.max(90.0),
        sbp: v.sbp.max(90.0),
        dbp: v.dbp.max(55.0),
        ..v
    }
    .with_derived_map()
}

pub fn apply_epi(v: Vitals, effect: f64) -> Vitals {
    let e = clamp(effect, 0.0, 1.0);
    Vitals {
        hr: v.hr + e * 8.0,
        sbp: v.sbp + e * 12.0,
        dbp: v.dbp + e * 6.0,
        ..v
    }
    .with_derived_map()
}

pub fn apply_fluids(v: Vitals, effect: f64) -> Vitals {
    let e = clamp(effect, 0.0, 1.0);
    Vitals {
        sbp: v.sbp + e * 10.0,
        dbp: v.dbp + e * 6.0,
        ..v
    }
    .with_derived_map()
}

/// Asystole flattens HR/RR and bleeds EtCO2 down to 4; PEA caps HR at 40 and
/// floors RR at 4.
pub fn apply_rhythm_overrides(v: Vitals, dt_s: f64) -> Vitals {
    match v.rhythm {
        Rhythm::Asystole => Vitals {
            hr: 0.0,
            rr: 0.0,
            etco2: (v.etco2 - dt_s * 3.0).max(4.0),
            ..v
        },
        Rhythm::Pea => Vitals {
            hr: v.hr.min(40.0),
            rr: v.rr.max(4.0),
            ..v
        },
        _ => v,
    }
}

/// Advance `prev` by `dt_ms` milliseconds.
///
/// Returns `prev` untouched when `dt_ms` is non-finite or non-positive.
pub fn step_vitals(prev: &Vitals, dt_ms: f64, ctx: &StepContext<'_>) -> Vitals {
    if !dt_ms.is_finite() || dt_ms <= 0.0 {
        return *prev;
    }
    let dt_s = dt_ms / 1000.0;
    let base = ctx.baseline;

    let mut next = Vitals {
        hr: smooth_towards(prev.hr, base.hr, TAU_HR_S, dt_s),
        rr: smooth_towards(prev.rr, base.rr, TAU_RR_S, dt_s),
        sbp: smooth_towards(prev.sbp, base.sbp, TAU_BP_S, dt_s),
        dbp: smooth_towards(prev.dbp, base.dbp, TAU_BP_S, dt_s),
        temp_c: smooth_towards(prev.temp_c, base.temp_c, TAU_TEMP_S, dt_s),
        etco2: smooth_towards(prev.etco2, base.etco2, TAU_ETCO2_S, dt_s),
        ..*prev
    };

    next = apply_vent_physics(
        next,
        dt_s,
        next.vent_on,
        next.fio2,
        ctx.interventions.bagging,
    );

    if ctx.hypoxia_rate > 0.0 {
        next = apply_hypoxia(next, dt_s, ctx.hypoxia_rate);
    }
    if ctx.shock_rate > 0.0 {
        next = apply_shock(next, dt_s, ctx.shock_rate);
    }
    if ctx.interventions.cpr {
        next = apply_cpr(next, dt_s, CPR_QUALITY);
    }
    if ctx.epi_effect > 0.0 {
        next = apply_epi(next, ctx.epi_effect);
    }
    if ctx.fluid_effect > 0.0 {
        next = apply_fluids(next, ctx.fluid_effect);
    }

    next = apply_rhythm_overrides(next, dt_s);

    clamp_vitals(Vitals {
        map: compute_map(next.sbp, next.dbp),
        ..next
    })
}
