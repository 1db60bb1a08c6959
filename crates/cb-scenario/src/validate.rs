//! Validation of loaded catalogs and titration configurations.

use crate::diagnosis::Diagnosis;
use crate::titration::TitrationConfig;
use cb_core::{CoreError, ensure_finite, ensure_in_range};
use cb_physio::Vitals;
use std::collections::HashSet;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Catalog is empty")]
    EmptyCatalog,

    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Unknown action kind {kind} in {context}")]
    UnknownAction { kind: String, context: String },

    #[error("Invalid value in {context}: {source}")]
    InvalidValue {
        context: String,
        #[source]
        source: CoreError,
    },

    #[error("Invalid range in {context}: min {min} must be below max {max}")]
    InvalidRange { context: String, min: f64, max: f64 },
}

fn check<T>(result: Result<T, CoreError>, context: &str) -> Result<T, ValidationError> {
    result.map_err(|source| ValidationError::InvalidValue {
        context: context.to_string(),
        source,
    })
}

fn validate_vitals(v: &Vitals, context: &str) -> Result<(), ValidationError> {
    for (value, what) in [
        (v.hr, "hr"),
        (v.rr, "rr"),
        (v.spo2, "spo2"),
        (v.sbp, "sbp"),
        (v.dbp, "dbp"),
        (v.map, "map"),
        (v.temp_c, "temp_c"),
        (v.etco2, "etco2"),
        (v.peep, "peep"),
    ] {
        check(ensure_finite(value, what), context)?;
    }
    check(ensure_in_range(v.fio2, 0.21, 1.0, "fio2"), context)?;
    Ok(())
}

fn validate_diagnosis(dx: &Diagnosis) -> Result<(), ValidationError> {
    let context = format!("diagnosis {}", dx.id);
    validate_vitals(&dx.baseline_vitals, &context)?;

    let p = &dx.progression;
    check(ensure_in_range(p.hypoxia_rate, 0.0, 1.0, "hypoxia_rate"), &context)?;
    check(ensure_in_range(p.shock_rate, 0.0, 1.0, "shock_rate"), &context)?;
    check(
        ensure_in_range(p.arrhythmia_risk, 0.0, 1.0, "arrhythmia_risk"),
        &context,
    )?;

    let l = &dx.loss_conditions;
    check(ensure_in_range(l.asystole_sec, 0.0, f64::MAX, "asystole_sec"), &context)?;
    for (t, what) in [(&l.spo2_below, "spo2_below"), (&l.map_below, "map_below")] {
        check(ensure_finite(t.threshold, what), &context)?;
        check(ensure_in_range(t.duration_sec, 0.0, f64::MAX, what), &context)?;
    }

    for kind in &dx.win_conditions {
        if !kind.is_known() {
            return Err(ValidationError::UnknownAction {
                kind: kind.to_string(),
                context: context.clone(),
            });
        }
    }
    Ok(())
}

pub fn validate_catalog(diagnoses: &[Diagnosis]) -> Result<(), ValidationError> {
    if diagnoses.is_empty() {
        return Err(ValidationError::EmptyCatalog);
    }
    let mut ids = HashSet::new();
    for dx in diagnoses {
        if !ids.insert(dx.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: dx.id.clone(),
                context: "diagnoses".to_string(),
            });
        }
        validate_diagnosis(dx)?;
    }
    Ok(())
}

fn validate_range(min: f64, max: f64, context: &str) -> Result<(), ValidationError> {
    check(ensure_finite(min, "min"), context)?;
    check(ensure_finite(max, "max"), context)?;
    if min >= max {
        return Err(ValidationError::InvalidRange {
            context: context.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

pub fn validate_titration(config: &TitrationConfig) -> Result<(), ValidationError> {
    let context = format!("titration {}", config.id);
    validate_range(config.fio2.min, config.fio2.max, &format!("{context} fio2"))?;
    check(ensure_in_range(config.fio2.min, 0.21, 1.0, "fio2.min"), &context)?;
    check(ensure_in_range(config.fio2.max, 0.21, 1.0, "fio2.max"), &context)?;
    check(
        ensure_in_range(config.baseline.fio2, config.fio2.min, config.fio2.max, "baseline.fio2"),
        &context,
    )?;
    if let Some(dose) = config.baseline.pressor_dose {
        check(ensure_in_range(dose, 0.0, 1.0, "baseline.pressor_dose"), &context)?;
    }

    let tc = &config.time_constants;
    for (value, what) in [
        (tc.spo2_sec, "time_constants.spo2_sec"),
        (tc.hr_sec, "time_constants.hr_sec"),
        (tc.rr_sec, "time_constants.rr_sec"),
        (tc.map_sec, "time_constants.map_sec"),
    ] {
        check(ensure_in_range(value, f64::MIN_POSITIVE, f64::MAX, what), &context)?;
    }

    let iv = &config.interventions;
    check(
        ensure_in_range(iv.fluids.residual_fraction, 0.0, 1.0, "fluids.residual_fraction"),
        &context,
    )?;
    for (value, what) in [
        (iv.bag.decay_sec, "bag.decay_sec"),
        (iv.bag.duration_sec, "bag.duration_sec"),
        (iv.fluids.decay_sec, "fluids.decay_sec"),
        (iv.fluids.cooldown_sec, "fluids.cooldown_sec"),
        (config.alarms.silence_duration_sec, "alarms.silence_duration_sec"),
        (config.trend.window_sec, "trend.window_sec"),
    ] {
        check(ensure_in_range(value, 0.0, f64::MAX, what), &context)?;
    }

    let hr_range = &config.objectives.hr_range;
    validate_range(hr_range.min, hr_range.max, &format!("{context} objectives.hr_range"))?;

    if config.debug.event_log_size == 0 {
        return Err(ValidationError::InvalidValue {
            context,
            source: CoreError::InvalidArg {
                what: "debug.event_log_size must be positive",
            },
        });
    }
    Ok(())
}
