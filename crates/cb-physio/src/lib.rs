//! Patient physiology for the code-blue simulator.
//!
//! Provides:
//! - `Vitals` snapshot with the MAP invariant and physiological bounds
//! - cardiac `Rhythm` classification
//! - `Interventions` flags read by the physiology step
//! - the staged, time-stepped vitals model (`step_vitals`) and instantaneous
//!   defibrillation (`apply_defib`)
//!
//! Everything here is a pure function of its inputs; callers own all state.

pub mod interventions;
pub mod model;
pub mod vitals;

pub use interventions::Interventions;
pub use model::{
    CPR_QUALITY, StepContext, apply_cpr, apply_defib, apply_epi, apply_fluids, apply_hypoxia,
    apply_rhythm_overrides, apply_shock, apply_vent_physics, step_vitals,
};
pub use vitals::{Rhythm, Vitals, clamp_vitals, compute_map, limits};
