//! Integration test: code-blue engine runs end to end.
//!
//! Covers:
//! - post-op hemorrhage treated with blood and pressors
//! - reset purity and run determinism
//! - action log capacity
//! - antibiotic discount on hypoxia progression
//! - scheduled arrhythmia checks gated on sinus rhythm
//! - score bounds, vitals bounds and the MAP invariant under arbitrary input

use cb_engine::{ACTION_LOG_CAPACITY, Action, ScenarioEngine, SimEngine};
use cb_physio::{Rhythm, compute_map, limits};
use cb_scenario::{ActionKind, CodeBluePhase, DiagnosisCatalog, KNOWN_ACTION_NAMES};
use proptest::prelude::*;
use std::sync::Arc;

fn catalog() -> Arc<DiagnosisCatalog> {
    Arc::new(DiagnosisCatalog::builtin())
}

#[test]
fn hemorrhage_responds_to_blood_and_pressors() {
    let mut engine = SimEngine::new(catalog(), "dx_postop_hemorrhage");
    let start = engine.vitals();
    assert_eq!(start.hr, 118.0);
    assert_eq!((start.sbp, start.dbp), (94.0, 52.0));
    assert!((start.map - 66.0).abs() < 1e-9);
    let score0 = engine.state().score;

    engine.dispatch(Action::new(ActionKind::BloodTransfuse));
    engine.dispatch(Action::new(ActionKind::PressorStart));
    for _ in 0..600 {
        engine.tick(100.0);
    }

    assert!(engine.vitals().map > 66.0);
    assert!(engine.state().score >= score0 + 4);
    assert!((engine.state().time_ms - 60_000.0).abs() < 1e-6);
    assert_eq!(engine.state().phase, CodeBluePhase::Deterioration);
    assert!(engine.interventions().blood && engine.interventions().pressors);
}

#[test]
fn reset_matches_fresh_engine() {
    let catalog = catalog();
    let mut engine = SimEngine::new(Arc::clone(&catalog), "dx_legionella");
    engine.dispatch(Action::new(ActionKind::MedEpi));
    engine.dispatch(Action::new(ActionKind::CprStart));
    engine.dispatch(Action::new(ActionKind::VentToggle));
    for _ in 0..2_000 {
        engine.tick(100.0);
    }

    engine.reset("dx_stroke");
    let fresh = SimEngine::new(catalog, "dx_stroke");
    assert_eq!(engine.snapshot(), fresh.snapshot());
    assert_eq!(engine.epi_effect(), 0.0);
    assert_eq!(engine.fluid_effect(), 0.0);
    assert_eq!(engine.arrest_start_ms(), None);
    assert!(engine.log().is_empty());

    engine.dispatch(Action::new(ActionKind::CallRrt));
    assert_eq!(engine.log()[0].id.index(), 0);
}

#[test]
fn identical_runs_are_identical() {
    let script = [
        (5_000.0, ActionKind::LabsAbg),
        (40_000.0, ActionKind::MonitorCheckRhythm),
        (120_000.0, ActionKind::CprStart),
        (125_000.0, ActionKind::MedEpi),
        (160_000.0, ActionKind::DefibShock),
    ];
    let run = || {
        let mut engine = SimEngine::new(catalog(), "dx_acute_mi");
        let mut pending = script.iter().peekable();
        for step in 1..=3_000 {
            let now = step as f64 * 100.0;
            while let Some((_, kind)) = pending.next_if(|(at, _)| *at <= now) {
                engine.dispatch(Action::new(kind.clone()));
            }
            engine.tick(100.0);
        }
        engine.snapshot()
    };
    assert_eq!(run(), run());
}

#[test]
fn action_log_keeps_most_recent_200() {
    let mut engine = SimEngine::new(catalog(), "dx_stroke");
    for i in 0..250 {
        let kind = ActionKind::from_name(KNOWN_ACTION_NAMES[i % KNOWN_ACTION_NAMES.len()]);
        engine.dispatch(Action::new(kind));
    }
    let log = engine.log();
    assert_eq!(log.len(), ACTION_LOG_CAPACITY);
    let indices: Vec<u64> = log.iter().map(|e| e.id.index()).collect();
    assert_eq!(indices, (50..250).collect::<Vec<u64>>());

    let state = engine.state();
    assert_eq!(state.last_actions.len(), 8);
    let tail: Vec<ActionKind> = log[192..].iter().map(|e| e.kind.clone()).collect();
    assert_eq!(state.last_actions, tail);
}

#[test]
fn loss_conditions_never_stop_the_run() {
    let mut engine = SimEngine::new(catalog(), "dx_postop_hemorrhage");
    for _ in 0..6_000 {
        engine.tick(100.0);
    }
    let state = engine.state();
    assert!(state.losses.any());
    assert_eq!(state.phase, CodeBluePhase::Rosc);
    engine.tick(100.0);
    assert!(engine.state().time_ms > state.time_ms);
}

#[test]
fn antibiotics_slow_desaturation() {
    let catalog = catalog();
    let mut untreated = SimEngine::new(Arc::clone(&catalog), "dx_legionella");
    let mut treated = SimEngine::new(catalog, "dx_legionella");
    treated.dispatch(Action::new(ActionKind::MedAntibiotics));
    assert!(treated.interventions().antibiotics);

    for _ in 0..50 {
        untreated.tick(100.0);
        treated.tick(100.0);
    }
    assert!(
        treated.vitals().spo2 > untreated.vitals().spo2,
        "treated {} vs untreated {}",
        treated.vitals().spo2,
        untreated.vitals().spo2
    );
}

fn tick_until(engine: &mut SimEngine, t_ms: f64) {
    while engine.state().time_ms < t_ms {
        engine.tick(100.0);
    }
}

#[test]
fn scheduled_arrhythmia_check_rolls_only_from_sinus() {
    let mut engine = SimEngine::new(catalog(), "dx_stroke");
    let first_check = engine.script().next_arrhythmia_check_ms;
    assert!(first_check > 90_000.0 && first_check < 110_000.0);

    tick_until(&mut engine, first_check - 100.0);
    assert_eq!(engine.vitals().rhythm, Rhythm::Nsr);
    assert_eq!(engine.script().next_arrhythmia_check_ms, first_check);

    tick_until(&mut engine, first_check);
    let fired_at = engine.state().time_ms;
    assert_ne!(engine.vitals().rhythm, Rhythm::Nsr);
    assert_eq!(engine.script().next_arrhythmia_check_ms, fired_at + 90_000.0);

    // Still in VF when the next check comes due, so nothing is rescheduled.
    let second_check = engine.script().next_arrhythmia_check_ms;
    tick_until(&mut engine, second_check + 1_000.0);
    assert_eq!(engine.vitals().rhythm, Rhythm::Vf);
    assert_eq!(engine.script().next_arrhythmia_check_ms, second_check);

    // Back in sinus, the overdue check fires on the next tick.
    engine.dispatch(Action::new(ActionKind::DefibCharge));
    engine.dispatch(Action::new(ActionKind::DefibShock));
    assert_eq!(engine.vitals().rhythm, Rhythm::Nsr);
    engine.tick(100.0);
    let refired_at = engine.state().time_ms;
    assert_eq!(engine.vitals().rhythm, Rhythm::Vf);
    assert_eq!(engine.script().next_arrhythmia_check_ms, refired_at + 90_000.0);
}

fn any_kind() -> impl Strategy<Value = ActionKind> {
    prop_oneof![
        9 => prop::sample::select(KNOWN_ACTION_NAMES.to_vec()).prop_map(ActionKind::from_name),
        1 => "[A-Z_]{3,12}".prop_map(|name| ActionKind::from_name(&name)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn score_and_vitals_stay_bounded(
        dx in 0u64..5,
        steps in prop::collection::vec((any_kind(), 0.0f64..5_000.0), 1..120),
    ) {
        let catalog = catalog();
        let id = catalog.pick(dx).id.clone();
        let mut engine = SimEngine::new(catalog, &id);
        for (kind, dt) in steps {
            engine.dispatch(Action::new(kind));
            engine.tick(dt);

            let score = engine.state().score;
            prop_assert!((0..=100).contains(&score));

            let v = engine.vitals();
            prop_assert!(v.hr >= limits::HR.0 && v.hr <= limits::HR.1);
            prop_assert!(v.rr >= limits::RR.0 && v.rr <= limits::RR.1);
            prop_assert!(v.spo2 >= limits::SPO2.0 && v.spo2 <= limits::SPO2.1);
            prop_assert!(v.sbp >= limits::SBP.0 && v.sbp <= limits::SBP.1);
            prop_assert!(v.dbp >= limits::DBP.0 && v.dbp <= limits::DBP.1);
            prop_assert!(v.map >= limits::MAP.0 && v.map <= limits::MAP.1);
            prop_assert!(v.fio2 >= limits::FIO2.0 && v.fio2 <= limits::FIO2.1);
            prop_assert!(v.peep >= limits::PEEP.0 && v.peep <= limits::PEEP.1);

            let expected = compute_map(v.sbp, v.dbp).clamp(limits::MAP.0, limits::MAP.1);
            prop_assert!((v.map - expected).abs() < 1e-9);
        }
    }
}
